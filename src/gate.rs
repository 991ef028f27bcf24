//! Request identity guard for list fetches.
//!
//! Each fetch gets a token from a monotonically increasing counter. Only the
//! response carrying the latest token is applied; anything older is stale and
//! dropped on arrival. There is no network cancellation.

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct RequestGate {
    latest: u64,
    in_flight: bool,
}

impl RequestGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new request, superseding any outstanding one.
    pub fn issue(&mut self) -> RequestToken {
        self.latest += 1;
        self.in_flight = true;
        RequestToken(self.latest)
    }

    /// Returns true if `token` is the latest request; that request is then settled.
    pub fn accept(&mut self, token: RequestToken) -> bool {
        if token.0 != self.latest {
            return false;
        }
        self.in_flight = false;
        true
    }

    /// Makes every outstanding token stale without starting a new request.
    pub fn invalidate(&mut self) {
        self.latest += 1;
        self.in_flight = false;
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }
}
