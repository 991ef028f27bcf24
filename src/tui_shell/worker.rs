use std::sync::mpsc::{self, Receiver, Sender};

use crate::display::PendingMove;
use crate::gate::RequestToken;
use crate::model::RocketDetail;

use super::*;

/// Result of one remote call, sent back to the UI thread.
#[derive(Debug)]
pub(super) enum Done {
    List {
        origin: Origin,
        token: RequestToken,
        result: Result<Vec<Rocket>, RemoteError>,
    },
    Grid {
        token: RequestToken,
        result: Result<Vec<Rocket>, RemoteError>,
    },
    Unlock {
        origin: Origin,
        id: ItemId,
        result: Result<(), RemoteError>,
    },
    Visibility {
        id: ItemId,
        result: Result<bool, RemoteError>,
    },
    Detail {
        origin: Origin,
        id: ItemId,
        token: RequestToken,
        result: Result<RocketDetail, RemoteError>,
    },
    Move {
        pending: PendingMove,
        result: Result<(), RemoteError>,
    },
}

pub(super) type SharedApi = Arc<dyn RocketApi + Send + Sync>;

/// Runs remote calls on short-lived threads so the UI loop never blocks.
pub(super) struct Worker {
    api: SharedApi,
    tx: Sender<Done>,
    rx: Receiver<Done>,
    in_flight: usize,
    #[cfg(test)]
    pub(super) refuse_threads: bool,
}

impl Worker {
    pub(super) fn new(api: SharedApi) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            api,
            tx,
            rx,
            in_flight: 0,
            #[cfg(test)]
            refuse_threads: false,
        }
    }

    /// Starts `job` on its own thread. When no thread can be started the job
    /// is dropped and the error returned; nothing will arrive for it.
    pub(super) fn spawn<F>(&mut self, label: &'static str, job: F) -> std::io::Result<()>
    where
        F: FnOnce(&dyn RocketApi) -> Done + Send + 'static,
    {
        #[cfg(test)]
        if self.refuse_threads {
            return Err(std::io::Error::other("worker threads refused"));
        }
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("rocketbox-{}", label))
            .spawn(move || {
                tracing::debug!(call = label, "remote call started");
                let done = job(api.as_ref());
                // The UI may already be gone.
                let _ = tx.send(done);
            });
        match spawned {
            Ok(_) => {
                self.in_flight += 1;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(call = label, error = %err, "could not start worker thread");
                Err(err)
            }
        }
    }

    /// Results that arrived since the last call.
    pub(super) fn drain(&mut self) -> Vec<Done> {
        let done: Vec<Done> = self.rx.try_iter().collect();
        self.in_flight = self.in_flight.saturating_sub(done.len());
        done
    }

    /// Blocks until one result arrives or `timeout` passes.
    #[cfg(test)]
    pub(super) fn wait(&mut self, timeout: Duration) -> Option<Done> {
        let done = self.rx.recv_timeout(timeout).ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(done)
    }

    pub(super) fn in_flight(&self) -> usize {
        self.in_flight
    }
}
