//! Display grid rearrangement.

use super::types::{MoveToEmptyRequest, SwapRequest};
use super::*;

impl RemoteClient {
    pub fn swap_display_locations(&self, source: &ItemId, target: &ItemId) -> Result<(), RemoteError> {
        self.send("swap displays", |c| {
            c.patch(self.url("/displays/location")).json(&SwapRequest {
                source_chest_id: source.as_str(),
                target_chest_id: target.as_str(),
            })
        })?;
        Ok(())
    }

    /// `target` is 0-based; the wire takes the 1-based slot number.
    pub fn move_display_to_empty(&self, id: &ItemId, target: usize) -> Result<(), RemoteError> {
        let target_location = u32::try_from(target + 1)
            .map_err(|e| RemoteError::decode("move display", e))?;
        self.send("move display", |c| {
            c.patch(self.url(&format!("/displays/{}/move-to-empty", id)))
                .json(&MoveToEmptyRequest { target_location })
        })?;
        Ok(())
    }
}
