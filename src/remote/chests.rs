//! Chest lists, details, unlock and visibility.

use super::http_client::read_json;
use super::types::{RocketWire, VisibilityWire};
use super::*;

impl RemoteClient {
    pub fn list_rockets(&self, origin: Origin) -> Result<Vec<Rocket>, RemoteError> {
        let label = format!("list {}", origin.label());
        let resp = self.send(&label, |c| c.get(self.url(origin.path())))?;
        let items: Vec<RocketWire> = read_json(resp, &label)?;
        Ok(items
            .into_iter()
            .map(|w| w.into_rocket(origin))
            .collect())
    }

    pub fn rocket_detail(&self, origin: Origin, id: &ItemId) -> Result<RocketDetail, RemoteError> {
        let label = format!("{} detail", origin.label());
        let resp = self.send(&label, |c| {
            c.get(self.url(&format!("{}/{}", origin.path(), id)))
        })?;
        let wire: RocketWire = read_json(resp, &label)?;
        Ok(wire.into_detail())
    }

    pub fn unlock_rocket(&self, rocket: &RocketId) -> Result<(), RemoteError> {
        self.send("unlock rocket", |c| {
            c.patch(self.url(&format!("/rockets/{}/unlock", rocket)))
        })?;
        Ok(())
    }

    pub fn toggle_chest_visibility(&self, chest: &ItemId) -> Result<bool, RemoteError> {
        let resp = self.send("toggle visibility", |c| {
            c.patch(self.url(&format!("/received-chests/{}/visibility", chest)))
        })?;
        let out: VisibilityWire = read_json(resp, "parse visibility")?;
        Ok(out.is_public())
    }
}

impl RocketApi for RemoteClient {
    fn profile(&self) -> Result<Profile, RemoteError> {
        self.fetch_profile()
    }

    fn list(&self, origin: Origin) -> Result<Vec<Rocket>, RemoteError> {
        self.list_rockets(origin)
    }

    fn detail(&self, origin: Origin, id: &ItemId) -> Result<RocketDetail, RemoteError> {
        self.rocket_detail(origin, id)
    }

    fn unlock(&self, rocket: &RocketId) -> Result<(), RemoteError> {
        self.unlock_rocket(rocket)
    }

    fn swap_displays(&self, source: &ItemId, target: &ItemId) -> Result<(), RemoteError> {
        self.swap_display_locations(source, target)
    }

    fn move_display(&self, id: &ItemId, target: usize) -> Result<(), RemoteError> {
        self.move_display_to_empty(id, target)
    }

    fn toggle_visibility(&self, chest: &ItemId) -> Result<bool, RemoteError> {
        self.toggle_chest_visibility(chest)
    }

    fn download(&self, file_id: &str) -> Result<Vec<u8>, RemoteError> {
        self.download_file(file_id)
    }
}
