mod config;
mod ids;
mod rocket;

pub use self::config::{ClientConfig, Credentials, RemoteConfig, SessionRecord};
pub use self::ids::{ItemId, RocketId};
pub use self::rocket::{
    Attachment, Design, DetailState, Origin, Profile, Rocket, RocketDetail, Schedule,
};
