use thiserror::Error;

use crate::store::StoreError;
use crate::upload::UploadError;

#[derive(Error, Debug)]
pub enum RoomError {
    /// The host could not supply data a hook needed (no game running, player gone...)
    #[error("Host data unavailable: {0}")]
    HostUnavailable(&'static str),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unknown chat command: {0}")]
    UnknownCommand(String),
}

impl RoomError {
    /// Errors caused by host timing rather than by a bug in a plugin.
    pub fn is_transient(&self) -> bool {
        matches!(self, RoomError::HostUnavailable(_))
    }
}

impl From<serde_yaml::Error> for RoomError {
    fn from(err: serde_yaml::Error) -> Self {
        RoomError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RoomError>;
