use thiserror::Error;
use vastsweeper_core::WorldError;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Malformed request: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid settings file: {0}")]
    Config(#[from] toml::de::Error),
    #[error(transparent)]
    World(#[from] WorldError),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
