use thiserror::Error;

use epo::error::{ConfigError, InitError};

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("could not determine the user data directory")]
    NoDataDir,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid script: {0}")]
    Script(#[from] serde_json::Error),
    #[error(transparent)]
    Init(#[from] InitError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("bad argument: {0}")]
    Argument(String),
}
