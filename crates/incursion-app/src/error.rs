use std::path::PathBuf;

use thiserror::Error;

use incursion_core::error::ConfigError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to read world file {path}: {source}")]
    WorldIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid world file: {0}")]
    WorldParse(#[from] serde_json::Error),

    #[error("failed to spawn the event loop thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("event loop is already running")]
    AlreadyRunning,

    #[error("event loop is not running")]
    LoopStopped,
}
