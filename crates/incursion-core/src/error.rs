//! Error types shared by all incursion crates.

use std::path::PathBuf;

use thiserror::Error;

use crate::enums::EventPhase;

/// Configuration loading or validation failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// A collaborator (faction or actor directory) could not answer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("{0} directory unavailable")]
    Unavailable(&'static str),
}

/// Zone placement produced nothing usable.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlacementError {
    #[error("no valid zone location found ({requested} requested)")]
    NoValidZones { requested: usize },
}

/// A control command that cannot be honoured in the current state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ControlError {
    #[error("an event is already running (phase {0})")]
    AlreadyRunning(EventPhase),

    #[error("no event is running")]
    NotRunning,

    #[error("cooldown active for {remaining_secs} more seconds")]
    CooldownActive { remaining_secs: u64 },

    #[error("not enough actors online ({online}/{required})")]
    NotEnoughActors { online: usize, required: usize },

    #[error(transparent)]
    Placement(#[from] PlacementError),
}

/// Umbrella error for engine operations.
#[derive(Debug, Error)]
pub enum IncursionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Placement(#[from] PlacementError),

    #[error(transparent)]
    Control(#[from] ControlError),
}
