use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BottlesError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("collaborator initialization failed: {0}")]
    CollaboratorInit(String),
    #[error("playback error on channel {channel}: {reason}")]
    Playback { channel: usize, reason: String },
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("timeout waiting for sensor")]
    Timeout,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("missing item weights")]
    MissingWeights,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;

pub(crate) fn config_err(msg: impl Into<String>) -> Report {
    Report::new(BottlesError::Config(msg.into()))
}
