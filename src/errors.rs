use crate::config::HostConfigError;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Host display is not available")]
    MissingDisplay,

    #[error("Host is not initialized")]
    NotInitialized,

    #[error("Engine failed to initialize: {0}")]
    EngineInit(String),

    #[error("Compositor error: {0:#}")]
    Compositor(anyhow::Error),

    #[error("Watcher handle {handle} is already registered for window '{existing}'")]
    WatcherNameMismatch { handle: u64, existing: String },

    #[error("Host context lock poisoned")]
    Poisoned,

    #[error("Invalid configuration: {0}")]
    Config(#[from] HostConfigError),
}
