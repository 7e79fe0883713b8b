//! Worker error types.

use menu_export_models::TransitionError;
use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Telemetry setup failed: {0}")]
    TelemetryFailed(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn telemetry_failed(msg: impl Into<String>) -> Self {
        Self::TelemetryFailed(msg.into())
    }
}
