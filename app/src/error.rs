//! FILENAME: app/src/error.rs

use thiserror::Error;

/// Failures reported by the analytics host or the settings store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("Host read failed: {0}")]
    Read(String),

    #[error("Filter on '{field}' failed: {message}")]
    Filter { field: String, message: String },

    #[error("Settings store failed: {0}")]
    Settings(String),
}

impl HostError {
    pub fn filter(field: impl Into<String>, message: impl Into<String>) -> Self {
        HostError::Filter {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Host(#[from] HostError),

    #[error("Session has no data yet; refresh first")]
    NotInitialized,
}
