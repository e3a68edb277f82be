//! High-level error types

use std::time::Duration;

use vikiprint_core::Command;

use crate::correlator::Expected;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] vikiprint_core::Error),
    
    #[error("Transport error: {0}")]
    Transport(#[from] vikiprint_transport::Error),
    
    #[error("Type error: {0}")]
    Types(#[from] vikiprint_types::Error),
    
    #[error("No response from device to {expected} within {timeout:?}")]
    NoResponse {
        expected: Expected,
        timeout: Duration,
    },
    
    #[error("Device not open")]
    NotOpen,
    
    #[error("Device closed while waiting for {0}")]
    Closed(Expected),
    
    #[error("Device rejected {command} with error {code}: {message}")]
    Device {
        command: Command,
        code: u8,
        message: String,
    },
    
    #[error("Invalid response from device: {0}")]
    InvalidResponse(String),
}

impl Error {
    /// Check if retrying the whole operation might succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NoResponse { .. } | Self::Transport(vikiprint_transport::Error::Io(_))
        )
    }
}
