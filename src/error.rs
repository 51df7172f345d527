//! Errors raised at the monitoring-service boundary.

use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FetchError>;

#[derive(Error, Debug)]
pub enum FetchError {
    /// curl could not be run or the transfer failed
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    /// Non-2xx response
    #[error("GET {url} returned HTTP {code}")]
    Status { url: String, code: u16 },

    /// Body was not valid JSON
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// WWN not present in the source
    #[error("device not found: {0}")]
    DeviceNotFound(String),
}
