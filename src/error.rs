//! Error types and result definitions for the yoctorfid crate.
//! Covers transport-level failures; per-tag protocol outcomes are carried by
//! [`OperationStatus`](crate::status::OperationStatus) instead.

use thiserror::Error;

/// Represents all possible local errors when communicating with a VirtualHub.
#[derive(Error, Debug, Clone)]
pub enum RfidError {
    /// Standard IO error (network, connection reset, etc.)
    #[error("IO error: {0}")]
    Io(String),

    /// JSON deserialization error in a hub response
    #[error("JSON error: {0}")]
    Json(String),

    /// The hub answered with a non-success HTTP status line
    #[error("HTTP error: {0}")]
    Http(String),

    /// Request timed out
    #[error("Timeout waiting for hub")]
    Timeout,

    /// Failed to decode hex data in a response
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// A downloaded event-log chunk or response body violated the protocol
    /// (e.g. missing the trailing position marker)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// An argument was rejected before any request was issued
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// A specialized Result type for hub operations.
pub type Result<T> = std::result::Result<T, RfidError>;

impl From<std::io::Error> for RfidError {
    fn from(err: std::io::Error) -> Self {
        RfidError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for RfidError {
    fn from(err: serde_json::Error) -> Self {
        RfidError::Json(err.to_string())
    }
}

impl From<hex::FromHexError> for RfidError {
    fn from(err: hex::FromHexError) -> Self {
        RfidError::DecodeError(err.to_string())
    }
}

// Local (library-side) result codes, kept in the (-50, 0) range so that
// classification treats them as library errors rather than device errors.
pub const ERR_NOT_INITIALIZED: i32 = -1;
pub const ERR_INVALID_ARGUMENT: i32 = -2;
pub const ERR_NOT_SUPPORTED: i32 = -3;
pub const ERR_DEVICE_NOT_FOUND: i32 = -4;
pub const ERR_DEVICE_BUSY: i32 = -6;
pub const ERR_TIMEOUT: i32 = -7;
pub const ERR_IO_ERROR: i32 = -8;
pub const ERR_NO_MORE_DATA: i32 = -9;
pub const ERR_UNAUTHORIZED: i32 = -12;

impl RfidError {
    /// Maps this error onto the local result-code range used by
    /// [`OperationStatus`](crate::status::OperationStatus).
    pub fn local_code(&self) -> i32 {
        match self {
            RfidError::Io(_) => ERR_IO_ERROR,
            RfidError::Json(_) => ERR_IO_ERROR,
            RfidError::Http(_) => ERR_IO_ERROR,
            RfidError::Timeout => ERR_TIMEOUT,
            RfidError::DecodeError(_) => ERR_IO_ERROR,
            RfidError::Protocol(_) => ERR_IO_ERROR,
            RfidError::InvalidArgument(_) => ERR_INVALID_ARGUMENT,
        }
    }
}
