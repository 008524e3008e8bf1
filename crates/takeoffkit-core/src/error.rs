//! Error handling for TakeoffKit
//!
//! Provides error types for the measurement engine:
//! - Input errors (invalid calibration input, bad point counts)
//! - Sync errors (remote persistence failures)
//!
//! All error types use `thiserror` for ergonomic error handling.
//! Input errors are rejected synchronously and never reach the server;
//! sync errors trigger rollback of the specific optimistic change that
//! failed and are surfaced as a transient notification.

use thiserror::Error;

/// Input validation error type
///
/// Represents errors caught before any state is mutated. These are never
/// sent to the server.
#[derive(Error, Debug, Clone)]
pub enum InputError {
    /// Reference distance must be positive
    #[error("Invalid reference distance: {value}")]
    InvalidDistance {
        /// The rejected distance value.
        value: f64,
    },

    /// Calibration reference points coincide
    #[error("Calibration reference points coincide")]
    DegenerateReference,

    /// Drawing scale string did not parse
    #[error("Unknown drawing scale: {scale}")]
    UnknownScale {
        /// The scale string that failed to parse.
        scale: String,
    },

    /// Unknown paper size name
    #[error("Unknown paper size: {size}")]
    UnknownPaperSize {
        /// The paper size name that was not recognized.
        size: String,
    },

    /// Unknown measurement unit
    #[error("Unknown unit: {unit}")]
    UnknownUnit {
        /// The unit string that was not recognized.
        unit: String,
    },

    /// Image dimensions must be positive for preset calibration
    #[error("Invalid image width: {width_px}px")]
    InvalidImageWidth {
        /// The rejected image width in pixels.
        width_px: f64,
    },

    /// Too few points for the measurement kind
    #[error("{kind} measurement requires at least {required} points, got {actual}")]
    NotEnoughPoints {
        /// The measurement kind name.
        kind: String,
        /// The minimum number of points for the kind.
        required: usize,
        /// The number of points supplied.
        actual: usize,
    },

    /// Measurement id not present in the store
    #[error("Measurement not found: {id}")]
    MeasurementNotFound {
        /// The raw local id that was not found.
        id: u64,
    },

    /// Deductions are one level deep only
    #[error("A deduction cannot have deductions of its own")]
    NestedDeduction,

    /// Deduction parent must be a top-level area or linear measurement
    #[error("Invalid deduction parent: {reason}")]
    InvalidParent {
        /// Why the parent was rejected.
        reason: String,
    },

    /// The caller does not hold the edit capability
    #[error("Editing is not permitted")]
    EditNotPermitted,

    /// No active cost code in the session context
    #[error("No active cost code selected")]
    NoActiveCostCode,

    /// Generic input error
    #[error("Invalid input: {message}")]
    Other {
        /// The error message.
        message: String,
    },
}

/// Remote sync error type
///
/// Represents failures of the optimistic-apply-then-confirm path. Never
/// fatal to the in-memory model: the caller reverts the specific change
/// and surfaces a notification.
#[derive(Error, Debug, Clone)]
pub enum SyncError {
    /// Request could not be sent or the connection dropped
    #[error("Request failed: {reason}")]
    RequestFailed {
        /// Why the request failed.
        reason: String,
    },

    /// Server answered with a non-success status
    #[error("Server returned status {status}")]
    BadStatus {
        /// The HTTP-like status code.
        status: u16,
    },

    /// Response body could not be decoded
    #[error("Failed to decode response: {reason}")]
    DecodeFailed {
        /// Why decoding failed.
        reason: String,
    },

    /// Request timed out
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout {
        /// The timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// Generic sync error
    #[error("Sync error: {message}")]
    Other {
        /// The error message.
        message: String,
    },
}

/// Main error type for TakeoffKit
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Input validation error
    #[error(transparent)]
    Input(#[from] InputError),

    /// Remote sync error
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is an input validation error
    pub fn is_input(&self) -> bool {
        matches!(self, Error::Input(_))
    }

    /// Check if this is a remote sync error
    pub fn is_sync(&self) -> bool {
        matches!(self, Error::Sync(_))
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Sync(SyncError::Timeout { .. }))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
