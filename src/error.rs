// In: src/error.rs

//! This module defines the single, unified error type for the spm-wrapper crate.
//! It uses the `thiserror` crate for the Rust side, and owns the isolated mapping
//! from an error to the `StatusCode` that crosses the foreign boundary.

use thiserror::Error;

use crate::status::StatusCode;

#[derive(Error, Debug)]
pub enum WrapperError {
    // =========================================================================
    // === Engine Failures (reported verbatim as a non-zero status)
    // =========================================================================
    /// The tokenization engine rejected the call.
    #[error("Engine reported {code}: {message}")]
    Engine { code: StatusCode, message: String },

    // =========================================================================
    // === Boundary & Argument Errors
    // =========================================================================
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Buffer length mismatch: expected at least {0} elements, got {1}")]
    BufferMismatch(usize, usize),

    /// A retry with the reported length did not produce the same length.
    /// This can only happen if the engine is not deterministic.
    #[error("Negotiation diverged: retried with {requested}, engine now requires {required}")]
    NegotiationDiverged { requested: usize, required: usize },

    #[error("Internal logic error (this is a bug): {0}")]
    InternalError(String),

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    #[error("Text is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the Serde JSON library, typically while reading a config.
    #[error("Serde JSON error: {0}")]
    Config(#[from] serde_json::Error),
}

impl WrapperError {
    /// Shorthand for building an engine failure.
    pub fn engine(code: StatusCode, message: impl Into<String>) -> Self {
        WrapperError::Engine {
            code,
            message: message.into(),
        }
    }

    /// The status a boundary call reports for this error. This is the only
    /// translation from Rust errors to boundary integers.
    pub fn status(&self) -> StatusCode {
        match self {
            WrapperError::Engine { code, .. } => *code,
            WrapperError::InvalidArgument(_) | WrapperError::Utf8(_) => StatusCode::InvalidArgument,
            WrapperError::BufferMismatch(..) => StatusCode::OutOfRange,
            WrapperError::Io(err) if err.kind() == std::io::ErrorKind::NotFound => {
                StatusCode::NotFound
            }
            WrapperError::Io(err) if err.kind() == std::io::ErrorKind::PermissionDenied => {
                StatusCode::PermissionDenied
            }
            WrapperError::Io(_) => StatusCode::Unknown,
            WrapperError::Config(_) => StatusCode::DataLoss,
            WrapperError::NegotiationDiverged { .. } | WrapperError::InternalError(_) => {
                StatusCode::Internal
            }
        }
    }
}

// =============================================================================
// === Manual `From` Implementations ===
// =============================================================================

impl From<std::string::FromUtf8Error> for WrapperError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        WrapperError::Utf8(err.utf8_error())
    }
}

impl From<std::ffi::NulError> for WrapperError {
    fn from(err: std::ffi::NulError) -> Self {
        WrapperError::InvalidArgument(err.to_string())
    }
}
