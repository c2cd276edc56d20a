// In: src/status.rs

//! The closed set of outcomes a boundary call can report, and the single place
//! where they are turned into the integers a foreign host sees.
//!
//! The values mirror the status enumeration of the tokenization engine (which
//! in turn mirrors the canonical RPC status codes), so hosts that already
//! interpret the engine's codes keep working unchanged.

use std::fmt;

/// A boundary-stable status. `Ok` is the only success value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum StatusCode {
    Ok = 0,
    Cancelled = 1,
    Unknown = 2,
    InvalidArgument = 3,
    DeadlineExceeded = 4,
    NotFound = 5,
    AlreadyExists = 6,
    PermissionDenied = 7,
    ResourceExhausted = 8,
    FailedPrecondition = 9,
    Aborted = 10,
    OutOfRange = 11,
    Unimplemented = 12,
    Internal = 13,
    Unavailable = 14,
    DataLoss = 15,
    Unauthenticated = 16,
}

impl StatusCode {
    /// Every status, in wire order.
    pub const ALL: [StatusCode; 17] = [
        StatusCode::Ok,
        StatusCode::Cancelled,
        StatusCode::Unknown,
        StatusCode::InvalidArgument,
        StatusCode::DeadlineExceeded,
        StatusCode::NotFound,
        StatusCode::AlreadyExists,
        StatusCode::PermissionDenied,
        StatusCode::ResourceExhausted,
        StatusCode::FailedPrecondition,
        StatusCode::Aborted,
        StatusCode::OutOfRange,
        StatusCode::Unimplemented,
        StatusCode::Internal,
        StatusCode::Unavailable,
        StatusCode::DataLoss,
        StatusCode::Unauthenticated,
    ];

    /// The integer written across the boundary.
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Interprets an integer received from the engine or a host.
    /// Returns `None` for values outside the closed set.
    pub fn from_code(code: i32) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
    }

    /// Looks a status up by its variant name. A trailing `Error` is ignored so
    /// that names such as `InternalError` resolve too.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.strip_suffix("Error").unwrap_or(name);
        Self::ALL
            .iter()
            .copied()
            .find(|status| format!("{status:?}") == name)
    }

    pub fn is_ok(self) -> bool {
        self == StatusCode::Ok
    }
}

impl From<StatusCode> for i32 {
    fn from(status: StatusCode) -> i32 {
        status.code()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}
