use std::fmt;

use serde::{Deserialize, Serialize};

/// Terminal outcome of a remote call.
///
/// Exactly one of these labels every completed call. A call that has not
/// completed has no status at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// The call succeeded and the response payload is populated.
    Ok,
    /// The remote handler reported a failure; the application error code and
    /// message carry the details.
    ApplicationError,
    /// The caller cancelled the call before a response was observed.
    Cancelled,
    /// The call's deadline expired before a response was observed.
    DeadlineExceeded,
    /// The transport failed before a response was observed.
    ConnectionError,
    /// The request payload did not match the method's input shape.
    InvalidRequest,
    /// The service/method pair could not be resolved.
    UnknownMethod,
}

impl Status {
    /// Stable lowercase label, used for human-readable output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::ApplicationError => "application_error",
            Status::Cancelled => "cancelled",
            Status::DeadlineExceeded => "deadline_exceeded",
            Status::ConnectionError => "connection_error",
            Status::InvalidRequest => "invalid_request",
            Status::UnknownMethod => "unknown_method",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Status::Ok)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
