//! Request/response envelopes carried on the wire.
//!
//! Envelopes are bincode-encoded and travel one per frame. The message
//! payload inside an envelope is the JSON encoding of the request or
//! response value, so schema validation and dynamic callers share one
//! payload representation.

use serde::{Deserialize, Serialize};
use zenith_core::Status;

/// Client-to-server envelope for one call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRequest {
    /// Correlates the response envelope back to the pending call.
    pub id: u64,
    pub service: String,
    pub method: String,
    /// JSON-encoded request message.
    pub payload: Vec<u8>,
}

/// Server-to-client envelope resolving one call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallResponse {
    pub id: u64,
    pub status: Status,
    pub application_error: Option<i32>,
    pub error_message: Option<String>,
    /// JSON-encoded response message, present iff `status` is `Ok`.
    pub payload: Option<Vec<u8>>,
}

impl CallResponse {
    pub fn ok(id: u64, payload: Vec<u8>) -> Self {
        Self {
            id,
            status: Status::Ok,
            application_error: None,
            error_message: None,
            payload: Some(payload),
        }
    }

    pub fn application_error(id: u64, code: i32, message: impl Into<String>) -> Self {
        Self {
            id,
            status: Status::ApplicationError,
            application_error: Some(code),
            error_message: Some(message.into()),
            payload: None,
        }
    }

    pub fn failure(id: u64, status: Status, message: impl Into<String>) -> Self {
        Self {
            id,
            status,
            application_error: None,
            error_message: Some(message.into()),
            payload: None,
        }
    }
}
