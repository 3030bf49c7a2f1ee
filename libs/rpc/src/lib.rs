//! Zenith RPC - Client-side remote call framework
//!
//! Callers invoke schema-described methods over a framed transport and
//! observe the result either by awaiting the call handle or through a
//! one-shot completion hook. One [`Connection`] serves many concurrent
//! calls; responses are correlated back to their handles by call id.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use zenith_core::{FieldKind, MessageShape, SchemaRegistry, ServiceDescriptor, Status};
//! use zenith_rpc::{Call, Channel, Connection};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut schema = SchemaRegistry::new();
//! schema.register(ServiceDescriptor::new("echo").method(
//!     "Echo",
//!     MessageShape::new().field("text", FieldKind::Text),
//!     MessageShape::new().field("text", FieldKind::Text),
//! ));
//!
//! let connection = Connection::connect(&"127.0.0.1:5000".parse()?).await?;
//! let channel = connection.create_channel(Arc::new(schema));
//!
//! let call = Call::new();
//! channel.call_raw("echo", "Echo", &call, &serde_json::json!({"text": "hi"}), None);
//! call.wait().await;
//! assert_eq!(call.status(), Some(Status::Ok));
//! # Ok(())
//! # }
//! ```

pub mod call;
pub mod channel;
pub mod completion;
pub mod connection;
pub mod error;
pub mod owned;
pub mod protocol;

// Re-exports for convenience
pub use call::Call;
pub use channel::{Channel, ChannelExt, ConnectionChannel};
pub use completion::Completion;
pub use connection::Connection;
pub use error::{Error, Result};
pub use owned::OwnedVec;
pub use zenith_core::Status;
pub use zenith_wire::Endpoint;
