//! Zenith Wire - Message-oriented transport layer
//!
//! Carries RPC traffic as length-prefixed frames over TCP or Unix sockets.
//! A [`Link`] is dialed from an [`Endpoint`] and can be split into reader
//! and writer halves so independent tasks drive each direction; envelopes
//! are bincode-encoded through [`codec`].
//!
//! # Example
//!
//! ```no_run
//! use serde::{Deserialize, Serialize};
//! use zenith_wire::MessageStream;
//!
//! #[derive(Serialize, Deserialize)]
//! struct Ping { seq: u32 }
//!
//! #[derive(Serialize, Deserialize)]
//! struct Pong { seq: u32 }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut stream = MessageStream::connect(&"127.0.0.1:8080".parse()?).await?;
//! stream.send(&Ping { seq: 1 }).await?;
//! let pong: Pong = stream.receive().await?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod endpoint;
pub mod error;
pub mod frame;
pub mod link;
pub mod stream;

// Re-exports for convenience
pub use endpoint::Endpoint;
pub use error::{Error, Result};
pub use link::{FrameReader, FrameWriter, Link, LinkOptions, Listener};
pub use stream::MessageStream;
