//! Typed messaging over a link.

use serde::{de::DeserializeOwned, Serialize};

use crate::codec;
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::link::Link;

/// A link that speaks whole messages instead of byte frames.
///
/// Suits one side of a conversation where a single task owns both
/// directions, such as a server answering one request at a time.
/// Concurrent use of the two directions goes through [`Link::split`]
/// instead.
pub struct MessageStream {
    link: Link,
}

impl MessageStream {
    pub fn new(link: Link) -> Self {
        Self { link }
    }

    /// Dial an endpoint and wrap the resulting link.
    pub async fn connect(endpoint: &Endpoint) -> Result<Self> {
        Ok(Self::new(Link::dial(endpoint).await?))
    }

    /// Encode and send one message.
    pub async fn send<T: Serialize>(&mut self, message: &T) -> Result<()> {
        let bytes = codec::encode(message)?;
        self.link.send(&bytes).await
    }

    /// Receive and decode one message.
    pub async fn receive<T: DeserializeOwned>(&mut self) -> Result<T> {
        let bytes = self.link.receive().await?;
        codec::decode(&bytes)
    }

    /// Shut down the sending direction.
    pub async fn close(mut self) -> Result<()> {
        self.link.close().await
    }
}
