//! Framed peer sessions, dialed from an endpoint.
//!
//! A [`Link`] is one connected session carrying length-prefixed frames.
//! Callers name the peer with an [`Endpoint`] and never touch a concrete
//! socket type; the TCP/Unix distinction ends at the dial. A link can be
//! [split](Link::split) into a [`FrameReader`] and a [`FrameWriter`] so a
//! reader task and a writer task can drive the same session independently.

use std::path::PathBuf;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UnixListener, UnixStream};

use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::frame::{maybe_timeout, read_frame, write_frame};

/// Time limits applied when dialing and driving a link.
///
/// Unset limits leave the corresponding operation unbounded.
#[derive(Debug, Clone, Default)]
pub struct LinkOptions {
    connect_timeout: Option<Duration>,
    send_timeout: Option<Duration>,
    receive_timeout: Option<Duration>,
}

impl LinkOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the dial itself.
    pub fn connect_timeout(mut self, limit: Duration) -> Self {
        self.connect_timeout = Some(limit);
        self
    }

    /// Bound every send on the resulting link.
    pub fn send_timeout(mut self, limit: Duration) -> Self {
        self.send_timeout = Some(limit);
        self
    }

    /// Bound every receive on the resulting link.
    pub fn receive_timeout(mut self, limit: Duration) -> Self {
        self.receive_timeout = Some(limit);
        self
    }
}

/// One framed session with a peer.
pub struct Link {
    reader: FrameReader,
    writer: FrameWriter,
}

impl Link {
    /// Dial an endpoint with no time limits.
    pub async fn dial(endpoint: &Endpoint) -> Result<Self> {
        Self::dial_with(endpoint, LinkOptions::new()).await
    }

    /// Dial an endpoint under the given options.
    pub async fn dial_with(endpoint: &Endpoint, options: LinkOptions) -> Result<Self> {
        let limit = options.connect_timeout;
        match endpoint {
            Endpoint::Tcp(addr) => {
                let stream = maybe_timeout(limit, "connect", async {
                    TcpStream::connect(addr).await.map_err(Into::into)
                })
                .await?;
                let (read, write) = stream.into_split();
                Ok(Self::from_halves(read, write, &options))
            }
            Endpoint::Unix(path) => {
                let stream = maybe_timeout(limit, "connect", async {
                    UnixStream::connect(path).await.map_err(Into::into)
                })
                .await?;
                let (read, write) = stream.into_split();
                Ok(Self::from_halves(read, write, &options))
            }
        }
    }

    fn from_halves(
        read: impl AsyncRead + Send + Unpin + 'static,
        write: impl AsyncWrite + Send + Unpin + 'static,
        options: &LinkOptions,
    ) -> Self {
        Self {
            reader: FrameReader {
                inner: Box::new(read),
                timeout: options.receive_timeout,
            },
            writer: FrameWriter {
                inner: Box::new(write),
                timeout: options.send_timeout,
            },
        }
    }

    /// Send one frame.
    pub async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.send(bytes).await
    }

    /// Receive one frame.
    pub async fn receive(&mut self) -> Result<Vec<u8>> {
        self.reader.receive().await
    }

    /// Split into halves that may live on different tasks.
    ///
    /// The halves keep the link's receive/send limits, so one task can
    /// receive while another sends.
    pub fn split(self) -> (FrameReader, FrameWriter) {
        (self.reader, self.writer)
    }

    /// Shut down the sending direction.
    pub async fn close(&mut self) -> Result<()> {
        self.writer.close().await
    }
}

/// Receiving half of a split link.
pub struct FrameReader {
    inner: Box<dyn AsyncRead + Send + Unpin>,
    timeout: Option<Duration>,
}

impl FrameReader {
    /// Receive one frame.
    pub async fn receive(&mut self) -> Result<Vec<u8>> {
        maybe_timeout(self.timeout, "receive", read_frame(&mut self.inner)).await
    }
}

/// Sending half of a split link.
pub struct FrameWriter {
    inner: Box<dyn AsyncWrite + Send + Unpin>,
    timeout: Option<Duration>,
}

impl FrameWriter {
    /// Send one frame.
    pub async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        maybe_timeout(self.timeout, "send", write_frame(&mut self.inner, bytes)).await
    }

    /// Shut down the sending direction.
    pub async fn close(&mut self) -> Result<()> {
        self.inner.shutdown().await?;
        Ok(())
    }
}

/// Accepts incoming links on a bound endpoint.
///
/// Binding a Unix endpoint replaces a stale socket file left by an earlier
/// run; the file is removed again when the listener drops.
pub struct Listener {
    inner: ListenerInner,
}

enum ListenerInner {
    Tcp(TcpListener),
    Unix { listener: UnixListener, path: PathBuf },
}

impl Listener {
    /// Bind to an endpoint.
    pub async fn bind(endpoint: &Endpoint) -> Result<Self> {
        let inner = match endpoint {
            Endpoint::Tcp(addr) => ListenerInner::Tcp(TcpListener::bind(addr).await?),
            Endpoint::Unix(path) => {
                if path.exists() {
                    std::fs::remove_file(path)?;
                }
                ListenerInner::Unix {
                    listener: UnixListener::bind(path)?,
                    path: path.clone(),
                }
            }
        };
        Ok(Self { inner })
    }

    /// The endpoint this listener is actually bound to.
    ///
    /// For TCP this reflects the assigned port when binding to port 0.
    pub fn local_endpoint(&self) -> Result<Endpoint> {
        match &self.inner {
            ListenerInner::Tcp(listener) => Ok(Endpoint::Tcp(listener.local_addr()?)),
            ListenerInner::Unix { path, .. } => Ok(Endpoint::Unix(path.clone())),
        }
    }

    /// Accept one incoming link, with no time limits on its frames.
    pub async fn accept(&self) -> Result<Link> {
        let options = LinkOptions::new();
        match &self.inner {
            ListenerInner::Tcp(listener) => {
                let (stream, _) = listener.accept().await?;
                let (read, write) = stream.into_split();
                Ok(Link::from_halves(read, write, &options))
            }
            ListenerInner::Unix { listener, .. } => {
                let (stream, _) = listener.accept().await?;
                let (read, write) = stream.into_split();
                Ok(Link::from_halves(read, write, &options))
            }
        }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        if let ListenerInner::Unix { path, .. } = &self.inner {
            let _ = std::fs::remove_file(path);
        }
    }
}
