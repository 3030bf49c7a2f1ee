//! Connections: transport session ownership and response demultiplexing.
//!
//! A [`Connection`] owns the framed link to one endpoint and runs two
//! tasks on the tokio runtime: a writer draining the outbound queue, and a
//! reader decoding response envelopes and resolving them against the
//! pending-call registry. Only the reader touches the receive side, so
//! incoming frames are routed exactly once.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use zenith_core::{SchemaRegistry, Status};
use zenith_wire::codec;
use zenith_wire::{Endpoint, FrameReader, FrameWriter, Link, LinkOptions};

use crate::call::{CallCore, Outcome};
use crate::channel::ConnectionChannel;
use crate::error::Result;
use crate::owned::OwnedVec;
use crate::protocol::CallResponse;

/// Registry of calls dispatched on a connection but not yet resolved.
///
/// The registry owns its bookkeeping entries; each entry holds only a weak
/// reference to the call core, so the caller remains the sole owner of the
/// handle and abandoning one cannot leak a registration forever.
pub(crate) struct PendingCalls {
    entries: Mutex<OwnedVec<PendingEntry>>,
}

struct PendingEntry {
    id: u64,
    core: Weak<CallCore>,
}

impl PendingCalls {
    fn new() -> Self {
        Self {
            entries: Mutex::new(OwnedVec::new()),
        }
    }

    /// Add an entry for a dispatched call, pruning entries whose handles
    /// were dropped by their callers.
    pub(crate) fn register(&self, id: u64, core: Weak<CallCore>) {
        let mut entries = self.entries.lock();
        let mut index = entries.len();
        while index > 0 {
            index -= 1;
            let dead = entries
                .at(index)
                .map(|entry| entry.core.strong_count() == 0)
                .unwrap_or(false);
            if dead {
                entries.remove_at(index);
            }
        }
        entries.append(Box::new(PendingEntry { id, core }));
    }

    /// Withdraw a registration that will never be resolved.
    pub(crate) fn withdraw(&self, id: u64) {
        let mut entries = self.entries.lock();
        if let Some(index) = position_of(&entries, id) {
            entries.remove_at(index);
        }
    }

    /// Route a response envelope to its call and complete it.
    fn resolve(&self, response: CallResponse) {
        let core = {
            let mut entries = self.entries.lock();
            match position_of(&entries, response.id) {
                Some(index) => {
                    let core = entries.at(index).and_then(|entry| entry.core.upgrade());
                    entries.remove_at(index);
                    core
                }
                None => None,
            }
        };

        match core {
            // Completion runs outside the registry lock.
            Some(core) => core.complete(outcome_of(response)),
            None => debug!(id = response.id, "response for unknown or abandoned call"),
        }
    }

    /// Complete every pending call with `status` and drain the registry.
    pub(crate) fn fail_all(&self, status: Status, message: &str) {
        let cores: Vec<Arc<CallCore>> = {
            let mut entries = self.entries.lock();
            let cores = entries
                .iter()
                .filter_map(|entry| entry.core.upgrade())
                .collect();
            entries.truncate(0);
            cores
        };
        for core in cores {
            core.complete(Outcome::failure(status, message));
        }
    }
}

fn position_of(entries: &OwnedVec<PendingEntry>, id: u64) -> Option<usize> {
    (0..entries.len()).find(|&index| entries.at(index).map(|entry| entry.id) == Some(id))
}

fn outcome_of(response: CallResponse) -> Outcome {
    match response.status {
        Status::Ok => match response.payload {
            Some(payload) => Outcome::ok(payload),
            // An ok response without a payload breaks the envelope contract.
            None => Outcome::failure(Status::ConnectionError, "response payload missing"),
        },
        Status::ApplicationError => Outcome::application_error(
            response.application_error.unwrap_or(0),
            response.error_message.unwrap_or_default(),
        ),
        status => Outcome::failure(status, response.error_message.unwrap_or_default()),
    }
}

/// State shared between a connection, its channels, and its I/O tasks.
pub(crate) struct ConnectionShared {
    pub(crate) outbound: mpsc::UnboundedSender<Vec<u8>>,
    pub(crate) pending: PendingCalls,
    next_call_id: AtomicU64,
}

impl ConnectionShared {
    pub(crate) fn next_call_id(&self) -> u64 {
        self.next_call_id.fetch_add(1, Ordering::Relaxed)
    }
}

/// Transport session to one endpoint; manufactures channels bound to it.
///
/// Dropping (or [`Connection::close`]) tears both I/O tasks down and fails
/// anything still pending, so no waiter is left hanging.
pub struct Connection {
    shared: Arc<ConnectionShared>,
    reader_task: JoinHandle<()>,
    writer_task: JoinHandle<()>,
}

impl Connection {
    /// Connect to an endpoint with no connect timeout.
    pub async fn connect(endpoint: &Endpoint) -> Result<Self> {
        Self::connect_inner(endpoint, None).await
    }

    /// Connect with a connect timeout.
    pub async fn connect_timeout(endpoint: &Endpoint, timeout: Duration) -> Result<Self> {
        Self::connect_inner(endpoint, Some(timeout)).await
    }

    async fn connect_inner(endpoint: &Endpoint, timeout: Option<Duration>) -> Result<Self> {
        let mut options = LinkOptions::new();
        if let Some(limit) = timeout {
            options = options.connect_timeout(limit);
        }
        let (reader, writer) = Link::dial_with(endpoint, options).await?.split();

        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(ConnectionShared {
            outbound,
            pending: PendingCalls::new(),
            next_call_id: AtomicU64::new(1),
        });

        let reader_task = tokio::spawn(run_reader(reader, shared.clone()));
        let writer_task = tokio::spawn(run_writer(writer, outbound_rx, shared.clone()));

        debug!(%endpoint, "connection established");
        Ok(Self {
            shared,
            reader_task,
            writer_task,
        })
    }

    /// Create a dispatch channel bound to this connection.
    ///
    /// Channels are cheap handles over the connection's shared state; the
    /// binding is fixed at construction.
    pub fn create_channel(&self, schema: Arc<SchemaRegistry>) -> ConnectionChannel {
        ConnectionChannel::new(self.shared.clone(), schema)
    }

    /// Tear the connection down and fail anything still pending.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.reader_task.abort();
        self.writer_task.abort();
        self.shared
            .pending
            .fail_all(Status::ConnectionError, "connection closed");
    }
}

/// Demux loop: decode response envelopes and resolve them.
async fn run_reader(mut reader: FrameReader, shared: Arc<ConnectionShared>) {
    loop {
        match reader.receive().await {
            Ok(bytes) => match codec::decode::<CallResponse>(&bytes) {
                Ok(response) => shared.pending.resolve(response),
                // Frame boundaries are intact, so the stream stays usable.
                Err(e) => warn!(error = %e, "skipping undecodable response envelope"),
            },
            Err(e) => {
                debug!(error = %e, "receive side closed, failing pending calls");
                shared
                    .pending
                    .fail_all(Status::ConnectionError, &e.to_string());
                return;
            }
        }
    }
}

/// Drain the outbound queue onto the transport.
async fn run_writer(
    mut writer: FrameWriter,
    mut outbound: mpsc::UnboundedReceiver<Vec<u8>>,
    shared: Arc<ConnectionShared>,
) {
    while let Some(bytes) = outbound.recv().await {
        if let Err(e) = writer.send(&bytes).await {
            warn!(error = %e, "send side failed, failing pending calls");
            shared
                .pending
                .fail_all(Status::ConnectionError, &e.to_string());
            return;
        }
    }
    let _ = writer.close().await;
}
