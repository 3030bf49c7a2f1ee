//! The dispatch contract and its connection-backed implementation.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use zenith_core::{MethodDescriptor, SchemaRegistry, Status};
use zenith_wire::codec;

use crate::call::{Call, Outcome};
use crate::completion::Completion;
use crate::connection::ConnectionShared;
use crate::protocol::CallRequest;

/// Abstract dispatch entry point every transport binding implements.
///
/// Dispatch never blocks on network I/O and never reports failures through a
/// return value: anything discovered synchronously (unresolvable method,
/// shape mismatch, closed connection) drives the call handle straight to a
/// terminal state, and the completion still fires. One channel instance
/// serves any number of concurrent calls.
///
/// Implementations hand completed work back from the connection's I/O
/// context, so dispatch must happen inside a tokio runtime.
pub trait Channel: Send + Sync {
    /// Dispatch one call to an already-resolved method.
    fn call_method(
        &self,
        method: &MethodDescriptor,
        call: &Call,
        request: &Value,
        completion: Option<Completion>,
    );

    /// Dispatch by `(service, method)` name pair.
    ///
    /// For callers that cannot carry resolved descriptors. The pair is
    /// resolved against the channel's schema and forwarded to the same path
    /// as [`Channel::call_method`]; resolution failure completes the call
    /// with `UnknownMethod` without touching the transport.
    fn call_raw(
        &self,
        service: &str,
        method: &str,
        call: &Call,
        request: &Value,
        completion: Option<Completion>,
    );
}

/// Typed convenience over [`Channel`].
pub trait ChannelExt: Channel {
    /// Serialize a typed request value and dispatch it.
    fn call_typed<Req: Serialize>(
        &self,
        method: &MethodDescriptor,
        call: &Call,
        request: &Req,
        completion: Option<Completion>,
    ) {
        match serde_json::to_value(request) {
            Ok(value) => self.call_method(method, call, &value, completion),
            Err(e) => reject(
                call,
                completion,
                Outcome::failure(Status::InvalidRequest, e.to_string()),
            ),
        }
    }
}

impl<C: Channel + ?Sized> ChannelExt for C {}

/// [`Channel`] bound to one [`Connection`](crate::Connection).
pub struct ConnectionChannel {
    shared: Arc<ConnectionShared>,
    schema: Arc<SchemaRegistry>,
}

impl ConnectionChannel {
    pub(crate) fn new(shared: Arc<ConnectionShared>, schema: Arc<SchemaRegistry>) -> Self {
        Self { shared, schema }
    }

    fn dispatch(
        &self,
        method: &MethodDescriptor,
        call: &Call,
        request: &Value,
        completion: Option<Completion>,
    ) {
        if !call.begin_dispatch(completion) {
            warn!(method = %method.full_name(), "call handle already used, ignoring dispatch");
            return;
        }

        if let Err(e) = method.input().validate(request) {
            call.complete_with(Outcome::failure(Status::InvalidRequest, e.to_string()));
            return;
        }

        let payload = match serde_json::to_vec(request) {
            Ok(payload) => payload,
            Err(e) => {
                call.complete_with(Outcome::failure(Status::InvalidRequest, e.to_string()));
                return;
            }
        };

        let id = self.shared.next_call_id();
        let envelope = CallRequest {
            id,
            service: method.service().to_string(),
            method: method.name().to_string(),
            payload,
        };
        let bytes = match codec::encode(&envelope) {
            Ok(bytes) => bytes,
            Err(e) => {
                call.complete_with(Outcome::failure(Status::InvalidRequest, e.to_string()));
                return;
            }
        };

        // Register before enqueueing so the response can never outrun its
        // waiter.
        self.shared
            .pending
            .register(id, Arc::downgrade(call.core_ref()));

        if self.shared.outbound.send(bytes).is_err() {
            self.shared.pending.withdraw(id);
            call.complete_with(Outcome::failure(Status::ConnectionError, "connection closed"));
            return;
        }

        if let Some(deadline) = call.deadline() {
            // The timer holds a weak reference only; an abandoned handle
            // does not keep ticking work alive past its drop.
            let core = Arc::downgrade(call.core_ref());
            tokio::spawn(async move {
                tokio::time::sleep(deadline).await;
                if let Some(core) = core.upgrade() {
                    core.complete(Outcome::failure(
                        Status::DeadlineExceeded,
                        "deadline exceeded",
                    ));
                }
            });
        }
    }
}

impl Channel for ConnectionChannel {
    fn call_method(
        &self,
        method: &MethodDescriptor,
        call: &Call,
        request: &Value,
        completion: Option<Completion>,
    ) {
        self.dispatch(method, call, request, completion);
    }

    fn call_raw(
        &self,
        service: &str,
        method: &str,
        call: &Call,
        request: &Value,
        completion: Option<Completion>,
    ) {
        match self.schema.resolve(service, method) {
            Some(descriptor) => self.dispatch(descriptor, call, request, completion),
            None => reject(
                call,
                completion,
                Outcome::failure(
                    Status::UnknownMethod,
                    format!("no method {service}.{method} in schema"),
                ),
            ),
        }
    }
}

/// Complete a call that failed before reaching the dispatch path proper.
fn reject(call: &Call, completion: Option<Completion>, outcome: Outcome) {
    if call.begin_dispatch(completion) {
        call.complete_with(outcome);
    } else {
        warn!("call handle already used, ignoring dispatch");
    }
}
