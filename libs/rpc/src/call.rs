//! Call handles and their completion protocol.
//!
//! A [`Call`] is created by the caller, handed to a channel for dispatch,
//! and completed exactly once: by the connection's reader task when the
//! response arrives, by a deadline timer, by the caller via
//! [`Call::cancel`], or synchronously by dispatch-time validation. All of
//! those paths converge on [`CallCore::complete`], which performs the single
//! pending-to-terminal transition, wakes waiters, and fires the installed
//! completion hook.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Notify;
use zenith_core::Status;

use crate::completion::Completion;

/// Terminal record of a completed call.
#[derive(Debug, Clone)]
pub(crate) struct Outcome {
    pub status: Status,
    pub application_error: Option<i32>,
    pub error_message: Option<String>,
    pub response: Option<Vec<u8>>,
}

impl Outcome {
    pub fn ok(response: Vec<u8>) -> Self {
        Self {
            status: Status::Ok,
            application_error: None,
            error_message: None,
            response: Some(response),
        }
    }

    pub fn application_error(code: i32, message: impl Into<String>) -> Self {
        Self {
            status: Status::ApplicationError,
            application_error: Some(code),
            error_message: Some(message.into()),
            response: None,
        }
    }

    pub fn failure(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            application_error: None,
            error_message: Some(message.into()),
            response: None,
        }
    }
}

struct CallState {
    outcome: Option<Outcome>,
    completion: Option<Completion>,
    dispatched: bool,
    deadline: Option<Duration>,
}

/// State shared between the caller's handle and the framework side.
///
/// The framework (pending registry, deadline timers) only ever holds `Weak`
/// references to this; the caller's [`Call`] is the owner.
pub(crate) struct CallCore {
    state: Mutex<CallState>,
    done: Notify,
}

impl CallCore {
    fn new() -> Self {
        Self {
            state: Mutex::new(CallState {
                outcome: None,
                completion: None,
                dispatched: false,
                deadline: None,
            }),
            done: Notify::new(),
        }
    }

    /// Perform the pending-to-terminal transition.
    ///
    /// The first caller wins; later outcomes for the same call are dropped.
    /// The outcome is fully recorded under the lock before anyone is woken,
    /// so any task that observes "done" also observes the populated record.
    pub(crate) fn complete(&self, outcome: Outcome) {
        let completion = {
            let mut state = self.state.lock();
            if state.outcome.is_some() {
                return;
            }
            state.outcome = Some(outcome);
            state.completion.take()
        };
        self.done.notify_waiters();
        if let Some(completion) = completion {
            completion.run();
        }
    }

    pub(crate) fn is_done(&self) -> bool {
        self.state.lock().outcome.is_some()
    }
}

/// One in-flight or completed remote call.
///
/// Accessors return `None` until the call is terminal; afterwards they are
/// stable forever.
pub struct Call {
    core: Arc<CallCore>,
}

impl Call {
    pub fn new() -> Self {
        Self {
            core: Arc::new(CallCore::new()),
        }
    }

    /// Create a handle whose dispatch is bounded by `deadline`.
    pub fn with_deadline(deadline: Duration) -> Self {
        let call = Self::new();
        call.set_deadline(deadline);
        call
    }

    /// Bound the call's lifetime. Takes effect if set before dispatch.
    pub fn set_deadline(&self, deadline: Duration) {
        self.core.state.lock().deadline = Some(deadline);
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.core.state.lock().deadline
    }

    /// Wait until the call is terminal.
    ///
    /// Returns immediately if completion already happened; otherwise
    /// suspends this task until the terminal transition wakes it.
    pub async fn wait(&self) {
        let notified = self.core.done.notified();
        tokio::pin!(notified);
        loop {
            // Register with the notifier before re-checking, so a
            // notify_waiters between the check and the await is not lost.
            notified.as_mut().enable();
            if self.core.is_done() {
                return;
            }
            notified.as_mut().await;
            notified.set(self.core.done.notified());
        }
    }

    /// Request early termination.
    ///
    /// A pending call transitions to `Cancelled` and its completion fires; a
    /// terminal call is left untouched. Cancellation is local: the remote
    /// side may still execute the request, but this handle will not wait for
    /// it.
    pub fn cancel(&self) {
        self.core
            .complete(Outcome::failure(Status::Cancelled, "cancelled by caller"));
    }

    pub fn is_done(&self) -> bool {
        self.core.is_done()
    }

    /// Terminal status, or `None` while pending.
    pub fn status(&self) -> Option<Status> {
        self.core.state.lock().outcome.as_ref().map(|o| o.status)
    }

    /// Application-level error code; set only under `ApplicationError`.
    pub fn application_error(&self) -> Option<i32> {
        self.core
            .state
            .lock()
            .outcome
            .as_ref()
            .and_then(|o| o.application_error)
    }

    /// Human-readable error message for a failed call.
    pub fn error_message(&self) -> Option<String> {
        self.core
            .state
            .lock()
            .outcome
            .as_ref()
            .and_then(|o| o.error_message.clone())
    }

    /// Raw response payload; populated iff the status is `Ok`.
    pub fn response_bytes(&self) -> Option<Vec<u8>> {
        self.core
            .state
            .lock()
            .outcome
            .as_ref()
            .and_then(|o| o.response.clone())
    }

    /// Response payload decoded as a JSON value.
    pub fn response_value(&self) -> Option<Value> {
        self.response_bytes()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
    }

    /// Install the completion hook and mark the handle dispatched.
    ///
    /// Returns false if the handle was already dispatched or is already
    /// terminal; such a handle must not be dispatched again.
    pub(crate) fn begin_dispatch(&self, completion: Option<Completion>) -> bool {
        let mut state = self.core.state.lock();
        if state.dispatched || state.outcome.is_some() {
            return false;
        }
        state.dispatched = true;
        state.completion = completion;
        true
    }

    pub(crate) fn complete_with(&self, outcome: Outcome) {
        self.core.complete(outcome);
    }

    pub(crate) fn core_ref(&self) -> &Arc<CallCore> {
        &self.core
    }
}

impl Default for Call {
    fn default() -> Self {
        Self::new()
    }
}
