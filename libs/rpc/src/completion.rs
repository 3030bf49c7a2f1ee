use std::fmt;

/// One-shot hook run when a call reaches a terminal state.
///
/// The bound action runs on whichever execution context observes completion,
/// usually the connection's reader task, so it must not block. Running
/// consumes the value; a second invocation is unrepresentable.
pub struct Completion {
    action: Box<dyn FnOnce() + Send + 'static>,
}

impl Completion {
    pub fn new(action: impl FnOnce() + Send + 'static) -> Self {
        Self {
            action: Box::new(action),
        }
    }

    /// Invoke the bound action.
    pub fn run(self) {
        (self.action)();
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Completion")
    }
}
