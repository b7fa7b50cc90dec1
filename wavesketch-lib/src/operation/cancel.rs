//! Shared lifecycle state and the caller-facing cancel capability.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use log::debug;

/// Lifecycle of a [`super::SampleOperation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Created,
    Opened,
    Reading,
    Completed,
    Failed,
    Cancelled,
}

impl OperationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Created => 0,
            Self::Opened => 1,
            Self::Reading => 2,
            Self::Completed => 3,
            Self::Failed => 4,
            Self::Cancelled => 5,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Created,
            1 => Self::Opened,
            2 => Self::Reading,
            3 => Self::Completed,
            4 => Self::Failed,
            _ => Self::Cancelled,
        }
    }
}

/// State shared between an operation, its loop, and its cancellation handles.
#[derive(Debug)]
pub(super) struct OperationShared {
    state: AtomicU8,
    cancel_requested: AtomicBool,
}

impl OperationShared {
    pub(super) fn new() -> Arc<Self> {
        Arc::new(Self {
            state: AtomicU8::new(OperationState::Created.as_u8()),
            cancel_requested: AtomicBool::new(false),
        })
    }

    pub(super) fn state(&self) -> OperationState {
        OperationState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub(super) fn cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::SeqCst)
    }

    /// Move between non-terminal states. Fails if `from` is not current.
    pub(super) fn advance(&self, from: OperationState, to: OperationState) -> bool {
        debug_assert!(!to.is_terminal());
        self.swap(from, to)
    }

    /// Enter a terminal state from whatever non-terminal state is current.
    ///
    /// # Returns
    /// `false` if a terminal state was already reached.
    pub(super) fn terminate(&self, to: OperationState) -> bool {
        let mut current = self.state();
        while !current.is_terminal() {
            if self.swap(current, to) {
                debug!("operation {:?} -> {:?}", current, to);
                return true;
            }
            current = self.state();
        }
        false
    }

    fn swap(&self, from: OperationState, to: OperationState) -> bool {
        self.state
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

/// Idempotent cancel capability for one operation.
///
/// Safe to call from any thread, any number of times. Once the operation has
/// reached a terminal state, cancelling does nothing.
#[derive(Debug, Clone)]
pub struct CancellationHandle {
    shared: Arc<OperationShared>,
}

impl CancellationHandle {
    pub(super) fn new(shared: Arc<OperationShared>) -> Self {
        Self { shared }
    }

    /// Request cancellation. Observed before the loop's next iteration.
    pub fn cancel(&self) {
        if self.shared.state().is_terminal() {
            return;
        }
        if !self.shared.cancel_requested.swap(true, Ordering::SeqCst) {
            debug!("cancel requested in state {:?}", self.shared.state());
        }
    }

    /// Whether the operation ended by cancellation.
    pub fn is_cancelled(&self) -> bool {
        self.shared.state() == OperationState::Cancelled
    }

    pub fn state(&self) -> OperationState {
        self.shared.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_first_terminal_transition_wins() {
        let shared = OperationShared::new();
        assert!(shared.advance(OperationState::Created, OperationState::Opened));
        assert!(shared.terminate(OperationState::Completed));
        assert!(!shared.terminate(OperationState::Cancelled));
        assert_eq!(shared.state(), OperationState::Completed);
    }

    #[test]
    fn cancel_after_terminal_is_ignored() {
        let shared = OperationShared::new();
        let handle = CancellationHandle::new(shared.clone());
        shared.terminate(OperationState::Failed);
        handle.cancel();
        handle.cancel();
        assert!(!shared.cancel_requested());
        assert!(!handle.is_cancelled());
    }

    #[test]
    fn repeated_cancel_is_idempotent() {
        let shared = OperationShared::new();
        let handle = CancellationHandle::new(shared.clone());
        handle.cancel();
        handle.clone().cancel();
        assert!(shared.cancel_requested());
        assert_eq!(handle.state(), OperationState::Created);
    }
}
