//! Observer trait for controller state transitions.
//!
//! Inject an [`Arc<dyn InteractionObserver>`] via
//! [`crate::session::InteractionController::with_observer`] to hear about each
//! step of a button press as it happens: a terminal spinner, a status bar or a
//! log line can all be driven from the same events without the controller
//! knowing how the host application renders them.
//!
//! # Example
//!
//! ```rust
//! use ats_resume::{InteractionObserver, InteractionState};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct Recorder(Mutex<Vec<InteractionState>>);
//!
//! impl InteractionObserver for Recorder {
//!     fn on_transition(&self, _from: InteractionState, to: InteractionState) {
//!         self.0.lock().unwrap().push(to);
//!     }
//! }
//!
//! let observer: Arc<dyn InteractionObserver> = Arc::new(Recorder::default());
//! observer.on_transition(InteractionState::Idle, InteractionState::Validating);
//! ```

use crate::prompts::AnalysisKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Where a button press currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionState {
    #[default]
    Idle,
    Validating,
    Rejected,
    Extracting,
    Invoking,
    Displaying,
}

impl fmt::Display for InteractionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InteractionState::Idle => "idle",
            InteractionState::Validating => "validating",
            InteractionState::Rejected => "rejected",
            InteractionState::Extracting => "extracting",
            InteractionState::Invoking => "invoking",
            InteractionState::Displaying => "displaying",
        };
        f.write_str(s)
    }
}

/// Receives controller events. All methods default to no-ops.
pub trait InteractionObserver: Send + Sync {
    /// A press of `kind` has started.
    fn on_press(&self, kind: AnalysisKind) {
        let _ = kind;
    }

    /// The controller moved from `from` to `to`.
    fn on_transition(&self, from: InteractionState, to: InteractionState) {
        let _ = (from, to);
    }

    /// A press ended with `error` and the controller is back to idle.
    fn on_error(&self, kind: AnalysisKind, error: &str) {
        let _ = (kind, error);
    }
}

/// An observer that ignores everything.
pub struct NoopObserver;

impl InteractionObserver for NoopObserver {}

/// Convenience alias matching the type stored in the controller.
pub type ObserverHandle = Arc<dyn InteractionObserver>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        presses: AtomicUsize,
        transitions: AtomicUsize,
        errors: AtomicUsize,
    }

    impl InteractionObserver for Counting {
        fn on_press(&self, _kind: AnalysisKind) {
            self.presses.fetch_add(1, Ordering::SeqCst);
        }

        fn on_transition(&self, _from: InteractionState, _to: InteractionState) {
            self.transitions.fetch_add(1, Ordering::SeqCst);
        }

        fn on_error(&self, _kind: AnalysisKind, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_observer_does_not_panic() {
        let o = NoopObserver;
        o.on_press(AnalysisKind::Match);
        o.on_transition(InteractionState::Idle, InteractionState::Validating);
        o.on_error(AnalysisKind::Match, "boom");
    }

    #[test]
    fn counting_observer_receives_events() {
        let o = Counting {
            presses: AtomicUsize::new(0),
            transitions: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
        };
        o.on_press(AnalysisKind::Analyze);
        o.on_transition(InteractionState::Idle, InteractionState::Validating);
        o.on_transition(InteractionState::Validating, InteractionState::Rejected);
        assert_eq!(o.presses.load(Ordering::SeqCst), 1);
        assert_eq!(o.transitions.load(Ordering::SeqCst), 2);
        assert_eq!(o.errors.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn state_display() {
        assert_eq!(InteractionState::Invoking.to_string(), "invoking");
        assert_eq!(InteractionState::default(), InteractionState::Idle);
    }
}
