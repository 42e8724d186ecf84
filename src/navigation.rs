use std::sync::Arc;

use crate::checkout::PaymentOutcome;

/// Routing capability consumed by the flow; only "leave for the default
/// location" is used.
pub trait Navigator: Send + Sync {
    fn go_to_default(&self);
}

/// Decides what happens to the view at the edges of an upgrade attempt. The
/// controller invokes `resume` exactly once per terminal outcome and `leave`
/// when the user backs out (or when an attempt is rejected before a session
/// opens); whether either of those navigates is the continuation's choice,
/// not the controller's.
pub trait Continuation: Send + Sync {
    fn resume(&self, outcome: &PaymentOutcome);
    fn leave(&self);
}

/// Stock continuation: leaves through the navigator after a successful
/// payment, stays put on cancel and failure.
pub struct NavigateContinuation {
    navigator: Arc<dyn Navigator>,
}

impl NavigateContinuation {
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self { navigator }
    }
}

impl Continuation for NavigateContinuation {
    fn resume(&self, outcome: &PaymentOutcome) {
        if matches!(outcome, PaymentOutcome::Success { .. }) {
            self.navigator.go_to_default();
        }
    }

    fn leave(&self) {
        self.navigator.go_to_default();
    }
}

pub type CloseFn = Box<dyn Fn() + Send + Sync>;

/// Caller-supplied close callback expressed as a continuation: the callback
/// runs instead of any navigation.
pub struct ClosingContinuation {
    close: CloseFn,
}

impl ClosingContinuation {
    pub fn new(close: CloseFn) -> Self {
        Self { close }
    }
}

impl Continuation for ClosingContinuation {
    fn resume(&self, outcome: &PaymentOutcome) {
        if matches!(outcome, PaymentOutcome::Success { .. }) {
            (self.close)();
        }
    }

    fn leave(&self) {
        (self.close)();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Default)]
    struct CountingNavigator {
        visits: AtomicUsize,
    }

    impl Navigator for CountingNavigator {
        fn go_to_default(&self) {
            self.visits.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn navigate_continuation_leaves_only_on_success() {
        let navigator = Arc::new(CountingNavigator::default());
        let continuation = NavigateContinuation::new(navigator.clone());

        continuation.resume(&PaymentOutcome::Cancelled);
        continuation.resume(&PaymentOutcome::Failed {
            reason: "declined".to_string(),
        });
        assert_eq!(navigator.visits.load(Ordering::SeqCst), 0);

        continuation.resume(&PaymentOutcome::Success {
            payment_reference: "pay_1".to_string(),
        });
        assert_eq!(navigator.visits.load(Ordering::SeqCst), 1);

        continuation.leave();
        assert_eq!(navigator.visits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn closing_continuation_runs_the_callback() {
        let closed = Arc::new(AtomicUsize::new(0));
        let counter = closed.clone();
        let continuation = ClosingContinuation::new(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        continuation.resume(&PaymentOutcome::Cancelled);
        assert_eq!(closed.load(Ordering::SeqCst), 0);

        continuation.resume(&PaymentOutcome::Success {
            payment_reference: "pay_2".to_string(),
        });
        continuation.leave();
        assert_eq!(closed.load(Ordering::SeqCst), 2);
    }
}
