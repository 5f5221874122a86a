//! Shot handles and cancellation tokens

use cinemap_core::ShotOutcome;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

/// Cooperative cancellation flag shared between a shot and its callers.
///
/// The running loop checks the token at the top of every frame, so a
/// cancellation is observed on the next frame.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Rc<Cell<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

/// One-shot completion slot resolved by the engine
#[derive(Debug, Default)]
pub(crate) struct Completion {
    outcome: Cell<Option<ShotOutcome>>,
    waker: RefCell<Option<Waker>>,
}

impl Completion {
    /// Record the outcome. Only the first resolution counts.
    pub(crate) fn resolve(&self, outcome: ShotOutcome) -> bool {
        if self.outcome.get().is_some() {
            return false;
        }
        self.outcome.set(Some(outcome));
        if let Some(waker) = self.waker.borrow_mut().take() {
            waker.wake();
        }
        true
    }

    pub(crate) fn outcome(&self) -> Option<ShotOutcome> {
        self.outcome.get()
    }
}

/// Handle to a started shot.
///
/// Await it (it is a [`Future`]) or poll [`ShotHandle::outcome`] from a frame
/// loop. Dropping the handle does not stop the shot.
#[derive(Clone, Debug)]
pub struct ShotHandle {
    token: CancelToken,
    completion: Rc<Completion>,
}

impl ShotHandle {
    pub(crate) fn new(token: CancelToken, completion: Rc<Completion>) -> Self {
        Self { token, completion }
    }

    /// A handle that is already resolved, for shots rejected before they start
    pub(crate) fn resolved(outcome: ShotOutcome) -> Self {
        let completion = Rc::new(Completion::default());
        completion.resolve(outcome);
        Self {
            token: CancelToken::new(),
            completion,
        }
    }

    /// Request cancellation; the shot resolves `Cancelled` on its next frame
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    pub fn outcome(&self) -> Option<ShotOutcome> {
        self.completion.outcome()
    }

    pub fn is_finished(&self) -> bool {
        self.outcome().is_some()
    }
}

impl Future for ShotHandle {
    type Output = ShotOutcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<ShotOutcome> {
        match self.completion.outcome() {
            Some(outcome) => Poll::Ready(outcome),
            None => {
                *self.completion.waker.borrow_mut() = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_resolution_wins() {
        let completion = Rc::new(Completion::default());
        let handle = ShotHandle::new(CancelToken::new(), completion.clone());
        assert!(!handle.is_finished());

        assert!(completion.resolve(ShotOutcome::Completed));
        assert!(!completion.resolve(ShotOutcome::Cancelled));
        assert_eq!(handle.outcome(), Some(ShotOutcome::Completed));
    }

    #[test]
    fn test_cancel_sets_shared_token() {
        let handle = ShotHandle::new(CancelToken::new(), Rc::new(Completion::default()));
        let token = handle.token().clone();
        handle.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_resolved_handle() {
        let handle = ShotHandle::resolved(ShotOutcome::Cancelled);
        assert_eq!(handle.outcome(), Some(ShotOutcome::Cancelled));
    }
}
