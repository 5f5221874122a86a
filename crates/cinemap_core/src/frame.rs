//! Per-frame callback scheduling
//!
//! Mirrors the host's "call me before the next repaint" primitive. Engines
//! request one frame at a time and re-request from inside the callback, so a
//! loop runs exactly as long as it keeps asking.

use slotmap::{new_key_type, SlotMap};
use std::cell::RefCell;

new_key_type! {
    /// Handle to a pending frame callback
    pub struct FrameHandle;
}

/// Callback invoked with the frame timestamp in milliseconds
pub type FrameCallback = Box<dyn FnOnce(f64)>;

/// Host-provided frame scheduler.
///
/// Methods take `&self` so callbacks may schedule their follow-up frame while
/// the scheduler is dispatching.
pub trait FrameScheduler {
    /// Run `callback` on the next frame
    fn schedule_frame(&self, callback: FrameCallback) -> FrameHandle;

    /// Drop a pending callback. Unknown or already-run handles are ignored.
    fn cancel_frame(&self, handle: FrameHandle);
}

/// A scheduler driven by hand: nothing runs until [`ManualScheduler::run_frame`].
///
/// Used by headless hosts and tests. Callbacks run in the order they were
/// scheduled; callbacks scheduled during a frame run on the following frame.
pub struct ManualScheduler {
    pending: RefCell<SlotMap<FrameHandle, FrameCallback>>,
    order: RefCell<Vec<FrameHandle>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self {
            pending: RefCell::new(SlotMap::with_key()),
            order: RefCell::new(Vec::new()),
        }
    }

    /// Run every callback that was pending when the frame began.
    ///
    /// Returns the number of callbacks invoked.
    pub fn run_frame(&self, timestamp: f64) -> usize {
        let due = std::mem::take(&mut *self.order.borrow_mut());
        let mut ran = 0;
        for handle in due {
            // Take each callback only when its turn comes so a callback that
            // cancels a later one in the same frame is honoured.
            let callback = self.pending.borrow_mut().remove(handle);
            if let Some(callback) = callback {
                callback(timestamp);
                ran += 1;
            }
        }
        ran
    }

    /// Number of callbacks waiting for the next frame
    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.borrow().is_empty()
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScheduler for ManualScheduler {
    fn schedule_frame(&self, callback: FrameCallback) -> FrameHandle {
        let handle = self.pending.borrow_mut().insert(callback);
        self.order.borrow_mut().push(handle);
        handle
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        if self.pending.borrow_mut().remove(handle).is_some() {
            self.order.borrow_mut().retain(|h| *h != handle);
        } else {
            tracing::trace!("cancel_frame: handle already ran or was cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_callbacks_run_in_order() {
        let scheduler = ManualScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let log = log.clone();
            scheduler.schedule_frame(Box::new(move |_| log.borrow_mut().push(i)));
        }

        assert_eq!(scheduler.run_frame(0.0), 3);
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn test_rescheduling_lands_on_next_frame() {
        let scheduler = Rc::new(ManualScheduler::new());
        let count = Rc::new(Cell::new(0));

        let inner_count = count.clone();
        let inner_scheduler = scheduler.clone();
        scheduler.schedule_frame(Box::new(move |_| {
            inner_count.set(inner_count.get() + 1);
            let again = inner_count.clone();
            inner_scheduler.schedule_frame(Box::new(move |_| again.set(again.get() + 1)));
        }));

        scheduler.run_frame(0.0);
        assert_eq!(count.get(), 1);
        assert_eq!(scheduler.pending_count(), 1);

        scheduler.run_frame(16.0);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_cancel_frame() {
        let scheduler = ManualScheduler::new();
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        let handle = scheduler.schedule_frame(Box::new(move |_| flag.set(true)));

        scheduler.cancel_frame(handle);
        assert_eq!(scheduler.run_frame(0.0), 0);
        assert!(!fired.get());

        // Cancelling twice is harmless
        scheduler.cancel_frame(handle);
    }
}
