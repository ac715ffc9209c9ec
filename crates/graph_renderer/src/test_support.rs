//! Test doubles for the presentation seams.

use std::cell::RefCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::{CompletionQueue, PresentTarget};

/// Counts how many times it was presented.
#[derive(Debug)]
pub(crate) struct CountedFrame(pub(crate) Arc<AtomicU32>);

impl PresentTarget for CountedFrame {
    fn present(self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Holds completion callbacks until `complete_all`.
#[derive(Default)]
pub(crate) struct DeferredQueue {
    pub(crate) callbacks: RefCell<Vec<Box<dyn FnOnce() + Send>>>,
}

impl DeferredQueue {
    pub(crate) fn complete_all(&self) {
        let callbacks: Vec<_> = self.callbacks.borrow_mut().drain(..).collect();
        for callback in callbacks {
            callback();
        }
    }
}

impl CompletionQueue for DeferredQueue {
    fn on_submitted_work_done(&self, callback: impl FnOnce() + Send + 'static) {
        self.callbacks.borrow_mut().push(Box::new(callback));
    }
}
