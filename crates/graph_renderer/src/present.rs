//! Presentation dispatch.
//!
//! Synchronous presentation hands the drawable back right after submit on
//! the render thread. Scheduled presentation registers a completion callback
//! that presents once the queue has finished the frame's work; the callback
//! owns only the drawable and a channel sender.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use graph_model::PresentMode;

use crate::RenderError;

/// Upper bound on waiting for an already-submitted frame to present.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

pub trait PresentTarget: Send + 'static {
    fn present(self);
}

impl PresentTarget for wgpu::SurfaceTexture {
    fn present(self) {
        wgpu::SurfaceTexture::present(self);
    }
}

pub trait CompletionQueue {
    fn on_submitted_work_done(&self, callback: impl FnOnce() + Send + 'static);
}

impl CompletionQueue for wgpu::Queue {
    fn on_submitted_work_done(&self, callback: impl FnOnce() + Send + 'static) {
        wgpu::Queue::on_submitted_work_done(self, callback);
    }
}

pub struct PresentDispatcher {
    completed_sender: Sender<()>,
    completed: Receiver<()>,
    in_flight: u32,
}

impl PresentDispatcher {
    pub fn new() -> Self {
        let (completed_sender, completed) = crossbeam_channel::unbounded();
        Self {
            completed_sender,
            completed,
            in_flight: 0,
        }
    }

    pub fn in_flight(&self) -> u32 {
        self.in_flight
    }

    pub fn dispatch<F: PresentTarget>(
        &mut self,
        queue: &impl CompletionQueue,
        frame: F,
        mode: PresentMode,
    ) {
        match mode {
            PresentMode::Synchronous => frame.present(),
            PresentMode::Scheduled => {
                let completed_sender = self.completed_sender.clone();
                queue.on_submitted_work_done(move || {
                    frame.present();
                    if let Err(error) = completed_sender.send(()) {
                        log::warn!("[renderer] scheduled present signal dropped: {error}");
                    }
                });
                self.in_flight += 1;
            }
        }
    }

    /// Waits until every scheduled presentation has run. `wait_for_device`
    /// blocks until submitted work completes, which fires the callbacks.
    pub fn settle(
        &mut self,
        mut wait_for_device: impl FnMut() -> Result<(), RenderError>,
    ) -> Result<(), RenderError> {
        while self.in_flight > 0 {
            match self.completed.try_recv() {
                Ok(()) => self.in_flight -= 1,
                Err(TryRecvError::Empty) => {
                    wait_for_device()?;
                    match self.completed.recv_timeout(SETTLE_TIMEOUT) {
                        Ok(()) => self.in_flight -= 1,
                        Err(RecvTimeoutError::Timeout) => {
                            return Err(RenderError::PresentStalled(SETTLE_TIMEOUT));
                        }
                        Err(RecvTimeoutError::Disconnected) => {
                            return Err(RenderError::PresentChannelClosed);
                        }
                    }
                }
                Err(TryRecvError::Disconnected) => return Err(RenderError::PresentChannelClosed),
            }
        }
        Ok(())
    }
}

impl Default for PresentDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::test_support::{CountedFrame, DeferredQueue};

    #[test]
    fn synchronous_presents_immediately() {
        let presented = Arc::new(AtomicU32::new(0));
        let queue = DeferredQueue::default();
        let mut dispatcher = PresentDispatcher::new();
        dispatcher.dispatch(
            &queue,
            CountedFrame(Arc::clone(&presented)),
            PresentMode::Synchronous,
        );
        assert_eq!(presented.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.in_flight(), 0);
        assert!(queue.callbacks.borrow().is_empty());
    }

    #[test]
    fn scheduled_presents_when_work_completes() {
        let presented = Arc::new(AtomicU32::new(0));
        let queue = DeferredQueue::default();
        let mut dispatcher = PresentDispatcher::new();
        dispatcher.dispatch(
            &queue,
            CountedFrame(Arc::clone(&presented)),
            PresentMode::Scheduled,
        );
        assert_eq!(presented.load(Ordering::SeqCst), 0);
        assert_eq!(dispatcher.in_flight(), 1);

        dispatcher
            .settle(|| {
                queue.complete_all();
                Ok(())
            })
            .expect("settle");
        assert_eq!(presented.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.in_flight(), 0);
    }

    #[test]
    fn settle_skips_waiting_when_callback_already_ran() {
        let presented = Arc::new(AtomicU32::new(0));
        let queue = DeferredQueue::default();
        let mut dispatcher = PresentDispatcher::new();
        dispatcher.dispatch(
            &queue,
            CountedFrame(Arc::clone(&presented)),
            PresentMode::Scheduled,
        );
        queue.complete_all();
        dispatcher
            .settle(|| panic!("device wait not needed"))
            .expect("settle");
        assert_eq!(presented.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn settle_propagates_device_failure() {
        let queue = DeferredQueue::default();
        let mut dispatcher = PresentDispatcher::new();
        dispatcher.dispatch(
            &queue,
            CountedFrame(Arc::new(AtomicU32::new(0))),
            PresentMode::Scheduled,
        );
        let result = dispatcher.settle(|| Err(RenderError::Device("lost".to_owned())));
        assert!(matches!(result, Err(RenderError::Device(_))));
    }
}
