//! Dedicated render-loop thread.
//!
//! The loop drains the control mailbox, applies the batch to the
//! presentation config it owns, and renders one frame, as fast as surface
//! acquisition allows, until a `Stop` message arrives.

use std::thread::{self, JoinHandle};

use control_protocol::ControlMessage;
use graph_model::PresentationConfig;
use mailbox::{MailboxSender, control_mailbox};

mod apply;
mod driver;

pub use apply::apply_message;
pub use driver::{LoopDriver, LoopSummary};

const RENDER_THREAD_NAME: &str = "render thread";
const MAILBOX_CAPACITY: usize = 64;

/// Work done by one render-loop iteration after messages are applied.
pub trait FrameRenderer {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Records the new drawable size. Takes effect on the next frame.
    fn resize_surface(&mut self, width: u32, height: u32);

    fn render_frame(&mut self, config: &PresentationConfig) -> Result<(), Self::Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum RenderLoopError {
    #[error("failed to spawn render thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("frame {frame} failed: {source}")]
    Frame {
        frame: u64,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("render thread panicked")]
    Panicked,
}

/// Handle to a running render loop.
pub struct RenderLoop {
    sender: MailboxSender,
    thread: Option<JoinHandle<Result<LoopSummary, RenderLoopError>>>,
}

impl RenderLoop {
    pub fn start<R>(renderer: R, config: PresentationConfig) -> Result<Self, RenderLoopError>
    where
        R: FrameRenderer + Send + 'static,
    {
        let (sender, receiver) = control_mailbox(MAILBOX_CAPACITY);
        let thread = thread::Builder::new()
            .name(RENDER_THREAD_NAME.to_owned())
            .spawn(move || {
                let mut driver = LoopDriver::new(receiver, renderer, config);
                log::info!("[render_loop] started");
                match driver.run() {
                    Ok(summary) => {
                        log::info!(
                            "[render_loop] stopped after {} frames, {} messages",
                            summary.frames_rendered,
                            summary.messages_applied
                        );
                        Ok(summary)
                    }
                    Err(error) => {
                        let frame = driver.summary().frames_rendered;
                        log::error!("[render_loop] frame {frame} failed: {error}");
                        Err(RenderLoopError::Frame {
                            frame,
                            source: Box::new(error),
                        })
                    }
                }
            })?;
        Ok(Self {
            sender,
            thread: Some(thread),
        })
    }

    pub fn post_message(&self, message: ControlMessage) {
        self.sender.post(message);
    }

    /// True once the render thread has exited, either after `Stop` or
    /// because a frame failed.
    pub fn is_finished(&self) -> bool {
        self.thread
            .as_ref()
            .is_none_or(|thread| thread.is_finished())
    }

    /// Posts `Stop` and blocks until the render thread exits.
    pub fn stop(mut self) -> Result<LoopSummary, RenderLoopError> {
        self.stop_and_join()
    }

    fn stop_and_join(&mut self) -> Result<LoopSummary, RenderLoopError> {
        let Some(thread) = self.thread.take() else {
            return Ok(LoopSummary::default());
        };
        self.sender.post(ControlMessage::Stop);
        thread.join().map_err(|_| RenderLoopError::Panicked)?
    }
}

impl Drop for RenderLoop {
    fn drop(&mut self) {
        if let Err(error) = self.stop_and_join() {
            log::error!("[render_loop] {error}");
        }
    }
}

impl std::fmt::Debug for RenderLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderLoop")
            .field("finished", &self.is_finished())
            .finish()
    }
}
