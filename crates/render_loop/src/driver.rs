use control_protocol::{ControlMessage, LoopControl};
use graph_model::PresentationConfig;
use mailbox::MailboxReceiver;

use crate::FrameRenderer;
use crate::apply::apply_message;

/// Batch capacity reserved up front so steady-state drains never allocate.
const INITIAL_BATCH_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopSummary {
    pub frames_rendered: u64,
    pub messages_applied: u64,
}

/// Owns all render-loop state. Lives on the render thread; nothing else
/// reads or writes the config.
pub struct LoopDriver<R> {
    mailbox: MailboxReceiver,
    renderer: R,
    config: PresentationConfig,
    batch: Vec<ControlMessage>,
    summary: LoopSummary,
}

impl<R: FrameRenderer> LoopDriver<R> {
    pub fn new(mailbox: MailboxReceiver, renderer: R, config: PresentationConfig) -> Self {
        Self {
            mailbox,
            renderer,
            config,
            batch: Vec::with_capacity(INITIAL_BATCH_CAPACITY),
            summary: LoopSummary::default(),
        }
    }

    #[cfg(test)]
    pub fn config(&self) -> &PresentationConfig {
        &self.config
    }

    #[cfg(test)]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn summary(&self) -> LoopSummary {
        self.summary
    }

    /// Drains the mailbox once and applies the whole batch in order. A `Stop`
    /// does not cut the batch short; messages after it still apply.
    pub fn apply_pending(&mut self) -> LoopControl {
        self.mailbox.drain_into(&mut self.batch);
        let mut control = LoopControl::Continue;
        for message in self.batch.drain(..) {
            control = control.merge(apply_message(&mut self.config, &mut self.renderer, message));
            self.summary.messages_applied += 1;
        }
        control
    }

    /// One loop iteration: apply messages, then render a frame unless a
    /// `Stop` was observed.
    pub fn run_iteration(&mut self) -> Result<LoopControl, R::Error> {
        if self.apply_pending() == LoopControl::Stop {
            return Ok(LoopControl::Stop);
        }
        {
            // Temporaries created while rendering drop at the end of this scope.
            self.renderer.render_frame(&self.config)?;
        }
        self.summary.frames_rendered += 1;
        Ok(LoopControl::Continue)
    }

    pub fn run(&mut self) -> Result<LoopSummary, R::Error> {
        while self.run_iteration()? == LoopControl::Continue {}
        Ok(self.summary)
    }
}
