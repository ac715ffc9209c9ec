//! Start of a frame: settle, prepare, timed acquisition, record.
//!
//! The timed interval covers only the acquisition. Waiting for the previous
//! frame's scheduled present and reconfiguring the surface both happen
//! before the clock starts, so Scheduled-mode samples never include the
//! wait for a deferred present.

use std::time::Duration;

use graph_model::{RecordedSample, SampleRing};

use crate::{PresentDispatcher, RenderError};

/// Where frames come from. Implemented over the wgpu surface by the
/// renderer.
pub trait FrameSource {
    type Frame;

    /// Blocks until submitted GPU work completes, running completion
    /// callbacks.
    fn wait_for_device(&mut self) -> Result<(), RenderError>;

    /// Pushes policy or size changes to the surface.
    fn prepare_surface(&mut self);

    fn acquire(&mut self) -> Result<Self::Frame, RenderError>;

    /// Monotonic time since an arbitrary origin.
    fn now(&self) -> Duration;
}

#[derive(Debug)]
pub struct AcquiredFrame<F> {
    pub frame: F,
    pub recorded: RecordedSample,
    pub latency_ns: f32,
}

/// Sample value stored for an acquisition that took `elapsed`.
pub fn latency_ns(elapsed: Duration) -> f32 {
    elapsed.as_nanos() as f32
}

pub fn acquire_and_record<S: FrameSource>(
    source: &mut S,
    presents: &mut PresentDispatcher,
    ring: &mut SampleRing,
) -> Result<AcquiredFrame<S::Frame>, RenderError> {
    presents.settle(|| source.wait_for_device())?;
    source.prepare_surface();

    let started = source.now();
    let frame = {
        let _span = tracing::trace_span!("next_drawable").entered();
        source.acquire()?
    };
    let latency_ns = latency_ns(source.now().saturating_sub(started));
    let recorded = ring.record(latency_ns);
    Ok(AcquiredFrame {
        frame,
        recorded,
        latency_ns,
    })
}
