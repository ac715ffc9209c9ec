//! Renderer crate root.
//!
//! `GraphRenderer` owns the device, the surface and every GPU resource the
//! latency graph needs. It lives on the render thread after construction.
//!
//! Internal architecture overview:
//! - `renderer_init`: constructs GPU resources and installs device callbacks.
//! - `renderer_frame`: one timed acquisition, record, draw and present.
//! - `frame_cycle`: settle, prepare and timed acquisition behind `FrameSource`.
//! - `pipeline`: bar pipeline, ring storage buffer, uniform and index buffer.
//! - `msaa`/`surface_policy`/`present`/`geometry`: domain logic shared by
//!   the frame pipeline.

use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use graph_model::SampleRing;

mod frame_cycle;
mod geometry;
mod msaa;
mod pipeline;
mod present;
mod renderer_frame;
mod renderer_init;
mod surface_policy;
#[cfg(test)]
mod test_support;

pub use frame_cycle::{AcquiredFrame, FrameSource, acquire_and_record, latency_ns};
pub use geometry::{DrawBatch, MAX_QUADS, QUADS_PER_DRAW, draw_batches, quad_indices};
pub use msaa::{
    MsaaTarget, MsaaTargetManager, MsaaTextureAllocator, TargetAllocator, TargetExtent,
    max_supported_sample_count, detect_sample_count,
};
pub use pipeline::{GraphPipeline, PassTarget};
pub use present::{CompletionQueue, PresentDispatcher, PresentTarget};
pub use surface_policy::{SurfacePolicyTracker, SurfaceSize, select_present_mode};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("surface acquisition failed: {0}")]
    Acquire(#[from] wgpu::SurfaceError),
    #[error("msaa target {width}x{height} allocation failed: {message}")]
    TargetAllocation {
        width: u32,
        height: u32,
        message: String,
    },
    #[error("pipeline creation failed: {0}")]
    Pipeline(String),
    #[error("device error: {0}")]
    Device(String),
    #[error("device lost ({reason}): {message}")]
    DeviceLost { reason: String, message: String },
    #[error("device poll failed: {0}")]
    Poll(#[from] wgpu::PollError),
    #[error("scheduled present did not run within {0:?}")]
    PresentStalled(Duration),
    #[error("scheduled present channel closed")]
    PresentChannelClosed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphSettings {
    pub ring_capacity: u32,
    pub max_latency_ms: f32,
    /// Frames between latency summaries in the log. Zero disables them.
    pub stats_interval_frames: u64,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            ring_capacity: graph_model::DEFAULT_RING_CAPACITY,
            max_latency_ms: graph_model::DEFAULT_MAX_LATENCY_MS,
            stats_interval_frames: 0,
        }
    }
}

struct GpuState {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    surface_size: SurfaceSize,
    device_errors: Receiver<String>,
    device_lost: Receiver<(wgpu::DeviceLostReason, String)>,
}

struct GraphState {
    ring: SampleRing,
    pipeline: GraphPipeline,
    settings: GraphSettings,
}

struct FrameState {
    msaa: Option<MsaaTargetManager<MsaaTextureAllocator>>,
    surface_policy: SurfacePolicyTracker,
    presents: PresentDispatcher,
    clock_origin: Instant,
}

pub struct GraphRenderer {
    gpu_state: GpuState,
    graph_state: GraphState,
    frame_state: FrameState,
}

impl GraphRenderer {
    pub fn sample_count(&self) -> u32 {
        self.graph_state.pipeline.sample_count()
    }

    /// Stores the new drawable size; the surface is reconfigured before the
    /// next acquisition.
    pub fn resize_surface(&mut self, width: u32, height: u32) {
        self.frame_state.surface_policy.request_resize(width, height);
    }

    /// Fails with the first device-lost notice or uncaptured validation
    /// error reported since the previous check.
    fn check_device(&self) -> Result<(), RenderError> {
        if let Ok((reason, message)) = self.gpu_state.device_lost.try_recv() {
            return Err(RenderError::DeviceLost {
                reason: format!("{reason:?}"),
                message,
            });
        }
        if let Ok(message) = self.gpu_state.device_errors.try_recv() {
            return Err(RenderError::Device(message));
        }
        Ok(())
    }
}

impl std::fmt::Debug for GraphRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphRenderer")
            .field("frames", &self.graph_state.ring.frame_counter())
            .field("sample_count", &self.sample_count())
            .field("surface_policy", &self.frame_state.surface_policy.applied())
            .finish()
    }
}
