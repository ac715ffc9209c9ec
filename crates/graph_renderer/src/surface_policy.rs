//! Maps vsync and buffer depth onto the surface configuration.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use graph_model::SurfacePolicy;

/// Latest drawable size, written by the thread that owns the window and read
/// by the render thread when the surface reports itself outdated. Resize
/// messages can still be queued in the mailbox at that point.
#[derive(Debug, Clone)]
pub struct SurfaceSize {
    packed: Arc<AtomicU64>,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            packed: Arc::new(AtomicU64::new(pack_size(width, height))),
        }
    }

    pub fn store(&self, width: u32, height: u32) {
        self.packed
            .store(pack_size(width, height), Ordering::Relaxed);
    }

    pub fn load(&self) -> (u32, u32) {
        let packed = self.packed.load(Ordering::Relaxed);
        ((packed >> 32) as u32, packed as u32)
    }
}

fn pack_size(width: u32, height: u32) -> u64 {
    (u64::from(width) << 32) | u64::from(height)
}

/// vsync waits for vertical blank through `Fifo`, which every surface
/// supports. Without vsync the first available of `Immediate` and `Mailbox`
/// wins, falling back to `AutoNoVsync`.
pub fn select_present_mode(vsync: bool, supported: &[wgpu::PresentMode]) -> wgpu::PresentMode {
    if vsync {
        return wgpu::PresentMode::Fifo;
    }
    [wgpu::PresentMode::Immediate, wgpu::PresentMode::Mailbox]
        .into_iter()
        .find(|mode| supported.contains(mode))
        .unwrap_or(wgpu::PresentMode::AutoNoVsync)
}

/// Tracks what the surface was last configured with so the policy is pushed
/// only when it changes.
#[derive(Debug)]
pub struct SurfacePolicyTracker {
    supported_modes: Vec<wgpu::PresentMode>,
    applied: Option<SurfacePolicy>,
    pending_resize: Option<(u32, u32)>,
}

impl SurfacePolicyTracker {
    pub fn new(supported_modes: Vec<wgpu::PresentMode>) -> Self {
        Self {
            supported_modes,
            applied: None,
            pending_resize: None,
        }
    }

    pub fn applied(&self) -> Option<SurfacePolicy> {
        self.applied
    }

    /// The newest size wins when several resizes arrive between frames.
    pub fn request_resize(&mut self, width: u32, height: u32) {
        self.pending_resize = Some((width.max(1), height.max(1)));
    }

    /// Adopts the window's current size after the surface reported itself
    /// outdated. Any resize still pending is older, so it is dropped.
    /// Returns true when the size in `surface_config` changed.
    pub fn sync_size(
        &mut self,
        latest: (u32, u32),
        surface_config: &mut wgpu::SurfaceConfiguration,
    ) -> bool {
        self.pending_resize = None;
        let latest = (latest.0.max(1), latest.1.max(1));
        if (surface_config.width, surface_config.height) == latest {
            return false;
        }
        (surface_config.width, surface_config.height) = latest;
        true
    }

    /// Writes any changed policy or pending size into `surface_config`.
    /// Returns true when the surface has to be reconfigured.
    pub fn update(
        &mut self,
        policy: SurfacePolicy,
        surface_config: &mut wgpu::SurfaceConfiguration,
    ) -> bool {
        let mut changed = false;
        if let Some((width, height)) = self.pending_resize.take()
            && (surface_config.width, surface_config.height) != (width, height)
        {
            surface_config.width = width;
            surface_config.height = height;
            changed = true;
        }
        if self.applied != Some(policy) {
            let present_mode = select_present_mode(policy.vsync, &self.supported_modes);
            let frame_latency = policy.buffer_depth.frame_latency();
            if self.applied.is_some() {
                log::info!(
                    "[renderer] surface policy: {present_mode:?}, {} images",
                    policy.buffer_depth.image_count()
                );
            }
            surface_config.present_mode = present_mode;
            surface_config.desired_maximum_frame_latency = frame_latency;
            self.applied = Some(policy);
            changed = true;
        }
        changed
    }
}
