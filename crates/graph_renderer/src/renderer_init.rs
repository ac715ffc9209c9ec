//! Renderer initialization and GPU resource construction.

use std::sync::Arc;
use std::time::Instant;

use graph_model::SampleRing;

use crate::{
    FrameState, GpuState, GraphPipeline, GraphRenderer, GraphSettings, GraphState,
    MsaaTargetManager, MsaaTextureAllocator, PresentDispatcher, RenderError,
    SurfacePolicyTracker, SurfaceSize,
};

impl GraphRenderer {
    /// Builds the pipeline and buffers for `surface_config.format`. The
    /// surface itself is configured on the first frame, once the presentation
    /// policy is known. `surface_size` tracks the window's drawable size and
    /// is consulted when the surface reports itself outdated.
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface: wgpu::Surface<'static>,
        surface_config: wgpu::SurfaceConfiguration,
        surface_size: SurfaceSize,
        present_modes: Vec<wgpu::PresentMode>,
        sample_count: u32,
        settings: GraphSettings,
    ) -> Result<Self, RenderError> {
        let (device_lost_sender, device_lost) = crossbeam_channel::unbounded();
        device.set_device_lost_callback(move |reason, message| {
            let _ = device_lost_sender.send((reason, message));
        });

        let (uncaptured_error_sender, device_errors) = crossbeam_channel::unbounded();
        device.on_uncaptured_error(Arc::new(move |error| {
            let _ = uncaptured_error_sender.send(error.to_string());
        }));

        let ring = SampleRing::new(settings.ring_capacity);
        let error_scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = GraphPipeline::new(
            &device,
            surface_config.format,
            sample_count,
            settings.ring_capacity,
        );
        if let Some(error) = pollster::block_on(error_scope.pop()) {
            return Err(RenderError::Pipeline(error.to_string()));
        }

        let msaa = (sample_count > 1).then(|| {
            MsaaTargetManager::new(MsaaTextureAllocator::new(
                device.clone(),
                surface_config.format,
                sample_count,
            ))
        });
        log::info!(
            "[renderer] ring {} slots, {}x{} {:?}, msaa x{sample_count}",
            ring.capacity(),
            surface_config.width,
            surface_config.height,
            surface_config.format
        );

        Ok(Self {
            gpu_state: GpuState {
                device,
                queue,
                surface,
                surface_config,
                surface_size,
                device_errors,
                device_lost,
            },
            graph_state: GraphState {
                ring,
                pipeline,
                settings,
            },
            frame_state: FrameState {
                msaa,
                surface_policy: SurfacePolicyTracker::new(present_modes),
                presents: PresentDispatcher::new(),
                clock_origin: Instant::now(),
            },
        })
    }
}
