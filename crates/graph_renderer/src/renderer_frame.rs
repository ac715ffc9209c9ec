//! Frame pipeline.
//!
//! Each frame settles the previous scheduled present, pushes surface policy
//! changes, then times the drawable acquisition. The measured interval is
//! the frame's latency sample; it is recorded and mirrored to the GPU before
//! the graph is drawn, so every frame shows its own sample.

use std::time::{Duration, Instant};

use graph_model::{GraphUniform, LatencyStats, PresentationConfig, SurfacePolicy};

use crate::frame_cycle::{FrameSource, acquire_and_record};
use crate::{
    GpuState, GraphRenderer, PassTarget, RenderError, SurfacePolicyTracker, TargetExtent,
};

/// Reconfigurations attempted within one acquisition before an outdated or
/// lost surface is treated as fatal.
const MAX_SURFACE_RECONFIGURES: u32 = 3;

struct SurfaceFrameSource<'a> {
    gpu_state: &'a mut GpuState,
    surface_policy: &'a mut SurfacePolicyTracker,
    policy: SurfacePolicy,
    origin: Instant,
}

impl FrameSource for SurfaceFrameSource<'_> {
    type Frame = wgpu::SurfaceTexture;

    fn wait_for_device(&mut self) -> Result<(), RenderError> {
        self.gpu_state
            .device
            .poll(wgpu::PollType::wait_indefinitely())?;
        Ok(())
    }

    fn prepare_surface(&mut self) {
        let gpu_state = &mut *self.gpu_state;
        if self
            .surface_policy
            .update(self.policy, &mut gpu_state.surface_config)
        {
            gpu_state
                .surface
                .configure(&gpu_state.device, &gpu_state.surface_config);
        }
    }

    /// Outdated or lost surfaces are reconfigured at the window's latest size
    /// and retried inside the timed region; any other failure is fatal.
    fn acquire(&mut self) -> Result<wgpu::SurfaceTexture, RenderError> {
        let gpu_state = &mut *self.gpu_state;
        let mut reconfigures = 0;
        loop {
            match gpu_state.surface.get_current_texture() {
                Ok(frame) => return Ok(frame),
                Err(error @ (wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost))
                    if reconfigures < MAX_SURFACE_RECONFIGURES =>
                {
                    reconfigures += 1;
                    self.surface_policy
                        .sync_size(gpu_state.surface_size.load(), &mut gpu_state.surface_config);
                    log::debug!(
                        "[renderer] surface {error:?}, reconfiguring at {}x{}",
                        gpu_state.surface_config.width,
                        gpu_state.surface_config.height
                    );
                    gpu_state
                        .surface
                        .configure(&gpu_state.device, &gpu_state.surface_config);
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

impl GraphRenderer {
    pub fn render_frame(&mut self, config: &PresentationConfig) -> Result<(), RenderError> {
        let acquired = {
            let mut source = SurfaceFrameSource {
                gpu_state: &mut self.gpu_state,
                surface_policy: &mut self.frame_state.surface_policy,
                policy: config.surface_policy(),
                origin: self.frame_state.clock_origin,
            };
            acquire_and_record(
                &mut source,
                &mut self.frame_state.presents,
                &mut self.graph_state.ring,
            )?
        };
        let frame = acquired.frame;
        let recorded = acquired.recorded;

        let pipeline = &self.graph_state.pipeline;
        let queue = &self.gpu_state.queue;
        pipeline.write_sample(queue, recorded.slot, acquired.latency_ns);
        pipeline.write_uniform(
            queue,
            &GraphUniform::new(
                config,
                recorded,
                self.graph_state.ring.mask(),
                self.graph_state.settings.max_latency_ms,
            ),
        );

        let frame_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let extent = TargetExtent {
            width: frame.texture.width(),
            height: frame.texture.height(),
        };
        let mut encoder =
            self.gpu_state
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("renderer.frame_encoder"),
                });
        match self.frame_state.msaa.as_mut() {
            Some(msaa) => {
                let target = msaa.ensure_target(extent)?;
                pipeline.encode(
                    &mut encoder,
                    PassTarget {
                        view: target.view(),
                        resolve_target: Some(&frame_view),
                    },
                    config.window_size(),
                );
            }
            None => pipeline.encode(
                &mut encoder,
                PassTarget {
                    view: &frame_view,
                    resolve_target: None,
                },
                config.window_size(),
            ),
        }

        // Closed by the queue once the GPU has finished this frame's work.
        let render_span = tracing::trace_span!("render", frame = recorded.frame);
        queue.submit(Some(encoder.finish()));
        queue.on_submitted_work_done(move || drop(render_span));
        drop(frame_view);
        self.frame_state
            .presents
            .dispatch(queue, frame, config.present_mode);

        self.check_device()?;
        self.log_stats(config.window_size());
        Ok(())
    }

    fn log_stats(&self, window_size: u32) {
        let interval = self.graph_state.settings.stats_interval_frames;
        let frames = self.graph_state.ring.frame_counter();
        if interval == 0 || frames % interval != 0 {
            return;
        }
        if let Some(stats) = LatencyStats::over_window(&self.graph_state.ring, window_size) {
            log::info!(
                "[renderer] frame {frames}: acquire last {:.3} ms, min {:.3} ms, mean {:.3} ms, max {:.3} ms over {} frames",
                stats.last_ms,
                stats.min_ms,
                stats.mean_ms,
                stats.max_ms,
                stats.count
            );
        }
    }
}
