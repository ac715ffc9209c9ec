//! Frame-presentation latency visualizer.
//!
//! The UI thread owns the window and forwards key presses and resizes as
//! control messages; the render thread times every drawable acquisition and
//! draws the history as a bar graph.

pub mod config;
pub mod gpu;
pub mod keymap;

use graph_model::PresentationConfig;
use graph_renderer::{GraphRenderer, RenderError};
use render_loop::FrameRenderer;

/// Adapts the GPU renderer to the render loop.
pub struct LoopRenderer(pub GraphRenderer);

impl FrameRenderer for LoopRenderer {
    type Error = RenderError;

    fn resize_surface(&mut self, width: u32, height: u32) {
        self.0.resize_surface(width, height);
    }

    fn render_frame(&mut self, config: &PresentationConfig) -> Result<(), RenderError> {
        self.0.render_frame(config)
    }
}
