//! Messages sent from input threads to the render loop.
//!
//! Each variant mutates exactly one piece of render-loop state. Adding a
//! command means adding a variant here and one arm where the render loop
//! applies it.

use graph_model::{BufferDepth, PresentMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    Stop,
    SetVsync(bool),
    SetPresentMode(PresentMode),
    SetBufferDepth(BufferDepth),
    SetScroll(bool),
    SetWindowSize(u32),
    ToggleVsync,
    TogglePresentMode,
    ToggleBufferDepth,
    ToggleScroll,
    ZoomIn,
    ZoomOut,
    /// The window's drawable size changed; the surface must be reconfigured
    /// by the thread that owns it.
    ResizeSurface { width: u32, height: u32 },
}

/// What the render loop does after applying a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Stop,
}

impl LoopControl {
    /// `Stop` is sticky across a batch.
    pub fn merge(self, other: Self) -> Self {
        match (self, other) {
            (Self::Continue, Self::Continue) => Self::Continue,
            _ => Self::Stop,
        }
    }
}
