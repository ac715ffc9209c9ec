//! Data model shared by the render loop and the renderer: the latency sample
//! ring, the presentation policy and the uniform the bar shader reads.

pub mod config;
pub mod ring;
pub mod stats;
pub mod uniform;

pub use config::{BufferDepth, PresentMode, PresentationConfig, SurfacePolicy};
pub use ring::{RecordedSample, SampleRing};
pub use stats::LatencyStats;
pub use uniform::GraphUniform;

pub const DEFAULT_RING_CAPACITY: u32 = 65536;
pub const DEFAULT_WINDOW_SIZE: u32 = 256;
/// Graph height corresponds to one 30 Hz frame.
pub const DEFAULT_MAX_LATENCY_MS: f32 = 1000.0 / 30.0;
