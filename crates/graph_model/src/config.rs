use serde::{Deserialize, Serialize};

use crate::DEFAULT_WINDOW_SIZE;

/// How a finished frame reaches the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentMode {
    /// Present right after submitting on the render thread; the presentation
    /// engine throttles submission.
    Synchronous,
    /// Present from a completion callback once the submission has been
    /// processed, decoupling submission pacing from display pacing.
    Scheduled,
}

impl PresentMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Synchronous => Self::Scheduled,
            Self::Scheduled => Self::Synchronous,
        }
    }
}

/// Number of images in the swapchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferDepth {
    Double,
    Triple,
}

impl BufferDepth {
    pub fn image_count(self) -> u32 {
        match self {
            Self::Double => 2,
            Self::Triple => 3,
        }
    }

    /// Frames the presentation engine may queue ahead of the one on screen.
    pub fn frame_latency(self) -> u32 {
        self.image_count() - 1
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Double => Self::Triple,
            Self::Triple => Self::Double,
        }
    }
}

/// Policy pushed down to the presentation surface. Changing it requires a
/// surface reconfiguration, so the renderer compares against the last applied one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfacePolicy {
    pub vsync: bool,
    pub buffer_depth: BufferDepth,
}

/// Render parameters owned by the render-loop thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentationConfig {
    pub vsync: bool,
    pub buffer_depth: BufferDepth,
    pub present_mode: PresentMode,
    pub scroll: bool,
    window_size: u32,
    max_window_size: u32,
}

impl PresentationConfig {
    /// Defaults for a ring of `ring_capacity` samples. The window may show at
    /// most half the ring.
    pub fn new(ring_capacity: u32) -> Self {
        assert!(
            ring_capacity.is_power_of_two() && ring_capacity >= 2,
            "ring capacity must be a power of two >= 2, got {ring_capacity}"
        );
        let max_window_size = ring_capacity / 2;
        Self {
            vsync: false,
            buffer_depth: BufferDepth::Triple,
            present_mode: PresentMode::Synchronous,
            scroll: true,
            window_size: DEFAULT_WINDOW_SIZE.clamp(1, max_window_size),
            max_window_size,
        }
    }

    pub fn window_size(&self) -> u32 {
        self.window_size
    }

    pub fn max_window_size(&self) -> u32 {
        self.max_window_size
    }

    pub fn set_window_size(&mut self, window_size: u32) -> u32 {
        self.window_size = window_size.clamp(1, self.max_window_size);
        self.window_size
    }

    pub fn zoom_in(&mut self) -> u32 {
        self.set_window_size(self.window_size / 2)
    }

    pub fn zoom_out(&mut self) -> u32 {
        self.set_window_size(self.window_size.saturating_mul(2))
    }

    pub fn toggle_vsync(&mut self) -> bool {
        self.vsync = !self.vsync;
        self.vsync
    }

    pub fn toggle_present_mode(&mut self) -> PresentMode {
        self.present_mode = self.present_mode.toggled();
        self.present_mode
    }

    pub fn toggle_buffer_depth(&mut self) -> BufferDepth {
        self.buffer_depth = self.buffer_depth.toggled();
        self.buffer_depth
    }

    pub fn toggle_scroll(&mut self) -> bool {
        self.scroll = !self.scroll;
        self.scroll
    }

    pub fn surface_policy(&self) -> SurfacePolicy {
        SurfacePolicy {
            vsync: self.vsync,
            buffer_depth: self.buffer_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_startup_policy() {
        let config = PresentationConfig::new(65536);
        assert!(!config.vsync);
        assert_eq!(config.buffer_depth, BufferDepth::Triple);
        assert_eq!(config.present_mode, PresentMode::Synchronous);
        assert!(config.scroll);
        assert_eq!(config.window_size(), 256);
        assert_eq!(config.max_window_size(), 32768);
    }

    #[test]
    fn default_window_clamps_to_small_ring() {
        let config = PresentationConfig::new(64);
        assert_eq!(config.window_size(), 32);
    }

    #[test]
    fn zoom_out_saturates_at_half_capacity() {
        let mut config = PresentationConfig::new(65536);
        for _ in 0..3 {
            config.zoom_out();
        }
        assert_eq!(config.window_size(), 2048);
        for _ in 0..6 {
            config.zoom_out();
        }
        assert_eq!(config.window_size(), 32768);
    }

    #[test]
    fn zoom_in_floors_at_one() {
        let mut config = PresentationConfig::new(65536);
        for _ in 0..20 {
            config.zoom_in();
        }
        assert_eq!(config.window_size(), 1);
        assert_eq!(config.zoom_in(), 1);
    }

    #[test]
    fn any_zoom_sequence_stays_in_bounds() {
        let mut config = PresentationConfig::new(1024);
        let mut state = 0x2545_f491_u32;
        for _ in 0..2000 {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            if state & 1 == 0 {
                config.zoom_in();
            } else {
                config.zoom_out();
            }
            let window = config.window_size();
            assert!((1..=512).contains(&window), "window {window} out of bounds");
        }
    }

    #[test]
    fn set_window_size_clamps_both_ends() {
        let mut config = PresentationConfig::new(256);
        assert_eq!(config.set_window_size(0), 1);
        assert_eq!(config.set_window_size(u32::MAX), 128);
        assert_eq!(config.set_window_size(77), 77);
    }

    #[test]
    fn toggles_invert_and_report_new_state() {
        let mut config = PresentationConfig::new(256);
        assert!(config.toggle_vsync());
        assert_eq!(config.toggle_present_mode(), PresentMode::Scheduled);
        assert_eq!(config.toggle_buffer_depth(), BufferDepth::Double);
        assert!(!config.toggle_scroll());
        assert_eq!(
            config.surface_policy(),
            SurfacePolicy {
                vsync: true,
                buffer_depth: BufferDepth::Double,
            }
        );
    }

    #[test]
    fn buffer_depth_maps_to_frame_latency() {
        assert_eq!(BufferDepth::Double.frame_latency(), 1);
        assert_eq!(BufferDepth::Triple.frame_latency(), 2);
    }

    #[test]
    fn policy_enums_use_snake_case_names() {
        #[derive(Deserialize)]
        struct Policy {
            mode: PresentMode,
            depth: BufferDepth,
        }
        let policy: Policy = toml::from_str("mode = \"scheduled\"\ndepth = \"double\"")
            .expect("parse policy");
        assert_eq!(policy.mode, PresentMode::Scheduled);
        assert_eq!(policy.depth, BufferDepth::Double);
    }
}
