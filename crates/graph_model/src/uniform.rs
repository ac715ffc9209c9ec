//! Per-draw configuration read by the bar vertex shader.
//!
//! Two 16-byte words. The layout must match `GraphUniform` in
//! `latency_bars.wgsl`.

use crate::config::PresentationConfig;
use crate::ring::RecordedSample;

const NANOS_PER_MILLI: f32 = 1_000_000.0;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GraphUniform {
    /// Clip-space width of one bar (`2 / window_size`).
    pub bar_width: f32,
    /// Multiplier turning nanoseconds into a fraction of the graph height.
    pub height_scale: f32,
    pub newest_slot: u32,
    pub slot_mask: u32,
    pub scroll_offset: u32,
    pub window_size: u32,
    pub _padding: [u32; 2],
}

impl GraphUniform {
    pub fn new(
        config: &PresentationConfig,
        recorded: RecordedSample,
        slot_mask: u32,
        max_latency_ms: f32,
    ) -> Self {
        let window_size = config.window_size();
        Self {
            bar_width: 2.0 / window_size as f32,
            height_scale: height_scale(max_latency_ms),
            newest_slot: recorded.slot,
            slot_mask,
            scroll_offset: scroll_offset(window_size, recorded.frame, config.scroll),
            window_size,
            _padding: [0; 2],
        }
    }
}

/// CPU mirror of the mapping in `latency_bars.wgsl`'s vertex stage.
#[cfg(test)]
impl GraphUniform {
    /// Column (0 = left edge) where the shader places bar `bar`, counting
    /// back from the newest sample.
    fn bar_column(&self, bar: u32) -> u32 {
        debug_assert!(bar < self.window_size, "bar index outside window");
        let window = self.window_size;
        (window - 1 - bar + window - self.scroll_offset) % window
    }

    /// Ring slot read for bar `bar`.
    fn bar_slot(&self, bar: u32) -> u32 {
        self.newest_slot.wrapping_sub(bar) & self.slot_mask
    }

    fn height_fraction(&self, latency_ns: f32) -> f32 {
        (latency_ns * self.height_scale).clamp(0.0, 1.0)
    }
}

pub fn height_scale(max_latency_ms: f32) -> f32 {
    assert!(
        max_latency_ms.is_finite() && max_latency_ms > 0.0,
        "max latency must be positive and finite, got {max_latency_ms}"
    );
    1.0 / (max_latency_ms * NANOS_PER_MILLI)
}

/// Zero in scroll mode. In paged mode the offset makes frame `f` land in
/// column `f % window`, so each block of `window` frames fills the graph
/// left to right before wrapping.
pub fn scroll_offset(window_size: u32, frame: u64, scroll: bool) -> u32 {
    assert!(window_size > 0, "window size must be positive");
    if scroll {
        return 0;
    }
    let phase = u32::try_from(frame % u64::from(window_size)).expect("phase below window size");
    window_size - 1 - phase
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorded(slot: u32, frame: u64) -> RecordedSample {
        RecordedSample { slot, frame }
    }

    #[test]
    fn uniform_is_two_sixteen_byte_words() {
        assert_eq!(std::mem::size_of::<GraphUniform>(), 32);
    }

    #[test]
    fn packs_first_word() {
        let config = PresentationConfig::new(65536);
        let uniform = GraphUniform::new(&config, recorded(41, 41), 65535, 1000.0 / 30.0);
        assert_eq!(uniform.bar_width, 2.0 / 256.0);
        assert!((uniform.height_scale - 30.0 / 1.0e9).abs() < 1.0e-12);
        assert_eq!(uniform.newest_slot, 41);
        assert_eq!(uniform.slot_mask, 65535);
        assert_eq!(uniform.window_size, 256);
    }

    #[test]
    fn scroll_mode_puts_newest_bar_on_the_right() {
        let config = PresentationConfig::new(64);
        let uniform = GraphUniform::new(&config, recorded(5, 1000), 63, 10.0);
        assert_eq!(uniform.scroll_offset, 0);
        assert_eq!(uniform.bar_column(0), config.window_size() - 1);
        assert_eq!(uniform.bar_column(config.window_size() - 1), 0);
    }

    #[test]
    fn paged_mode_places_frame_at_frame_mod_window() {
        let mut config = PresentationConfig::new(64);
        config.scroll = false;
        config.set_window_size(8);
        for frame in 0..40u64 {
            let uniform = GraphUniform::new(&config, recorded(0, frame), 63, 10.0);
            assert_eq!(uniform.scroll_offset, 7 - (frame % 8) as u32);
            for bar in 0..8u32 {
                let Some(bar_frame) = frame.checked_sub(u64::from(bar)) else {
                    continue;
                };
                assert_eq!(
                    u64::from(uniform.bar_column(bar)),
                    bar_frame % 8,
                    "frame {frame} bar {bar}"
                );
            }
        }
    }

    #[test]
    fn bar_slots_wrap_with_mask() {
        let config = PresentationConfig::new(16);
        let uniform = GraphUniform::new(&config, recorded(2, 2), 15, 10.0);
        assert_eq!(uniform.bar_slot(0), 2);
        assert_eq!(uniform.bar_slot(2), 0);
        assert_eq!(uniform.bar_slot(3), 15);
    }

    #[test]
    fn height_fraction_saturates_at_full_height() {
        let config = PresentationConfig::new(16);
        let uniform = GraphUniform::new(&config, recorded(0, 0), 15, 10.0);
        assert!((uniform.height_fraction(5_000_000.0) - 0.5).abs() < 1.0e-6);
        assert_eq!(uniform.height_fraction(50_000_000.0), 1.0);
    }
}
