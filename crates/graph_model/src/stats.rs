use crate::ring::SampleRing;

/// Summary of the samples currently on screen, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyStats {
    pub count: u32,
    pub min_ms: f32,
    pub mean_ms: f32,
    pub max_ms: f32,
    pub last_ms: f32,
}

impl LatencyStats {
    /// Walks the newest `window_size` samples (fewer if the ring has not
    /// seen that many frames yet). Returns `None` before the first sample.
    pub fn over_window(ring: &SampleRing, window_size: u32) -> Option<Self> {
        let recorded = u32::try_from(ring.frame_counter()).unwrap_or(u32::MAX);
        let count = window_size.min(recorded).min(ring.capacity());
        if count == 0 {
            return None;
        }
        let mut min_ns = f32::INFINITY;
        let mut max_ns = 0.0f32;
        let mut sum_ns = 0.0f64;
        for age in 0..count {
            let sample = ring.sample_back(age);
            min_ns = min_ns.min(sample);
            max_ns = max_ns.max(sample);
            sum_ns += f64::from(sample);
        }
        Some(Self {
            count,
            min_ms: nanos_to_millis(min_ns),
            mean_ms: (sum_ns / f64::from(count) / 1.0e6) as f32,
            max_ms: nanos_to_millis(max_ns),
            last_ms: nanos_to_millis(ring.sample_back(0)),
        })
    }
}

fn nanos_to_millis(nanos: f32) -> f32 {
    nanos / 1.0e6
}
