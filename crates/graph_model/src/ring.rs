//! Fixed-capacity latency history.
//!
//! The ring is a single contiguous allocation addressed with a bitmask, so the
//! capacity must be a power of two. The GPU reads the same layout through a
//! storage buffer; the renderer mirrors the slot written by [`SampleRing::record`].

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedSample {
    /// Slot that now holds the sample.
    pub slot: u32,
    /// Logical frame number the sample belongs to.
    pub frame: u64,
}

#[derive(Debug, Clone)]
pub struct SampleRing {
    samples: Box<[f32]>,
    mask: u32,
    start_pos: u32,
    base_pos: u64,
}

impl SampleRing {
    pub fn new(capacity: u32) -> Self {
        assert!(
            capacity.is_power_of_two(),
            "sample ring capacity must be a power of two, got {capacity}"
        );
        assert!(capacity >= 2, "sample ring capacity must be at least 2");
        let len = usize::try_from(capacity).expect("sample ring capacity exceeds usize");
        Self {
            samples: vec![0.0; len].into_boxed_slice(),
            mask: capacity - 1,
            start_pos: 0,
            base_pos: 0,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.mask + 1
    }

    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// Number of samples recorded so far. Wraps only at `u64::MAX`.
    pub fn frame_counter(&self) -> u64 {
        self.base_pos
    }

    pub fn record(&mut self, latency_ns: f32) -> RecordedSample {
        let slot = self.start_pos;
        self.samples[slot as usize] = latency_ns;
        let recorded = RecordedSample {
            slot,
            frame: self.base_pos,
        };
        self.start_pos = slot.wrapping_add(1) & self.mask;
        self.base_pos = self.base_pos.wrapping_add(1);
        recorded
    }

    /// Sample recorded `age` frames before the most recent one (`age == 0` is the newest).
    pub fn sample_back(&self, age: u32) -> f32 {
        let index = self.start_pos.wrapping_sub(age).wrapping_sub(1) & self.mask;
        self.samples[index as usize]
    }

    /// Byte offset of `slot` inside the GPU mirror of the ring.
    pub fn byte_offset(slot: u32) -> u64 {
        u64::from(slot) * std::mem::size_of::<f32>() as u64
    }
}

#[cfg(test)]
impl SampleRing {
    /// Slot the next sample will be written to.
    fn cursor(&self) -> u32 {
        self.start_pos
    }

    fn slot(&self, slot: u32) -> f32 {
        self.samples[(slot & self.mask) as usize]
    }

    fn byte_len(&self) -> u64 {
        Self::byte_offset(self.capacity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ring_is_zeroed() {
        let ring = SampleRing::new(16);
        assert_eq!(ring.capacity(), 16);
        assert_eq!(ring.mask(), 15);
        assert_eq!(ring.cursor(), 0);
        assert_eq!(ring.frame_counter(), 0);
        assert!(ring.samples.iter().all(|sample| *sample == 0.0));
    }

    #[test]
    #[should_panic(expected = "power of two")]
    fn rejects_non_power_of_two_capacity() {
        let _ = SampleRing::new(100);
    }

    #[test]
    fn record_writes_slot_then_advances() {
        let mut ring = SampleRing::new(4);
        let first = ring.record(10.0);
        assert_eq!(first, RecordedSample { slot: 0, frame: 0 });
        assert_eq!(ring.slot(0), 10.0);
        assert_eq!(ring.cursor(), 1);
        assert_eq!(ring.frame_counter(), 1);
    }

    #[test]
    fn keeps_last_capacity_samples_in_order_after_wrap() {
        for capacity in [2u32, 8, 64, 1024] {
            for extra in [0u32, 1, 3, capacity + 5] {
                let mut ring = SampleRing::new(capacity);
                let total = capacity + extra;
                for value in 0..total {
                    ring.record(value as f32);
                }
                for age in 0..capacity {
                    let expected = (total - age - 1) as f32;
                    assert_eq!(
                        ring.sample_back(age),
                        expected,
                        "capacity {capacity} extra {extra} age {age}"
                    );
                }
                assert_eq!(ring.cursor(), total % capacity);
                assert_eq!(ring.frame_counter(), u64::from(total));
            }
        }
    }

    #[test]
    fn byte_offsets_follow_f32_layout() {
        let ring = SampleRing::new(65536);
        assert_eq!(SampleRing::byte_offset(3), 12);
        assert_eq!(ring.byte_len(), 65536 * 4);
    }
}
