//! Offscreen multisample target.
//!
//! The sample count is detected once at startup. The target itself follows the
//! drawable size and is reallocated only when that size changes.

use crate::RenderError;

const MAX_SAMPLE_COUNT: u32 = 16;

/// Largest power-of-two sample count in `2..=16` accepted by `supports`, or
/// `1` when none is.
pub fn max_supported_sample_count(supports: impl Fn(u32) -> bool) -> u32 {
    let mut best = 1;
    let mut count = 2;
    while count <= MAX_SAMPLE_COUNT {
        if supports(count) {
            best = count;
        }
        count *= 2;
    }
    best
}

/// Checks the surface format. Without adapter-specific format features only
/// the counts every adapter guarantees (1 and 4) are considered.
pub fn detect_sample_count(
    adapter: &wgpu::Adapter,
    format: wgpu::TextureFormat,
    adapter_specific_formats: bool,
) -> u32 {
    let flags = adapter.get_texture_format_features(format).flags;
    let count = max_supported_sample_count(|count| {
        if !adapter_specific_formats && count != 4 {
            return false;
        }
        flags.sample_count_supported(count)
    });
    log::info!("[renderer] msaa sample count {count} for {format:?}");
    count
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetExtent {
    pub width: u32,
    pub height: u32,
}

pub trait TargetAllocator {
    type Target;
    type Error;

    fn allocate(&mut self, extent: TargetExtent) -> Result<Self::Target, Self::Error>;
}

pub struct MsaaTargetManager<A: TargetAllocator> {
    allocator: A,
    current: Option<(TargetExtent, A::Target)>,
    allocations: u64,
}

impl<A: TargetAllocator> MsaaTargetManager<A> {
    pub fn new(allocator: A) -> Self {
        Self {
            allocator,
            current: None,
            allocations: 0,
        }
    }

    /// Returns a target matching `extent`, allocating a replacement when the
    /// stored one has different dimensions or none exists yet.
    pub fn ensure_target(&mut self, extent: TargetExtent) -> Result<&A::Target, A::Error> {
        let slot = match self.current.take() {
            Some((current_extent, target)) if current_extent == extent => {
                self.current.insert((current_extent, target))
            }
            previous => {
                let target = self.allocator.allocate(extent)?;
                drop(previous);
                self.allocations += 1;
                log::debug!(
                    "[renderer] msaa target {}x{}, allocation {}",
                    extent.width,
                    extent.height,
                    self.allocations
                );
                self.current.insert((extent, target))
            }
        };
        Ok(&slot.1)
    }

    #[cfg(test)]
    fn allocations(&self) -> u64 {
        self.allocations
    }

    #[cfg(test)]
    fn extent(&self) -> Option<TargetExtent> {
        self.current.as_ref().map(|(extent, _)| *extent)
    }
}

pub struct MsaaTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl MsaaTarget {
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

/// Allocates multisample color textures on the device. Each allocation runs
/// inside its own error scope, so only its own failures are reported.
pub struct MsaaTextureAllocator {
    device: wgpu::Device,
    format: wgpu::TextureFormat,
    sample_count: u32,
}

impl MsaaTextureAllocator {
    pub fn new(device: wgpu::Device, format: wgpu::TextureFormat, sample_count: u32) -> Self {
        assert!(sample_count > 1, "msaa allocator needs a multisample count");
        Self {
            device,
            format,
            sample_count,
        }
    }
}

impl TargetAllocator for MsaaTextureAllocator {
    type Target = MsaaTarget;
    type Error = RenderError;

    fn allocate(&mut self, extent: TargetExtent) -> Result<MsaaTarget, RenderError> {
        let out_of_memory_scope = self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let validation_scope = self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("renderer.msaa_target"),
            size: wgpu::Extent3d {
                width: extent.width.max(1),
                height: extent.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: self.sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: self.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let validation_error = pollster::block_on(validation_scope.pop());
        let out_of_memory_error = pollster::block_on(out_of_memory_scope.pop());
        if let Some(error) = validation_error.or(out_of_memory_error) {
            return Err(RenderError::TargetAllocation {
                width: extent.width,
                height: extent.height,
                message: error.to_string(),
            });
        }
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(MsaaTarget {
            _texture: texture,
            view,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingAllocator {
        allocated: Vec<TargetExtent>,
        fail: bool,
    }

    impl TargetAllocator for CountingAllocator {
        type Target = TargetExtent;
        type Error = &'static str;

        fn allocate(&mut self, extent: TargetExtent) -> Result<TargetExtent, &'static str> {
            if self.fail {
                return Err("out of memory");
            }
            self.allocated.push(extent);
            Ok(extent)
        }
    }

    fn extent(width: u32, height: u32) -> TargetExtent {
        TargetExtent { width, height }
    }

    #[test]
    fn identical_dimensions_allocate_once() {
        let mut manager = MsaaTargetManager::new(CountingAllocator::default());
        manager.ensure_target(extent(800, 600)).expect("first");
        manager.ensure_target(extent(800, 600)).expect("second");
        assert_eq!(manager.allocations(), 1);
    }

    #[test]
    fn resize_between_frames_reallocates_once() {
        let mut manager = MsaaTargetManager::new(CountingAllocator::default());
        // Frame N at the old size, N+1 and N+2 after the resize.
        manager.ensure_target(extent(800, 600)).expect("frame n");
        let resized = *manager.ensure_target(extent(1600, 1200)).expect("frame n+1");
        assert_eq!(resized, extent(1600, 1200));
        assert_eq!(manager.allocations(), 2);
        manager.ensure_target(extent(1600, 1200)).expect("frame n+2");
        assert_eq!(manager.allocations(), 2);
        assert_eq!(manager.extent(), Some(extent(1600, 1200)));
    }

    #[test]
    fn allocation_failure_is_reported() {
        let mut manager = MsaaTargetManager::new(CountingAllocator {
            fail: true,
            ..CountingAllocator::default()
        });
        assert_eq!(manager.ensure_target(extent(4, 4)), Err("out of memory"));
        assert_eq!(manager.allocations(), 0);
        assert_eq!(manager.extent(), None);
    }

    #[test]
    fn sample_count_keeps_largest_supported_power_of_two() {
        assert_eq!(max_supported_sample_count(|_| false), 1);
        assert_eq!(max_supported_sample_count(|count| count == 4), 4);
        assert_eq!(max_supported_sample_count(|count| count <= 8), 8);
        assert_eq!(max_supported_sample_count(|count| count != 16), 8);
        assert_eq!(max_supported_sample_count(|_| true), 16);
    }
}
