//! Instance, adapter and device bootstrap for the window surface.

use std::sync::Arc;

use graph_renderer::{
    GraphRenderer, GraphSettings, RenderError, SurfaceSize, detect_sample_count,
};
use winit::window::Window;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface is not supported by the adapter")]
    UnsupportedSurface,
    #[error(transparent)]
    Renderer(#[from] RenderError),
}

pub async fn create_renderer(
    window: Arc<Window>,
    settings: GraphSettings,
    surface_size: SurfaceSize,
) -> Result<GraphRenderer, StartupError> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });

    let surface = instance.create_surface(window.clone())?;

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        })
        .await?;
    let info = adapter.get_info();
    log::info!("[presentscope] adapter {} ({:?})", info.name, info.backend);

    // Sample counts other than 1 and 4 are only usable with this feature.
    let adapter_specific_formats = adapter
        .features()
        .contains(wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES);
    let required_features = if adapter_specific_formats {
        wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES
    } else {
        wgpu::Features::empty()
    };
    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("presentscope.device"),
            required_features,
            required_limits: adapter.limits(),
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        })
        .await?;

    let caps = surface.get_capabilities(&adapter);
    let surface_format = caps
        .formats
        .iter()
        .copied()
        .find(|format| format.is_srgb())
        .or_else(|| caps.formats.first().copied())
        .ok_or(StartupError::UnsupportedSurface)?;
    let sample_count = detect_sample_count(&adapter, surface_format, adapter_specific_formats);

    let size = window.inner_size();
    let surface_config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format: surface_format,
        width: size.width.max(1),
        height: size.height.max(1),
        present_mode: wgpu::PresentMode::Fifo,
        alpha_mode: caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto),
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    };

    Ok(GraphRenderer::new(
        device,
        queue,
        surface,
        surface_config,
        surface_size,
        caps.present_modes,
        sample_count,
        settings,
    )?)
}
