use anyhow::{Context, Result};

/// Adapter and device requirements shared by the windowed and headless hosts.
pub(crate) struct DeviceRequest<'a, 's> {
    pub label: &'static str,
    pub power_preference: wgpu::PowerPreference,
    pub force_fallback_adapter: bool,
    /// Surface the adapter must be able to present to, if any.
    pub compatible_surface: Option<&'a wgpu::Surface<'s>>,
    pub required_features: wgpu::Features,
    pub required_limits: wgpu::Limits,
}

/// Instance over every backend; wgpu picks the platform's best one.
pub(crate) fn new_instance() -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    })
}

/// Selects an adapter and opens a device on it.
///
/// The coverage pass renders into `Rgba16Float` with blending, so the adapter
/// is checked for that up front rather than failing at pipeline creation.
pub(crate) async fn acquire(
    instance: &wgpu::Instance,
    req: DeviceRequest<'_, '_>,
) -> Result<(wgpu::Adapter, wgpu::Device, wgpu::Queue)> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: req.power_preference,
            compatible_surface: req.compatible_surface,
            force_fallback_adapter: req.force_fallback_adapter,
        })
        .await
        .context("failed to find a suitable GPU adapter")?;

    let info = adapter.get_info();
    let coverage = adapter.get_texture_format_features(wgpu::TextureFormat::Rgba16Float);
    if !supports_coverage_target(coverage.allowed_usages, coverage.flags) {
        log::warn!(
            "adapter {} cannot blend into Rgba16Float; use Precision::Medium",
            info.name
        );
    }

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some(req.label),
            required_features: req.required_features,
            required_limits: req.required_limits,
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        })
        .await
        .with_context(|| format!("failed to open a device on {}", info.name))?;

    log::info!("{}: {} ({:?})", req.label, info.name, info.backend);
    Ok((adapter, device, queue))
}

fn supports_coverage_target(
    usages: wgpu::TextureUsages,
    flags: wgpu::TextureFormatFeatureFlags,
) -> bool {
    usages.contains(wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING)
        && flags.contains(wgpu::TextureFormatFeatureFlags::BLENDABLE)
}
