use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::Precision;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(0);

fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// Offscreen coverage target written by the point pass and read by the
/// colorize pass.
///
/// Only the alpha channel carries data. Storage follows [`Precision`].
pub struct OffscreenAlphaBuffer {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    /// Unique per allocation; dependent bind groups rebuild when it changes.
    generation: u64,
}

impl OffscreenAlphaBuffer {
    pub fn new(device: &wgpu::Device, width: u32, height: u32, precision: Precision) -> Self {
        let format = precision.alpha_buffer_format();
        let (texture, view) = create_texture(device, width, height, format);
        Self { texture, view, width, height, format, generation: next_generation() }
    }

    /// Reallocates if the size changed. Returns `true` when it did.
    pub fn ensure_size(&mut self, device: &wgpu::Device, width: u32, height: u32) -> bool {
        if self.width == width && self.height == height {
            return false;
        }
        let (texture, view) = create_texture(device, width, height, self.format);
        log::debug!(
            "heatmap coverage buffer {}x{} -> {}x{} ({:?})",
            self.width,
            self.height,
            width,
            height,
            self.format
        );
        self.texture = texture;
        self.view = view;
        self.width = width;
        self.height = height;
        self.generation = next_generation();
        true
    }

    #[inline]
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    #[inline]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    #[inline]
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }
}

fn create_texture(
    device: &wgpu::Device,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("heatmap coverage buffer"),
        size: wgpu::Extent3d { width: width.max(1), height: height.max(1), depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}
