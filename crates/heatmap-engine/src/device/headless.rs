use anyhow::{Context, Result, ensure};

use crate::render::RenderCtx;

use super::adapter::{self, DeviceRequest};

/// Initialization parameters for a surface-less GPU context.
#[derive(Debug, Clone)]
pub struct HeadlessInit {
    pub power_preference: wgpu::PowerPreference,
    /// Accept only a software adapter (e.g. for CI).
    pub force_fallback_adapter: bool,
    pub required_features: wgpu::Features,
    pub required_limits: wgpu::Limits,
}

impl Default for HeadlessInit {
    fn default() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::default(),
            force_fallback_adapter: false,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults(),
        }
    }
}

/// Device + queue without a window, for offscreen rendering and readback.
pub struct HeadlessGpu {
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl HeadlessGpu {
    pub async fn new(init: HeadlessInit) -> Result<Self> {
        let instance = adapter::new_instance();
        let (adapter, device, queue) = adapter::acquire(
            &instance,
            DeviceRequest {
                label: "heatmap-engine headless device",
                power_preference: init.power_preference,
                force_fallback_adapter: init.force_fallback_adapter,
                compatible_surface: None,
                required_features: init.required_features,
                required_limits: init.required_limits,
            },
        )
        .await?;

        Ok(Self { adapter, device, queue })
    }

    /// Blocking variant of [`new`](Self::new).
    pub fn blocking(init: HeadlessInit) -> Result<Self> {
        pollster::block_on(Self::new(init))
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Pass context for targets of `format`.
    pub fn render_ctx(&self, format: wgpu::TextureFormat) -> RenderCtx<'_> {
        RenderCtx::new(&self.device, &self.queue, format)
    }

    /// Allocates a color target that can be rendered to and read back.
    pub fn create_target(
        &self,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("heatmap headless target"),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
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

    /// Clears `view` to `color` in its own submission.
    pub fn clear(&self, view: &wgpu::TextureView, color: wgpu::Color) {
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("heatmap headless clear encoder"),
        });
        {
            let _rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("heatmap headless clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Reads an 8-bit RGBA texture back into tightly packed rows.
    ///
    /// Blocks until the copy completes.
    pub fn read_rgba8(&self, texture: &wgpu::Texture) -> Result<Vec<u8>> {
        ensure!(
            matches!(
                texture.format(),
                wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb
            ),
            "read_rgba8 needs an Rgba8 texture, got {:?}",
            texture.format()
        );
        let (width, height) = (texture.width(), texture.height());
        let row_bytes = width * 4;
        let padded = padded_bytes_per_row(row_bytes);

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("heatmap readback buffer"),
            size: padded as u64 * height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("heatmap readback encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .context("failed to wait for readback")?;
        rx.recv()
            .context("readback callback dropped")?
            .context("failed to map readback buffer")?;

        let mut out = Vec::with_capacity((row_bytes * height) as usize);
        {
            let data = slice.get_mapped_range();
            for row in data.chunks(padded as usize) {
                out.extend_from_slice(&row[..row_bytes as usize]);
            }
        }
        buffer.unmap();
        Ok(out)
    }
}

/// Device for GPU tests, or `None` (with a note on stderr) when the host has
/// no usable adapter.
#[cfg(test)]
pub(crate) fn test_gpu() -> Option<HeadlessGpu> {
    match HeadlessGpu::blocking(HeadlessInit::default()) {
        Ok(gpu) => Some(gpu),
        Err(err) => {
            eprintln!("skipping GPU test: {err:#}");
            None
        }
    }
}

fn padded_bytes_per_row(row_bytes: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    row_bytes.div_ceil(align) * align
}
