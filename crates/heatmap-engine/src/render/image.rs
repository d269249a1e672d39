use anyhow::{Result, ensure};
use wgpu::util::DeviceExt;

use crate::config::ShaderConstants;
use crate::coords::{Rect, ViewportParams};

use super::common::{ImageUniform, ImageVertex, QUAD_INDICES, primitive_state, uniform_entry};
use super::{RenderCtx, RenderTarget};

/// A texture placed over a model-space rectangle.
///
/// Created by [`ImageCompositor::create_layer`]; owns its texture, vertex
/// buffer and bindings.
pub struct ImageLayer {
    texture: wgpu::Texture,
    rect: Rect,
    vbo: wgpu::Buffer,
    ubo: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl ImageLayer {
    #[inline]
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Moves the layer. Takes effect on the next draw.
    pub fn set_rect(&mut self, queue: &wgpu::Queue, rect: Rect) {
        self.rect = rect;
        queue.write_buffer(&self.vbo, 0, bytemuck::cast_slice(&ImageVertex::quad(rect)));
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }

    /// Replaces the texel data. `rgba8` must match the current size.
    pub fn write_rgba8(&self, queue: &wgpu::Queue, rgba8: &[u8]) -> Result<()> {
        let (w, h) = self.size();
        write_texels(queue, &self.texture, w, h, rgba8)
    }
}

/// Image pass: draws an [`ImageLayer`] straight into the caller's target.
///
/// Sampling is nearest-neighbour. Texels with alpha below
/// [`IMAGE_ALPHA_CUTOFF`](crate::config::IMAGE_ALPHA_CUTOFF) are discarded,
/// all others replace the target pixel without blending.
pub struct ImageCompositor {
    constants: ShaderConstants,

    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,

    // Format independent, so layers survive pipeline rebuilds.
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    sampler: Option<wgpu::Sampler>,
    quad_ibo: Option<wgpu::Buffer>,
}

impl ImageCompositor {
    pub fn new(constants: ShaderConstants) -> Self {
        Self {
            constants,
            pipeline_format: None,
            pipeline: None,
            bind_group_layout: None,
            sampler: None,
            quad_ibo: None,
        }
    }

    /// Uploads `rgba8` (tightly packed, row 0 at `rect.origin`) as a new layer.
    pub fn create_layer(
        &mut self,
        ctx: &RenderCtx<'_>,
        width: u32,
        height: u32,
        rgba8: &[u8],
        rect: Rect,
    ) -> Result<ImageLayer> {
        ensure!(width > 0 && height > 0, "image layer {width}x{height} has no texels");
        self.ensure_shared(ctx);
        let (Some(bgl), Some(sampler)) = (self.bind_group_layout.as_ref(), self.sampler.as_ref())
        else {
            anyhow::bail!("image compositor bindings unavailable");
        };

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("heatmap image texture"),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        write_texels(ctx.queue, &texture, width, height, rgba8)?;
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let vbo = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("heatmap image vbo"),
            contents: bytemuck::cast_slice(&ImageVertex::quad(rect)),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("heatmap image ubo"),
            size: std::mem::size_of::<ImageUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("heatmap image bind group"),
            layout: bgl,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: ubo.as_entire_binding() },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        log::debug!("heatmap image layer {width}x{height} at {rect:?}");
        Ok(ImageLayer { texture, rect, vbo, ubo, bind_group })
    }

    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        layer: &ImageLayer,
        params: &ViewportParams,
    ) {
        if layer.rect.is_empty() || !params.is_valid() {
            return;
        }
        self.ensure_shared(ctx);
        self.ensure_pipeline(ctx);

        let uniform = ImageUniform::new(&self.constants, params);
        ctx.queue.write_buffer(&layer.ubo, 0, bytemuck::bytes_of(&uniform));

        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(quad_ibo) = self.quad_ibo.as_ref() else { return };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("heatmap image pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, &layer.bind_group, &[]);
        rpass.set_vertex_buffer(0, layer.vbo.slice(..));
        rpass.set_index_buffer(quad_ibo.slice(..), wgpu::IndexFormat::Uint16);
        rpass.draw_indexed(0..6, 0, 0..1);
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn ensure_shared(&mut self, ctx: &RenderCtx<'_>) {
        if self.bind_group_layout.is_none() {
            self.bind_group_layout =
                Some(ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("heatmap image bgl"),
                    entries: &[
                        uniform_entry::<ImageUniform>(0, wgpu::ShaderStages::VERTEX),
                        wgpu::BindGroupLayoutEntry {
                            binding: 1,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Texture {
                                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                                view_dimension: wgpu::TextureViewDimension::D2,
                                multisampled: false,
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: 2,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                            count: None,
                        },
                    ],
                }));
        }

        if self.sampler.is_none() {
            self.sampler = Some(ctx.device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("heatmap image sampler"),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: wgpu::FilterMode::Nearest,
                min_filter: wgpu::FilterMode::Nearest,
                mipmap_filter: wgpu::MipmapFilterMode::Nearest,
                ..Default::default()
            }));
        }

        if self.quad_ibo.is_none() {
            self.quad_ibo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("heatmap image quad ibo"),
                contents: bytemuck::cast_slice(&QUAD_INDICES),
                usage: wgpu::BufferUsages::INDEX,
            }));
        }
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipeline.is_some() {
            return;
        }
        let Some(bind_group_layout) = self.bind_group_layout.as_ref() else { return };

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("heatmap image shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/image.wgsl").into()),
        });

        let pipeline_layout =
            ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("heatmap image pipeline layout"),
                bind_group_layouts: &[bind_group_layout],
                immediate_size: 0,
            });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("heatmap image pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[ImageVertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: primitive_state(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("heatmap image pipeline built for {:?}", ctx.surface_format);
        self.pipeline_format = Some(ctx.surface_format);
        self.pipeline = Some(pipeline);
    }
}

fn write_texels(
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    width: u32,
    height: u32,
    rgba8: &[u8],
) -> Result<()> {
    let expected = width as usize * height as usize * 4;
    ensure!(
        rgba8.len() == expected,
        "image data is {} bytes, {width}x{height} RGBA needs {expected}",
        rgba8.len()
    );
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        rgba8,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * 4),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
    );
    Ok(())
}
