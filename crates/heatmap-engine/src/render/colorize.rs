use wgpu::util::DeviceExt;

use crate::config::{RampOverflow, ShaderConstants};
use crate::paint::ColorRamp;

use super::common::{
    QUAD_INDICES, QUAD_VERTICES, QuadVertex, RampUniform, premul_alpha_blend, primitive_state,
    uniform_entry,
};
use super::offscreen::OffscreenAlphaBuffer;
use super::{RenderCtx, RenderTarget};

/// Colorize pass: a full-target quad that reads coverage texel by texel and
/// maps it through the color ramp.
///
/// Output pixel `(x, y)` reads coverage texel `(x, h - 1 - y)`. Pixels whose
/// coverage is not in `(0, 1]` are left untouched.
pub struct GradientColorizer {
    constants: ShaderConstants,

    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,

    bind_group_layout: Option<wgpu::BindGroupLayout>,
    ramp_ubo: Option<wgpu::Buffer>,
    /// Bound to one coverage buffer generation.
    bind_group: Option<(u64, wgpu::BindGroup)>,

    quad_vbo: Option<wgpu::Buffer>,
    quad_ibo: Option<wgpu::Buffer>,
}

impl GradientColorizer {
    pub fn new(constants: ShaderConstants) -> Self {
        Self {
            constants,
            pipeline_format: None,
            pipeline: None,
            bind_group_layout: None,
            ramp_ubo: None,
            bind_group: None,
            quad_vbo: None,
            quad_ibo: None,
        }
    }

    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        coverage: &OffscreenAlphaBuffer,
        ramp: &ColorRamp,
        opacity: f32,
        overflow: RampOverflow,
    ) {
        self.ensure_pipeline(ctx);
        self.ensure_static_buffers(ctx);
        self.ensure_bindings(ctx, coverage);

        if let Some(ubo) = self.ramp_ubo.as_ref() {
            let uniform = RampUniform::new(ramp, opacity, &self.constants, overflow);
            ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&uniform));
        }

        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some((_, bind_group)) = self.bind_group.as_ref() else { return };
        let Some(quad_vbo) = self.quad_vbo.as_ref() else { return };
        let Some(quad_ibo) = self.quad_ibo.as_ref() else { return };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("heatmap colorize pass"),
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
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.set_vertex_buffer(0, quad_vbo.slice(..));
        rpass.set_index_buffer(quad_ibo.slice(..), wgpu::IndexFormat::Uint16);
        rpass.draw_indexed(0..6, 0, 0..1);
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("heatmap colorize shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/colorize.wgsl").into()),
        });

        let bind_group_layout =
            ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("heatmap colorize bgl"),
                entries: &[
                    uniform_entry::<RampUniform>(0, wgpu::ShaderStages::FRAGMENT),
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: false },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                ],
            });

        let pipeline_layout =
            ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("heatmap colorize pipeline layout"),
                bind_group_layouts: &[&bind_group_layout],
                immediate_size: 0,
            });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("heatmap colorize pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[QuadVertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: Some(premul_alpha_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: primitive_state(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("heatmap colorize pipeline built for {:?}", ctx.surface_format);
        self.pipeline_format = Some(ctx.surface_format);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bind_group_layout);
        self.bind_group = None;
        self.ramp_ubo = None;
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>, coverage: &OffscreenAlphaBuffer) {
        let generation = coverage.generation();
        if self.ramp_ubo.is_some()
            && self.bind_group.as_ref().is_some_and(|(g, _)| *g == generation)
        {
            return;
        }
        let Some(bgl) = self.bind_group_layout.as_ref() else { return };

        let ramp_ubo = match self.ramp_ubo.take() {
            Some(ubo) => ubo,
            None => ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("heatmap ramp ubo"),
                size: std::mem::size_of::<RampUniform>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }),
        };

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("heatmap colorize bind group"),
            layout: bgl,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: ramp_ubo.as_entire_binding() },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(coverage.view()),
                },
            ],
        });

        self.ramp_ubo = Some(ramp_ubo);
        self.bind_group = Some((generation, bind_group));
    }

    fn ensure_static_buffers(&mut self, ctx: &RenderCtx<'_>) {
        if self.quad_vbo.is_some() && self.quad_ibo.is_some() {
            return;
        }

        self.quad_vbo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("heatmap colorize quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        }));
        self.quad_ibo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("heatmap colorize quad ibo"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeatmapConfig;
    use crate::coords::ViewportParams;
    use crate::device::test_gpu;
    use crate::heat::HeatPoint;
    use crate::paint::{ColorRgba, ColorStop};
    use crate::render::PointRasterizer;

    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    #[test]
    fn target_pixels_beyond_coverage_are_left_untouched() {
        let Some(gpu) = test_gpu() else { return };
        let ctx = RenderCtx::new(gpu.device(), gpu.queue(), FORMAT);
        let ramp = ColorRamp::new(vec![ColorStop::new(0.0, ColorRgba::white())]).unwrap();
        let config = HeatmapConfig::default().with_point_size(16.0).with_ramp(ramp.clone());

        // Full coverage over a 4x4 buffer, colorized into an 8x8 target.
        let coverage = OffscreenAlphaBuffer::new(gpu.device(), 4, 4, config.constants.precision);
        let (texture, view) = gpu.create_target(8, 8, FORMAT);
        gpu.clear(&view, wgpu::Color::TRANSPARENT);

        let mut points = PointRasterizer::new(config.constants);
        let mut colorizer = GradientColorizer::new(config.constants);
        let mut encoder = gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        points.render(
            &ctx,
            &mut encoder,
            &coverage,
            &[HeatPoint::new(2.0, 2.0, 1.0)],
            &config,
            &ViewportParams::new(4, 4),
        );
        colorizer.render(
            &ctx,
            &mut RenderTarget::new(&mut encoder, &view),
            &coverage,
            &ramp,
            1.0,
            RampOverflow::ClampToLast,
        );
        gpu.queue().submit(std::iter::once(encoder.finish()));
        let out = gpu.read_rgba8(&texture).unwrap();

        for y in 0..8 {
            for x in 0..8 {
                let i = (y * 8 + x) * 4;
                let expected: [u8; 4] = if x < 4 && y < 4 { [255; 4] } else { [0; 4] };
                assert_eq!(&out[i..i + 4], &expected, "pixel ({x}, {y})");
            }
        }
    }
}
