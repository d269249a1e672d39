use wgpu::util::DeviceExt;

use crate::config::{HeatmapConfig, ShaderConstants};
use crate::coords::ViewportParams;
use crate::heat::HeatPoint;

use super::common::{
    PointUniform, QUAD_INDICES, QUAD_VERTICES, QuadVertex, premul_alpha_blend, primitive_state,
    uniform_entry,
};
use super::offscreen::OffscreenAlphaBuffer;
use super::RenderCtx;

/// Point pass: draws one disc sprite per [`HeatPoint`] into the coverage
/// buffer.
///
/// Each fragment writes `(0, 0, 0, a)` with premultiplied source-over, so
/// overlapping discs accumulate `a + dst * (1 - a)`.
pub struct PointRasterizer {
    constants: ShaderConstants,

    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,

    bind_group_layout: Option<wgpu::BindGroupLayout>,
    bind_group: Option<wgpu::BindGroup>,
    uniform_ubo: Option<wgpu::Buffer>,

    quad_vbo: Option<wgpu::Buffer>,
    quad_ibo: Option<wgpu::Buffer>,

    instance_vbo: Option<wgpu::Buffer>,
    instance_capacity: usize,

    warned_invalid_params: bool,
}

impl PointRasterizer {
    pub fn new(constants: ShaderConstants) -> Self {
        Self {
            constants,
            pipeline_format: None,
            pipeline: None,
            bind_group_layout: None,
            bind_group: None,
            uniform_ubo: None,
            quad_vbo: None,
            quad_ibo: None,
            instance_vbo: None,
            instance_capacity: 0,
            warned_invalid_params: false,
        }
    }

    /// Clears `target` to `default_alpha` and accumulates `points` into it.
    ///
    /// An empty batch still clears. Non-finite points are skipped. The
    /// pipeline is keyed on the coverage format, not `ctx.surface_format`.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        target: &OffscreenAlphaBuffer,
        points: &[HeatPoint],
        config: &HeatmapConfig,
        params: &ViewportParams,
    ) {
        let (device, queue) = (ctx.device, ctx.queue);
        self.ensure_pipeline(device, target.format());
        self.ensure_static_buffers(device);
        self.ensure_bindings(device);

        let instances: Vec<HeatPoint> = if points.iter().all(|p| p.is_finite()) {
            points.to_vec()
        } else {
            let kept: Vec<HeatPoint> = points.iter().copied().filter(|p| p.is_finite()).collect();
            log::trace!("skipped {} non-finite heat points", points.len() - kept.len());
            kept
        };

        if !params.is_valid() && !self.warned_invalid_params {
            log::warn!("heatmap point pass skipped: invalid viewport {params:?}");
            self.warned_invalid_params = true;
        }
        let draw = !instances.is_empty() && config.point_size > 0.0 && params.is_valid();
        if draw {
            self.write_uniform(queue, config, params);
            self.ensure_instance_capacity(device, instances.len());
            if let Some(instance_vbo) = self.instance_vbo.as_ref() {
                queue.write_buffer(instance_vbo, 0, bytemuck::cast_slice(&instances));
            }
        }

        let clear = self.constants.default_alpha as f64;
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("heatmap point pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.view(),
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color { r: 0.0, g: 0.0, b: 0.0, a: clear }),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        if !draw {
            return;
        }

        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(bind_group) = self.bind_group.as_ref() else { return };
        let Some(quad_vbo) = self.quad_vbo.as_ref() else { return };
        let Some(quad_ibo) = self.quad_ibo.as_ref() else { return };
        let Some(instance_vbo) = self.instance_vbo.as_ref() else { return };

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.set_vertex_buffer(0, quad_vbo.slice(..));
        rpass.set_vertex_buffer(1, instance_vbo.slice(..));
        rpass.set_index_buffer(quad_ibo.slice(..), wgpu::IndexFormat::Uint16);
        rpass.draw_indexed(0..6, 0, 0..instances.len() as u32);
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn ensure_pipeline(&mut self, device: &wgpu::Device, format: wgpu::TextureFormat) {
        if self.pipeline_format == Some(format) && self.pipeline.is_some() {
            return;
        }

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("heatmap point shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/points.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("heatmap point bgl"),
            entries: &[uniform_entry::<PointUniform>(
                0,
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            )],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("heatmap point pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("heatmap point pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[QuadVertex::layout(), HeatPoint::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
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

        log::debug!("heatmap point pipeline built for {format:?}");
        self.pipeline_format = Some(format);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bind_group_layout);
        self.bind_group = None;
        self.uniform_ubo = None;
    }

    fn ensure_bindings(&mut self, device: &wgpu::Device) {
        if self.bind_group.is_some() && self.uniform_ubo.is_some() {
            return;
        }
        let Some(bgl) = self.bind_group_layout.as_ref() else { return };

        let uniform_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("heatmap point ubo"),
            size: std::mem::size_of::<PointUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("heatmap point bind group"),
            layout: bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_ubo.as_entire_binding(),
            }],
        });

        self.uniform_ubo = Some(uniform_ubo);
        self.bind_group = Some(bind_group);
    }

    fn ensure_static_buffers(&mut self, device: &wgpu::Device) {
        if self.quad_vbo.is_some() && self.quad_ibo.is_some() {
            return;
        }

        self.quad_vbo = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("heatmap point quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        }));
        self.quad_ibo = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("heatmap point quad ibo"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        }));
    }

    fn write_uniform(&self, queue: &wgpu::Queue, config: &HeatmapConfig, params: &ViewportParams) {
        let Some(ubo) = self.uniform_ubo.as_ref() else { return };
        let uniform = PointUniform::new(&self.constants, config, params);
        queue.write_buffer(ubo, 0, bytemuck::bytes_of(&uniform));
    }

    fn ensure_instance_capacity(&mut self, device: &wgpu::Device, required: usize) {
        if required <= self.instance_capacity && self.instance_vbo.is_some() {
            return;
        }
        let new_cap = required.next_power_of_two().max(64);
        let new_size = (new_cap * std::mem::size_of::<HeatPoint>()) as u64;
        self.instance_vbo = Some(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("heatmap point instance vbo"),
            size: new_size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.instance_capacity = new_cap;
    }
}
