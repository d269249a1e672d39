//! GPU types and helpers shared by the heatmap passes.

use bytemuck::{Pod, Zeroable};

use crate::config::{HeatmapConfig, MAX_COLORS, RampOverflow, ShaderConstants};
use crate::coords::{Rect, ViewportParams};
use crate::paint::ColorRamp;

// ── blend ─────────────────────────────────────────────────────────────────

/// `src + dst * (1 - src.a)` on every channel.
pub(super) fn premul_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

// ── quad vertex ───────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct QuadVertex {
    pub pos: [f32; 2], // 0..1
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

pub(super) const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { pos: [0.0, 0.0] },
    QuadVertex { pos: [1.0, 0.0] },
    QuadVertex { pos: [1.0, 1.0] },
    QuadVertex { pos: [0.0, 1.0] },
];

pub(super) const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

// ── uniforms ──────────────────────────────────────────────────────────────

/// Point pass uniform (64 bytes).
///
///  offset  0  resolution       [f32; 2]
///  offset  8  translate        [f32; 2]
///  offset 16  zoom, angle, density, size
///  offset 32  min_intensity, max_intensity, intensity_scale, falloff
///  offset 48  min_zoom, _pad[3]
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct PointUniform {
    pub resolution: [f32; 2],
    pub translate: [f32; 2],
    pub zoom: f32,
    pub angle: f32,
    pub density: f32,
    pub size: f32,
    pub min_intensity: f32,
    pub max_intensity: f32,
    pub intensity_scale: f32,
    pub falloff: u32,
    pub min_zoom: f32,
    pub _pad: [f32; 3],
}

impl PointUniform {
    pub(super) fn new(
        constants: &ShaderConstants,
        config: &HeatmapConfig,
        params: &ViewportParams,
    ) -> Self {
        Self {
            resolution: params.resolution.to_array(),
            translate: params.translate.to_array(),
            zoom: params.zoom,
            angle: params.angle,
            density: params.density,
            size: config.point_size,
            min_intensity: config.intensity_range.min,
            max_intensity: config.intensity_range.max,
            intensity_scale: config.intensity_scale,
            falloff: config.falloff.as_u32(),
            min_zoom: constants.min_zoom,
            _pad: [0.0; 3],
        }
    }
}

/// Image pass uniform (32 bytes).
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct ImageUniform {
    pub resolution: [f32; 2],
    pub translate: [f32; 2],
    pub zoom: f32,
    pub angle: f32,
    pub density: f32,
    pub min_zoom: f32,
}

impl ImageUniform {
    pub(super) fn new(constants: &ShaderConstants, params: &ViewportParams) -> Self {
        Self {
            resolution: params.resolution.to_array(),
            translate: params.translate.to_array(),
            zoom: params.zoom,
            angle: params.angle,
            density: params.density,
            min_zoom: constants.min_zoom,
        }
    }
}

/// Colorize pass uniform.
///
///  offset   0  colors   [[f32; 4]; 20]
///  offset 320  offsets  [[f32; 4]; 5]   (four offsets per vec4)
///  offset 400  count, max_colors, opacity, overflow
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct RampUniform {
    pub colors: [[f32; 4]; MAX_COLORS],
    pub offsets: [[f32; 4]; MAX_COLORS / 4],
    pub count: u32,
    pub max_colors: u32,
    pub opacity: f32,
    pub overflow: u32,
}

impl RampUniform {
    pub(super) fn new(
        ramp: &ColorRamp,
        opacity: f32,
        constants: &ShaderConstants,
        overflow: RampOverflow,
    ) -> Self {
        let (colors, offsets) = ramp.pack();
        Self {
            colors,
            offsets,
            count: ramp.len().min(MAX_COLORS) as u32,
            max_colors: constants.max_colors.min(MAX_COLORS) as u32,
            opacity,
            overflow: overflow.as_u32(),
        }
    }
}

/// Image quad vertex: model-space corner + texture coordinate.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct ImageVertex {
    pub position: [f32; 2],
    pub tex_coord: [f32; 2],
}

impl ImageVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x2, // position
        1 => Float32x2  // tex_coord
    ];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ImageVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }

    pub(super) fn quad(rect: Rect) -> [ImageVertex; 4] {
        let uv = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        let c = rect.corners();
        std::array::from_fn(|i| ImageVertex { position: c[i].to_array(), tex_coord: uv[i] })
    }
}

// ── binding sizes ─────────────────────────────────────────────────────────

/// `wgpu` minimum binding size for a uniform of type `T`.
///
/// Returns `None` for zero-sized types, which wgpu treats as "unchecked".
pub(super) fn min_binding_size<T>() -> Option<std::num::NonZeroU64> {
    std::num::NonZeroU64::new(std::mem::size_of::<T>() as u64)
}

pub(super) fn uniform_entry<T>(
    binding: u32,
    visibility: wgpu::ShaderStages,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: min_binding_size::<T>(),
        },
        count: None,
    }
}

pub(super) fn primitive_state() -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        strip_index_format: None,
        front_face: wgpu::FrontFace::Ccw,
        cull_mode: None,
        polygon_mode: wgpu::PolygonMode::Fill,
        unclipped_depth: false,
        conservative: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::ColorRgba;

    #[test]
    fn uniform_sizes_match_wgsl_layouts() {
        assert_eq!(std::mem::size_of::<PointUniform>(), 64);
        assert_eq!(std::mem::size_of::<ImageUniform>(), 32);
        assert_eq!(std::mem::size_of::<RampUniform>(), 416);
        assert_eq!(std::mem::size_of::<ImageVertex>(), 16);
    }

    #[test]
    fn ramp_uniform_carries_honored_count() {
        let ramp = ColorRamp::evenly_spaced(&[ColorRgba::black(), ColorRgba::white()]).unwrap();
        let k = ShaderConstants { max_colors: 1, ..ShaderConstants::STANDARD };
        let u = RampUniform::new(&ramp, 0.7, &k, RampOverflow::Transparent);
        assert_eq!(u.count, 2);
        assert_eq!(u.max_colors, 1);
        assert_eq!(u.overflow, 1);
        assert_eq!(u.offsets[0][1], 1.0);
    }

    #[test]
    fn point_uniform_takes_zoom_floor_from_pass_constants() {
        let pass = ShaderConstants { min_zoom: 0.5, ..ShaderConstants::STANDARD };
        let config = HeatmapConfig::default().with_point_size(12.0);
        let u = PointUniform::new(&pass, &config, &ViewportParams::new(8, 4));
        assert_eq!(u.min_zoom, 0.5);
        assert_eq!(u.size, 12.0);
        assert_eq!(u.resolution, [8.0, 4.0]);
    }

    #[test]
    fn image_quad_maps_origin_to_uv_origin() {
        let q = ImageVertex::quad(Rect::new(10.0, 20.0, 30.0, 40.0));
        assert_eq!(q[0].position, [10.0, 20.0]);
        assert_eq!(q[0].tex_coord, [0.0, 0.0]);
        assert_eq!(q[2].position, [40.0, 60.0]);
        assert_eq!(q[2].tex_coord, [1.0, 1.0]);
    }
}
