use bytemuck::{Pod, Zeroable};

use crate::coords::Vec2;

/// A weighted sample in model space.
///
/// Layout doubles as the per-instance vertex stream of the point pass, so a
/// `&[HeatPoint]` uploads without conversion.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct HeatPoint {
    pub position: [f32; 2],
    pub intensity: f32,
}

impl HeatPoint {
    #[inline]
    pub const fn new(x: f32, y: f32, intensity: f32) -> Self {
        Self { position: [x, y], intensity }
    }

    #[inline]
    pub fn pos(self) -> Vec2 {
        Vec2::new(self.position[0], self.position[1])
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.position[0].is_finite() && self.position[1].is_finite() && self.intensity.is_finite()
    }

    pub(crate) const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        1 => Float32x2, // position
        2 => Float32    // intensity
    ];

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<HeatPoint>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_stride_is_twelve_bytes() {
        assert_eq!(std::mem::size_of::<HeatPoint>(), 12);
        assert_eq!(HeatPoint::layout().array_stride, 12);
    }

    #[test]
    fn nan_intensity_is_not_finite() {
        assert!(!HeatPoint::new(0.0, 0.0, f32::NAN).is_finite());
        assert!(HeatPoint::new(1.0, 2.0, 3.0).is_finite());
    }
}
