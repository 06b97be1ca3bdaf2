//! Shared GPU types and utilities used by the renderers.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

// ── blend ─────────────────────────────────────────────────────────────────

/// Classic `SRC_ALPHA, ONE_MINUS_SRC_ALPHA` blending for straight-alpha colors.
pub(super) fn straight_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
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

// ── primitive state ───────────────────────────────────────────────────────

/// Filled triangle list, no culling.
pub(super) fn triangle_list() -> wgpu::PrimitiveState {
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

// ── camera uniform ────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub world: [[f32; 4]; 4],
}

impl CameraUniform {
    pub(super) fn new(view_proj: Mat4, world: Mat4) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            world: world.to_cols_array_2d(),
        }
    }
}

// ── uniform binding size ──────────────────────────────────────────────────

/// Returns the `wgpu` minimum binding size for a uniform of type `T`.
///
/// Every uniform struct in this module has fields, so its size is non-zero.
pub(super) fn uniform_min_binding_size<T: Pod>() -> std::num::NonZeroU64 {
    std::num::NonZeroU64::new(std::mem::size_of::<T>() as u64)
        .expect("uniform types have non-zero size by construction")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_uniform_is_two_column_major_matrices() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 128);

        let u = CameraUniform::new(Mat4::from_translation(glam::Vec3::new(1.0, 2.0, 3.0)), Mat4::IDENTITY);
        assert_eq!(u.view_proj[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(u.world, Mat4::IDENTITY.to_cols_array_2d());
    }
}
