//! Camera-facing billboards and the batch that turns them into GPU vertices.
//!
//! Responsibilities:
//! - the `Billboard` record embedded in every particle
//! - non-owning handles (`BillboardId`) from the batch back into a producer's slot arena
//! - the registration contract between producers and the batch (`BillboardRegistry`)
//! - CPU-side depth sorting and quad reconstruction (`BillboardBatch`)
//!
//! GPU upload and drawing live in `render::billboard`; everything here is device-free.

mod batch;
mod handle;
mod registry;
mod sort_key;
mod vertex;

pub use batch::BillboardBatch;
pub use handle::{BillboardId, BillboardOwner};
pub use registry::{BillboardRegistry, BillboardSource};
pub use sort_key::DepthKey;
pub use vertex::{BillboardVertex, QUAD_UVS, VERTICES_PER_BILLBOARD};

use glam::{Vec2, Vec3, Vec4};

/// A flat quad that always faces the camera.
///
/// `angle` is a clockwise screen-space roll in degrees about the camera's forward axis.
/// `color` is straight-alpha RGBA.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Billboard {
    pub position: Vec3,
    pub size: Vec2,
    pub angle: f32,
    pub color: Vec4,
}

impl Default for Billboard {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            size: Vec2::ONE,
            angle: 0.0,
            color: Vec4::ONE,
        }
    }
}
