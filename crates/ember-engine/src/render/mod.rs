//! GPU rendering subsystem.
//!
//! Renderers consume CPU-side data (`billboard::BillboardBatch`, plain matrices) and
//! issue GPU commands via wgpu. Each renderer owns its GPU resources (pipelines,
//! buffers, textures) and creates them lazily on first use.
//!
//! Convention:
//! - geometry is in world units, right-handed, +Y up
//! - the vertex shader applies `projection × view × world`

mod common;
mod ctx;

pub mod billboard;
pub mod triangle;

pub use ctx::{RenderCtx, RenderTarget};
