//! GPU device and window surface.
//!
//! `Gpu` owns the device, queue and the configured surface of the runtime's window.
//! Frames are acquired and presented through `core::FrameCtx::render`.

mod gpu;

pub use gpu::{Gpu, GpuInit};
pub(crate) use gpu::{FrameAcquire, GpuFrame};
