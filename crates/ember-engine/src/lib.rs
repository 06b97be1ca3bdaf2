//! Ember engine crate.
//!
//! CPU-side particle simulation and billboard batching, plus the platform + GPU
//! runtime pieces (window loop, wgpu device, renderers) that display them.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod camera;
pub mod billboard;
pub mod particles;
pub mod render;
