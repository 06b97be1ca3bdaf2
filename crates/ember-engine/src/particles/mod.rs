//! CPU particle simulation.
//!
//! A `ParticleSystem` owns a fixed arena of particles split into an active and an
//! inactive set. Every frame it emits at a fixed period from its `ParticleEmitter`,
//! integrates the active particles according to a shared `ParticleDescriptor`, and
//! recycles the expired ones. Each active particle's billboard is registered with a
//! `BillboardRegistry` (usually the `BillboardBatch` that draws it).

mod descriptor;
mod emitter;
mod particle;
mod random;
mod system;

pub use descriptor::{FadeInterpolation, ParticleDescriptor};
pub use emitter::ParticleEmitter;
pub use particle::Particle;
pub use random::RandomSource;
pub use system::{ParticleSystem, perturb_in_cone};
