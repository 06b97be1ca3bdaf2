use glam::Vec3;

use crate::billboard::Billboard;

/// Mutable simulation state of one pooled particle.
///
/// Slots are constructed once with the system and re-initialized on every spawn.
#[derive(Debug, Clone, Default)]
pub struct Particle {
    pub billboard: Billboard,
    /// Seconds since spawn.
    pub age: f32,
    /// Lifetime resolved at spawn time (base ± jitter).
    pub lifetime: f32,
    pub velocity: Vec3,
}
