use glam::{Vec2, Vec3, Vec4};

/// How the fade-in and fade-out phases turn age into a blend factor.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum FadeInterpolation {
    /// Fade-in blends with `age`, fade-out with `age - fade_out_time`, both in seconds
    /// and unclamped. The visible fade speed therefore depends on the time unit.
    #[default]
    Literal,
    /// Each fade phase is mapped onto `[0, 1]` over its own duration.
    Normalized,
}

/// Spawn and evolution rules shared by every particle of one system.
///
/// Times are in seconds, angles in degrees, sizes and velocities in world units.
/// Colors are straight-alpha RGBA.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleDescriptor {
    /// Particles per second.
    pub emission_rate: f32,

    pub total_lifetime: f32,
    /// Lifetime jitter; a spawned particle lives `total_lifetime ± total_lifetime_randomness`.
    pub total_lifetime_randomness: f32,

    pub initial_color: Vec4,
    pub mid_color: Vec4,
    pub end_color: Vec4,
    pub fade_in_time: f32,
    pub fade_out_time: f32,
    pub fade_interpolation: FadeInterpolation,

    pub initial_size: Vec2,
    /// Uniform jitter added to both size components at spawn.
    pub initial_size_randomness: f32,
    pub size_growth_velocity: Vec2,

    pub velocity: Vec3,
    pub acceleration: Vec3,
    /// Half-angle of the spawn direction cone around `velocity`.
    pub velocity_angle_randomness: f32,

    pub initial_rotation_angle: f32,
    pub initial_rotation_angle_randomness: f32,
}

impl ParticleDescriptor {
    /// Rising fire plume: orange to transparent grey.
    pub fn fire() -> Self {
        Self {
            emission_rate: 25.0,
            total_lifetime: 2.5,
            total_lifetime_randomness: 0.4,
            initial_color: Vec4::new(1.0, 0.7, 0.0, 0.0),
            mid_color: Vec4::new(1.0, 0.5, 0.0, 1.0),
            end_color: Vec4::new(0.5, 0.5, 0.5, 0.0),
            fade_in_time: 0.2,
            fade_out_time: 0.7,
            fade_interpolation: FadeInterpolation::Literal,
            initial_size: Vec2::splat(0.5),
            initial_size_randomness: 0.2,
            size_growth_velocity: Vec2::splat(0.7),
            velocity: Vec3::new(0.0, 0.8, 0.0),
            acceleration: Vec3::new(0.0, -0.2, 0.0),
            velocity_angle_randomness: 20.0,
            initial_rotation_angle: 0.0,
            initial_rotation_angle_randomness: 360.0,
        }
    }

    /// Slow, long-lived grey smoke.
    pub fn smoke() -> Self {
        Self {
            emission_rate: 6.0,
            total_lifetime: 5.0,
            total_lifetime_randomness: 1.0,
            initial_color: Vec4::new(0.4, 0.4, 0.4, 0.0),
            mid_color: Vec4::new(0.35, 0.35, 0.35, 0.6),
            end_color: Vec4::new(0.3, 0.3, 0.3, 0.0),
            fade_in_time: 0.5,
            fade_out_time: 1.5,
            fade_interpolation: FadeInterpolation::Literal,
            initial_size: Vec2::splat(0.8),
            initial_size_randomness: 0.3,
            size_growth_velocity: Vec2::splat(0.4),
            velocity: Vec3::new(0.0, 0.5, 0.0),
            acceleration: Vec3::new(0.05, 0.02, 0.0),
            velocity_angle_randomness: 35.0,
            initial_rotation_angle: 0.0,
            initial_rotation_angle_randomness: 180.0,
        }
    }

    /// Pool size that covers steady-state emission without running dry:
    /// `floor(rate × (lifetime + lifetime_randomness)) + 1`.
    pub fn max_particles(&self) -> usize {
        let alive = self.emission_rate * (self.total_lifetime + self.total_lifetime_randomness);
        // `as` saturates: negative or NaN products collapse to 0.
        alive.floor() as usize + 1
    }

    /// Fixed time between two emissions. Infinite for a zero rate.
    #[inline]
    pub fn emission_period(&self) -> f32 {
        1.0 / self.emission_rate
    }

    /// Color of a particle of the given `age`.
    ///
    /// Phases: `[0, fade_in)` initial → mid, `[fade_in, total_lifetime - fade_out)` mid,
    /// `[total_lifetime - fade_out, ..)` mid → end. The bounds use the base lifetime, so
    /// every particle of a system changes phase at the same age whatever its jitter.
    pub fn color_at(&self, age: f32) -> Vec4 {
        let fade_out_start = self.total_lifetime - self.fade_out_time;

        if age < self.fade_in_time {
            let t = match self.fade_interpolation {
                FadeInterpolation::Literal => age,
                FadeInterpolation::Normalized => (age / self.fade_in_time).clamp(0.0, 1.0),
            };
            self.initial_color.lerp(self.mid_color, t)
        } else if age < fade_out_start {
            self.mid_color
        } else {
            let t = match self.fade_interpolation {
                FadeInterpolation::Literal => age - self.fade_out_time,
                FadeInterpolation::Normalized if self.fade_out_time > 0.0 => {
                    ((age - fade_out_start) / self.fade_out_time).clamp(0.0, 1.0)
                }
                FadeInterpolation::Normalized => 1.0,
            };
            self.mid_color.lerp(self.end_color, t)
        }
    }
}

impl Default for ParticleDescriptor {
    fn default() -> Self {
        Self::fire()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palette() -> ParticleDescriptor {
        ParticleDescriptor {
            initial_color: Vec4::new(1.0, 0.0, 0.0, 0.0),
            mid_color: Vec4::new(0.0, 1.0, 0.0, 1.0),
            end_color: Vec4::new(0.0, 0.0, 1.0, 0.0),
            fade_in_time: 0.5,
            fade_out_time: 1.0,
            total_lifetime: 3.0,
            ..ParticleDescriptor::fire()
        }
    }

    // ── pool sizing ───────────────────────────────────────────────────────

    #[test]
    fn max_particles_truncates_then_adds_one() {
        let d = ParticleDescriptor {
            emission_rate: 10.0,
            total_lifetime: 2.0,
            total_lifetime_randomness: 0.55,
            ..ParticleDescriptor::fire()
        };
        assert_eq!(d.max_particles(), 26);
    }

    #[test]
    fn zero_rate_still_gets_one_slot() {
        let d = ParticleDescriptor {
            emission_rate: 0.0,
            ..ParticleDescriptor::fire()
        };
        assert_eq!(d.max_particles(), 1);
        assert!(d.emission_period().is_infinite());
    }

    // ── literal fades ─────────────────────────────────────────────────────

    #[test]
    fn color_at_birth_is_initial_color() {
        let d = palette();
        assert_eq!(d.color_at(0.0), d.initial_color);
    }

    #[test]
    fn fade_in_blends_by_raw_age() {
        let d = palette();
        let c = d.color_at(0.25);
        assert!(c.abs_diff_eq(d.initial_color.lerp(d.mid_color, 0.25), 1e-6));
    }

    #[test]
    fn middle_phase_holds_mid_color() {
        let d = palette();
        assert_eq!(d.color_at(0.5), d.mid_color);
        assert_eq!(d.color_at(1.9), d.mid_color);
    }

    #[test]
    fn fade_out_starts_from_mid_when_lifetime_is_twice_fade_out() {
        // Literal parameter at the phase start is `total_lifetime - 2 × fade_out` = 0.
        let d = ParticleDescriptor {
            total_lifetime: 2.0,
            ..palette()
        };
        assert!(d.color_at(1.0).abs_diff_eq(d.mid_color, 1e-6));
    }

    #[test]
    fn fade_out_blends_by_age_minus_fade_out_time() {
        let d = palette();
        let c = d.color_at(2.5);
        assert!(c.abs_diff_eq(d.mid_color.lerp(d.end_color, 1.5), 1e-6));
    }

    #[test]
    fn fade_out_starts_at_base_lifetime_regardless_of_jitter() {
        let d = ParticleDescriptor {
            total_lifetime_randomness: 1.0,
            ..palette()
        };
        // A particle that resolved to a 2s lifetime still holds mid color until 2s.
        assert_eq!(d.color_at(1.5), d.mid_color);
        assert_eq!(d.color_at(1.99), d.mid_color);
        assert_ne!(d.color_at(2.5), d.mid_color);
    }

    // ── normalized fades ──────────────────────────────────────────────────

    #[test]
    fn normalized_fades_reach_exact_endpoints() {
        let d = ParticleDescriptor {
            fade_interpolation: FadeInterpolation::Normalized,
            total_lifetime: 4.0,
            ..palette()
        };
        assert!(d.color_at(0.25).abs_diff_eq(d.initial_color.lerp(d.mid_color, 0.5), 1e-6));
        assert!(d.color_at(3.0).abs_diff_eq(d.mid_color, 1e-6));
        assert!(d.color_at(4.0).abs_diff_eq(d.end_color, 1e-6));
        assert!(d.color_at(9.0).abs_diff_eq(d.end_color, 1e-6));
    }
}
