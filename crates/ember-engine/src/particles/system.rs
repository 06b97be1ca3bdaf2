use std::sync::Arc;

use glam::{Quat, Vec2, Vec3};

use crate::billboard::{Billboard, BillboardId, BillboardOwner, BillboardRegistry, BillboardSource};

use super::{Particle, ParticleDescriptor, ParticleEmitter, RandomSource};

/// Fixed-capacity particle pool driven by a descriptor.
///
/// Slots live in one arena sized once at construction. `active` keeps spawn order;
/// `inactive` is a stack, so moving a slot between the two is O(1) on spawn and
/// amortized O(1) on expiry. Every slot index is in exactly one of the two sets.
///
/// Frame contract: call `update` once per frame, before the billboard batch that the
/// registry feeds rebuilds its vertices.
pub struct ParticleSystem {
    owner: BillboardOwner,
    emitter: ParticleEmitter,
    descriptor: Arc<ParticleDescriptor>,

    particles: Vec<Particle>,
    active: Vec<u32>,
    inactive: Vec<u32>,

    time_since_last_emission: f32,
    stalled: bool,
}

impl ParticleSystem {
    /// Builds the system and pre-allocates `descriptor.max_particles()` slots.
    ///
    /// `owner` must be unique among the systems feeding the same registry.
    pub fn new(
        owner: BillboardOwner,
        emitter: ParticleEmitter,
        descriptor: Arc<ParticleDescriptor>,
    ) -> Self {
        let max_particles = descriptor.max_particles();

        // Reversed so the first spawn takes slot 0.
        let inactive: Vec<u32> = (0..max_particles as u32).rev().collect();

        log::debug!("particle system {owner:?}: pool of {max_particles} particles");

        Self {
            owner,
            emitter,
            descriptor,
            particles: vec![Particle::default(); max_particles],
            active: Vec::with_capacity(max_particles),
            inactive,
            time_since_last_emission: 0.0,
            stalled: false,
        }
    }

    #[inline]
    pub fn owner(&self) -> BillboardOwner {
        self.owner
    }

    #[inline]
    pub fn descriptor(&self) -> &ParticleDescriptor {
        &self.descriptor
    }

    #[inline]
    pub fn emitter(&self) -> &ParticleEmitter {
        &self.emitter
    }

    #[inline]
    pub fn emitter_mut(&mut self) -> &mut ParticleEmitter {
        &mut self.emitter
    }

    #[inline]
    pub fn max_particles(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    #[inline]
    pub fn inactive_count(&self) -> usize {
        self.inactive.len()
    }

    /// Active particles in spawn order.
    pub fn particles(&self) -> impl Iterator<Item = &Particle> + '_ {
        self.active.iter().map(|&slot| &self.particles[slot as usize])
    }

    /// Advances the system by `dt` seconds.
    ///
    /// 1. Emits at most one particle if more than one emission period has accumulated
    ///    over the previous frames and a slot is free. Without a free slot emission
    ///    waits; this is backpressure, not an error.
    /// 2. Integrates every active particle (explicit Euler) and recolors it.
    /// 3. Retires particles whose age exceeds their lifetime and unregisters them.
    pub fn update<G, R>(&mut self, dt: f32, registry: &mut G, rng: &mut R)
    where
        G: BillboardRegistry + ?Sized,
        R: RandomSource + ?Sized,
    {
        self.emit_if_due(registry, rng);
        self.time_since_last_emission += dt;
        self.integrate(dt, registry);
    }

    /// Unregisters every active billboard and drops the system.
    pub fn release<G>(mut self, registry: &mut G)
    where
        G: BillboardRegistry + ?Sized,
    {
        for slot in self.active.drain(..) {
            registry.remove_billboard(BillboardId::new(self.owner, slot));
            self.inactive.push(slot);
        }
    }

    fn emit_if_due<G, R>(&mut self, registry: &mut G, rng: &mut R)
    where
        G: BillboardRegistry + ?Sized,
        R: RandomSource + ?Sized,
    {
        if self.time_since_last_emission <= self.descriptor.emission_period() {
            return;
        }

        let Some(slot) = self.inactive.pop() else {
            if !self.stalled {
                log::debug!("particle system {:?}: pool exhausted, emission waits", self.owner);
                self.stalled = true;
            }
            return;
        };

        self.stalled = false;
        self.time_since_last_emission = 0.0;

        self.active.push(slot);
        registry.add_billboard(BillboardId::new(self.owner, slot));

        let position = self.emitter.position();
        spawn(&mut self.particles[slot as usize], &self.descriptor, position, rng);
    }

    fn integrate<G>(&mut self, dt: f32, registry: &mut G)
    where
        G: BillboardRegistry + ?Sized,
    {
        let owner = self.owner;
        let descriptor = &*self.descriptor;
        let particles = &mut self.particles;
        let inactive = &mut self.inactive;

        self.active.retain(|&slot| {
            let p = &mut particles[slot as usize];

            p.age += dt;
            p.billboard.position += p.velocity * dt;
            p.velocity += descriptor.acceleration * dt;
            p.billboard.size += descriptor.size_growth_velocity * dt;
            p.billboard.color = descriptor.color_at(p.age);

            if p.age > p.lifetime {
                inactive.push(slot);
                registry.remove_billboard(BillboardId::new(owner, slot));
                false
            } else {
                true
            }
        });
    }
}

impl BillboardSource for ParticleSystem {
    fn billboard(&self, id: BillboardId) -> Option<&Billboard> {
        if id.owner != self.owner {
            return None;
        }
        self.particles.get(id.slot as usize).map(|p| &p.billboard)
    }
}

impl Drop for ParticleSystem {
    fn drop(&mut self) {
        if !self.active.is_empty() {
            log::warn!(
                "particle system {:?} dropped with {} billboard(s) still registered; use `release`",
                self.owner,
                self.active.len()
            );
        }
    }
}

fn spawn<R>(particle: &mut Particle, d: &ParticleDescriptor, position: Vec3, rng: &mut R)
where
    R: RandomSource + ?Sized,
{
    let size_jitter = rng.random_float(-1.0, 1.0) * d.initial_size_randomness;
    let lifetime_jitter = d.total_lifetime_randomness * rng.random_float(-1.0, 1.0);
    let angle_jitter = rng.random_float(0.0, d.initial_rotation_angle_randomness);

    particle.billboard = Billboard {
        position,
        size: d.initial_size + Vec2::splat(size_jitter),
        angle: d.initial_rotation_angle + angle_jitter,
        color: d.initial_color,
    };
    particle.age = 0.0;
    particle.lifetime = d.total_lifetime + lifetime_jitter;
    particle.velocity = perturb_in_cone(d.velocity, d.velocity_angle_randomness, rng);
}

/// Randomizes `velocity` inside a cone of half-angle `max_angle_degrees` around itself.
///
/// Two rotations: first away from the axis by a random angle in `[0, max]` about a
/// random perpendicular axis, then by a random angle in `[0, 360)` about the original
/// direction. The speed is preserved. A zero velocity is returned unchanged.
pub fn perturb_in_cone<R>(velocity: Vec3, max_angle_degrees: f32, rng: &mut R) -> Vec3
where
    R: RandomSource + ?Sized,
{
    let Some(axis) = velocity.try_normalize() else {
        return velocity;
    };

    let auxiliary = Vec3::new(
        rng.random_float(0.0, 1.0),
        rng.random_float(0.0, 1.0),
        rng.random_float(0.0, 1.0),
    );
    let perpendicular = axis
        .cross(auxiliary)
        .try_normalize()
        .unwrap_or_else(|| axis.any_orthonormal_vector());

    let deflection = rng.random_float(0.0, max_angle_degrees).to_radians();
    let deflected = Quat::from_axis_angle(perpendicular, deflection) * velocity;

    let spin = rng.random_float(0.0, 360.0).to_radians();
    Quat::from_axis_angle(axis, spin) * deflected
}

#[cfg(test)]
mod tests {
    use glam::Vec4;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::billboard::BillboardBatch;

    fn system_with(descriptor: ParticleDescriptor) -> (ParticleSystem, BillboardBatch) {
        let descriptor = Arc::new(descriptor);
        let batch = BillboardBatch::new(descriptor.max_particles());
        let system = ParticleSystem::new(
            BillboardOwner(1),
            ParticleEmitter::new(Vec3::new(0.0, 1.0, 0.0)),
            descriptor,
        );
        (system, batch)
    }

    fn steady(rate: f32, lifetime: f32, randomness: f32) -> ParticleDescriptor {
        ParticleDescriptor {
            emission_rate: rate,
            total_lifetime: lifetime,
            total_lifetime_randomness: randomness,
            ..ParticleDescriptor::fire()
        }
    }

    // ── construction ──────────────────────────────────────────────────────

    #[test]
    fn new_fills_inactive_pool() {
        let (system, batch) = system_with(steady(10.0, 2.0, 0.5));
        assert_eq!(system.max_particles(), 26);
        assert_eq!(system.inactive_count(), 26);
        assert_eq!(system.active_count(), 0);
        assert_eq!(batch.live_count(), 0);
    }

    // ── emission timing ───────────────────────────────────────────────────

    #[test]
    fn emits_on_second_and_third_frame_at_two_per_second() {
        let (mut system, mut batch) = system_with(steady(2.0, 1.0, 0.0));
        let mut rng = StdRng::seed_from_u64(1);

        system.update(0.6, &mut batch, &mut rng);
        assert_eq!(system.active_count(), 0);
        assert_eq!(batch.live_count(), 0);

        system.update(0.6, &mut batch, &mut rng);
        assert_eq!(system.active_count(), 1);

        // Third frame: second emission; the first particle (age 1.2 > 1.0) expires.
        system.update(0.6, &mut batch, &mut rng);
        assert_eq!(system.active_count(), 1);
        assert_eq!(batch.live_count(), 1);
        assert_eq!(system.particles().next().map(|p| p.age), Some(0.6));
    }

    #[test]
    fn emission_is_fixed_period() {
        // Period 0.25s, frames of 0.3s: one emission on every frame after the first.
        let (mut system, mut batch) = system_with(steady(4.0, 100.0, 0.0));
        let mut rng = StdRng::seed_from_u64(2);

        for frame in 1..=20 {
            system.update(0.3, &mut batch, &mut rng);
            assert_eq!(system.active_count(), frame - 1);
        }
    }

    #[test]
    fn short_frames_accumulate_before_emitting() {
        let (mut system, mut batch) = system_with(steady(1.0, 100.0, 0.0));
        let mut rng = StdRng::seed_from_u64(3);

        // 0.25s per frame against a 1s period: the timer exceeds 1s after five frames.
        for _ in 0..5 {
            system.update(0.25, &mut batch, &mut rng);
        }
        assert_eq!(system.active_count(), 0);

        system.update(0.25, &mut batch, &mut rng);
        assert_eq!(system.active_count(), 1);
    }

    #[test]
    fn long_run_emission_count_trails_elapsed_periods() {
        // Period 0.5s, frames of 0.125s. The timer is checked before the frame's dt
        // is added and must strictly exceed the period, so emissions land on frame 6
        // and then every fifth frame: 15 over 10s, where 10s holds 20 periods.
        let (mut system, mut batch) = system_with(steady(2.0, 100.0, 0.0));
        let mut rng = StdRng::seed_from_u64(12);

        let mut emitted_on = Vec::new();
        for frame in 1..=80 {
            let before = system.active_count();
            system.update(0.125, &mut batch, &mut rng);
            if system.active_count() > before {
                emitted_on.push(frame);
            }
        }

        assert_eq!(emitted_on.len(), 15);
        assert_eq!(emitted_on.first(), Some(&6));
        assert!(emitted_on.windows(2).all(|w| w[1] - w[0] == 5));
        assert!(emitted_on.len() < (10.0 * 2.0) as usize);
    }

    #[test]
    fn two_per_second_over_ten_long_frames_emits_nine() {
        let (mut system, mut batch) = system_with(steady(2.0, 100.0, 0.0));
        let mut rng = StdRng::seed_from_u64(13);
        for _ in 0..10 {
            system.update(0.6, &mut batch, &mut rng);
        }
        assert_eq!(system.active_count(), 9);
    }

    #[test]
    fn zero_rate_never_emits() {
        let (mut system, mut batch) = system_with(steady(0.0, 1.0, 0.0));
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..100 {
            system.update(1.0, &mut batch, &mut rng);
        }
        assert_eq!(system.active_count(), 0);
    }

    #[test]
    fn exhausted_pool_waits_then_resumes() {
        // Negative jitter sizes the pool at one slot while lifetimes reach 2s, so the slot
        // is often still busy when the next emission is due (every 0.2s frame).
        let (mut system, mut batch) = system_with(steady(10.0, 1.0, -1.0));
        let mut rng = StdRng::seed_from_u64(6);
        assert_eq!(system.max_particles(), 1);

        let mut stalled_frames = 0;
        let mut spawns = 0;
        for _ in 0..200 {
            system.update(0.2, &mut batch, &mut rng);
            assert_eq!(system.active_count() + system.inactive_count(), 1);

            match system.particles().next().map(|p| p.age) {
                Some(age) if age == 0.2 => spawns += 1,
                Some(_) => stalled_frames += 1,
                None => {}
            }
        }
        assert!(stalled_frames > 0);
        assert!(spawns > 1);
    }

    // ── pool invariants ───────────────────────────────────────────────────

    #[test]
    fn pool_is_conserved_and_registrations_match() {
        let (mut system, mut batch) = system_with(steady(30.0, 0.8, 0.3));
        let mut rng = StdRng::seed_from_u64(5);
        let max = system.max_particles();

        for frame in 0..2000 {
            let dt = if frame % 3 == 0 { 0.05 } else { 0.016 };
            system.update(dt, &mut batch, &mut rng);

            assert_eq!(system.active_count() + system.inactive_count(), max);
            assert_eq!(batch.live_count(), system.active_count());
            assert!(batch.live_count() <= batch.capacity());
        }
        assert!(system.active_count() > 0);
    }

    #[test]
    fn active_particles_are_registered_by_slot() {
        let (mut system, mut batch) = system_with(steady(20.0, 1.0, 0.0));
        let mut rng = StdRng::seed_from_u64(6);
        for _ in 0..30 {
            system.update(0.06, &mut batch, &mut rng);
        }

        for id in batch.registered() {
            assert_eq!(id.owner, system.owner());
            assert!(system.billboard(id).is_some());
        }
    }

    // ── spawn state ───────────────────────────────────────────────────────

    #[test]
    fn spawned_lifetime_stays_within_jitter() {
        let (mut system, mut batch) = system_with(steady(50.0, 1.0, 0.3));
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..500 {
            system.update(0.021, &mut batch, &mut rng);
            for p in system.particles() {
                assert!(p.lifetime >= 0.7 - 1e-6 && p.lifetime <= 1.3 + 1e-6);
            }
        }
    }

    #[test]
    fn spawn_resets_state_from_descriptor() {
        let d = ParticleDescriptor {
            emission_rate: 1.0,
            initial_size: Vec2::new(2.0, 3.0),
            initial_size_randomness: 0.0,
            initial_rotation_angle: 15.0,
            initial_rotation_angle_randomness: 0.0,
            velocity_angle_randomness: 0.0,
            velocity: Vec3::new(0.0, 2.0, 0.0),
            acceleration: Vec3::ZERO,
            size_growth_velocity: Vec2::ZERO,
            ..steady(1.0, 10.0, 0.0)
        };
        let (mut system, mut batch) = system_with(d);
        let mut rng = StdRng::seed_from_u64(8);

        system.update(1.5, &mut batch, &mut rng);
        system.update(0.5, &mut batch, &mut rng);

        let p = system.particles().next().cloned().unwrap();
        assert_eq!(p.age, 0.5);
        assert_eq!(p.billboard.size, Vec2::new(2.0, 3.0));
        assert_eq!(p.billboard.angle, 15.0);
        assert!(p.velocity.abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1e-5));
        // Spawned at the emitter, then moved once by velocity × dt.
        assert!(p.billboard.position.abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1e-5));
    }

    #[test]
    fn integration_is_explicit_euler() {
        let d = ParticleDescriptor {
            velocity: Vec3::new(1.0, 0.0, 0.0),
            velocity_angle_randomness: 0.0,
            acceleration: Vec3::new(0.0, -10.0, 0.0),
            initial_size: Vec2::ONE,
            initial_size_randomness: 0.0,
            size_growth_velocity: Vec2::new(1.0, 2.0),
            ..steady(1.0, 10.0, 0.0)
        };
        let (mut system, mut batch) = system_with(d);
        let mut rng = StdRng::seed_from_u64(9);

        system.update(2.0, &mut batch, &mut rng); // nothing yet, timer = 2
        system.update(0.5, &mut batch, &mut rng); // spawn + first step
        system.update(0.5, &mut batch, &mut rng);

        let p = system.particles().next().cloned().unwrap();
        // Position uses the velocity from before this step's acceleration.
        assert!(p.billboard.position.abs_diff_eq(Vec3::new(1.0, 1.0 - 2.5, 0.0), 1e-5));
        assert!(p.velocity.abs_diff_eq(Vec3::new(1.0, -10.0, 0.0), 1e-5));
        assert!(p.billboard.size.abs_diff_eq(Vec2::new(2.0, 3.0), 1e-5));
    }

    #[test]
    fn color_follows_descriptor_phases() {
        let d = ParticleDescriptor {
            initial_color: Vec4::new(1.0, 0.0, 0.0, 1.0),
            mid_color: Vec4::new(0.0, 1.0, 0.0, 1.0),
            end_color: Vec4::new(0.0, 0.0, 1.0, 0.0),
            fade_in_time: 0.2,
            fade_out_time: 0.5,
            ..steady(1.0, 4.0, 0.0)
        };
        let (mut system, mut batch) = system_with(d.clone());
        let mut rng = StdRng::seed_from_u64(10);

        system.update(1.5, &mut batch, &mut rng);
        system.update(1.0, &mut batch, &mut rng);
        let p = system.particles().next().cloned().unwrap();
        assert_eq!(p.billboard.color, d.mid_color);
        assert_eq!(p.billboard.color, d.color_at(p.age));
    }

    #[test]
    fn jittered_lifetime_does_not_move_fade_out_start() {
        let d = ParticleDescriptor {
            mid_color: Vec4::new(0.0, 1.0, 0.0, 1.0),
            end_color: Vec4::new(0.0, 0.0, 1.0, 0.0),
            fade_in_time: 0.1,
            fade_out_time: 0.5,
            ..steady(10.0, 2.0, 1.0)
        };
        let fade_out_start = d.total_lifetime - d.fade_out_time;
        let (mut system, mut batch) = system_with(d.clone());
        let mut rng = StdRng::seed_from_u64(3);

        // Short-lived particles that reach their own `lifetime - fade_out` before the
        // shared fade-out start must still hold mid color there.
        let mut checked = 0;
        for _ in 0..120 {
            system.update(0.05, &mut batch, &mut rng);
            for p in system.particles() {
                if p.age >= d.fade_in_time && p.age < fade_out_start {
                    assert_eq!(p.billboard.color, d.mid_color);
                    if p.age >= p.lifetime - d.fade_out_time {
                        checked += 1;
                    }
                }
            }
        }
        assert!(checked > 0);
    }

    // ── expiry ────────────────────────────────────────────────────────────

    #[test]
    fn expired_particle_leaves_batch_in_same_update() {
        let (mut system, mut batch) = system_with(steady(1.0, 1.0, 0.0));
        let mut rng = StdRng::seed_from_u64(11);

        system.update(1.5, &mut batch, &mut rng);
        system.update(0.9, &mut batch, &mut rng); // spawned, age 0.9
        assert_eq!(batch.live_count(), 1);

        // No second emission (timer 0.9 < 1.0); age crosses 1.0 now.
        system.update(0.2, &mut batch, &mut rng);
        assert_eq!(system.active_count(), 0);
        assert_eq!(batch.live_count(), 0);
        assert_eq!(system.inactive_count(), system.max_particles());
    }

    #[test]
    fn expiring_several_particles_in_one_frame_skips_none() {
        let (mut system, mut batch) = system_with(steady(10.0, 1.0, 0.0));
        let mut rng = StdRng::seed_from_u64(12);

        for _ in 0..8 {
            system.update(0.11, &mut batch, &mut rng);
        }
        assert!(system.active_count() >= 6);

        // One huge step ages everything past its lifetime, including this frame's spawn.
        system.update(5.0, &mut batch, &mut rng);
        assert_eq!(system.active_count(), 0);
        assert_eq!(batch.live_count(), 0);
        assert_eq!(system.inactive_count(), system.max_particles());
    }

    // ── teardown ──────────────────────────────────────────────────────────

    #[test]
    fn release_unregisters_every_active_billboard() {
        let (mut system, mut batch) = system_with(steady(20.0, 2.0, 0.0));
        let mut rng = StdRng::seed_from_u64(13);
        for _ in 0..20 {
            system.update(0.06, &mut batch, &mut rng);
        }
        assert!(batch.live_count() > 0);

        system.release(&mut batch);
        assert_eq!(batch.live_count(), 0);
    }

    #[test]
    fn systems_resolve_only_their_own_handles() {
        let (mut a, mut batch) = system_with(steady(5.0, 10.0, 0.0));
        let mut rng = StdRng::seed_from_u64(14);
        a.update(0.3, &mut batch, &mut rng);
        a.update(0.3, &mut batch, &mut rng);

        let foreign = BillboardId::new(BillboardOwner(99), 0);
        assert!(a.billboard(foreign).is_none());

        let systems = [a];
        let mine = BillboardId::new(BillboardOwner(1), 0);
        assert!(systems.as_slice().billboard(mine).is_some());
    }

    // ── cone perturbation ─────────────────────────────────────────────────

    #[test]
    fn cone_perturbation_respects_half_angle() {
        let velocity = Vec3::new(0.3, 4.0, -1.2);
        for seed in [1u64, 17, 4242, 99_991] {
            let mut rng = StdRng::seed_from_u64(seed);
            for max in [0.0f32, 5.0, 20.0, 45.0, 90.0] {
                for _ in 0..1000 {
                    let v = perturb_in_cone(velocity, max, &mut rng);
                    let angle = velocity.angle_between(v).to_degrees();
                    assert!(angle <= max + 0.1, "angle {angle} exceeds {max}");
                    assert!((v.length() - velocity.length()).abs() < 1e-3);
                }
            }
        }
    }

    #[test]
    fn cone_perturbation_spreads_around_axis() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut sum = Vec3::ZERO;
        let mut widest = 0.0f32;
        for _ in 0..2000 {
            let v = perturb_in_cone(Vec3::Y, 30.0, &mut rng);
            sum += v;
            widest = widest.max(Vec3::Y.angle_between(v).to_degrees());
        }
        // Deflections cancel sideways and some samples reach the rim.
        let mean = sum / 2000.0;
        assert!(mean.x.abs() < 0.05 && mean.z.abs() < 0.05);
        assert!(widest > 25.0);
    }

    #[test]
    fn zero_velocity_is_not_perturbed() {
        let mut rng = StdRng::seed_from_u64(22);
        assert_eq!(perturb_in_cone(Vec3::ZERO, 45.0, &mut rng), Vec3::ZERO);
    }
}
