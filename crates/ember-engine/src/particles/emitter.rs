use glam::{Mat4, Vec3};

/// Point emitter supplying spawn positions.
///
/// Without a parent the emitter sits at `position` in world space. With a parent
/// transform, `position` is local to that transform, so the emitter follows it.
#[derive(Debug, Clone, Default)]
pub struct ParticleEmitter {
    position: Vec3,
    parent: Option<Mat4>,
}

impl ParticleEmitter {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            parent: None,
        }
    }

    pub fn with_parent(position: Vec3, parent_world: Mat4) -> Self {
        Self {
            position,
            parent: Some(parent_world),
        }
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Replaces (or clears) the parent's world transform. Call whenever the parent moves.
    pub fn set_parent_transform(&mut self, parent_world: Option<Mat4>) {
        self.parent = parent_world;
    }

    /// World-space spawn position.
    pub fn position(&self) -> Vec3 {
        match self.parent {
            Some(world) => world.transform_point3(self.position),
            None => self.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Quat;

    use super::*;

    #[test]
    fn unparented_emitter_uses_its_own_position() {
        let e = ParticleEmitter::new(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(e.position(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn parented_emitter_follows_parent_translation() {
        let parent = Mat4::from_translation(Vec3::new(10.0, 0.0, -4.0));
        let e = ParticleEmitter::with_parent(Vec3::ZERO, parent);
        assert_eq!(e.position(), Vec3::new(10.0, 0.0, -4.0));
    }

    #[test]
    fn local_offset_is_rotated_by_parent() {
        let parent = Mat4::from_rotation_translation(
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            Vec3::new(0.0, 5.0, 0.0),
        );
        let mut e = ParticleEmitter::with_parent(Vec3::X, parent);
        assert!(e.position().abs_diff_eq(Vec3::new(0.0, 5.0, -1.0), 1e-5));

        e.set_parent_transform(None);
        assert_eq!(e.position(), Vec3::X);
    }
}
