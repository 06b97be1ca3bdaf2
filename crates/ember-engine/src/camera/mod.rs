//! Look-at camera with a switchable projection.
//!
//! Conventions: right-handed world, +Y up, the camera looks down its local -Z.
//! View-space depth is therefore negative in front of the camera, which is what the
//! billboard batch's back-to-front ordering relies on.

mod projection;

pub use projection::Projection;

use glam::{Mat4, Quat, Vec3};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub projection: Projection,
}

impl Camera {
    pub fn new(eye: Vec3, target: Vec3, projection: Projection) -> Self {
        Self {
            eye,
            target,
            up: Vec3::Y,
            projection,
        }
    }

    #[inline]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    #[inline]
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection.matrix()
    }

    #[inline]
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.projection.set_aspect(aspect);
    }

    pub fn toggle_projection(&mut self) {
        let focus = self.eye.distance(self.target);
        self.projection = self.projection.toggled(focus);
    }

    /// Rotates the eye about the target around the up axis.
    pub fn orbit(&mut self, yaw_degrees: f32) {
        let axis = self.up.normalize_or(Vec3::Y);
        let offset = self.eye - self.target;
        self.eye = self.target + Quat::from_axis_angle(axis, yaw_degrees.to_radians()) * offset;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 1.5, 6.0), Vec3::new(0.0, 1.0, 0.0), Projection::default())
    }
}
