use glam::Mat4;

/// Projection half of a camera. Angles in degrees, distances in world units.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Projection {
    Perspective {
        fov_y_degrees: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
    Orthographic {
        /// Half of the visible height at any depth.
        half_height: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
}

impl Projection {
    pub fn perspective(fov_y_degrees: f32, aspect: f32) -> Self {
        Self::Perspective {
            fov_y_degrees,
            aspect,
            near: 0.1,
            far: 100.0,
        }
    }

    pub fn orthographic(half_height: f32, aspect: f32) -> Self {
        Self::Orthographic {
            half_height,
            aspect,
            near: 0.1,
            far: 100.0,
        }
    }

    #[inline]
    pub fn aspect(&self) -> f32 {
        match *self {
            Self::Perspective { aspect, .. } | Self::Orthographic { aspect, .. } => aspect,
        }
    }

    pub fn set_aspect(&mut self, value: f32) {
        // A minimized window reports 0×0; keep the last usable ratio.
        if !(value.is_finite() && value > 0.0) {
            return;
        }
        match self {
            Self::Perspective { aspect, .. } | Self::Orthographic { aspect, .. } => *aspect = value,
        }
    }

    /// Right-handed projection with wgpu's `[0, 1]` clip depth.
    pub fn matrix(&self) -> Mat4 {
        match *self {
            Self::Perspective {
                fov_y_degrees,
                aspect,
                near,
                far,
            } => Mat4::perspective_rh(fov_y_degrees.to_radians(), aspect, near, far),
            Self::Orthographic {
                half_height,
                aspect,
                near,
                far,
            } => {
                let half_width = half_height * aspect;
                Mat4::orthographic_rh(-half_width, half_width, -half_height, half_height, near, far)
            }
        }
    }

    /// Swaps between perspective and orthographic, keeping aspect and depth range.
    ///
    /// The orthographic half-height is chosen so objects at `focus_distance` keep their
    /// on-screen size; the reverse direction restores a 60° field of view.
    pub fn toggled(&self, focus_distance: f32) -> Self {
        match *self {
            Self::Perspective {
                fov_y_degrees,
                aspect,
                near,
                far,
            } => Self::Orthographic {
                half_height: focus_distance * (fov_y_degrees.to_radians() * 0.5).tan(),
                aspect,
                near,
                far,
            },
            Self::Orthographic {
                aspect, near, far, ..
            } => Self::Perspective {
                fov_y_degrees: 60.0,
                aspect,
                near,
                far,
            },
        }
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::perspective(60.0, 16.0 / 9.0)
    }
}
