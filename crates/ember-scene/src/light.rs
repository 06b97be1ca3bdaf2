/// Point light as described by a scene file.
///
/// Plain arrays keep this crate free of math dependencies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSource {
    /// Homogeneous position; `w = 1` for a point light.
    pub position: [f32; 4],
    /// Linear RGB.
    pub color: [f32; 3],
    /// Constant, linear and quadratic attenuation.
    pub coefficients: [f32; 3],
}

impl Default for LightSource {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0, 1.0],
            color: [1.0, 1.0, 1.0],
            coefficients: [1.0, 0.0, 0.0],
        }
    }
}
