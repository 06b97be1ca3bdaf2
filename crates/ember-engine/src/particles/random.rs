/// Uniform random sampling consumed by particle spawning.
///
/// Implemented for every `rand::Rng`, so a seeded `StdRng` works in tests and a
/// thread or OS seeded generator works at runtime.
pub trait RandomSource {
    /// Returns a uniform sample in `[min, max]`, or `min` when the range is empty or not finite.
    fn random_float(&mut self, min: f32, max: f32) -> f32;
}

impl<R: rand::Rng + ?Sized> RandomSource for R {
    #[inline]
    fn random_float(&mut self, min: f32, max: f32) -> f32 {
        if !(min.is_finite() && max.is_finite()) || max <= min {
            return min;
        }
        self.random_range(min..=max)
    }
}
