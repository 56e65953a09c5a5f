use std::fmt;
use std::sync::Arc;

/// A scalar function of elapsed time.
pub type Converter = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// Time-based travel along one curve.
///
/// Supplied by whoever computed the motion along the path segment, so
/// placement never has to re-derive the physics. Both converters take the
/// time elapsed since entering the curve; `distance` returns metres travelled
/// along it and `speed` the instantaneous speed in metres per second.
#[derive(Clone)]
pub struct Kinematics {
    distance: Converter,
    speed: Converter,
}

impl Kinematics {
    /// Creates kinematics from explicit converters.
    pub fn new(
        distance: impl Fn(f64) -> f64 + Send + Sync + 'static,
        speed: impl Fn(f64) -> f64 + Send + Sync + 'static,
    ) -> Self {
        Self {
            distance: Arc::new(distance),
            speed: Arc::new(speed),
        }
    }

    /// Constant speed covering `length` metres in `duration` seconds.
    #[must_use]
    pub fn uniform(length: f64, duration: f64) -> Self {
        let speed = if duration > 0.0 { length / duration } else { 0.0 };
        Self::new(move |t| speed * t, move |_| speed)
    }

    /// Constant acceleration from `initial_speed`.
    #[must_use]
    pub fn constant_acceleration(initial_speed: f64, acceleration: f64) -> Self {
        Self::new(
            move |t| initial_speed * t + 0.5 * acceleration * t * t,
            move |t| initial_speed + acceleration * t,
        )
    }

    /// Distance travelled after `elapsed` seconds on the curve.
    #[must_use]
    pub fn distance(&self, elapsed: f64) -> f64 {
        (self.distance)(elapsed)
    }

    /// Speed after `elapsed` seconds on the curve.
    #[must_use]
    pub fn speed(&self, elapsed: f64) -> f64 {
        (self.speed)(elapsed)
    }
}

impl fmt::Debug for Kinematics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kinematics").finish_non_exhaustive()
    }
}
