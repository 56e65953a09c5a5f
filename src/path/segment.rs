use crate::geometry::Curve;
use crate::math::TOLERANCE;

use super::ZoneWindow;

/// One sub-curve of a [`CompositePath`](super::CompositePath) together with its
/// place in the path's length, time, and zone bookkeeping.
#[derive(Debug)]
pub struct PathSegment {
    pub(super) curve: Box<dyn Curve>,
    pub(super) length: f64,
    pub(super) duration: f64,
    pub(super) start_length: f64,
    pub(super) start_time: f64,
    pub(super) zone_start: usize,
    pub(super) zone_count: usize,
}

impl PathSegment {
    /// The underlying curve.
    #[must_use]
    pub fn curve(&self) -> &dyn Curve {
        self.curve.as_ref()
    }

    /// Arc length of this segment.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Time needed to traverse this segment.
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Path length before this segment begins.
    #[must_use]
    pub fn start_length(&self) -> f64 {
        self.start_length
    }

    /// Elapsed time at which travel enters this segment.
    #[must_use]
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// First zone owned by this segment.
    #[must_use]
    pub fn zone_start(&self) -> usize {
        self.zone_start
    }

    /// Number of zones owned by this segment.
    #[must_use]
    pub fn zone_count(&self) -> usize {
        self.zone_count
    }

    /// Global zone index for local arc-length fraction `u`.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn zone_of(&self, u: f64) -> usize {
        let local = (u.clamp(0.0, 1.0) * self.zone_count as f64).floor() as usize;
        self.zone_start + local.min(self.zone_count.saturating_sub(1))
    }

    /// Global zones covered by the local interval `[u0, u1]`.
    #[must_use]
    pub fn zone_span(&self, u0: f64, u1: f64) -> ZoneWindow {
        ZoneWindow::new(self.zone_of(u0), self.zone_of(u1))
    }

    /// Local arc-length fraction reached `elapsed` seconds after entering.
    ///
    /// Uses the curve's kinematics when attached, otherwise uniform speed
    /// over the segment's duration.
    #[must_use]
    pub fn fraction_after(&self, elapsed: f64) -> f64 {
        if self.length < TOLERANCE {
            return 0.0;
        }
        let distance = match self.curve.kinematics() {
            Some(kinematics) => kinematics.distance(elapsed),
            None => self.length * elapsed / self.duration,
        };
        (distance / self.length).clamp(0.0, 1.0)
    }

    /// Speed `elapsed` seconds after entering.
    #[must_use]
    pub fn speed_after(&self, elapsed: f64) -> f64 {
        match self.curve.kinematics() {
            Some(kinematics) => kinematics.speed(elapsed),
            None => self.length / self.duration,
        }
    }
}
