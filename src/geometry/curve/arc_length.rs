use crate::math::{Point3, TOLERANCE};

/// Default number of chord samples used to build an arc-length table.
pub const DEFAULT_DIVISIONS: usize = 200;

/// Cumulative chord lengths of a curve sampled at `divisions + 1` evenly
/// spaced parameter values.
///
/// Entry `i` is the distance travelled from `t = 0` to `t = i / divisions`.
/// The table is monotonic non-decreasing and starts at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ArcLengthTable {
    lengths: Vec<f64>,
}

impl ArcLengthTable {
    /// Samples `eval` at `divisions + 1` parameters and accumulates chords.
    pub fn sample(divisions: usize, eval: impl Fn(f64) -> Point3) -> Self {
        let divisions = divisions.max(1);
        let mut lengths = Vec::with_capacity(divisions + 1);
        let mut last = eval(0.0);
        let mut sum = 0.0;
        lengths.push(0.0);
        for i in 1..=divisions {
            #[allow(clippy::cast_precision_loss)]
            let current = eval(i as f64 / divisions as f64);
            sum += (current - last).norm();
            lengths.push(sum);
            last = current;
        }
        Self { lengths }
    }

    /// Table for a curve already parameterised by arc length.
    #[must_use]
    pub fn uniform(total: f64, divisions: usize) -> Self {
        let divisions = divisions.max(1);
        #[allow(clippy::cast_precision_loss)]
        let lengths = (0..=divisions)
            .map(|i| total * i as f64 / divisions as f64)
            .collect();
        Self { lengths }
    }

    /// Total sampled length.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.lengths.last().copied().unwrap_or(0.0)
    }

    /// Number of sampled intervals.
    #[must_use]
    pub fn divisions(&self) -> usize {
        self.lengths.len().saturating_sub(1)
    }

    /// Raw cumulative lengths.
    #[must_use]
    pub fn lengths(&self) -> &[f64] {
        &self.lengths
    }

    /// Maps an arc-length fraction `u` to the curve parameter `t`.
    ///
    /// Binary search finds the bracketing samples; an exact hit on a sample
    /// returns that sample's parameter, otherwise the parameter is linearly
    /// interpolated inside the bracket. Both ends are exact.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn u_to_t(&self, u: f64) -> f64 {
        let total = self.total();
        let divisions = self.divisions();
        if divisions == 0 || total < TOLERANCE {
            return u.clamp(0.0, 1.0);
        }
        if u <= 0.0 {
            return 0.0;
        }
        if u >= 1.0 {
            return 1.0;
        }

        let target = u * total;
        let hi = self.lengths.partition_point(|&l| l < target);
        if hi >= self.lengths.len() {
            return 1.0;
        }
        if (self.lengths[hi] - target).abs() <= f64::EPSILON * total || hi == 0 {
            return hi as f64 / divisions as f64;
        }

        let lo = hi - 1;
        let before = self.lengths[lo];
        let segment = self.lengths[hi] - before;
        let fraction = if segment > TOLERANCE {
            (target - before) / segment
        } else {
            0.0
        };
        (lo as f64 + fraction) / divisions as f64
    }

    /// Maps a curve parameter `t` back to its arc-length fraction.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn t_to_u(&self, t: f64) -> f64 {
        let total = self.total();
        let divisions = self.divisions();
        if divisions == 0 || total < TOLERANCE {
            return t.clamp(0.0, 1.0);
        }
        let scaled = t.clamp(0.0, 1.0) * divisions as f64;
        let lo = (scaled.floor() as usize).min(divisions - 1);
        let fraction = scaled - lo as f64;
        let length = self.lengths[lo] + (self.lengths[lo + 1] - self.lengths[lo]) * fraction;
        (length / total).clamp(0.0, 1.0)
    }
}
