use serde::Deserialize;

use crate::error::{GeometryError, Result};
use crate::math::orient::any_perpendicular;
use crate::math::{Point3, Vector3, TOLERANCE};

use super::{ArcLengthTable, Curve, Kinematics, DEFAULT_DIVISIONS};

/// Chord deltas smaller than this are treated as coincident points.
const MIN_CHORD_DELTA: f64 = 1e-4;

/// How knot spacing is derived from the control points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameterization {
    /// Equal knot spacing (classic Catmull-Rom, tension 0.5).
    Uniform,
    /// Knot spacing `|Δp|^0.5`; no cusps or self-intersections within a segment.
    #[default]
    Centripetal,
    /// Knot spacing `|Δp|`.
    Chordal,
}

impl Parameterization {
    /// Exponent applied to squared chord lengths.
    fn squared_exponent(self) -> Option<f64> {
        match self {
            Self::Uniform => None,
            Self::Centripetal => Some(0.25),
            Self::Chordal => Some(0.5),
        }
    }
}

/// Cubic Hermite coefficients `c0 + c1 w + c2 w^2 + c3 w^3` for one span.
#[derive(Debug, Clone, Copy)]
struct Cubic {
    c0: Vector3,
    c1: Vector3,
    c2: Vector3,
    c3: Vector3,
}

impl Cubic {
    fn hermite(p1: Vector3, p2: Vector3, t1: Vector3, t2: Vector3) -> Self {
        Self {
            c0: p1,
            c1: t1,
            c2: -3.0 * p1 + 3.0 * p2 - 2.0 * t1 - t2,
            c3: 2.0 * p1 - 2.0 * p2 + t1 + t2,
        }
    }

    fn value(&self, w: f64) -> Vector3 {
        self.c0 + (self.c1 + (self.c2 + self.c3 * w) * w) * w
    }

    fn derivative(&self, w: f64) -> Vector3 {
        self.c1 + (2.0 * self.c2 + 3.0 * self.c3 * w) * w
    }
}

/// A piecewise-cubic curve interpolating an ordered point list.
///
/// Tangents use the non-uniform Catmull-Rom formulation with knot deltas
/// derived from chord lengths. The first and last spans use phantom control
/// points reflected through the end points, so `point(0)` and `point(1)` are
/// exactly the first and last input points.
///
/// The normal is the curve's `up` reference vector (default `+Y`) with its
/// tangential component removed.
#[derive(Debug, Clone)]
pub struct CatmullRom {
    name: String,
    points: Vec<Point3>,
    parameterization: Parameterization,
    up: Vector3,
    arc_lengths: ArcLengthTable,
    kinematics: Option<Kinematics>,
}

impl CatmullRom {
    /// Creates a new interpolating curve.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than two points are given or a point is not
    /// finite.
    pub fn new(
        name: impl Into<String>,
        points: Vec<Point3>,
        parameterization: Parameterization,
    ) -> Result<Self> {
        if points.len() < 2 {
            return Err(GeometryError::TooFewPoints {
                required: 2,
                actual: points.len(),
            }
            .into());
        }
        if points.iter().any(|p| !p.coords.iter().all(|c| c.is_finite())) {
            return Err(GeometryError::Degenerate("control point is not finite".into()).into());
        }

        let mut curve = Self {
            name: name.into(),
            points,
            parameterization,
            up: Vector3::y(),
            arc_lengths: ArcLengthTable::uniform(0.0, 1),
            kinematics: None,
        };
        let divisions = DEFAULT_DIVISIONS.max(curve.points.len() * 4);
        curve.arc_lengths = ArcLengthTable::sample(divisions, |t| curve.point(t));
        Ok(curve)
    }

    /// Sets the reference up vector used to derive normals.
    ///
    /// # Errors
    ///
    /// Returns an error if `up` is zero-length.
    pub fn with_up(mut self, up: Vector3) -> Result<Self> {
        self.up = up
            .try_normalize(TOLERANCE)
            .ok_or(GeometryError::ZeroVector)?;
        Ok(self)
    }

    /// Attaches time-based travel converters.
    #[must_use]
    pub fn with_kinematics(mut self, kinematics: Kinematics) -> Self {
        self.kinematics = Some(kinematics);
        self
    }

    /// Rebuilds the arc-length table with a different sample count.
    #[must_use]
    pub fn with_arc_length_divisions(mut self, divisions: usize) -> Self {
        self.arc_lengths = ArcLengthTable::sample(divisions, |t| self.point(t));
        self
    }

    /// Control points the curve passes through.
    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    #[must_use]
    pub fn parameterization(&self) -> Parameterization {
        self.parameterization
    }

    /// Span index, local weight in `[0, 1]`, and the span's cubic.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn span(&self, t: f64) -> (f64, Cubic) {
        let n = self.points.len();
        let scaled = (n - 1) as f64 * t.clamp(0.0, 1.0);
        let mut index = scaled.floor() as usize;
        let mut weight = scaled - index as f64;
        if index >= n - 1 {
            index = n - 2;
            weight = 1.0;
        }

        let p1 = self.points[index].coords;
        let p2 = self.points[index + 1].coords;
        let p0 = if index > 0 {
            self.points[index - 1].coords
        } else {
            2.0 * p1 - p2
        };
        let p3 = if index + 2 < n {
            self.points[index + 2].coords
        } else {
            2.0 * p2 - p1
        };

        let cubic = match self.parameterization.squared_exponent() {
            None => Cubic::hermite(p1, p2, 0.5 * (p2 - p0), 0.5 * (p3 - p1)),
            Some(exponent) => {
                let mut dt0 = (p1 - p0).norm_squared().powf(exponent);
                let mut dt1 = (p2 - p1).norm_squared().powf(exponent);
                let mut dt2 = (p3 - p2).norm_squared().powf(exponent);

                // Coincident points would give zero knot deltas.
                if dt1 < MIN_CHORD_DELTA {
                    dt1 = 1.0;
                }
                if dt0 < MIN_CHORD_DELTA {
                    dt0 = dt1;
                }
                if dt2 < MIN_CHORD_DELTA {
                    dt2 = dt1;
                }

                let t1 = ((p1 - p0) / dt0 - (p2 - p0) / (dt0 + dt1) + (p2 - p1) / dt1) * dt1;
                let t2 = ((p2 - p1) / dt1 - (p3 - p1) / (dt1 + dt2) + (p3 - p2) / dt2) * dt1;
                Cubic::hermite(p1, p2, t1, t2)
            }
        };
        (weight, cubic)
    }
}

impl Curve for CatmullRom {
    fn name(&self) -> &str {
        &self.name
    }

    fn point(&self, t: f64) -> Point3 {
        let (w, cubic) = self.span(t);
        Point3::from(cubic.value(w))
    }

    fn tangent(&self, t: f64) -> Vector3 {
        let (w, cubic) = self.span(t);
        if let Some(tangent) = cubic.derivative(w).try_normalize(TOLERANCE) {
            return tangent;
        }

        // Stationary point: fall back to a finite difference, then the chord.
        let t = t.clamp(0.0, 1.0);
        let h = 1e-4;
        let forward = self.point((t + h).min(1.0)) - self.point((t - h).max(0.0));
        let chord = self.points[self.points.len() - 1] - self.points[0];
        forward
            .try_normalize(TOLERANCE)
            .or_else(|| chord.try_normalize(TOLERANCE))
            .unwrap_or_else(Vector3::x)
    }

    fn normal(&self, t: f64) -> Vector3 {
        let tangent = self.tangent(t);
        (self.up - tangent * self.up.dot(&tangent))
            .try_normalize(TOLERANCE)
            .unwrap_or_else(|| any_perpendicular(&tangent))
    }

    fn arc_lengths(&self) -> &ArcLengthTable {
        &self.arc_lengths
    }

    fn kinematics(&self) -> Option<&Kinematics> {
        self.kinematics.as_ref()
    }
}
