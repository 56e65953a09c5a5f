use std::fmt;

use serde::Deserialize;

use crate::math::Vector3;

/// The closed set of object kinds streamed along paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// Launch vehicle travelling the whole path.
    Vehicle,
    /// Sled carrying a vehicle along the accelerator.
    Sled,
    /// Drive screw section.
    ScrewSegment,
    /// Bracket holding the screws and rails.
    Bracket,
    /// Ring of the evacuated tube.
    TubeRing,
}

impl ObjectKind {
    /// Number of kinds.
    pub const COUNT: usize = 5;

    /// Every kind, in registry order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Vehicle,
        Self::Sled,
        Self::ScrewSegment,
        Self::Bracket,
        Self::TubeRing,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Vehicle => "vehicle",
            Self::Sled => "sled",
            Self::ScrewSegment => "screw_segment",
            Self::Bracket => "bracket",
            Self::TubeRing => "tube_ring",
        }
    }

    /// Position in [`ALL`](Self::ALL).
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Whether positions of this kind derive from a launch time rather than a
    /// fixed place on the path.
    #[must_use]
    pub fn is_time_driven(self) -> bool {
        matches!(self, Self::Vehicle | Self::Sled)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lifecycle flags and placement parameters shared by every object of a kind.
#[derive(Debug, Clone, PartialEq)]
pub struct KindSettings {
    /// Reposition every active object every frame.
    pub dynamic: bool,
    /// Reposition every active object once, after a design edit.
    pub has_changed: bool,
    /// Return resources to the pool when their zone leaves the window.
    pub recyclable: bool,
    /// Offset along the path binormal.
    pub lateral_offset: f64,
    /// Offset along the path normal.
    pub vertical_offset: f64,
    /// Model axis aligned with the path tangent.
    pub forward_axis: Vector3,
    /// Model axis aligned with the path normal.
    pub up_axis: Vector3,
}

impl KindSettings {
    /// Default settings for `kind`: time-driven kinds are dynamic.
    #[must_use]
    pub fn for_kind(kind: ObjectKind) -> Self {
        Self {
            dynamic: kind.is_time_driven(),
            has_changed: false,
            recyclable: true,
            lateral_offset: 0.0,
            vertical_offset: 0.0,
            forward_axis: Vector3::x(),
            up_axis: Vector3::y(),
        }
    }

    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// Placed once on assignment and left alone while active.
    #[must_use]
    pub fn is_static(&self) -> bool {
        !self.dynamic && !self.has_changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_matches_all() {
        for (i, kind) in ObjectKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn moving_kinds_default_to_dynamic() {
        assert!(KindSettings::for_kind(ObjectKind::Vehicle).is_dynamic());
        assert!(KindSettings::for_kind(ObjectKind::TubeRing).is_static());

        let mut edited = KindSettings::for_kind(ObjectKind::Bracket);
        edited.has_changed = true;
        assert!(!edited.is_static());
    }
}
