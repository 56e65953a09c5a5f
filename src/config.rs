//! TOML configuration for reference frames and object kinds.
//!
//! ```toml
//! version = 1
//!
//! [[frames]]
//! name = "ground"
//! zones = 64
//! camera_range = 500.0
//!
//! [[kinds]]
//! kind = "vehicle"
//! launch_spacing = 30.0
//! initial_pool = 8
//! max_pool = 64
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::frame::{FrameMotion, ReferenceFrame};
use crate::math::Vector3;
use crate::object::{KindRegistry, KindSettings, LaunchSchedule, ObjectKind};
use crate::path::CompositePath;
use crate::pool::{RenderResource, ResourceStore};

/// Top-level streaming configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StreamConfig {
    /// Design version frames are built at.
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub frames: Vec<FrameConfig>,
    #[serde(default)]
    pub kinds: Vec<KindConfig>,
}

/// Zone partition and camera settings of one reference frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrameConfig {
    pub name: String,
    pub zones: usize,
    pub camera_range: f64,
    #[serde(default)]
    pub motion: MotionConfig,
}

/// Rotation of a reference frame about an axis through the origin.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MotionConfig {
    #[serde(default = "default_up")]
    pub axis: [f64; 3],
    #[serde(default)]
    pub angular_velocity: f64,
    #[serde(default)]
    pub angular_offset: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            axis: default_up(),
            angular_velocity: 0.0,
            angular_offset: 0.0,
        }
    }
}

/// Lifecycle, placement and pool settings of one object kind.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KindConfig {
    pub kind: ObjectKind,
    /// Overrides the kind's default; time-driven kinds are dynamic otherwise.
    #[serde(default)]
    pub dynamic: Option<bool>,
    #[serde(default = "default_true")]
    pub recyclable: bool,
    #[serde(default)]
    pub lateral_offset: f64,
    #[serde(default)]
    pub vertical_offset: f64,
    #[serde(default = "default_forward")]
    pub forward_axis: [f64; 3],
    #[serde(default = "default_up")]
    pub up_axis: [f64; 3],
    /// Resources created up front.
    #[serde(default)]
    pub initial_pool: usize,
    /// Growth cap; unbounded when absent.
    #[serde(default)]
    pub max_pool: Option<usize>,
    /// Fixed objects spread evenly along each frame's path.
    #[serde(default)]
    pub count: usize,
    /// Seconds between launches of a time-driven kind.
    #[serde(default)]
    pub launch_spacing: Option<f64>,
}

fn default_true() -> bool {
    true
}

fn default_forward() -> [f64; 3] {
    [1.0, 0.0, 0.0]
}

fn default_up() -> [f64; 3] {
    [0.0, 1.0, 0.0]
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn check_axis(field: &'static str, axis: [f64; 3]) -> std::result::Result<(), ConfigError> {
    let v = Vector3::from(axis);
    if v.iter().all(|c| c.is_finite()) && v.norm() > crate::math::TOLERANCE {
        Ok(())
    } else {
        Err(invalid(field, format!("{axis:?} is not a usable direction")))
    }
}

impl StreamConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not parse or fails validation.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, does not parse, or fails
    /// validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(ConfigError::from)?;
        let config = Self::from_toml_str(&source)?;
        debug!(
            path = %path.display(),
            frames = config.frames.len(),
            kinds = config.kinds.len(),
            "loaded stream config"
        );
        Ok(config)
    }

    /// Checks every value that deserialisation alone cannot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let mut names = BTreeSet::new();
        for frame in &self.frames {
            if !names.insert(frame.name.as_str()) {
                let message = format!("duplicate frame `{}`", frame.name);
                return Err(invalid("frames.name", message).into());
            }
            frame.validate()?;
        }
        let mut kinds = BTreeSet::new();
        for kind in &self.kinds {
            if !kinds.insert(kind.kind) {
                let message = format!("`{}` configured twice", kind.kind);
                return Err(invalid("kinds.kind", message).into());
            }
            kind.validate()?;
        }
        Ok(())
    }

    #[must_use]
    pub fn frame(&self, name: &str) -> Option<&FrameConfig> {
        self.frames.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn kind(&self, kind: ObjectKind) -> Option<&KindConfig> {
        self.kinds.iter().find(|k| k.kind == kind)
    }

    /// Applies every kind's settings to `registry` and stocks its pool.
    pub fn configure_registry<R: RenderResource>(
        &self,
        registry: &mut KindRegistry,
        store: &mut ResourceStore<R>,
        prototype: impl Fn(ObjectKind) -> R,
    ) {
        for kind in &self.kinds {
            registry.configure(kind, store, &prototype(kind.kind));
        }
    }
}

impl FrameConfig {
    fn validate(&self) -> Result<()> {
        if self.zones == 0 {
            return Err(invalid("frames.zones", "must be at least 1").into());
        }
        if !(self.camera_range.is_finite() && self.camera_range >= 0.0) {
            let message = format!("{} is not a distance", self.camera_range);
            return Err(invalid("frames.camera_range", message).into());
        }
        check_axis("frames.motion.axis", self.motion.axis)?;
        if !(self.motion.angular_velocity.is_finite() && self.motion.angular_offset.is_finite()) {
            return Err(invalid("frames.motion", "angles must be finite").into());
        }
        Ok(())
    }

    #[must_use]
    pub fn motion(&self) -> FrameMotion {
        FrameMotion {
            axis: Vector3::from(self.motion.axis),
            angular_velocity: self.motion.angular_velocity,
            angular_offset: self.motion.angular_offset,
        }
    }

    /// Subdivides `path` into this frame's zones and wraps it in a frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be split into the configured
    /// number of zones.
    pub fn build(&self, mut path: CompositePath, version: u64) -> Result<ReferenceFrame> {
        path.subdivide(self.zones)?;
        Ok(ReferenceFrame::new(self.name.clone(), path, self.camera_range)?
            .with_motion(self.motion())
            .with_version(version))
    }
}

impl KindConfig {
    fn validate(&self) -> Result<()> {
        check_axis("kinds.forward_axis", self.forward_axis)?;
        check_axis("kinds.up_axis", self.up_axis)?;
        if !(self.lateral_offset.is_finite() && self.vertical_offset.is_finite()) {
            return Err(invalid("kinds.offset", "offsets must be finite").into());
        }
        if let Some(max) = self.max_pool {
            if max < self.initial_pool {
                return Err(invalid(
                    "kinds.max_pool",
                    format!("{max} is below initial_pool {}", self.initial_pool),
                )
                .into());
            }
        }
        match (self.kind.is_time_driven(), self.launch_spacing) {
            (false, Some(_)) => {
                let message = format!("`{}` is not launched", self.kind);
                return Err(invalid("kinds.launch_spacing", message).into());
            }
            (true, Some(spacing)) if !(spacing.is_finite() && spacing > 0.0) => {
                let message = format!("{spacing} is not a positive interval");
                return Err(invalid("kinds.launch_spacing", message).into());
            }
            _ => {}
        }
        if self.kind.is_time_driven() && self.count > 0 {
            let message = format!("`{}` is populated by launches", self.kind);
            return Err(invalid("kinds.count", message).into());
        }
        Ok(())
    }

    #[must_use]
    pub fn settings(&self) -> KindSettings {
        let defaults = KindSettings::for_kind(self.kind);
        KindSettings {
            dynamic: self.dynamic.unwrap_or(defaults.dynamic),
            has_changed: false,
            recyclable: self.recyclable,
            lateral_offset: self.lateral_offset,
            vertical_offset: self.vertical_offset,
            forward_axis: Vector3::from(self.forward_axis),
            up_axis: Vector3::from(self.up_axis),
        }
    }

    /// Launch schedule for a time-driven kind with a spacing configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the spacing is invalid.
    pub fn schedule(&self) -> Result<Option<LaunchSchedule>> {
        self.launch_spacing
            .map(|spacing| LaunchSchedule::new(self.kind, spacing))
            .transpose()
    }
}

impl KindRegistry {
    /// Replaces a kind's settings and pool cap from configuration, then
    /// stocks its initial resources.
    pub fn configure<R: RenderResource>(
        &mut self,
        config: &KindConfig,
        store: &mut ResourceStore<R>,
        prototype: &R,
    ) {
        *self.settings_mut(config.kind) = config.settings();
        self.pool_mut(config.kind).set_max_resources(config.max_pool);
        self.stock(config.kind, store, prototype, config.initial_pool);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::StreamError;
    use crate::geometry::{CatmullRom, Parameterization};
    use crate::math::Point3;
    use crate::pool::tests::Probe;

    const SAMPLE: &str = r#"
        version = 3

        [[frames]]
        name = "ground"
        zones = 20
        camera_range = 250.0

        [[frames]]
        name = "orbit"
        zones = 8
        camera_range = 1000.0
        motion = { axis = [0.0, 0.0, 1.0], angular_velocity = 0.01 }

        [[kinds]]
        kind = "vehicle"
        launch_spacing = 30.0
        initial_pool = 4
        max_pool = 16

        [[kinds]]
        kind = "tube_ring"
        count = 200
        initial_pool = 32
        vertical_offset = -1.5
        recyclable = false
    "#;

    fn assert_invalid(source: &str, expected: &str) {
        match StreamConfig::from_toml_str(source) {
            Err(StreamError::Config(ConfigError::Invalid { field, .. })) => {
                assert_eq!(field, expected);
            }
            other => panic!("expected invalid `{expected}`, got {other:?}"),
        }
    }

    #[test]
    fn parses_sample() {
        let config = StreamConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.version, 3);
        assert_eq!(config.frames.len(), 2);

        let orbit = config.frame("orbit").unwrap();
        assert_eq!(orbit.motion().axis, Vector3::z());
        assert!((orbit.motion().angular_velocity - 0.01).abs() < 1e-12);
        assert_eq!(config.frame("ground").unwrap().motion(), FrameMotion::default());

        let vehicle = config.kind(ObjectKind::Vehicle).unwrap();
        assert!(vehicle.settings().dynamic);
        assert!(vehicle.schedule().unwrap().is_some());

        let ring = config.kind(ObjectKind::TubeRing).unwrap().settings();
        assert!(!ring.dynamic);
        assert!(!ring.recyclable);
        assert!((ring.vertical_offset + 1.5).abs() < 1e-12);
        assert!(config.kind(ObjectKind::Bracket).is_none());
    }

    #[test]
    fn empty_document_is_valid() {
        let config = StreamConfig::from_toml_str("").unwrap();
        assert_eq!(config, StreamConfig::default());
    }

    #[test]
    fn rejects_unknown_fields_and_kinds() {
        assert!(matches!(
            StreamConfig::from_toml_str("colour = 1"),
            Err(StreamError::Config(ConfigError::Parse(_)))
        ));
        assert!(StreamConfig::from_toml_str("[[kinds]]\nkind = \"rocket\"").is_err());
    }

    #[test]
    fn rejects_inconsistent_values() {
        const FRAME: &str = "[[frames]]\nname = \"a\"\n";
        const BRACKET: &str = "[[kinds]]\nkind = \"bracket\"\n";
        const SLED: &str = "[[kinds]]\nkind = \"sled\"\n";
        let frame = format!("{FRAME}zones = 2\ncamera_range = 1.0\n");

        assert_invalid(&format!("{FRAME}zones = 0\ncamera_range = 1.0"), "frames.zones");
        assert_invalid(&format!("{FRAME}zones = 2\ncamera_range = -1.0"), "frames.camera_range");
        assert_invalid(&format!("{frame}{frame}"), "frames.name");
        assert_invalid(&format!("{BRACKET}launch_spacing = 5.0"), "kinds.launch_spacing");
        assert_invalid(&format!("{SLED}launch_spacing = 0.0"), "kinds.launch_spacing");
        assert_invalid(&format!("{SLED}count = 3"), "kinds.count");
        assert_invalid(&format!("{BRACKET}initial_pool = 5\nmax_pool = 2"), "kinds.max_pool");
        assert_invalid(&format!("{BRACKET}up_axis = [0.0, 0.0, 0.0]"), "kinds.up_axis");
        assert_invalid(&format!("{BRACKET}{BRACKET}"), "kinds.kind");
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            StreamConfig::load("/nonexistent/curvestream.toml"),
            Err(StreamError::Config(ConfigError::Io(_)))
        ));
    }

    #[test]
    fn configures_registry_and_builds_frames() {
        let config = StreamConfig::from_toml_str(SAMPLE).unwrap();
        let mut registry = KindRegistry::new();
        let mut store = ResourceStore::new();
        config.configure_registry(&mut registry, &mut store, |_| Probe::new(0));

        assert_eq!(registry.pool(ObjectKind::Vehicle).available(), 4);
        assert_eq!(registry.pool(ObjectKind::Vehicle).max_resources(), Some(16));
        assert_eq!(registry.pool(ObjectKind::TubeRing).available(), 32);
        assert_eq!(store.len(), 36);
        assert!(!registry.settings(ObjectKind::TubeRing).recyclable);

        let curve = CatmullRom::new(
            "line",
            vec![Point3::origin(), Point3::new(2000.0, 0.0, 0.0)],
            Parameterization::Centripetal,
        )
        .unwrap();
        let path = CompositePath::new("line").with(curve, 60.0).unwrap();
        let frame = config.frame("ground").unwrap().build(path, config.version).unwrap();
        assert_eq!(frame.num_zones(), 20);
        assert_eq!(frame.version(), 3);
        assert!((frame.camera_range() - 250.0).abs() < 1e-12);
    }
}
