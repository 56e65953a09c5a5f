//! Streams vehicles and track hardware along a synthetic launch path while a
//! camera flies over it.
//!
//! Usage:
//! ```text
//! cargo run --example stream
//! RUST_LOG=curvestream=debug cargo run --example stream
//! ```

use curvestream::geometry::{CatmullRom, CircularArc, Kinematics, Parameterization};
use curvestream::math::{Point3, Transform, Vector3};
use curvestream::{
    CompositePath, KindRegistry, ObjectKind, RenderResource, ResourceStore, StreamConfig,
    VisibilityScheduler,
};
use tracing::info;

const CONFIG: &str = r#"
    version = 1

    [[frames]]
    name = "ground"
    zones = 48
    camera_range = 400.0

    [[kinds]]
    kind = "vehicle"
    launch_spacing = 12.0
    initial_pool = 4
    vertical_offset = 2.0

    [[kinds]]
    kind = "sled"
    launch_spacing = 12.0
    initial_pool = 4
    max_pool = 6

    [[kinds]]
    kind = "bracket"
    count = 300
    initial_pool = 40

    [[kinds]]
    kind = "tube_ring"
    count = 600
    initial_pool = 80
    recyclable = false
"#;

/// Stand-in for a renderer mesh instance.
#[derive(Debug)]
struct Marker {
    kind: ObjectKind,
    visible: bool,
    transform: Transform,
}

impl RenderResource for Marker {
    fn duplicate(&self) -> Self {
        Self {
            kind: self.kind,
            visible: false,
            transform: self.transform,
        }
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn set_transform(&mut self, transform: &Transform) {
        self.transform = *transform;
    }
}

fn launch_path() -> curvestream::Result<CompositePath> {
    let accelerator = CatmullRom::new(
        "accelerator",
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(600.0, 20.0, 0.0),
            Point3::new(1300.0, 60.0, 0.0),
            Point3::new(2000.0, 80.0, 0.0),
        ],
        Parameterization::Centripetal,
    )?
    .with_kinematics(Kinematics::constant_acceleration(10.0, 0.8));
    let ramp = CircularArc::new(
        "ramp",
        Point3::new(2000.0, 80.0, -1000.0),
        Vector3::y(),
        Point3::new(2000.0, 80.0, 0.0),
        1500.0,
    )?;
    CompositePath::new("launch")
        .with(accelerator, 60.0)?
        .with(ramp, 40.0)
}

fn main() -> curvestream::Result<()> {
    // Default: WARN for everything, INFO for curvestream and this demo.
    // Override with RUST_LOG (e.g. RUST_LOG=curvestream=trace).
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("stream=info".parse().unwrap_or_default())
        .add_directive("curvestream=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = StreamConfig::from_toml_str(CONFIG)?;

    let mut registry = KindRegistry::new();
    let mut store = ResourceStore::new();
    config.configure_registry(&mut registry, &mut store, |kind| Marker {
        kind,
        visible: false,
        transform: Transform::default(),
    });

    let mut frames = Vec::new();
    for frame_config in &config.frames {
        frames.push(frame_config.build(launch_path()?, config.version)?);
    }

    let mut schedules = Vec::new();
    for kind_config in &config.kinds {
        for frame in &mut frames {
            if kind_config.count > 0 {
                frame.populate_static(kind_config.kind, kind_config.count);
            }
        }
        if let Some(schedule) = kind_config.schedule()? {
            for frame in &mut frames {
                schedule.backfill(frame, 0.0);
            }
            schedules.push(schedule);
        }
    }

    let mut scheduler = VisibilityScheduler::new(registry, store);
    let dt = 0.5;
    for step in 0..240_u32 {
        let elapsed = f64::from(step) * dt;
        for schedule in &schedules {
            for frame in &mut frames {
                schedule.spawn_due(frame, elapsed);
            }
        }

        // Fly along the accelerator and out over the ramp, 150 m up.
        let camera = Point3::new(-200.0 + 20.0 * elapsed, 150.0, -100.0);
        let report = scheduler.run_frame(&mut frames, &camera, elapsed);

        if step % 20 == 0 {
            let visible = scheduler
                .resources()
                .iter()
                .filter(|(_, marker)| marker.visible)
                .count();
            info!(
                elapsed,
                window = ?frames[0].current_window(),
                objects = frames[0].object_count(),
                bound = frames[0].bound_count(),
                visible,
                resources = scheduler.resources().len(),
                placed = report.placed,
                shortfall = report.total_shortfall(),
                "frame"
            );
        }
    }

    for kind in ObjectKind::ALL {
        let pool = scheduler.registry().pool(kind);
        let placed = scheduler
            .resources()
            .iter()
            .filter(|(_, marker)| marker.kind == kind && marker.visible)
            .count();
        info!(%kind, owned = pool.owned(), available = pool.available(), visible = placed, "pool");
    }
    Ok(())
}
