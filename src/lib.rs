pub mod config;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod math;
pub mod object;
pub mod path;
pub mod pool;
pub mod scheduler;

pub use config::StreamConfig;
pub use error::{Result, StreamError};
pub use frame::{FrameMotion, ReferenceFrame};
pub use object::{KindRegistry, KindSettings, LaunchSchedule, ObjectKind, VirtualObject};
pub use path::CompositePath;
pub use pool::{ObjectPool, RenderResource, ResourceId, ResourceStore};
pub use scheduler::{FrameReport, VisibilityScheduler};
