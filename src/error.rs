use thiserror::Error;

/// Top-level error type for curvestream.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised while constructing curves.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("parameter {parameter} = {value} is out of range [{min}, {max}]")]
    ParameterOutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,

    #[error("curve needs at least {required} points, got {actual}")]
    TooFewPoints { required: usize, actual: usize },
}

/// Errors related to composite paths and their zone partition.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("path `{0}` has no sub-curves")]
    Empty(String),

    #[error("sub-curve duration must be positive, got {0}")]
    InvalidDuration(f64),

    #[error("cannot split {segments} sub-curves into {zones} zones")]
    TooFewZones { zones: usize, segments: usize },

    #[error("path `{0}` has not been subdivided into zones")]
    NotSubdivided(String),

    #[error("objects of kind `{0}` cannot be launched")]
    NotTimeDriven(&'static str),
}

/// Errors related to loading and validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Convenience type alias for results using [`StreamError`].
pub type Result<T> = std::result::Result<T, StreamError>;
