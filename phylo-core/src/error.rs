//! Error types for tree construction and layout configuration.

use thiserror::Error;

/// A rejected configuration or sampler parameter.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    #[error("max_depth {got} exceeds the supported maximum of {max}")]
    MaxDepth { got: u32, max: u32 },

    #[error("sphere_radius must be finite and positive, got {0}")]
    SphereRadius(f64),

    #[error("sample count must be at least 1")]
    SampleCount,

    #[error("damping must lie strictly between 0 and 1, got {0}")]
    Damping(f64),

    #[error("time_step must be finite and positive, got {0}")]
    TimeStep(f64),

    #[error("{name} must be finite and non-negative, got {value}")]
    Negative { name: &'static str, value: f64 },
}

/// Main error type for the crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("topology error: {0}")]
    Topology(String),
}

pub type Result<T> = std::result::Result<T, Error>;
