//! Error types for gravbox.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("Invalid input: dt must be finite and non-negative, got {dt}")]
    InvalidInput { dt: f32 },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
