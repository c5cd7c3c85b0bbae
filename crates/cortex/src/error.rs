//! Error type shared across the crate

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CortexError {
    #[error("failed to read config {}: {source}", path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid socket address {0:?}")]
    InvalidAddress(String),

    #[error("landmark source failed: {0}")]
    Source(#[from] std::io::Error),

    #[error("input injection failed: {0}")]
    Effector(String),

    #[error("failed to start {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },
}
