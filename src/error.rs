use crate::config::{ConfigError, Tier};
use thiserror::Error;

/// Top-level error type for the dragon-tiers library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to load {source_name} at {tier} tier: {error}")]
    Source {
        source_name: String,
        tier: Tier,
        #[source]
        error: ConfigError,
    },
}
