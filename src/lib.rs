pub mod config;
mod error;

pub use config::{
    ConfigError, ConfigTree, ConfigValue, LayeredConfig, LoadReport, SchemaBinding, Tier,
    ValueKind,
};
pub use error::Error;
