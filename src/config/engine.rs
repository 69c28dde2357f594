//! Caller-facing entry point.

use tracing::warn;

use super::binding::SchemaBinding;
use super::builder::LayeredConfigBuilder;
use super::decode::{Decoder, Format};
use super::source::ConfigSource;
use super::tier::Tier;
use super::tree::{ConfigTree, LoadReport};
use super::value::ConfigValue;
use super::ConfigError;

/// A layered configuration tree plus the plumbing to feed it.
///
/// Every failed load leaves the tree exactly as it was.
///
/// ## Example
///
/// ```
/// use dragon_tiers::{ConfigValue, LayeredConfig, Tier};
///
/// let mut config = LayeredConfig::new();
/// config.load_from_bytes(br#"{"volume": 5, "audio": {"bitrate": 128}}"#, Tier::Base)?;
/// config.load_from_bytes(br#"{"volume": 7}"#, Tier::User)?;
///
/// assert_eq!(config.read("volume"), Some(&ConfigValue::Integer(7)));
/// assert_eq!(config.read("audio.bitrate"), Some(&ConfigValue::Integer(128)));
/// # Ok::<(), dragon_tiers::ConfigError>(())
/// ```
#[derive(Debug, Default)]
pub struct LayeredConfig {
    tree: ConfigTree,
    format: Format,
}

impl LayeredConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new builder.
    pub fn builder() -> LayeredConfigBuilder {
        LayeredConfigBuilder::default()
    }

    pub(crate) fn from_parts(tree: ConfigTree, format: Format) -> Self {
        Self { tree, format }
    }

    /// Loads whatever `source` produces at `tier`.
    ///
    /// Returns `Ok(None)` when the source had nothing to load.
    pub fn load_from_source(
        &mut self,
        source: &dyn ConfigSource,
        tier: Tier,
    ) -> Result<Option<LoadReport>, ConfigError> {
        let loaded = match source.load_for(self.tree.root()) {
            Ok(Some(object)) => self.tree.load(object, tier).map(Some),
            Ok(None) => Ok(None),
            Err(err) => Err(err),
        };
        if let Err(err) = &loaded {
            warn!(source = %source.describe(), %tier, "configuration not loaded: {err}");
        }
        loaded
    }

    /// Decodes `bytes` with the default format and loads them at `tier`.
    pub fn load_from_bytes(&mut self, bytes: &[u8], tier: Tier) -> Result<LoadReport, ConfigError> {
        let format = self.format;
        self.load_with(&format, bytes, tier)
    }

    /// Decodes `bytes` with `decoder` and loads them at `tier`.
    pub fn load_with(
        &mut self,
        decoder: &dyn Decoder,
        bytes: &[u8],
        tier: Tier,
    ) -> Result<LoadReport, ConfigError> {
        let loaded = decoder
            .decode_object(bytes)
            .and_then(|object| self.tree.load(object, tier));
        if let Err(err) = &loaded {
            warn!(%tier, "configuration not loaded: {err}");
        }
        loaded
    }

    pub fn current_root(&self) -> Option<&SchemaBinding> {
        self.tree.current_root()
    }

    pub fn read(&self, path: &str) -> Option<&ConfigValue> {
        self.tree.read(path)
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ConfigTree {
        &mut self.tree
    }
}
