use std::fmt;
use std::path::Path;

use tracing::debug;

use super::binding::BindingPublisher;
use super::decode::Format;
use super::engine::LayeredConfig;
use super::env::EnvSource;
use super::file::FileSource;
use super::source::ConfigSource;
use super::tier::Tier;
use super::tree::ConfigTree;
use crate::Error;

/// Builder for a [`LayeredConfig`] loaded from several sources.
///
/// Sources are loaded in registration order, each at its own tier. The first
/// source should be the base tier: it declares every property the other tiers
/// may override.
///
/// ## Example
///
/// ```no_run
/// use dragon_tiers::{LayeredConfig, Tier};
///
/// let config = LayeredConfig::builder()
///     .with_file("/etc/myapp/defaults.json", true, Tier::Base)
///     .with_file("~/.config/myapp/user.toml", false, Tier::User)
///     .with_env("MYAPP", "__", Tier::Project)
///     .build()?;
///
/// let bitrate = config.read("audio.bitrate");
/// # Ok::<(), dragon_tiers::Error>(())
/// ```
#[derive(Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct LayeredConfigBuilder {
    format: Format,
    publisher: Option<Box<dyn BindingPublisher>>,
    sources: Vec<(Box<dyn ConfigSource>, Tier)>,
}

impl LayeredConfigBuilder {
    /// Sets the format `load_from_bytes` decodes with. Files pick their own
    /// format from their extension.
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Receives the root binding on every base-tier load, including the ones
    /// made by `build`.
    pub fn with_publisher(mut self, publisher: impl BindingPublisher + 'static) -> Self {
        self.publisher = Some(Box::new(publisher));
        self
    }

    /// Adds a JSON or TOML file to be loaded at `tier`.
    ///
    /// If `required` is `true`, the build will fail if the file doesn't exist.
    /// Optional files that are missing are silently skipped.
    pub fn with_file(self, path: impl AsRef<Path>, required: bool, tier: Tier) -> Self {
        self.with_source(FileSource::new(path, required), tier)
    }

    /// Loads environment variables with the given prefix at `tier`.
    ///
    /// Variables are mapped to property paths by removing the prefix and
    /// splitting on the separator. Segments match the base tier's keys
    /// regardless of ASCII case, and values are parsed as the declared kind
    /// of their property.
    pub fn with_env(
        self,
        prefix: impl Into<String>,
        separator: impl Into<String>,
        tier: Tier,
    ) -> Self {
        self.with_source(EnvSource::new(prefix, separator), tier)
    }

    pub fn with_source(mut self, source: impl ConfigSource + 'static, tier: Tier) -> Self {
        self.sources.push((Box::new(source), tier));
        self
    }

    /// Loads every source in order.
    ///
    /// A source that fails to load aborts the build. Keys a source supplies
    /// that the base tier never declared are only logged.
    pub fn build(self) -> Result<LayeredConfig, Error> {
        let tree = match self.publisher {
            Some(publisher) => ConfigTree::with_publisher(publisher),
            None => ConfigTree::new(),
        };
        let mut config = LayeredConfig::from_parts(tree, self.format);

        for (source, tier) in &self.sources {
            let report = config
                .load_from_source(source.as_ref(), *tier)
                .map_err(|error| Error::Source {
                    source_name: source.describe(),
                    tier: *tier,
                    error,
                })?;
            if let Some(report) = report {
                debug!(
                    source = %source.describe(),
                    %tier,
                    diagnostics = report.diagnostics.len(),
                    "source applied"
                );
            }
        }

        Ok(config)
    }
}

impl fmt::Debug for LayeredConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayeredConfigBuilder")
            .field("format", &self.format)
            .field("has_publisher", &self.publisher.is_some())
            .field("sources", &self.sources)
            .finish()
    }
}
