use dragon_tiers::config::{BindingPublisher, EnvSource, NodeView, PropertyChange};
use dragon_tiers::{LayeredConfig, Tier};
use tracing_subscriber::EnvFilter;

struct LogPublisher;

impl BindingPublisher for LogPublisher {
    fn publish_root(&mut self, root: NodeView<'_>) {
        let Some(binding) = root.binding() else {
            return;
        };
        let fields: Vec<_> = root
            .properties()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        let children: Vec<_> = root.children().map(|child| child.name()).collect();
        println!(
            "published {} fields={fields:?} children={children:?}",
            binding.type_name()
        );
    }
}

fn main() -> Result<(), dragon_tiers::Error> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("dragon_tiers=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = LayeredConfig::builder().with_publisher(LogPublisher).build()?;

    config.load_from_bytes(
        br#"{"volume": 5, "audio": {"bitrate": 128, "codec": "opus"}}"#,
        Tier::Base,
    )?;
    config.tree_mut().connect("volume", |change: &PropertyChange<'_>| {
        let PropertyChange { name, tier, value } = change;
        println!("{name} -> {value} (from {tier} tier)");
    })?;

    config.load_from_bytes(br#"{"volume": 7}"#, Tier::User)?;
    config.load_from_bytes(br#"{"volume": 9, "video": {"fps": 30}}"#, Tier::Project)?;
    config.load_from_bytes(br#"{"volume": 3}"#, Tier::User)?;

    // DRAGON_DEMO__AUDIO__BITRATE=256 overrides at the project tier.
    config.load_from_source(&EnvSource::new("DRAGON_DEMO", "__"), Tier::Project)?;

    println!("effective: {}", config.tree().snapshot());
    Ok(())
}
