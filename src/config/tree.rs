//! The layered property tree.
//!
//! A base-tier load rebuilds the whole tree and republishes the root binding.
//! Any other tier only writes values into the shape the base tier declared,
//! so loads at those tiers never add or remove properties.
//!
//! The tree is single-threaded and not reentrant: callers must serialize all
//! calls that take `&mut self`, and listeners must not call back into the
//! tree.

use std::fmt;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::binding::{BindingIds, BindingPublisher, PropertyChange, SchemaBinding};
use super::node::{NodeArena, NodeId, NodeView};
use super::tier::Tier;
use super::value::{ConfigValue, RawObject};
use super::ConfigError;

/// Outcome of one successful `load`.
#[derive(Debug)]
pub struct LoadReport {
    pub tier: Tier,
    /// Per-key problems that were skipped over.
    pub diagnostics: Vec<ConfigError>,
    /// Qualified names of properties whose listeners were notified, in order.
    pub changed: Vec<String>,
}

impl LoadReport {
    pub fn new(tier: Tier) -> Self {
        Self {
            tier,
            diagnostics: Vec::new(),
            changed: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Names reported as `PropertyNotFound`.
    pub fn not_found(&self) -> impl Iterator<Item = &str> {
        self.diagnostics.iter().filter_map(|d| match d {
            ConfigError::PropertyNotFound(name) => Some(name.as_str()),
            _ => None,
        })
    }

    pub(crate) fn push(&mut self, diagnostic: ConfigError) {
        warn!(tier = %self.tier, "{diagnostic}");
        self.diagnostics.push(diagnostic);
    }
}

#[derive(Default)]
pub struct ConfigTree {
    arena: NodeArena,
    root: Option<NodeId>,
    raw: [Option<RawObject>; Tier::COUNT],
    binding_ids: BindingIds,
    publisher: Option<Box<dyn BindingPublisher>>,
}

impl ConfigTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tree that hands every new root binding to `publisher`.
    pub fn with_publisher(publisher: Box<dyn BindingPublisher>) -> Self {
        Self {
            publisher: Some(publisher),
            ..Self::default()
        }
    }

    pub fn set_publisher(&mut self, publisher: Box<dyn BindingPublisher>) {
        self.publisher = Some(publisher);
    }

    pub fn is_loaded(&self) -> bool {
        self.root.is_some()
    }

    /// Loads `object` at `tier`.
    ///
    /// At the base tier the existing tree is released and rebuilt from
    /// `object`, dropping every value set at other tiers. At any other tier the
    /// values are written into the existing shape; keys absent from `object`
    /// keep what they had.
    pub fn load(&mut self, object: RawObject, tier: Tier) -> Result<LoadReport, ConfigError> {
        let report = if tier.is_base() {
            self.rebuild(&object)
        } else {
            let Some(root) = self.root else {
                warn!(%tier, "no base configuration loaded, ignoring update");
                return Err(ConfigError::NoTreeLoaded { tier });
            };
            let mut report = LoadReport::new(tier);
            self.arena.apply_update(root, &object, tier, &mut report);
            report
        };

        debug!(
            %tier,
            changed = report.changed.len(),
            diagnostics = report.diagnostics.len(),
            "configuration loaded"
        );
        self.raw[tier.index()] = Some(object);
        Ok(report)
    }

    fn rebuild(&mut self, object: &RawObject) -> LoadReport {
        if let Some(root) = self.root.take() {
            self.arena.clear(root);
        }
        self.arena = NodeArena::new();

        let mut report = LoadReport::new(Tier::Base);
        let root = self.arena.insert_root();
        self.arena.establish_shape(root, object, &mut self.binding_ids, &mut report);
        self.root = Some(root);

        let view = NodeView::new(&self.arena, root);
        if let Some(binding) = view.binding() {
            info!(binding = ?binding.id(), "configuration tree rebuilt");
        }
        if let Some(publisher) = self.publisher.as_mut() {
            publisher.publish_root(view);
        }
        report
    }

    /// The binding consumers should currently hold for the root.
    pub fn current_root(&self) -> Option<&SchemaBinding> {
        self.arena.get(self.root?).binding()
    }

    pub fn root(&self) -> Option<NodeView<'_>> {
        Some(NodeView::new(&self.arena, self.root?))
    }

    /// The node behind `id`, if it belongs to the current tree.
    ///
    /// Ids from before the last base-tier load may name a different node.
    pub fn view(&self, id: NodeId) -> Option<NodeView<'_>> {
        self.arena
            .contains(id)
            .then(|| NodeView::new(&self.arena, id))
    }

    /// Navigates to the namespace at a dotted path; `""` is the root.
    pub fn node(&self, path: &str) -> Option<NodeView<'_>> {
        let id = self.arena.find_node(self.root?, path)?;
        Some(NodeView::new(&self.arena, id))
    }

    /// Effective value of a dotted property path.
    pub fn read(&self, path: &str) -> Option<&ConfigValue> {
        let (node, key) = self.arena.resolve(self.root?, path)?;
        self.arena.get(node).slot(key)?.read()
    }

    pub fn read_at_tier(&self, path: &str, tier: Tier) -> Option<&ConfigValue> {
        let (node, key) = self.arena.resolve(self.root?, path)?;
        self.arena.get(node).slot(key)?.read_at_tier(tier)
    }

    /// Writes one declared property at `tier`, notifying if visible.
    ///
    /// Returns whether the write became the effective value.
    pub fn set_property(
        &mut self,
        path: &str,
        value: impl Into<ConfigValue>,
        tier: Tier,
    ) -> Result<bool, ConfigError> {
        let root = self.root.ok_or(ConfigError::NotLoaded)?;
        let (node, key) = self
            .arena
            .resolve(root, path)
            .ok_or_else(|| ConfigError::PropertyNotFound(path.to_string()))?;
        let changed = self.arena.write_property(node, key, value.into(), tier)?;
        Ok(changed.is_some())
    }

    /// Registers a listener for a dotted property path.
    ///
    /// Listeners belong to the current tree and are dropped by the next
    /// base-tier load.
    pub fn connect<F>(&mut self, path: &str, listener: F) -> Result<(), ConfigError>
    where
        F: FnMut(&PropertyChange<'_>) + 'static,
    {
        let not_found = || ConfigError::PropertyNotFound(path.to_string());
        let root = self.root.ok_or(ConfigError::NotLoaded)?;
        let (node, key) = self.arena.resolve(root, path).ok_or_else(not_found)?;
        let binding = self.arena.binding_mut(node).ok_or_else(not_found)?;
        if binding.connect(key, listener) {
            Ok(())
        } else {
            Err(not_found())
        }
    }

    /// The object most recently loaded at `tier`.
    pub fn raw(&self, tier: Tier) -> Option<&RawObject> {
        self.raw[tier.index()].as_ref()
    }

    /// Effective values of the whole tree, or `Null` before the first base
    /// load.
    pub fn snapshot(&self) -> Value {
        self.root.map_or(Value::Null, |root| self.arena.snapshot(root))
    }
}

impl fmt::Debug for ConfigTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigTree")
            .field("root", &self.current_root())
            .field("raw", &self.raw)
            .field("has_publisher", &self.publisher.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use serde_json::json;

    fn object(value: Value) -> RawObject {
        match value {
            Value::Object(map) => map,
            _ => panic!("test fixture must be an object"),
        }
    }

    fn loaded() -> ConfigTree {
        let mut tree = ConfigTree::new();
        tree.load(
            object(json!({"volume": 5, "audio": {"bitrate": 128}})),
            Tier::Base,
        )
        .unwrap();
        tree
    }

    /// Records the root type name and effective `volume` of each rebuild.
    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<(String, Option<ConfigValue>)>>>);

    impl BindingPublisher for Recorder {
        fn publish_root(&mut self, root: NodeView<'_>) {
            let type_name = root.binding().map(|b| b.type_name().to_string());
            let volume = root.property("volume").cloned();
            self.0
                .borrow_mut()
                .push((type_name.unwrap_or_default(), volume));
        }
    }

    #[test]
    fn test_update_before_base_is_rejected() {
        let mut tree = ConfigTree::new();
        let result = tree.load(object(json!({"volume": 7})), Tier::User);
        assert!(matches!(
            result,
            Err(ConfigError::NoTreeLoaded { tier: Tier::User })
        ));
        assert!(!tree.is_loaded());
        assert!(tree.raw(Tier::User).is_none());
        assert!(tree.current_root().is_none());
    }

    #[test]
    fn test_reads_across_tiers() {
        let mut tree = loaded();
        assert_eq!(tree.read("volume"), Some(&ConfigValue::Integer(5)));
        assert_eq!(tree.read("audio.bitrate"), Some(&ConfigValue::Integer(128)));

        let report = tree.load(object(json!({"volume": 7})), Tier::User).unwrap();
        assert_eq!(report.changed, vec!["volume".to_string()]);
        assert_eq!(tree.read("volume"), Some(&ConfigValue::Integer(7)));
        assert_eq!(
            tree.read_at_tier("volume", Tier::Base),
            Some(&ConfigValue::Integer(5))
        );
    }

    #[test]
    fn test_reload_keeps_unmentioned_values() {
        let mut tree = loaded();
        tree.load(
            object(json!({"volume": 7, "audio": {"bitrate": 192}})),
            Tier::User,
        )
        .unwrap();
        tree.load(object(json!({"volume": 3})), Tier::User).unwrap();
        assert_eq!(tree.read("volume"), Some(&ConfigValue::Integer(3)));
        assert_eq!(tree.read("audio.bitrate"), Some(&ConfigValue::Integer(192)));
        assert_eq!(tree.raw(Tier::User), Some(&object(json!({"volume": 3}))));
    }

    #[test]
    fn test_base_reload_replaces_everything() {
        let recorder = Recorder::default();
        let mut tree = ConfigTree::with_publisher(Box::new(recorder.clone()));
        tree.load(
            object(json!({"volume": 5, "audio": {"bitrate": 128}})),
            Tier::Base,
        )
        .unwrap();
        let first = tree.current_root().unwrap().id();
        tree.load(object(json!({"volume": 7})), Tier::Project)
            .unwrap();

        tree.load(

            object(json!({"volume": 1, "video": {"fps": 30}})),

            Tier::Base,

        )

        .unwrap();
        assert_ne!(tree.current_root().unwrap().id(), first);
        assert_eq!(tree.read("volume"), Some(&ConfigValue::Integer(1)));
        assert_eq!(tree.read_at_tier("volume", Tier::Project), None);
        assert!(tree.read("audio.bitrate").is_none());
        assert!(tree.node("audio").is_none());
        assert_eq!(tree.read("video.fps"), Some(&ConfigValue::Integer(30)));
        assert_eq!(
            *recorder.0.borrow(),
            vec![
                ("RootObject".to_string(), Some(ConfigValue::Integer(5))),
                ("RootObject".to_string(), Some(ConfigValue::Integer(1))),
            ]
        );
    }

    #[test]
    fn test_publisher_reads_values_and_children() {
        struct Inspector(Rc<RefCell<Vec<String>>>);

        impl BindingPublisher for Inspector {
            fn publish_root(&mut self, root: NodeView<'_>) {
                let binding = root.binding().unwrap();
                let mut seen = self.0.borrow_mut();
                for field in binding.fields() {
                    let value = root.property(&field.name).unwrap();
                    seen.push(format!("{}={value}", field.name));
                }
                for child in binding.children() {
                    let node = root.child(&child.name).unwrap();
                    let bitrate = node.property("bitrate").unwrap();
                    let type_name = node.binding().unwrap().type_name();
                    seen.push(format!("{type_name}.bitrate={bitrate}"));
                }
            }
        }

        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut tree = ConfigTree::with_publisher(Box::new(Inspector(Rc::clone(&seen))));
        tree.load(
            object(json!({"volume": 5, "audio": {"bitrate": 128}})),
            Tier::Base,
        )
        .unwrap();
        assert_eq!(*seen.borrow(), vec!["volume=5", "Audio.bitrate=128"]);

        let audio = tree.current_root().unwrap().child("audio").unwrap();
        let view = tree.view(audio).unwrap();
        assert_eq!(view.fully_qualified_name("bitrate"), "audio.bitrate");
    }

    #[test]
    fn test_view_requires_a_tree() {
        let tree = loaded();
        let audio = tree.node("audio").unwrap().id();
        assert_eq!(tree.view(audio).unwrap().name(), "audio");
        assert!(ConfigTree::new().view(audio).is_none());
    }

    #[test]
    fn test_listeners_follow_visibility() {
        let mut tree = loaded();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        tree.connect("audio.bitrate", move |change| {
            sink.borrow_mut().push((change.tier, change.value.clone()));
        })
        .unwrap();

        tree.load(object(json!({"audio": {"bitrate": 256}})), Tier::Project)
            .unwrap();
        tree.load(object(json!({"audio": {"bitrate": 192}})), Tier::User)
            .unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![(Tier::Project, ConfigValue::Integer(256))]
        );
    }

    #[test]
    fn test_connect_before_any_load() {
        let mut tree = ConfigTree::new();
        let result = tree.connect("volume", |_| {});
        assert!(matches!(result, Err(ConfigError::NotLoaded)));
        assert!(matches!(
            tree.set_property("volume", 7, Tier::User),
            Err(ConfigError::NotLoaded)
        ));
        assert_eq!(
            ConfigError::NotLoaded.to_string(),
            "no configuration tree has been loaded yet"
        );
    }

    #[test]
    fn test_connect_unknown_path() {
        let mut tree = loaded();
        let result = tree.connect("audio.codec", |_| {});
        assert!(matches!(result, Err(ConfigError::PropertyNotFound(p)) if p == "audio.codec"));
        let result = tree.connect("audio", |_| {});
        assert!(matches!(result, Err(ConfigError::PropertyNotFound(_))));
    }

    #[test]
    fn test_set_property() {
        let mut tree = loaded();
        assert!(tree.set_property("audio.bitrate", 320, Tier::User).unwrap());
        assert!(!tree.set_property("audio.bitrate", 64, Tier::Base).unwrap());
        assert_eq!(tree.read("audio.bitrate"), Some(&ConfigValue::Integer(320)));
        assert!(matches!(
            tree.set_property("audio.codec", "opus", Tier::User),
            Err(ConfigError::PropertyNotFound(_))
        ));
        assert!(matches!(
            tree.set_property("volume", "max", Tier::User),
            Err(ConfigError::KindMismatch { .. })
        ));
    }

    #[test]
    fn test_snapshot() {
        let mut tree = ConfigTree::new();
        assert_eq!(tree.snapshot(), Value::Null);
        tree.load(
            object(json!({"volume": 5, "audio": {"bitrate": 128}})),
            Tier::Base,
        )
        .unwrap();
        tree.load(object(json!({"audio": {"bitrate": 96}})), Tier::User)
            .unwrap();
        assert_eq!(
            tree.snapshot(),
            json!({"volume": 5, "audio": {"bitrate": 96}})
        );
    }
}
