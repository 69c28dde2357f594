//! The namespace tree.
//!
//! Nodes live in a [`NodeArena`] and refer to each other by [`NodeId`]. A
//! node's `children` list is the only thing that keeps a child alive; the
//! `parent` id is a back-reference used to build qualified names.

use serde_json::Value;
use tracing::debug;

use super::binding::{
    type_name_for, BindingIds, ChildField, FieldDescriptor, PropertyChange, SchemaBinding,
};
use super::slot::ValueSlot;
use super::tier::Tier;
use super::tree::LoadReport;
use super::value::{classify, ConfigValue, Entry, RawObject, ValueKind};
use super::ConfigError;

/// Separator used in fully-qualified property names and lookup paths.
pub const PATH_DELIMITER: &str = ".";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug)]
pub struct Node {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    slots: Vec<ValueSlot>,
    binding: Option<SchemaBinding>,
}

impl Node {
    fn new(name: impl Into<String>, parent: Option<NodeId>) -> Self {
        Self {
            name: name.into(),
            parent,
            children: Vec::new(),
            slots: Vec::new(),
            binding: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn slots(&self) -> &[ValueSlot] {
        &self.slots
    }

    pub fn slot(&self, key: &str) -> Option<&ValueSlot> {
        self.slots.iter().find(|s| s.key() == key)
    }

    pub fn binding(&self) -> Option<&SchemaBinding> {
        self.binding.as_ref()
    }
}

#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_root(&mut self) -> NodeId {
        self.insert(Node::new(String::new(), None))
    }

    fn insert(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn child_by_name(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.get(id)
            .children
            .iter()
            .copied()
            .find(|&child| self.get(child).name == name)
    }

    /// Names from just below the root down to `id`.
    pub fn path(&self, id: NodeId) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.get(node_id);
            if !node.name.is_empty() {
                path.push(node.name.as_str());
            }
            current = node.parent;
        }
        path.reverse();
        path
    }

    pub fn fully_qualified_name(&self, id: NodeId, key: &str) -> String {
        let mut path = self.path(id);
        path.push(key);
        path.join(PATH_DELIMITER)
    }

    /// Defines the shape of `id` from a base-tier object.
    ///
    /// Scalars and lists become properties holding their base value, nested
    /// objects become children shaped recursively. Anything else is reported
    /// and left out of the shape for good.
    pub(crate) fn establish_shape(
        &mut self,
        id: NodeId,
        object: &RawObject,
        ids: &mut BindingIds,
        report: &mut LoadReport,
    ) {
        let mut objects = Vec::new();
        for (key, value) in object {
            match classify(value) {
                Entry::Value(value) => self.get_mut(id).slots.push(ValueSlot::new(key, value)),
                Entry::Object(nested) => objects.push((key, nested)),
                Entry::Unsupported(found) => report.push(ConfigError::UnsupportedValueKind {
                    name: self.fully_qualified_name(id, key),
                    found,
                }),
            }
        }

        for (key, nested) in objects {
            let child = self.insert(Node::new(key.as_str(), Some(id)));
            self.get_mut(id).children.push(child);
            self.establish_shape(child, nested, ids, report);
        }

        self.build_binding(id, ids);
    }

    fn build_binding(&mut self, id: NodeId, ids: &mut BindingIds) {
        let type_name = type_name_for(&self.path(id));
        let node = self.get(id);
        let fields = node
            .slots
            .iter()
            .map(|slot| FieldDescriptor {
                name: slot.key().to_string(),
                kind: slot.kind(),
            })
            .collect();
        let children = node
            .children
            .iter()
            .map(|&child| ChildField {
                name: self.get(child).name.clone(),
                node: child,
            })
            .collect();
        let binding = SchemaBinding::new(ids.next_id(), type_name, fields, children);
        self.get_mut(id).binding = Some(binding);
    }

    /// Applies a non-base object to the existing shape of `id`.
    ///
    /// Keys that are unknown or of the wrong kind are reported and skipped;
    /// the rest of the object is still applied.
    pub(crate) fn apply_update(
        &mut self,
        id: NodeId,
        object: &RawObject,
        tier: Tier,
        report: &mut LoadReport,
    ) {
        let mut objects = Vec::new();
        for (key, value) in object {
            let result = match classify(value) {
                Entry::Value(value) => self.write_property(id, key, value, tier),
                Entry::Object(nested) => {
                    objects.push((key, nested));
                    continue;
                }
                Entry::Unsupported(found) => Err(self.mismatch(id, key, found)),
            };
            match result {
                Ok(Some(name)) => report.changed.push(name),
                Ok(None) => {}
                Err(err) => report.push(err),
            }
        }

        for (key, nested) in objects {
            match self.child_by_name(id, key) {
                Some(child) => self.apply_update(child, nested, tier, report),
                None => report.push(self.mismatch(id, key, "object")),
            }
        }
    }

    /// Error for an update of `key` that does not fit the declared shape.
    fn mismatch(&self, id: NodeId, key: &str, found: &'static str) -> ConfigError {
        let name = self.fully_qualified_name(id, key);
        let expected = match self.get(id).slot(key) {
            Some(slot) => slot.kind(),
            None if self.child_by_name(id, key).is_some() => ValueKind::Object,
            None => return ConfigError::PropertyNotFound(name),
        };
        ConfigError::KindMismatch {
            name,
            expected,
            found,
        }
    }

    /// Writes one property and notifies its listeners if the write is visible.
    ///
    /// Returns the qualified name when listeners were notified.
    pub(crate) fn write_property(
        &mut self,
        id: NodeId,
        key: &str,
        value: ConfigValue,
        tier: Tier,
    ) -> Result<Option<String>, ConfigError> {
        let Some(index) = self.get(id).slots.iter().position(|s| s.key() == key) else {
            return Err(self.mismatch(id, key, value.kind().as_str()));
        };

        let name = self.fully_qualified_name(id, key);
        let node = self.get_mut(id);
        let slot = &mut node.slots[index];
        let expected = slot.kind();
        let value = value
            .coerce_to(expected)
            .map_err(|found| ConfigError::KindMismatch {
                name: name.clone(),
                expected,
                found: found.kind().as_str(),
            })?;

        if !slot.write(tier, value) {
            debug!(property = %name, %tier, "write shadowed by a higher tier");
            return Ok(None);
        }

        debug!(property = %name, %tier, "property changed");
        let value = node.slots[index].read();
        if let (Some(binding), Some(value)) = (node.binding.as_mut(), value) {
            binding.notify(
                index,
                &PropertyChange {
                    name: &name,
                    tier,
                    value,
                },
            );
        }
        Ok(Some(name))
    }

    /// Releases the subtree under `id`: children, binding and properties.
    pub fn clear(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.get_mut(id).children);
        for child in children {
            self.clear(child);
        }
        let node = self.get_mut(id);
        node.binding = None;
        node.slots.clear();
        node.name.clear();
    }

    pub(crate) fn binding_mut(&mut self, id: NodeId) -> Option<&mut SchemaBinding> {
        self.get_mut(id).binding.as_mut()
    }

    /// Finds the node at a dotted namespace path. The empty path is `root`.
    pub fn find_node(&self, root: NodeId, path: &str) -> Option<NodeId> {
        if path.is_empty() {
            return Some(root);
        }
        path.split(PATH_DELIMITER)
            .try_fold(root, |node, segment| self.child_by_name(node, segment))
    }

    /// Splits a dotted property path into its owning node and local key.
    pub fn resolve<'p>(&self, root: NodeId, path: &'p str) -> Option<(NodeId, &'p str)> {
        match path.rsplit_once(PATH_DELIMITER) {
            Some((namespace, key)) => Some((self.find_node(root, namespace)?, key)),
            None => Some((root, path)),
        }
    }

    /// Effective values of the subtree as a JSON object.
    pub fn snapshot(&self, id: NodeId) -> Value {
        let node = self.get(id);
        let mut object = RawObject::new();
        for slot in &node.slots {
            if let Some(value) = slot.read() {
                object.insert(slot.key().to_string(), value.to_json());
            }
        }
        for &child in &node.children {
            object.insert(self.get(child).name.clone(), self.snapshot(child));
        }
        Value::Object(object)
    }
}

/// Read-only view of one node.
#[derive(Debug, Clone, Copy)]
pub struct NodeView<'a> {
    arena: &'a NodeArena,
    id: NodeId,
}

impl<'a> NodeView<'a> {
    pub(crate) fn new(arena: &'a NodeArena, id: NodeId) -> Self {
        Self { arena, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node(&self) -> &'a Node {
        self.arena.get(self.id)
    }

    pub fn name(&self) -> &'a str {
        &self.arena.get(self.id).name
    }

    pub fn fully_qualified_name(&self, key: &str) -> String {
        self.arena.fully_qualified_name(self.id, key)
    }

    pub fn binding(&self) -> Option<&'a SchemaBinding> {
        self.arena.get(self.id).binding()
    }

    pub fn property(&self, key: &str) -> Option<&'a ConfigValue> {
        self.arena.get(self.id).slot(key)?.read()
    }

    pub fn property_at_tier(&self, key: &str, tier: Tier) -> Option<&'a ConfigValue> {
        self.arena.get(self.id).slot(key)?.read_at_tier(tier)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&'a str, &'a ConfigValue)> + 'a {
        self.arena
            .get(self.id)
            .slots
            .iter()
            .filter_map(|slot| Some((slot.key(), slot.read()?)))
    }

    pub fn parent(&self) -> Option<NodeView<'a>> {
        let parent = self.arena.get(self.id).parent?;
        Some(NodeView::new(self.arena, parent))
    }

    pub fn child(&self, name: &str) -> Option<NodeView<'a>> {
        let child = self.arena.child_by_name(self.id, name)?;
        Some(NodeView::new(self.arena, child))
    }

    pub fn children(&self) -> impl Iterator<Item = NodeView<'a>> + 'a {
        let arena = self.arena;
        arena
            .get(self.id)
            .children
            .iter()
            .map(move |&child| NodeView::new(arena, child))
    }
}
