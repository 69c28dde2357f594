//! Externally visible projection of a node.
//!
//! A [`SchemaBinding`] is a property table built once per node shape: one
//! read-only, typed field per property and one reference field per child
//! namespace. Each field has its own listener list, fired whenever the
//! property's effective value may have changed.

use std::fmt;

use super::node::{NodeId, NodeView};
use super::tier::Tier;
use super::value::{ConfigValue, ValueKind};

/// Identity of one binding instance. A rebuilt node gets a new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(u64);

/// Hands out binding ids. Lives as long as the tree so ids never repeat
/// across rebuilds.
#[derive(Debug, Default)]
pub(crate) struct BindingIds(u64);

impl BindingIds {
    pub(crate) fn next_id(&mut self) -> BindingId {
        self.0 += 1;
        BindingId(self.0)
    }
}

/// A typed property field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: ValueKind,
}

/// A reference field pointing at a child namespace.
///
/// `node` indexes the tree that built this binding. A base-tier load starts a
/// new tree, so hold on to the name rather than the id across rebuilds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildField {
    pub name: String,
    pub node: NodeId,
}

/// Delivered to listeners when a property's effective value changes.
#[derive(Debug, Clone, Copy)]
pub struct PropertyChange<'a> {
    /// Fully-qualified, dot-separated property name.
    pub name: &'a str,
    pub tier: Tier,
    pub value: &'a ConfigValue,
}

pub type Listener = Box<dyn FnMut(&PropertyChange<'_>)>;

/// Receives the root every time the tree is rebuilt.
///
/// The view reaches the root's binding, its current values and its children.
pub trait BindingPublisher {
    fn publish_root(&mut self, root: NodeView<'_>);
}

pub struct SchemaBinding {
    id: BindingId,
    type_name: String,
    fields: Vec<FieldDescriptor>,
    children: Vec<ChildField>,
    listeners: Vec<Vec<Listener>>,
}

impl SchemaBinding {
    pub(crate) fn new(
        id: BindingId,
        type_name: String,
        fields: Vec<FieldDescriptor>,
        children: Vec<ChildField>,
    ) -> Self {
        let listeners = fields.iter().map(|_| Vec::new()).collect();
        Self {
            id,
            type_name,
            fields,
            children,
            listeners,
        }
    }

    pub fn id(&self) -> BindingId {
        self.id
    }

    /// `RootObject` for the root, otherwise the capitalised path segments
    /// joined together (`audio.codec` becomes `AudioCodec`).
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn children(&self) -> &[ChildField] {
        &self.children
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn child(&self, name: &str) -> Option<NodeId> {
        self.children.iter().find(|c| c.name == name).map(|c| c.node)
    }

    /// Registers `listener` on the named field. Returns `false` if the
    /// binding has no such field.
    pub fn connect<F>(&mut self, name: &str, listener: F) -> bool
    where
        F: FnMut(&PropertyChange<'_>) + 'static,
    {
        match self.field_index(name) {
            Some(index) => {
                self.listeners[index].push(Box::new(listener));
                true
            }
            None => false,
        }
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.field_index(name)
            .map_or(0, |index| self.listeners[index].len())
    }

    /// Fires every listener of field `index`.
    pub(crate) fn notify(&mut self, index: usize, change: &PropertyChange<'_>) {
        if let Some(listeners) = self.listeners.get_mut(index) {
            for listener in listeners.iter_mut() {
                listener(change);
            }
        }
    }
}

impl fmt::Debug for SchemaBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaBinding")
            .field("id", &self.id)
            .field("type_name", &self.type_name)
            .field("fields", &self.fields)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

/// Builds the type name for a node from its path below the root.
pub(crate) fn type_name_for(path: &[&str]) -> String {
    if path.is_empty() {
        return "RootObject".to_string();
    }
    path.iter().map(|segment| capitalize(segment)).collect()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
