//! Layered configuration tree.
//!
//! Values for each property may be supplied at several [`Tier`]s. The base
//! tier fixes the tree's shape; higher tiers override values inside it.

mod binding;
mod builder;
mod decode;
mod engine;
mod env;
mod error;
mod file;
mod node;
mod slot;
mod source;
mod tier;
mod tree;
mod value;

pub use binding::{
    BindingId, BindingPublisher, ChildField, FieldDescriptor, Listener, PropertyChange,
    SchemaBinding,
};
pub use builder::LayeredConfigBuilder;
pub use decode::{Decoder, Format};
pub use engine::LayeredConfig;
pub use env::EnvSource;
pub use error::ConfigError;
pub use file::FileSource;
pub use node::{Node, NodeId, NodeView, PATH_DELIMITER};
pub use slot::ValueSlot;
pub use source::{ConfigSource, ObjectSource};
pub use tier::Tier;
pub use tree::{ConfigTree, LoadReport};
pub use value::{ConfigValue, RawObject, ValueKind};
