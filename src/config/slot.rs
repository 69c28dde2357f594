//! Per-property storage across tiers.

use super::tier::Tier;
use super::value::{ConfigValue, ValueKind};

/// One property's values, one optional value per tier.
#[derive(Debug, Clone)]
pub struct ValueSlot {
    key: String,
    kind: ValueKind,
    values: [Option<ConfigValue>; Tier::COUNT],
}

impl ValueSlot {
    /// Creates a slot holding `value` at the base tier. The slot's kind is
    /// taken from this value and never changes.
    pub fn new(key: impl Into<String>, value: ConfigValue) -> Self {
        let kind = value.kind();
        let mut values: [Option<ConfigValue>; Tier::COUNT] = Default::default();
        values[Tier::Base.index()] = Some(value);
        Self {
            key: key.into(),
            kind,
            values,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Stores `value` at `tier`.
    ///
    /// Returns `true` when no higher tier holds a value, i.e. the write is what
    /// consumers now see. Rewriting an identical value still counts.
    pub fn write(&mut self, tier: Tier, value: ConfigValue) -> bool {
        self.values[tier.index()] = Some(value);
        tier.higher()
            .iter()
            .all(|higher| self.values[higher.index()].is_none())
    }

    /// The effective value: the one held at the highest tier that has any.
    pub fn read(&self) -> Option<&ConfigValue> {
        self.values.iter().rev().find_map(Option::as_ref)
    }

    pub fn read_at_tier(&self, tier: Tier) -> Option<&ConfigValue> {
        self.values[tier.index()].as_ref()
    }

    /// The tier the effective value comes from.
    pub fn winning_tier(&self) -> Option<Tier> {
        Tier::ALL
            .into_iter()
            .rev()
            .find(|tier| self.values[tier.index()].is_some())
    }
}
