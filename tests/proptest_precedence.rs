//! Property-based tests for tier precedence and notification suppression.
//!
//! Run with: `cargo test --test proptest_precedence`

use std::cell::Cell;
use std::rc::Rc;

use proptest::prelude::*;
use serde_json::json;

use dragon_tiers::config::{PropertyChange, ValueSlot};
use dragon_tiers::{ConfigTree, ConfigValue, Tier};

fn tier_strategy() -> impl Strategy<Value = Tier> {
    prop_oneof![Just(Tier::Base), Just(Tier::User), Just(Tier::Project)]
}

/// A sequence of writes at random tiers.
fn writes_strategy() -> impl Strategy<Value = Vec<(Tier, i64)>> {
    prop::collection::vec((tier_strategy(), any::<i64>()), 0..32)
}

fn base_tree() -> ConfigTree {
    let mut tree = ConfigTree::new();
    let base = json!({"volume": 0, "audio": {"bitrate": 0}});
    let serde_json::Value::Object(object) = base else {
        unreachable!()
    };
    tree.load(object, Tier::Base).unwrap();
    tree
}

proptest! {
    /// The effective value is the latest write at the highest tier written.
    #[test]
    fn slot_reads_highest_tier(writes in writes_strategy()) {
        let mut slot = ValueSlot::new("volume", ConfigValue::Integer(0));
        let mut latest = [Some(0i64), None, None];

        for (tier, value) in &writes {
            slot.write(*tier, ConfigValue::Integer(*value));
            latest[tier.index()] = Some(*value);
        }

        let expected = latest.iter().rev().find_map(|v| *v);
        prop_assert_eq!(slot.read().and_then(ConfigValue::as_i64), expected);
    }

    /// A write notifies exactly when no higher tier holds a value, and a
    /// suppressed write never changes what consumers read.
    #[test]
    fn notifications_track_visibility(writes in writes_strategy()) {
        let mut tree = base_tree();
        let fired = Rc::new(Cell::new(0usize));
        let counter = Rc::clone(&fired);
        tree.connect("audio.bitrate", move |_: &PropertyChange<'_>| {
            counter.set(counter.get() + 1);
        })
        .unwrap();

        let mut held = [true, false, false];
        for (tier, value) in writes {
            let before = tree.read("audio.bitrate").cloned();
            let count = fired.get();
            let expect_visible = tier.higher().iter().all(|t| !held[t.index()]);

            let visible = tree.set_property("audio.bitrate", value, tier).unwrap();
            held[tier.index()] = true;

            prop_assert_eq!(visible, expect_visible);
            if visible {
                prop_assert_eq!(fired.get(), count + 1);
                let expected = ConfigValue::Integer(value);
                prop_assert_eq!(tree.read("audio.bitrate"), Some(&expected));
            } else {
                prop_assert_eq!(fired.get(), count);
                prop_assert_eq!(tree.read("audio.bitrate").cloned(), before);
            }
        }
    }

    /// Loads at non-base tiers never add properties, whatever keys they carry.
    #[test]
    fn updates_never_change_shape(
        keys in prop::collection::btree_set("[a-z]{1,8}", 0..16),
        tier in prop_oneof![Just(Tier::User), Just(Tier::Project)],
    ) {
        let mut tree = base_tree();
        let root = tree.current_root().unwrap().id();

        let object = keys.iter().map(|k| (k.clone(), json!(1))).collect();
        let report = tree.load(object, tier).unwrap();

        // A scalar for the declared `audio` namespace is a kind mismatch.
        let rejected = keys.iter().filter(|k| k.as_str() != "volume").count();
        let unknown = keys
            .iter()
            .filter(|k| !["volume", "audio"].contains(&k.as_str()))
            .count();
        prop_assert_eq!(tree.current_root().unwrap().id(), root);
        prop_assert_eq!(tree.current_root().unwrap().fields().len(), 1);
        prop_assert_eq!(report.not_found().count(), unknown);
        prop_assert_eq!(report.diagnostics.len(), rejected);
    }
}
