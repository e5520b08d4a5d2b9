//! `WorldStateV1`: the named fact store consumed by the planner core.
//!
//! A state is a map from `(predicate, subject)` to a [`FactValueV1`], backed
//! by a `BTreeMap` for deterministic iteration at serialization boundaries.
//!
//! # Snapshot semantics
//!
//! Cloning a state is the snapshot operation. A snapshot captured in a
//! solution-tree node is never mutated in place; execution always produces a
//! fresh state value from the previous one.
//!
//! # Equality semantics
//!
//! `WorldStateV1` intentionally does **not** derive `PartialEq`. The name is
//! a diagnostic label, not identity — use [`WorldStateV1::facts_eq`] for the
//! structural comparison goal satisfaction and tests rely on.

use std::collections::BTreeMap;

use crate::hash::{canonical_hash, ContentHashV1};
use crate::value::FactValueV1;

/// Domain prefix for world-state fingerprints.
pub const DOMAIN_WORLD_STATE: &[u8] = b"MERIDIAN::WORLD_STATE::V1\0";

/// A named fact store over `(predicate, subject) -> value`.
#[derive(Debug, Clone)]
pub struct WorldStateV1 {
    name: String,
    facts: BTreeMap<(String, String), FactValueV1>,
}

impl WorldStateV1 {
    /// Create an empty state with a diagnostic name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            facts: BTreeMap::new(),
        }
    }

    /// The diagnostic name of this state.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a fact value.
    #[must_use]
    pub fn get_fact(&self, predicate: &str, subject: &str) -> Option<&FactValueV1> {
        self.facts
            .get(&(predicate.to_string(), subject.to_string()))
    }

    /// Insert or replace a fact.
    pub fn set_fact(
        &mut self,
        predicate: impl Into<String>,
        subject: impl Into<String>,
        value: impl Into<FactValueV1>,
    ) {
        self.facts
            .insert((predicate.into(), subject.into()), value.into());
    }

    /// Builder-style [`set_fact`](Self::set_fact), for fixtures and worlds.
    #[must_use]
    pub fn with_fact(
        mut self,
        predicate: impl Into<String>,
        subject: impl Into<String>,
        value: impl Into<FactValueV1>,
    ) -> Self {
        self.set_fact(predicate, subject, value);
        self
    }

    /// Deterministic iteration over all facts, sorted by `(predicate, subject)`.
    pub fn facts(&self) -> impl Iterator<Item = (&str, &str, &FactValueV1)> {
        self.facts
            .iter()
            .map(|((p, s), v)| (p.as_str(), s.as_str(), v))
    }

    /// Number of facts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    /// Whether the state holds no facts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Structural equality over facts only (the name is excluded).
    #[must_use]
    pub fn facts_eq(&self, other: &Self) -> bool {
        self.facts == other.facts
    }

    /// Canonical byte encoding of the fact map, for fingerprints.
    ///
    /// Length-prefixed `predicate`, `subject`, and value payload per fact,
    /// in `BTreeMap` order. Infallible and independent of the state name.
    #[must_use]
    pub fn identity_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for ((predicate, subject), value) in &self.facts {
            push_str(&mut out, predicate);
            push_str(&mut out, subject);
            match value {
                FactValueV1::Sym(s) => {
                    out.push(b'S');
                    push_str(&mut out, s);
                }
                FactValueV1::Int(i) => {
                    out.push(b'I');
                    out.extend_from_slice(&i.to_le_bytes());
                }
                FactValueV1::Bool(b) => {
                    out.push(b'B');
                    out.push(u8::from(*b));
                }
            }
        }
        out
    }

    /// Fingerprint of the fact map under [`DOMAIN_WORLD_STATE`].
    #[must_use]
    pub fn fingerprint(&self) -> ContentHashV1 {
        canonical_hash(DOMAIN_WORLD_STATE, &self.identity_bytes())
    }

    /// Project to a `serde_json::Value` for artifact rendering.
    ///
    /// Shape: `{"name": ..., "facts": {predicate: {subject: value}}}`.
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        let mut by_predicate: BTreeMap<&str, serde_json::Map<String, serde_json::Value>> =
            BTreeMap::new();
        for (predicate, subject, value) in self.facts() {
            by_predicate
                .entry(predicate)
                .or_default()
                .insert(subject.to_string(), value.to_json_value());
        }
        let facts: serde_json::Map<String, serde_json::Value> = by_predicate
            .into_iter()
            .map(|(p, subjects)| (p.to_string(), serde_json::Value::Object(subjects)))
            .collect();
        serde_json::json!({
            "name": self.name,
            "facts": facts,
        })
    }
}

fn push_str(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u64).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_and_set_round_trip() {
        let mut state = WorldStateV1::new("test");
        assert!(state.get_fact("pos", "a").is_none());
        state.set_fact("pos", "a", "table");
        assert_eq!(
            state.get_fact("pos", "a"),
            Some(&FactValueV1::sym("table"))
        );
        state.set_fact("pos", "a", "b");
        assert_eq!(state.get_fact("pos", "a"), Some(&FactValueV1::sym("b")));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn facts_eq_ignores_name() {
        let a = WorldStateV1::new("a").with_fact("pos", "x", "table");
        let b = WorldStateV1::new("b").with_fact("pos", "x", "table");
        assert!(a.facts_eq(&b));
        let c = b.clone().with_fact("pos", "y", "table");
        assert!(!a.facts_eq(&c));
    }

    #[test]
    fn fingerprint_is_order_insensitive() {
        let a = WorldStateV1::new("s")
            .with_fact("pos", "a", "table")
            .with_fact("clear", "a", true);
        let b = WorldStateV1::new("s")
            .with_fact("clear", "a", true)
            .with_fact("pos", "a", "table");
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_distinguishes_value_types() {
        let a = WorldStateV1::new("s").with_fact("n", "x", 1i64);
        let b = WorldStateV1::new("s").with_fact("n", "x", true);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn json_projection_groups_by_predicate() {
        let state = WorldStateV1::new("s")
            .with_fact("pos", "a", "table")
            .with_fact("pos", "b", "a");
        let value = state.to_json_value();
        assert_eq!(value["facts"]["pos"]["a"], "table");
        assert_eq!(value["facts"]["pos"]["b"], "a");
    }
}
