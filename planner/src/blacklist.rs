//! Blacklist bookkeeping: two independent exclusion mechanisms.
//!
//! Method blacklists are **per-node** and scoped to backtracking — they live
//! on [`crate::node::PlanNodeV1::blacklisted_methods`]. Command blacklists
//! are **global** and live on the tree. This module provides the command
//! key type and the session-level diagnostic record the executor maintains
//! alongside both: which entries were added, at which recovery attempt, and
//! the domain-wide "method totally exhausted" signal.

use std::collections::BTreeSet;

use meridian_kernel::value::{render_args, FactValueV1};

/// Canonical key for a concrete action instance: name plus exact arguments.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CommandKeyV1 {
    pub name: String,
    pub args: Vec<FactValueV1>,
}

impl CommandKeyV1 {
    /// Construct a command key.
    #[must_use]
    pub fn new(name: impl Into<String>, args: Vec<FactValueV1>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Project to a `serde_json::Value` for artifact rendering.
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "args": self.args.iter().map(FactValueV1::to_json_value).collect::<Vec<_>>(),
        })
    }
}

impl std::fmt::Display for CommandKeyV1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, render_args(&self.args))
    }
}

/// One blacklist decision, recorded for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlacklistEntryV1 {
    /// A method was excluded at one node's scope.
    Method { node_id: u64, method: String },
    /// A method was marked exhausted domain-wide (no node can use it to
    /// make progress on its task anymore).
    MethodExhausted { method: String },
    /// A concrete command was excluded globally.
    Command { command: CommandKeyV1 },
}

/// A recorded blacklist event: what was excluded, at which recovery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlacklistEventV1 {
    /// Recovery attempt ordinal (1-based; attempt counters, not wall-clock).
    pub attempt: u64,
    pub entry: BlacklistEntryV1,
}

/// Session-level blacklist diagnostics, separate from the per-node sets.
#[derive(Debug, Clone, Default)]
pub struct BlacklistStateV1 {
    exhausted_methods: BTreeSet<String>,
    commands: BTreeSet<CommandKeyV1>,
    events: Vec<BlacklistEventV1>,
    methods_blacklisted_total: u64,
    commands_blacklisted_total: u64,
}

impl BlacklistStateV1 {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a node-scoped method exclusion.
    pub fn record_method(&mut self, attempt: u64, node_id: u64, method: impl Into<String>) {
        self.methods_blacklisted_total += 1;
        self.events.push(BlacklistEventV1 {
            attempt,
            entry: BlacklistEntryV1::Method {
                node_id,
                method: method.into(),
            },
        });
    }

    /// Record that a method is exhausted domain-wide.
    pub fn record_method_exhausted(&mut self, attempt: u64, method: impl Into<String>) {
        let method = method.into();
        if self.exhausted_methods.insert(method.clone()) {
            self.events.push(BlacklistEventV1 {
                attempt,
                entry: BlacklistEntryV1::MethodExhausted { method },
            });
        }
    }

    /// Record a global command exclusion.
    pub fn record_command(&mut self, attempt: u64, command: CommandKeyV1) {
        if self.commands.insert(command.clone()) {
            self.commands_blacklisted_total += 1;
            self.events.push(BlacklistEventV1 {
                attempt,
                entry: BlacklistEntryV1::Command { command },
            });
        }
    }

    /// Whether a method has been marked exhausted domain-wide.
    #[must_use]
    pub fn is_method_exhausted(&self, method: &str) -> bool {
        self.exhausted_methods.contains(method)
    }

    /// Total node-scoped method exclusions recorded.
    #[must_use]
    pub fn methods_blacklisted_total(&self) -> u64 {
        self.methods_blacklisted_total
    }

    /// Total global command exclusions recorded.
    #[must_use]
    pub fn commands_blacklisted_total(&self) -> u64 {
        self.commands_blacklisted_total
    }

    /// The chronological event log.
    #[must_use]
    pub fn events(&self) -> &[BlacklistEventV1] {
        &self.events
    }

    /// Project to a `serde_json::Value` for artifact rendering.
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        let events: Vec<serde_json::Value> = self
            .events
            .iter()
            .map(|e| {
                let (kind, detail) = match &e.entry {
                    BlacklistEntryV1::Method { node_id, method } => (
                        "method",
                        serde_json::json!({"node_id": node_id, "method": method}),
                    ),
                    BlacklistEntryV1::MethodExhausted { method } => {
                        ("method_exhausted", serde_json::json!({"method": method}))
                    }
                    BlacklistEntryV1::Command { command } => {
                        ("command", command.to_json_value())
                    }
                };
                serde_json::json!({"attempt": e.attempt, "kind": kind, "detail": detail})
            })
            .collect();
        serde_json::json!({
            "events": events,
            "methods_blacklisted_total": self.methods_blacklisted_total,
            "commands_blacklisted_total": self.commands_blacklisted_total,
        })
    }
}
