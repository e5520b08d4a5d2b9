//! Execution trace and recovery audit artifact.
//!
//! The chronological trace of `(action, resulting state)` pairs is the
//! caller-facing record of how far execution progressed; it is returned on
//! success and carried inside every execution error. The
//! [`ExecutionReportV1`] wraps the trace with recovery events and counters
//! and renders to canonical JSON bytes — the normative diagnostic artifact
//! of a run.

use meridian_kernel::canon::{canonical_json_bytes, CanonError};
use meridian_kernel::hash::ContentHashV1;
use meridian_kernel::state::WorldStateV1;
use meridian_kernel::value::FactValueV1;

use crate::blacklist::{BlacklistStateV1, CommandKeyV1};
use crate::node::NodeId;

/// Domain prefix for execution report content hashing.
pub const DOMAIN_EXECUTION_REPORT: &[u8] = b"MERIDIAN::EXECUTION_REPORT::V1\0";

/// One executed action and the state it produced.
#[derive(Debug, Clone)]
pub struct TraceEntryV1 {
    /// Chronological position in the trace (0-based).
    pub step_index: u64,
    /// The primitive node the action came from.
    pub node_id: NodeId,
    pub name: String,
    pub args: Vec<FactValueV1>,
    /// State after the action.
    pub resulting_state: WorldStateV1,
    /// Fingerprint of `resulting_state`, for cheap diffing.
    pub state_fingerprint: ContentHashV1,
}

impl TraceEntryV1 {
    /// Project to a `serde_json::Value` for artifact rendering.
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "step_index": self.step_index,
            "node_id": self.node_id,
            "name": self.name,
            "args": self.args.iter().map(FactValueV1::to_json_value).collect::<Vec<_>>(),
            "state_fingerprint": self.state_fingerprint.to_string(),
        })
    }
}

/// The chronological execution trace.
#[derive(Debug, Clone, Default)]
pub struct ExecutionTraceV1 {
    pub entries: Vec<TraceEntryV1>,
}

impl ExecutionTraceV1 {
    /// Create an empty trace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an executed action.
    pub fn push(
        &mut self,
        node_id: NodeId,
        name: impl Into<String>,
        args: Vec<FactValueV1>,
        resulting_state: &WorldStateV1,
    ) {
        self.entries.push(TraceEntryV1 {
            step_index: self.entries.len() as u64,
            node_id,
            name: name.into(),
            args,
            state_fingerprint: resulting_state.fingerprint(),
            resulting_state: resulting_state.clone(),
        });
    }

    /// Number of executed actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no action has executed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The executed sequence projected to `(name, args)` pairs.
    #[must_use]
    pub fn actions(&self) -> Vec<(String, Vec<FactValueV1>)> {
        self.entries
            .iter()
            .map(|e| (e.name.clone(), e.args.clone()))
            .collect()
    }

    /// Project to a `serde_json::Value` for artifact rendering.
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "entries": self.entries.iter().map(TraceEntryV1::to_json_value).collect::<Vec<_>>(),
            "entry_count": self.entries.len(),
        })
    }
}

/// What stopped an execution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepFailureKindV1 {
    /// The step matched the global command blacklist before dispatch.
    BlacklistedCommand,
    /// The action name was not declared in the domain.
    UnknownAction,
    /// The action body returned an error value.
    ActionFailed { detail: String },
    /// The action body panicked (captured as a value).
    ActionPanicked { detail: String },
}

impl std::fmt::Display for StepFailureKindV1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlacklistedCommand => write!(f, "command is globally blacklisted"),
            Self::UnknownAction => write!(f, "unknown action"),
            Self::ActionFailed { detail } => write!(f, "action failed: {detail}"),
            Self::ActionPanicked { detail } => write!(f, "action panicked: {detail}"),
        }
    }
}

/// How a failure was attributed during backtracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributionV1 {
    /// The nearest ancestor with an attributable method was found; its
    /// method was blacklisted at that node and the subtree regenerated.
    Method { node_id: NodeId, method: String },
    /// No attributable ancestor — the command was globally blacklisted.
    Command { command: CommandKeyV1 },
}

/// One backtracking decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryEventV1 {
    /// Recovery attempt ordinal (1-based).
    pub attempt: u64,
    /// The node whose step failed.
    pub failed_node: NodeId,
    /// The failed command.
    pub failed_command: CommandKeyV1,
    pub failure: StepFailureKindV1,
    pub attribution: AttributionV1,
    /// Descendants removed by the subtree discard (zero for command
    /// blacklisting).
    pub discarded_nodes: u64,
    /// Nodes created by the regeneration pass (zero for command
    /// blacklisting).
    pub regenerated_nodes: u64,
}

impl RecoveryEventV1 {
    /// Project to a `serde_json::Value` for artifact rendering.
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        let attribution = match &self.attribution {
            AttributionV1::Method { node_id, method } => serde_json::json!({
                "kind": "method",
                "node_id": node_id,
                "method": method,
            }),
            AttributionV1::Command { command } => serde_json::json!({
                "kind": "command",
                "command": command.to_json_value(),
            }),
        };
        serde_json::json!({
            "attempt": self.attempt,
            "failed_node": self.failed_node,
            "failed_command": self.failed_command.to_json_value(),
            "failure": self.failure.to_string(),
            "attribution": attribution,
            "discarded_nodes": self.discarded_nodes,
            "regenerated_nodes": self.regenerated_nodes,
        })
    }
}

/// Why execution terminated.
///
/// Every termination — success or failure — produces a report; the
/// variants mirror [`crate::error::ExecuteFailureReasonV1`] for failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationV1 {
    /// The full linearized sequence (of the final tree version) completed.
    Completed,
    /// The retry budget was spent on an unresolved failure.
    RetriesExhausted,
    /// Recovery could not make progress (no alternative method, or the
    /// failing command was already blacklisted).
    NoRecoveryPath,
    /// Pre-flight validation rejected the run; no pass executed.
    Rejected,
}

impl TerminationV1 {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::RetriesExhausted => "retries_exhausted",
            Self::NoRecoveryPath => "no_recovery_path",
            Self::Rejected => "rejected",
        }
    }
}

/// Aggregate execution/recovery audit artifact.
#[derive(Debug, Clone)]
pub struct ExecutionReportV1 {
    pub domain_name: String,
    pub termination: TerminationV1,
    pub steps_executed: u64,
    /// Steps skipped because their node already executed in a prior pass.
    pub steps_skipped_resume: u64,
    pub retries_used: u32,
    pub recoveries: Vec<RecoveryEventV1>,
    /// Session-level blacklist diagnostics (events, counters).
    pub blacklist: BlacklistStateV1,
    /// Fingerprint of the final (or last reached) state.
    pub final_state_fingerprint: ContentHashV1,
}

impl ExecutionReportV1 {
    /// Project to a `serde_json::Value` for artifact rendering.
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "schema_version": "execution_report.v1",
            "domain_name": self.domain_name,
            "termination": self.termination.as_str(),
            "steps_executed": self.steps_executed,
            "steps_skipped_resume": self.steps_skipped_resume,
            "retries_used": self.retries_used,
            "recoveries": self.recoveries.iter().map(RecoveryEventV1::to_json_value).collect::<Vec<_>>(),
            "blacklist": self.blacklist.to_json_value(),
            "final_state_fingerprint": self.final_state_fingerprint.to_string(),
        })
    }

    /// Serialize the report to canonical JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CanonError`] if serialization fails (cannot happen for
    /// integer-only reports; kept explicit for the single-canonicalizer
    /// contract).
    pub fn to_canonical_json_bytes(&self) -> Result<Vec<u8>, CanonError> {
        canonical_json_bytes(&self.to_json_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_indexes_entries_chronologically() {
        let mut trace = ExecutionTraceV1::new();
        let state = WorldStateV1::new("s").with_fact("pos", "a", "b");
        trace.push(5, "first", Vec::new(), &state);
        trace.push(9, "second", vec!["a".into()], &state);
        assert_eq!(trace.len(), 2);
        assert_eq!(trace.entries[0].step_index, 0);
        assert_eq!(trace.entries[1].step_index, 1);
        assert_eq!(
            trace.actions(),
            vec![
                ("first".to_string(), Vec::new()),
                ("second".to_string(), vec!["a".into()]),
            ]
        );
    }

    #[test]
    fn report_renders_canonical_bytes() {
        let state = WorldStateV1::new("s");
        let report = ExecutionReportV1 {
            domain_name: "test".to_string(),
            termination: TerminationV1::Completed,
            steps_executed: 2,
            steps_skipped_resume: 0,
            retries_used: 0,
            recoveries: Vec::new(),
            blacklist: BlacklistStateV1::new(),
            final_state_fingerprint: state.fingerprint(),
        };
        let bytes = report.to_canonical_json_bytes().unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with('{'));
        // Canonical bytes are stable across renders.
        assert_eq!(bytes, report.to_canonical_json_bytes().unwrap());
    }
}
