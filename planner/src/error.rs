//! Typed planning and execution errors.
//!
//! Single-action failures are always attempted locally via backtracking
//! first; only retry exhaustion or an unrecoverable structural condition
//! becomes a caller-visible error. Execution errors always carry the
//! partial trace — the caller can inspect exactly how far execution
//! progressed. Partial success is never reported as success.

use crate::node::NodeId;
use crate::policy::PolicyViolationV1;
use crate::trace::{ExecutionReportV1, ExecutionTraceV1};

/// Typed failure for planning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanErrorV1 {
    /// Pre-flight policy validation failed.
    PolicyViolation(PolicyViolationV1),
    /// No applicable, non-blacklisted method exists for a node.
    PlanningFailure {
        node_id: NodeId,
        /// Rendered task (e.g. `cook()` or `pos(a)=table`).
        task: String,
        detail: String,
    },
    /// The expansion budget was spent before the tree was fully expanded.
    ExpansionBudgetExceeded { limit: u64 },
    /// The tree failed a structural-integrity check.
    TreeIntegrity { detail: String },
}

impl std::fmt::Display for PlanErrorV1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PolicyViolation(v) => write!(f, "policy violation: {v}"),
            Self::PlanningFailure {
                node_id,
                task,
                detail,
            } => write!(f, "planning failure at node {node_id} ({task}): {detail}"),
            Self::ExpansionBudgetExceeded { limit } => {
                write!(f, "expansion budget exceeded: {limit}")
            }
            Self::TreeIntegrity { detail } => write!(f, "tree integrity violation: {detail}"),
        }
    }
}

impl std::error::Error for PlanErrorV1 {}

/// Why execution failed, independent of how far it got.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecuteFailureReasonV1 {
    /// Pre-flight policy validation failed.
    PolicyViolation(PolicyViolationV1),
    /// The retry budget was spent on an unresolved failure.
    RetriesExhausted { retries_used: u32, last_failure: String },
    /// Backtracking could not make progress: no attributable method with an
    /// alternative, and the failing command could not be usefully
    /// blacklisted.
    NoRecoveryPath { detail: String },
    /// The tree failed a structural-integrity check.
    TreeIntegrity { detail: String },
}

impl std::fmt::Display for ExecuteFailureReasonV1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PolicyViolation(v) => write!(f, "policy violation: {v}"),
            Self::RetriesExhausted {
                retries_used,
                last_failure,
            } => write!(
                f,
                "retries exhausted after {retries_used} attempts; last failure: {last_failure}"
            ),
            Self::NoRecoveryPath { detail } => write!(f, "no recovery path: {detail}"),
            Self::TreeIntegrity { detail } => write!(f, "tree integrity violation: {detail}"),
        }
    }
}

/// Typed failure for execution.
///
/// Always carries the partial trace and the recovery report — every
/// termination preserves its audit trail, successful or not.
#[derive(Debug, Clone)]
pub struct ExecuteErrorV1 {
    pub reason: ExecuteFailureReasonV1,
    /// Chronological record of everything that executed before the failure.
    pub partial_trace: ExecutionTraceV1,
    /// Execution/recovery audit artifact as of the failure.
    pub report: ExecutionReportV1,
}

impl std::fmt::Display for ExecuteErrorV1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({} actions executed before failure)",
            self.reason,
            self.partial_trace.len()
        )
    }
}

impl std::error::Error for ExecuteErrorV1 {}
