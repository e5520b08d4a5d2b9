//! Re-entrant executor: linearize → execute → (on failure) backtrack →
//! re-linearize → resume, bounded by the retry budget.
//!
//! # Recovery protocol
//!
//! On a step failure the executor walks the failed node's parent chain to
//! the nearest ancestor with an attributable method. If one exists, that
//! method is blacklisted at that node only, the ancestor's subtree is
//! discarded, and the node is re-expanded from the state snapshot it held
//! before its previous expansion. If none exists, the concrete command is
//! blacklisted globally. Either way the loop re-linearizes and resumes —
//! steps whose node already executed are skipped, never replayed.
//!
//! Backtracking touches nothing outside the attributed subtree: siblings
//! and ancestors above the attributed node keep their node values.

use std::collections::BTreeSet;

use meridian_kernel::dispatch::{apply_action, ActionFailureV1};
use meridian_kernel::domain::DomainV1;
use meridian_kernel::state::WorldStateV1;

use crate::blacklist::{BlacklistStateV1, CommandKeyV1};
use crate::error::{ExecuteErrorV1, ExecuteFailureReasonV1, PlanErrorV1};
use crate::expand::expand_from;
use crate::linearize::linearize;
use crate::node::NodeId;
use crate::policy::PlannerPolicyV1;
use crate::trace::{
    AttributionV1, ExecutionReportV1, ExecutionTraceV1, RecoveryEventV1, StepFailureKindV1,
    TerminationV1,
};
use crate::tree::SolutionTreeV1;

/// Result of a completed execution.
#[derive(Debug, Clone)]
pub struct ExecutionOutcomeV1 {
    /// The final tree version (repaired subtrees included).
    pub tree: SolutionTreeV1,
    pub final_state: WorldStateV1,
    /// Chronological `(action, resulting state)` record.
    pub trace: ExecutionTraceV1,
    /// Execution/recovery audit artifact.
    pub report: ExecutionReportV1,
}

/// The first failing step of an execution pass.
struct StepFailure {
    node_id: NodeId,
    command: CommandKeyV1,
    kind: StepFailureKindV1,
}

impl StepFailure {
    fn describe(&self) -> String {
        format!("{} at node {}: {}", self.command, self.node_id, self.kind)
    }
}

/// Execute a fully expanded solution tree with HTN failure recovery.
///
/// Consumes the tree; the returned outcome (or error report) reflects the
/// final tree version after any repairs.
///
/// # Errors
///
/// Returns [`ExecuteErrorV1`] on pre-flight rejection, retry exhaustion,
/// or an unrecoverable structural condition. The error always carries the
/// partial trace and the recovery report.
#[allow(clippy::too_many_lines)]
pub fn execute(
    domain: &DomainV1,
    initial_state: &WorldStateV1,
    mut tree: SolutionTreeV1,
    policy: &PlannerPolicyV1,
) -> Result<ExecutionOutcomeV1, ExecuteErrorV1> {
    let mut trace = ExecutionTraceV1::new();
    let mut recoveries: Vec<RecoveryEventV1> = Vec::new();
    let mut blacklist = BlacklistStateV1::new();
    let mut executed: BTreeSet<NodeId> = BTreeSet::new();
    let mut state = initial_state.clone();
    let mut retries_used: u32 = 0;
    let mut steps_executed: u64 = 0;
    let mut steps_skipped: u64 = 0;

    let build_report = |termination: TerminationV1,
                        steps_executed: u64,
                        steps_skipped: u64,
                        retries_used: u32,
                        recoveries: &[RecoveryEventV1],
                        blacklist: &BlacklistStateV1,
                        state: &WorldStateV1| {
        ExecutionReportV1 {
            domain_name: domain.name().to_string(),
            termination,
            steps_executed,
            steps_skipped_resume: steps_skipped,
            retries_used,
            recoveries: recoveries.to_vec(),
            blacklist: blacklist.clone(),
            final_state_fingerprint: state.fingerprint(),
        }
    };

    if let Err(violation) = policy.validate() {
        return Err(ExecuteErrorV1 {
            reason: ExecuteFailureReasonV1::PolicyViolation(violation),
            partial_trace: trace,
            report: build_report(TerminationV1::Rejected, 0, 0, 0, &recoveries, &blacklist, &state),
        });
    }
    if let Err(integrity) = tree.check_integrity() {
        return Err(ExecuteErrorV1 {
            reason: ExecuteFailureReasonV1::TreeIntegrity {
                detail: integrity.to_string(),
            },
            partial_trace: trace,
            report: build_report(TerminationV1::Rejected, 0, 0, 0, &recoveries, &blacklist, &state),
        });
    }

    loop {
        let steps = linearize(&tree);
        let mut failure: Option<StepFailure> = None;

        for step in steps {
            if executed.contains(&step.node_id) {
                steps_skipped += 1;
                continue;
            }
            let command = step.command_key();
            if tree.is_command_blacklisted(&command) {
                failure = Some(StepFailure {
                    node_id: step.node_id,
                    command,
                    kind: StepFailureKindV1::BlacklistedCommand,
                });
                break;
            }
            match apply_action(domain, &state, &step.name, &step.args) {
                Ok(next) => {
                    state = next;
                    trace.push(step.node_id, step.name.clone(), step.args.clone(), &state);
                    executed.insert(step.node_id);
                    steps_executed += 1;
                    if policy.verbose >= 2 {
                        tracing::debug!(node_id = step.node_id, command = %command, "action applied");
                    }
                }
                Err(fail) => {
                    let kind = match fail {
                        ActionFailureV1::UnknownAction { .. } => StepFailureKindV1::UnknownAction,
                        ActionFailureV1::Failed { detail, .. } => {
                            StepFailureKindV1::ActionFailed { detail }
                        }
                        ActionFailureV1::Panicked { detail, .. } => {
                            StepFailureKindV1::ActionPanicked { detail }
                        }
                    };
                    failure = Some(StepFailure {
                        node_id: step.node_id,
                        command,
                        kind,
                    });
                    break;
                }
            }
        }

        let Some(fail) = failure else {
            // No pending failure: the full linearized sequence completed.
            let report = build_report(
                TerminationV1::Completed,
                steps_executed,
                steps_skipped,
                retries_used,
                &recoveries,
                &blacklist,
                &state,
            );
            if policy.verbose >= 1 {
                tracing::info!(
                    domain = domain.name(),
                    steps = steps_executed,
                    retries = retries_used,
                    "execution complete"
                );
            }
            return Ok(ExecutionOutcomeV1 {
                tree,
                final_state: state,
                trace,
                report,
            });
        };

        if policy.verbose >= 1 {
            tracing::info!(
                node_id = fail.node_id,
                command = %fail.command,
                failure = %fail.kind,
                "step failed; attempting recovery"
            );
        }

        if retries_used >= policy.max_retries {
            let reason = ExecuteFailureReasonV1::RetriesExhausted {
                retries_used,
                last_failure: fail.describe(),
            };
            let report = build_report(
                TerminationV1::RetriesExhausted,
                steps_executed,
                steps_skipped,
                retries_used,
                &recoveries,
                &blacklist,
                &state,
            );
            return Err(ExecuteErrorV1 {
                reason,
                partial_trace: trace,
                report,
            });
        }
        let attempt = u64::from(retries_used) + 1;

        match find_attributable_ancestor(&tree, fail.node_id) {
            Some((ancestor_id, method)) => {
                if let Some(node) = tree.node_mut(ancestor_id) {
                    node.blacklisted_methods.insert(method.clone());
                }
                blacklist.record_method(attempt, ancestor_id, &method);
                let discarded = tree.discard_subtree(ancestor_id);

                // Re-expand from the snapshot the node held before its
                // previous expansion, now excluding the blacklisted method.
                match expand_from(domain, &mut tree, ancestor_id, policy) {
                    Ok(regenerated) => {
                        recoveries.push(RecoveryEventV1 {
                            attempt,
                            failed_node: fail.node_id,
                            failed_command: fail.command,
                            failure: fail.kind,
                            attribution: AttributionV1::Method {
                                node_id: ancestor_id,
                                method,
                            },
                            discarded_nodes: discarded,
                            regenerated_nodes: regenerated,
                        });
                        retries_used += 1;
                    }
                    Err(plan_err) => {
                        if matches!(plan_err, PlanErrorV1::PlanningFailure { .. }) {
                            blacklist.record_method_exhausted(attempt, &method);
                        }
                        let reason = ExecuteFailureReasonV1::NoRecoveryPath {
                            detail: format!(
                                "replanning failed after blacklisting method {method} at node {ancestor_id}: {plan_err}"
                            ),
                        };
                        let report = build_report(
                            TerminationV1::NoRecoveryPath,
                            steps_executed,
                            steps_skipped,
                            retries_used,
                            &recoveries,
                            &blacklist,
                            &state,
                        );
                        return Err(ExecuteErrorV1 {
                            reason,
                            partial_trace: trace,
                            report,
                        });
                    }
                }
            }
            None => {
                // No owning method anywhere up the chain: global command
                // blacklist fallback. Re-inserting an already-blacklisted
                // command makes no progress, so fail closed.
                if tree.blacklist_command(fail.command.clone()) {
                    blacklist.record_command(attempt, fail.command.clone());
                    recoveries.push(RecoveryEventV1 {
                        attempt,
                        failed_node: fail.node_id,
                        failed_command: fail.command.clone(),
                        failure: fail.kind,
                        attribution: AttributionV1::Command {
                            command: fail.command,
                        },
                        discarded_nodes: 0,
                        regenerated_nodes: 0,
                    });
                    retries_used += 1;
                } else {
                    let reason = ExecuteFailureReasonV1::NoRecoveryPath {
                        detail: format!(
                            "command {} has no owning method and is already blacklisted",
                            fail.command
                        ),
                    };
                    let report = build_report(
                        TerminationV1::NoRecoveryPath,
                        steps_executed,
                        steps_skipped,
                        retries_used,
                        &recoveries,
                        &blacklist,
                        &state,
                    );
                    return Err(ExecuteErrorV1 {
                        reason,
                        partial_trace: trace,
                        report,
                    });
                }
            }
        }
    }
}

/// Walk the parent chain from the failed node to the nearest ancestor with
/// an attributable method, skipping nodes with none (including the root's
/// sentinel expansion).
fn find_attributable_ancestor(
    tree: &SolutionTreeV1,
    failed_node: NodeId,
) -> Option<(NodeId, String)> {
    let mut cursor = tree.node(failed_node)?.parent_id;
    while let Some(id) = cursor {
        let node = tree.node(id)?;
        if let Some(method) = node.attributable_method() {
            return Some((id, method.to_string()));
        }
        cursor = node.parent_id;
    }
    None
}
