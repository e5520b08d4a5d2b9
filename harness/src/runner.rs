//! Harness runner: orchestrates planner APIs to produce run artifacts.
//!
//! The runner uses ONLY planner/kernel APIs: `plan`, `execute`, canonical
//! JSON rendering, canonical hashing. It does not implement any planning
//! logic itself.
//!
//! # Pipeline
//!
//! ```text
//! world.domain() → plan() → execute()
//!   → render tree/report canonical JSON → digest → RunArtifactsV1
//! ```

use std::path::Path;

use meridian_kernel::canon::canonical_json_bytes;
use meridian_kernel::hash::{canonical_hash, ContentHashV1};
use meridian_kernel::state::WorldStateV1;

use meridian_planner::error::{ExecuteErrorV1, PlanErrorV1};
use meridian_planner::executor::execute;
use meridian_planner::expand::plan;
use meridian_planner::policy::PlannerPolicyV1;
use meridian_planner::trace::{ExecutionTraceV1, DOMAIN_EXECUTION_REPORT};

use crate::contract::{PlanningWorldV1, WorldBuildError};

/// Fixed artifact filenames written by [`write_artifacts`].
const TREE_FILENAME: &str = "solution_tree.json";
const REPORT_FILENAME: &str = "execution_report.json";
const DIGEST_FILENAME: &str = "report_digest.txt";

/// Error during a harness run.
#[derive(Debug)]
pub enum RunErrorV1 {
    /// World construction failed.
    WorldError(WorldBuildError),
    /// Planning failed.
    PlanFailed(PlanErrorV1),
    /// Execution failed after recovery was exhausted.
    ExecuteFailed(Box<ExecuteErrorV1>),
    /// Canonical JSON serialization failed.
    CanonFailed { detail: String },
    /// I/O error while writing artifacts.
    Io { detail: String },
}

impl std::fmt::Display for RunErrorV1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WorldError(e) => write!(f, "world error: {e}"),
            Self::PlanFailed(e) => write!(f, "planning failed: {e}"),
            Self::ExecuteFailed(e) => write!(f, "execution failed: {e}"),
            Self::CanonFailed { detail } => write!(f, "canonical JSON error: {detail}"),
            Self::Io { detail } => write!(f, "I/O error: {detail}"),
        }
    }
}

impl std::error::Error for RunErrorV1 {}

/// A completed run's artifact set.
#[derive(Debug, Clone)]
pub struct RunArtifactsV1 {
    pub world_id: String,
    /// Canonical JSON bytes of the final tree version.
    pub tree_json: Vec<u8>,
    /// Canonical JSON bytes of the execution report.
    pub report_json: Vec<u8>,
    /// `canonical_hash(DOMAIN_EXECUTION_REPORT, report_json)`.
    pub report_digest: ContentHashV1,
    pub final_state: WorldStateV1,
    pub trace: ExecutionTraceV1,
}

/// Plan and execute a world, rendering canonical artifacts.
///
/// # Errors
///
/// Returns [`RunErrorV1`] if any pipeline stage fails. Execution errors
/// keep their partial trace and report inside the boxed error.
pub fn run_world(
    world: &dyn PlanningWorldV1,
    policy: &PlannerPolicyV1,
) -> Result<RunArtifactsV1, RunErrorV1> {
    let domain = world.domain().map_err(RunErrorV1::WorldError)?;
    let state = world.initial_state();
    let todos = world.todos();

    let tree = plan(&domain, &state, &todos, policy).map_err(RunErrorV1::PlanFailed)?;
    let outcome = execute(&domain, &state, tree, policy)
        .map_err(|e| RunErrorV1::ExecuteFailed(Box::new(e)))?;

    let tree_json =
        canonical_json_bytes(&outcome.tree.to_json_value()).map_err(|e| RunErrorV1::CanonFailed {
            detail: e.to_string(),
        })?;
    let report_json = outcome
        .report
        .to_canonical_json_bytes()
        .map_err(|e| RunErrorV1::CanonFailed {
            detail: e.to_string(),
        })?;
    let report_digest = canonical_hash(DOMAIN_EXECUTION_REPORT, &report_json);

    if policy.verbose >= 1 {
        tracing::info!(
            world_id = world.world_id(),
            digest = %report_digest,
            "run complete"
        );
    }

    Ok(RunArtifactsV1 {
        world_id: world.world_id().to_string(),
        tree_json,
        report_json,
        report_digest,
        final_state: outcome.final_state,
        trace: outcome.trace,
    })
}

/// Write a run's artifacts into a directory.
///
/// Layout:
///
/// ```text
/// <dir>/
///   solution_tree.json      — canonical JSON, final tree version
///   execution_report.json   — canonical JSON, execution/recovery report
///   report_digest.txt       — ASCII digest string ("sha256:...")
/// ```
///
/// The directory path is never part of any hash surface.
///
/// # Errors
///
/// Returns [`RunErrorV1::Io`] on any filesystem failure.
pub fn write_artifacts(artifacts: &RunArtifactsV1, dir: &Path) -> Result<(), RunErrorV1> {
    let io_err = |e: std::io::Error| RunErrorV1::Io {
        detail: e.to_string(),
    };
    std::fs::create_dir_all(dir).map_err(io_err)?;
    std::fs::write(dir.join(TREE_FILENAME), &artifacts.tree_json).map_err(io_err)?;
    std::fs::write(dir.join(REPORT_FILENAME), &artifacts.report_json).map_err(io_err)?;
    std::fs::write(
        dir.join(DIGEST_FILENAME),
        artifacts.report_digest.to_string(),
    )
    .map_err(io_err)?;
    Ok(())
}
