//! Determinism lock tests: same inputs produce byte-identical canonical
//! artifacts, with and without recovery.

use meridian_harness::runner::{run_world, write_artifacts};
use meridian_harness::worlds::blocks_mini::BlocksMini;
use meridian_harness::worlds::kitchen::Kitchen;
use meridian_planner::policy::PlannerPolicyV1;

#[test]
fn clean_run_artifacts_are_reproducible() {
    let policy = PlannerPolicyV1::default();
    let first = run_world(&BlocksMini, &policy).unwrap();
    let second = run_world(&BlocksMini, &policy).unwrap();
    assert_eq!(first.tree_json, second.tree_json);
    assert_eq!(first.report_json, second.report_json);
    assert_eq!(first.report_digest, second.report_digest);
}

#[test]
fn recovery_run_artifacts_are_reproducible() {
    let policy = PlannerPolicyV1::default();
    let first = run_world(&Kitchen::with_broken_stove(), &policy).unwrap();
    let second = run_world(&Kitchen::with_broken_stove(), &policy).unwrap();
    assert_eq!(first.tree_json, second.tree_json);
    assert_eq!(first.report_json, second.report_json);
}

#[test]
fn verbosity_has_no_behavioral_effect() {
    let quiet = run_world(&Kitchen::with_broken_stove(), &PlannerPolicyV1::default()).unwrap();
    let loud = run_world(
        &Kitchen::with_broken_stove(),
        &PlannerPolicyV1 {
            verbose: 3,
            ..PlannerPolicyV1::default()
        },
    )
    .unwrap();
    assert_eq!(quiet.tree_json, loud.tree_json);
    assert_eq!(quiet.report_json, loud.report_json);
}

#[test]
fn written_artifacts_round_trip_byte_identical() {
    let artifacts = run_world(&Kitchen::with_broken_stove(), &PlannerPolicyV1::default()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    write_artifacts(&artifacts, dir.path()).unwrap();
    let tree = std::fs::read(dir.path().join("solution_tree.json")).unwrap();
    let report = std::fs::read(dir.path().join("execution_report.json")).unwrap();
    assert_eq!(tree, artifacts.tree_json);
    assert_eq!(report, artifacts.report_json);
}
