//! Recovery-semantics lock tests: blacklist scoping and permanence,
//! backtracking locality, resume-not-replay, and retry budgets.

use lock_tests::{counting_action, counting_failing_action, plan_and_execute, CallCounter};
use meridian_kernel::domain::{task_method, DomainV1};
use meridian_kernel::state::WorldStateV1;
use meridian_kernel::todo::TodoItemV1;
use meridian_planner::error::ExecuteFailureReasonV1;
use meridian_planner::executor::execute;
use meridian_planner::expand::plan;
use meridian_planner::node::NodeId;
use meridian_planner::policy::PlannerPolicyV1;
use meridian_planner::tree::SolutionTreeV1;

/// `work` task with three methods; the first two produce failing actions.
fn three_method_domain(
    fail_a: &CallCounter,
    fail_b: &CallCounter,
    good: &CallCounter,
) -> DomainV1 {
    let mut domain = DomainV1::new("three_methods");
    domain
        .declare_action("bad_a", counting_failing_action(fail_a, "a is broken"))
        .unwrap();
    domain
        .declare_action("bad_b", counting_failing_action(fail_b, "b is broken"))
        .unwrap();
    domain
        .declare_action("good", counting_action(good, "good"))
        .unwrap();
    domain
        .declare_task_methods(
            "work",
            vec![
                task_method("plan_a", |_, _| {
                    Ok(vec![TodoItemV1::action("bad_a", Vec::new())])
                }),
                task_method("plan_b", |_, _| {
                    Ok(vec![TodoItemV1::action("bad_b", Vec::new())])
                }),
                task_method("plan_c", |_, _| {
                    Ok(vec![TodoItemV1::action("good", Vec::new())])
                }),
            ],
        )
        .unwrap();
    domain
}

#[test]
fn blacklisted_methods_are_never_reselected() {
    let fail_a = CallCounter::new();
    let fail_b = CallCounter::new();
    let good = CallCounter::new();
    let domain = three_method_domain(&fail_a, &fail_b, &good);
    let state = WorldStateV1::new("s");
    let outcome =
        plan_and_execute(&domain, &state, &[TodoItemV1::task("work", Vec::new())]).unwrap();

    // Each failing method was tried exactly once, then never again.
    assert_eq!(fail_a.count(), 1);
    assert_eq!(fail_b.count(), 1);
    assert_eq!(good.count(), 1);
    assert_eq!(outcome.report.retries_used, 2);

    let work_id = outcome.tree.node(outcome.tree.root_id()).unwrap().children[0];
    let work = outcome.tree.node(work_id).unwrap();
    assert!(work.blacklisted_methods.contains("plan_a"));
    assert!(work.blacklisted_methods.contains("plan_b"));
    assert_eq!(work.method_tried.as_deref(), Some("plan_c"));
}

#[test]
fn retry_budget_bounds_recovery_attempts() {
    let fail_a = CallCounter::new();
    let fail_b = CallCounter::new();
    let good = CallCounter::new();
    let domain = three_method_domain(&fail_a, &fail_b, &good);
    let state = WorldStateV1::new("s");
    let policy = PlannerPolicyV1 {
        max_retries: 1,
        ..PlannerPolicyV1::default()
    };
    let tree = plan(&domain, &state, &[TodoItemV1::task("work", Vec::new())], &policy).unwrap();
    let err = execute(&domain, &state, tree, &policy).unwrap_err();
    // One retry reached plan_b; its failure exhausted the budget before
    // plan_c could be tried.
    assert!(matches!(
        err.reason,
        ExecuteFailureReasonV1::RetriesExhausted { retries_used: 1, .. }
    ));
    assert_eq!(fail_a.count(), 1);
    assert_eq!(fail_b.count(), 1);
    assert_eq!(good.count(), 0);
}

/// Snapshot a subtree as JSON values, in DFS order.
fn subtree_snapshot(tree: &SolutionTreeV1, start: NodeId) -> Vec<serde_json::Value> {
    let mut out = Vec::new();
    let mut stack = vec![start];
    while let Some(id) = stack.pop() {
        if let Some(node) = tree.node(id) {
            out.push(node.to_json_value());
            stack.extend(node.children.iter().rev().copied());
        }
    }
    out
}

#[test]
fn backtracking_is_local_to_the_attributed_subtree() {
    let fail_a = CallCounter::new();
    let fail_b = CallCounter::new();
    let good = CallCounter::new();
    let before_counter = CallCounter::new();
    let after_counter = CallCounter::new();
    let mut domain = three_method_domain(&fail_a, &fail_b, &good);
    domain
        .declare_action("before", counting_action(&before_counter, "before"))
        .unwrap();
    domain
        .declare_action("after", counting_action(&after_counter, "after"))
        .unwrap();

    let state = WorldStateV1::new("s");
    let todos = vec![
        TodoItemV1::action("before", Vec::new()),
        TodoItemV1::task("work", Vec::new()),
        TodoItemV1::action("after", Vec::new()),
    ];
    let policy = PlannerPolicyV1::default();
    let tree = plan(&domain, &state, &todos, &policy).unwrap();
    let root_children: Vec<NodeId> = tree.node(tree.root_id()).unwrap().children.clone();
    let before_snap = subtree_snapshot(&tree, root_children[0]);
    let after_snap = subtree_snapshot(&tree, root_children[2]);

    let outcome = execute(&domain, &state, tree, &policy).unwrap();

    // Siblings of the repaired subtree are unchanged, node for node.
    assert_eq!(subtree_snapshot(&outcome.tree, root_children[0]), before_snap);
    assert_eq!(subtree_snapshot(&outcome.tree, root_children[2]), after_snap);

    // Completed work was never replayed across the two recoveries.
    assert_eq!(before_counter.count(), 1);
    assert_eq!(after_counter.count(), 1);
    let names: Vec<String> = outcome.trace.actions().into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["before", "good", "after"]);
}

#[test]
fn recovery_resumes_from_partial_state_not_initial() {
    // The prefix action's effect must be visible to the actions that run
    // after a recovery (resume semantics: execution state carries over).
    let mut domain = DomainV1::new("carryover");
    let stamp = CallCounter::new();
    domain
        .declare_action("stamp", counting_action(&stamp, "stamp"))
        .unwrap();
    domain
        .declare_action(
            "needs_stamp",
            meridian_kernel::domain::action_fn(|state, _| {
                if state.get_fact("done", "stamp") == Some(&true.into()) {
                    let mut next = state.clone();
                    next.set_fact("done", "needs_stamp", true);
                    Ok(next)
                } else {
                    Err("stamp effect missing".to_string())
                }
            }),
        )
        .unwrap();
    domain
        .declare_action(
            "flaky",
            meridian_kernel::domain::action_fn(|_, _| Err("first path dies".to_string())),
        )
        .unwrap();
    domain
        .declare_task_methods(
            "finish",
            vec![
                task_method("doomed", |_, _| {
                    Ok(vec![TodoItemV1::action("flaky", Vec::new())])
                }),
                task_method("viable", |_, _| {
                    Ok(vec![TodoItemV1::action("needs_stamp", Vec::new())])
                }),
            ],
        )
        .unwrap();
    let state = WorldStateV1::new("s");
    let todos = vec![
        TodoItemV1::action("stamp", Vec::new()),
        TodoItemV1::task("finish", Vec::new()),
    ];
    let outcome = plan_and_execute(&domain, &state, &todos).unwrap();
    assert_eq!(stamp.count(), 1);
    assert_eq!(
        outcome.final_state.get_fact("done", "needs_stamp"),
        Some(&true.into())
    );
}
