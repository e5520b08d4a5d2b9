//! End-to-end lock scenarios: satisfied goals, task decomposition, method
//! fallback after runtime failure, unattributable command blacklisting,
//! and default multigoal expansion order.

use lock_tests::{counting_action, counting_failing_action, plan_and_execute, CallCounter};
use meridian_kernel::domain::{action_fn, task_method, unigoal_method, DomainV1};
use meridian_kernel::state::WorldStateV1;
use meridian_kernel::todo::{GoalV1, MultigoalV1, TodoItemV1};
use meridian_planner::error::ExecuteFailureReasonV1;
use meridian_planner::executor::execute;
use meridian_planner::expand::plan;
use meridian_planner::node::{NodeTaskV1, MULTIGOAL_SPLIT};
use meridian_planner::policy::PlannerPolicyV1;

// ---------------------------------------------------------------------------
// Scenario 1: a goal already satisfied executes zero actions.
// ---------------------------------------------------------------------------

#[test]
fn satisfied_goal_executes_zero_actions() {
    let mut domain = DomainV1::new("s1");
    domain
        .declare_unigoal_methods(
            "pos",
            vec![unigoal_method("achieve_pos", |state, subject, value| {
                if state.get_fact("pos", subject) == Some(value) {
                    Ok(Vec::new())
                } else {
                    Err("unreachable in this scenario".to_string())
                }
            })],
        )
        .unwrap();
    let state = WorldStateV1::new("s").with_fact("pos", "a", "table");
    let outcome =
        plan_and_execute(&domain, &state, &[TodoItemV1::goal("pos", "a", "table")]).unwrap();
    assert!(outcome.trace.is_empty());
    assert!(outcome.final_state.facts_eq(&state));
}

// ---------------------------------------------------------------------------
// Scenario 2: a task decomposes into two actions, both succeed.
// ---------------------------------------------------------------------------

#[test]
fn task_decomposition_executes_in_order() {
    let heat = CallCounter::new();
    let serve = CallCounter::new();
    let mut domain = DomainV1::new("s2");
    domain
        .declare_action("heat", counting_action(&heat, "heat"))
        .unwrap();
    domain
        .declare_action("serve", counting_action(&serve, "serve"))
        .unwrap();
    domain
        .declare_task_methods(
            "cook",
            vec![task_method("stove", |_, _| {
                Ok(vec![
                    TodoItemV1::action("heat", Vec::new()),
                    TodoItemV1::action("serve", Vec::new()),
                ])
            })],
        )
        .unwrap();
    let state = WorldStateV1::new("s");
    let outcome =
        plan_and_execute(&domain, &state, &[TodoItemV1::task("cook", Vec::new())]).unwrap();
    let names: Vec<String> = outcome.trace.actions().into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["heat", "serve"]);
    assert_eq!(heat.count(), 1);
    assert_eq!(serve.count(), 1);
    // Final state reflects both effects.
    assert_eq!(
        outcome.final_state.get_fact("done", "heat"),
        Some(&true.into())
    );
    assert_eq!(
        outcome.final_state.get_fact("done", "serve"),
        Some(&true.into())
    );
}

// ---------------------------------------------------------------------------
// Scenario 3: first method's action fails at run time; the second method
// (declared after the first) takes over after exactly one retry.
// ---------------------------------------------------------------------------

#[test]
fn runtime_failure_falls_back_to_second_method() {
    let heat = CallCounter::new();
    let microwave = CallCounter::new();
    let serve = CallCounter::new();
    let mut domain = DomainV1::new("s3");
    domain
        .declare_action("heat", counting_failing_action(&heat, "burner out"))
        .unwrap();
    domain
        .declare_action("microwave", counting_action(&microwave, "microwave"))
        .unwrap();
    domain
        .declare_action("serve", counting_action(&serve, "serve"))
        .unwrap();
    domain
        .declare_task_methods(
            "cook",
            vec![
                task_method("stove", |_, _| {
                    Ok(vec![
                        TodoItemV1::action("heat", Vec::new()),
                        TodoItemV1::action("serve", Vec::new()),
                    ])
                }),
                task_method("nuker", |_, _| {
                    Ok(vec![
                        TodoItemV1::action("microwave", Vec::new()),
                        TodoItemV1::action("serve", Vec::new()),
                    ])
                }),
            ],
        )
        .unwrap();
    let state = WorldStateV1::new("s");
    let outcome =
        plan_and_execute(&domain, &state, &[TodoItemV1::task("cook", Vec::new())]).unwrap();

    // The failed attempt is not replayed: heat ran exactly once.
    assert_eq!(heat.count(), 1);
    assert_eq!(microwave.count(), 1);
    assert_eq!(serve.count(), 1);
    let names: Vec<String> = outcome.trace.actions().into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["microwave", "serve"]);
    assert_eq!(outcome.report.retries_used, 1);

    // The stove method is blacklisted at that node only, not domain-wide.
    let task_node_id = outcome.tree.node(outcome.tree.root_id()).unwrap().children[0];
    let task_node = outcome.tree.node(task_node_id).unwrap();
    assert!(task_node.blacklisted_methods.contains("stove"));
    assert_eq!(task_node.method_tried.as_deref(), Some("nuker"));
    assert!(!outcome.report.blacklist.is_method_exhausted("stove"));
}

// ---------------------------------------------------------------------------
// Scenario 4: a bare todo action with no owning method fails every time.
// ---------------------------------------------------------------------------

#[test]
fn unattributable_failing_action_exhausts_recovery() {
    let doom = CallCounter::new();
    let mut domain = DomainV1::new("s4");
    domain
        .declare_action("doom", counting_failing_action(&doom, "always fails"))
        .unwrap();
    let state = WorldStateV1::new("s");
    let err =
        plan_and_execute(&domain, &state, &[TodoItemV1::action("doom", Vec::new())]).unwrap_err();
    assert!(matches!(
        err.reason,
        ExecuteFailureReasonV1::NoRecoveryPath { .. }
    ));
    // One live attempt; the re-linearized occurrence is pre-failed by the
    // blacklist, not dispatched again.
    assert_eq!(doom.count(), 1);
    assert!(err.partial_trace.is_empty());
    assert_eq!(err.report.blacklist.commands_blacklisted_total(), 1);
}

#[test]
fn globally_blacklisted_action_is_avoided_by_alternative_branch() {
    // The same failing command appears under a task with an alternative
    // method: after the owning method is blacklisted, replanning avoids the
    // command entirely.
    let doom = CallCounter::new();
    let safe = CallCounter::new();
    let mut domain = DomainV1::new("s4b");
    domain
        .declare_action("doom", counting_failing_action(&doom, "always fails"))
        .unwrap();
    domain
        .declare_action("safe", counting_action(&safe, "safe"))
        .unwrap();
    domain
        .declare_task_methods(
            "job",
            vec![
                task_method("risky", |_, _| {
                    Ok(vec![TodoItemV1::action("doom", Vec::new())])
                }),
                task_method("careful", |_, _| {
                    Ok(vec![TodoItemV1::action("safe", Vec::new())])
                }),
            ],
        )
        .unwrap();
    let state = WorldStateV1::new("s");
    let outcome =
        plan_and_execute(&domain, &state, &[TodoItemV1::task("job", Vec::new())]).unwrap();
    assert_eq!(doom.count(), 1);
    assert_eq!(safe.count(), 1);
    let names: Vec<String> = outcome.trace.actions().into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["safe"]);
}

// ---------------------------------------------------------------------------
// Scenario 5: default multigoal expansion preserves goal order.
// ---------------------------------------------------------------------------

#[test]
fn default_multigoal_expansion_keeps_declared_order() {
    let mut domain = DomainV1::new("s5");
    domain
        .declare_action(
            "move",
            action_fn(|state, args| {
                let [block, dest] = args else {
                    return Err(format!("move expects 2 args, got {}", args.len()));
                };
                let Some(block) = block.as_sym() else {
                    return Err("move: block must be symbolic".to_string());
                };
                let mut next = state.clone();
                next.set_fact("pos", block, dest.clone());
                Ok(next)
            }),
        )
        .unwrap();
    domain
        .declare_unigoal_methods(
            "pos",
            vec![unigoal_method("move_to", |state, subject, value| {
                if state.get_fact("pos", subject) == Some(value) {
                    Ok(Vec::new())
                } else {
                    Ok(vec![TodoItemV1::action(
                        "move",
                        vec![subject.into(), value.clone()],
                    )])
                }
            })],
        )
        .unwrap();
    let state = WorldStateV1::new("s");
    let mg = MultigoalV1::new(
        "layout",
        vec![
            GoalV1::new("pos", "a", "b"),
            GoalV1::new("pos", "b", "table"),
        ],
    );
    let tree = plan(
        &domain,
        &state,
        &[TodoItemV1::Multigoal(mg)],
        &PlannerPolicyV1::default(),
    )
    .unwrap();

    let mg_node_id = tree.node(tree.root_id()).unwrap().children[0];
    let mg_node = tree.node(mg_node_id).unwrap();
    assert_eq!(mg_node.method_tried.as_deref(), Some(MULTIGOAL_SPLIT));
    let goals: Vec<(String, String)> = mg_node
        .children
        .iter()
        .map(|&id| match &tree.node(id).unwrap().task {
            NodeTaskV1::Todo(TodoItemV1::Goal(g)) => (g.subject.clone(), g.value.to_string()),
            other => panic!("expected goal child, got {other}"),
        })
        .collect();
    assert_eq!(
        goals,
        vec![
            ("a".to_string(), "b".to_string()),
            ("b".to_string(), "table".to_string()),
        ]
    );

    // Execution achieves both goals in that order.
    let outcome = execute(&domain, &state, tree, &PlannerPolicyV1::default()).unwrap();
    assert_eq!(
        outcome.trace.actions(),
        vec![
            ("move".to_string(), vec!["a".into(), "b".into()]),
            ("move".to_string(), vec!["b".into(), "table".into()]),
        ]
    );
}
