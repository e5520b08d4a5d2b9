//! Node expansion: turn one unexpanded node into children, or mark it
//! terminal.
//!
//! # Method selection protocol
//!
//! Methods are tried in declared order, minus the node's blacklisted
//! methods. The **first** method that does not itself error is selected;
//! later methods are never consulted once one succeeds, even if the chosen
//! branch later fails downstream (that is the executor's backtracking
//! problem). A method error — returned or panicked — blacklists the method
//! at this node only and moves on to the next candidate.
//!
//! Method panics are caught here and treated as method errors; expansion
//! never unwinds on a domain callback's behalf.

use std::panic::{catch_unwind, AssertUnwindSafe};

use meridian_kernel::dispatch::panic_detail;
use meridian_kernel::domain::DomainV1;
use meridian_kernel::state::WorldStateV1;
use meridian_kernel::todo::{GoalV1, MultigoalV1, TodoItemV1};
use meridian_kernel::value::FactValueV1;

use crate::error::PlanErrorV1;
use crate::node::{NodeId, NodeTaskV1, MULTIGOAL_SPLIT, ROOT_EXPANSION};
use crate::policy::PlannerPolicyV1;
use crate::tree::SolutionTreeV1;

/// What expanding one node did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpandOutcomeV1 {
    /// The node was already expanded or primitive — the tree is unchanged.
    AlreadyDone,
    /// The node was marked terminal/primitive (no children).
    Primitive,
    /// A method decomposed the node into children.
    Decomposed { method: String, children: u64 },
}

/// A method candidate prepared for the shared selection protocol.
struct MethodThunk<'a> {
    name: String,
    invoke: Box<dyn Fn() -> Result<Vec<TodoItemV1>, String> + 'a>,
}

/// Outcome of the selection protocol, before the tree is touched.
enum Selection {
    /// A method succeeded (possibly with zero todos = already achieved).
    Chosen {
        method: String,
        todos: Vec<TodoItemV1>,
        errored: Vec<(String, String)>,
    },
    /// Every candidate was blacklisted or errored.
    Exhausted {
        errored: Vec<(String, String)>,
        skipped: usize,
        total: usize,
    },
}

/// Run the fixed selection protocol over prepared candidates.
fn select_method(
    thunks: Vec<MethodThunk<'_>>,
    blacklisted: &std::collections::BTreeSet<String>,
) -> Selection {
    let total = thunks.len();
    let mut errored: Vec<(String, String)> = Vec::new();
    let mut skipped = 0usize;
    for thunk in thunks {
        if blacklisted.contains(&thunk.name) {
            skipped += 1;
            continue;
        }
        let outcome = catch_unwind(AssertUnwindSafe(|| (thunk.invoke)()));
        match outcome {
            Ok(Ok(todos)) => {
                return Selection::Chosen {
                    method: thunk.name,
                    todos,
                    errored,
                };
            }
            Ok(Err(detail)) => errored.push((thunk.name, detail)),
            Err(payload) => errored.push((
                thunk.name,
                format!("method panicked: {}", panic_detail(payload.as_ref())),
            )),
        }
    }
    Selection::Exhausted {
        errored,
        skipped,
        total,
    }
}

/// Expand a single node per the protocol above.
///
/// # Errors
///
/// Returns [`PlanErrorV1::PlanningFailure`] when no applicable,
/// non-blacklisted method exists, and [`PlanErrorV1::TreeIntegrity`] if the
/// node id is missing from the arena.
pub fn expand_node(
    domain: &DomainV1,
    tree: &mut SolutionTreeV1,
    node_id: NodeId,
    policy: &PlannerPolicyV1,
) -> Result<ExpandOutcomeV1, PlanErrorV1> {
    let Some(node) = tree.node(node_id) else {
        return Err(PlanErrorV1::TreeIntegrity {
            detail: format!("expansion target {node_id} missing from arena"),
        });
    };
    if node.expanded || node.is_primitive {
        return Ok(ExpandOutcomeV1::AlreadyDone);
    }
    let state = node.state.clone();
    let task = node.task.clone();
    let node_blacklist = node.blacklisted_methods.clone();

    let selection = match &task {
        NodeTaskV1::Root { .. } => {
            tree.expand_root();
            let children = tree.node(node_id).map_or(0, |n| n.children.len() as u64);
            return Ok(ExpandOutcomeV1::Decomposed {
                method: ROOT_EXPANSION.to_string(),
                children,
            });
        }
        NodeTaskV1::Todo(TodoItemV1::Action { .. }) => {
            mark_primitive(tree, node_id);
            return Ok(ExpandOutcomeV1::Primitive);
        }
        NodeTaskV1::Todo(TodoItemV1::Goal(goal)) => {
            if goal.satisfied_in(&state) {
                mark_primitive(tree, node_id);
                return Ok(ExpandOutcomeV1::Primitive);
            }
            let methods = domain.lookup_unigoal_methods(&goal.predicate);
            if methods.is_empty() {
                return Err(planning_failure(
                    node_id,
                    &task,
                    format!("no unigoal methods declared for predicate {}", goal.predicate),
                ));
            }
            let thunks = methods
                .iter()
                .map(|m| MethodThunk {
                    name: m.name.clone(),
                    invoke: Box::new({
                        let func = m.func.clone();
                        let state = &state;
                        let goal: &GoalV1 = goal;
                        move || func(state, &goal.subject, &goal.value)
                    }),
                })
                .collect();
            select_method(thunks, &node_blacklist)
        }
        NodeTaskV1::Todo(TodoItemV1::Multigoal(mg)) => {
            if mg.satisfied_in(&state) {
                mark_primitive(tree, node_id);
                return Ok(ExpandOutcomeV1::Primitive);
            }
            let methods = domain.lookup_multigoal_methods();
            if methods.is_empty() {
                if node_blacklist.contains(MULTIGOAL_SPLIT) {
                    return Err(planning_failure(
                        node_id,
                        &task,
                        "default split blacklisted and no multigoal methods declared".to_string(),
                    ));
                }
                let todos = default_split(mg, &state);
                return Ok(attach_children(
                    tree,
                    node_id,
                    MULTIGOAL_SPLIT.to_string(),
                    todos,
                    &state,
                    policy,
                ));
            }
            let thunks = methods
                .iter()
                .map(|m| MethodThunk {
                    name: m.name.clone(),
                    invoke: Box::new({
                        let func = m.func.clone();
                        let state = &state;
                        let mg: &MultigoalV1 = mg;
                        move || func(state, mg)
                    }),
                })
                .collect();
            select_method(thunks, &node_blacklist)
        }
        NodeTaskV1::Todo(TodoItemV1::Task { name, args }) => {
            let methods = domain.lookup_task_methods(name);
            if methods.is_empty() {
                return Err(planning_failure(
                    node_id,
                    &task,
                    format!("no methods declared for task {name}"),
                ));
            }
            let thunks = methods
                .iter()
                .map(|m| MethodThunk {
                    name: m.name.clone(),
                    invoke: Box::new({
                        let func = m.func.clone();
                        let state = &state;
                        let args: &[FactValueV1] = args;
                        move || func(state, args)
                    }),
                })
                .collect();
            select_method(thunks, &node_blacklist)
        }
    };

    match selection {
        Selection::Chosen {
            method,
            todos,
            errored,
        } => {
            record_errored(tree, node_id, &errored, policy);
            if todos.is_empty() {
                // Already achieved per the method's own logic.
                mark_primitive(tree, node_id);
                Ok(ExpandOutcomeV1::Primitive)
            } else {
                Ok(attach_children(tree, node_id, method, todos, &state, policy))
            }
        }
        Selection::Exhausted {
            errored,
            skipped,
            total,
        } => {
            record_errored(tree, node_id, &errored, policy);
            Err(planning_failure(
                node_id,
                &task,
                format!(
                    "all {total} methods exhausted ({skipped} blacklisted, {} errored)",
                    errored.len()
                ),
            ))
        }
    }
}

/// Default multigoal expansion: one child goal per unsatisfied triple, in
/// the multigoal's original relative order.
fn default_split(mg: &MultigoalV1, state: &WorldStateV1) -> Vec<TodoItemV1> {
    mg.unsatisfied_goals(state)
        .into_iter()
        .map(TodoItemV1::Goal)
        .collect()
}

fn mark_primitive(tree: &mut SolutionTreeV1, node_id: NodeId) {
    if let Some(node) = tree.node_mut(node_id) {
        node.expanded = true;
        node.is_primitive = true;
    }
}

fn attach_children(
    tree: &mut SolutionTreeV1,
    node_id: NodeId,
    method: String,
    todos: Vec<TodoItemV1>,
    state: &WorldStateV1,
    policy: &PlannerPolicyV1,
) -> ExpandOutcomeV1 {
    let count = todos.len() as u64;
    for todo in todos {
        tree.add_child(node_id, NodeTaskV1::Todo(todo), state.clone());
    }
    if let Some(node) = tree.node_mut(node_id) {
        node.expanded = true;
        node.method_tried = Some(method.clone());
    }
    if policy.verbose >= 2 {
        tracing::debug!(node_id, method = %method, children = count, "node decomposed");
    }
    ExpandOutcomeV1::Decomposed { method, children: count }
}

fn record_errored(
    tree: &mut SolutionTreeV1,
    node_id: NodeId,
    errored: &[(String, String)],
    policy: &PlannerPolicyV1,
) {
    if errored.is_empty() {
        return;
    }
    if let Some(node) = tree.node_mut(node_id) {
        for (method, detail) in errored {
            node.blacklisted_methods.insert(method.clone());
            if policy.verbose >= 2 {
                tracing::debug!(node_id, method = %method, detail = %detail, "method errored; blacklisted at node");
            }
        }
    }
}

fn planning_failure(node_id: NodeId, task: &NodeTaskV1, detail: String) -> PlanErrorV1 {
    PlanErrorV1::PlanningFailure {
        node_id,
        task: task.to_string(),
        detail,
    }
}

/// Depth-first expansion of the subtree rooted at `start`, until every
/// leaf is primitive or expanded. Returns the number of nodes created.
///
/// # Errors
///
/// Propagates [`PlanErrorV1`] from `expand_node`, and returns
/// [`PlanErrorV1::ExpansionBudgetExceeded`] when `policy.max_expansions`
/// node expansions have been performed without finishing.
pub fn expand_from(
    domain: &DomainV1,
    tree: &mut SolutionTreeV1,
    start: NodeId,
    policy: &PlannerPolicyV1,
) -> Result<u64, PlanErrorV1> {
    let mut expansions = 0u64;
    let mut created = 0u64;
    let mut stack = vec![start];
    while let Some(id) = stack.pop() {
        let Some(node) = tree.node(id) else {
            continue;
        };
        if node.is_primitive {
            continue;
        }
        if node.expanded {
            stack.extend(node.children.iter().rev().copied());
            continue;
        }
        if expansions >= policy.max_expansions {
            return Err(PlanErrorV1::ExpansionBudgetExceeded {
                limit: policy.max_expansions,
            });
        }
        expansions += 1;
        match expand_node(domain, tree, id, policy)? {
            ExpandOutcomeV1::Decomposed { children, .. } => {
                created += children;
                if let Some(node) = tree.node(id) {
                    stack.extend(node.children.iter().rev().copied());
                }
            }
            ExpandOutcomeV1::Primitive | ExpandOutcomeV1::AlreadyDone => {}
        }
    }
    Ok(created)
}

/// Build and fully expand a solution tree for `todos` from `state`.
///
/// # Errors
///
/// Returns [`PlanErrorV1`] on policy violations, planning failure, budget
/// exhaustion, or a structural-integrity defect.
pub fn plan(
    domain: &DomainV1,
    state: &WorldStateV1,
    todos: &[TodoItemV1],
    policy: &PlannerPolicyV1,
) -> Result<SolutionTreeV1, PlanErrorV1> {
    policy.validate().map_err(PlanErrorV1::PolicyViolation)?;
    let mut tree = SolutionTreeV1::create_initial_tree(todos, state);
    tree.expand_root();
    let root_id = tree.root_id();
    expand_from(domain, &mut tree, root_id, policy)?;
    tree.check_integrity()
        .map_err(|e| PlanErrorV1::TreeIntegrity {
            detail: e.to_string(),
        })?;
    if policy.verbose >= 1 {
        tracing::info!(
            domain = domain.name(),
            nodes = tree.len(),
            "plan complete"
        );
    }
    Ok(tree)
}
