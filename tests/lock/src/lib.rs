//! Shared helpers for lock tests: counting actions and one-call runs.

#![forbid(unsafe_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use meridian_kernel::domain::{ActionFnV1, DomainV1};
use meridian_kernel::state::WorldStateV1;
use meridian_kernel::todo::TodoItemV1;
use meridian_planner::error::ExecuteErrorV1;
use meridian_planner::executor::{execute, ExecutionOutcomeV1};
use meridian_planner::expand::plan;
use meridian_planner::policy::PlannerPolicyV1;

/// An invocation counter shared with a counting action.
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    /// Create a counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of invocations observed.
    #[must_use]
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// An action that counts invocations and sets `done(<marker>) = true`.
#[must_use]
pub fn counting_action(counter: &CallCounter, marker: &str) -> ActionFnV1 {
    let counter = Arc::clone(&counter.0);
    let marker = marker.to_string();
    meridian_kernel::domain::action_fn(move |state, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        let mut next = state.clone();
        next.set_fact("done", marker.clone(), true);
        Ok(next)
    })
}

/// An action that counts invocations and always fails.
#[must_use]
pub fn counting_failing_action(counter: &CallCounter, reason: &str) -> ActionFnV1 {
    let counter = Arc::clone(&counter.0);
    let reason = reason.to_string();
    meridian_kernel::domain::action_fn(move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        Err(reason.clone())
    })
}

/// Plan then execute with the default policy.
///
/// # Errors
///
/// Returns [`ExecuteErrorV1`] when execution fails.
///
/// # Panics
///
/// Panics if planning fails — lock scenarios plan successfully by
/// construction.
pub fn plan_and_execute(
    domain: &DomainV1,
    state: &WorldStateV1,
    todos: &[TodoItemV1],
) -> Result<ExecutionOutcomeV1, ExecuteErrorV1> {
    let policy = PlannerPolicyV1::default();
    let tree = plan(domain, state, todos, &policy).expect("lock scenario must plan");
    execute(domain, state, tree, &policy)
}
