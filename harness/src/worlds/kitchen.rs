//! `Kitchen`: task-decomposition world exercising runtime recovery.
//!
//! One `cook` task, two methods in declared order: the stove path and the
//! microwave path. The stove action consults a `broken(stove)` fact at run
//! time, so a world built with a broken stove plans the stove path first,
//! fails during execution, and recovers onto the microwave path — the
//! backtracking scenario end-to-end.

use meridian_kernel::domain::{action_fn, task_method, DomainV1};
use meridian_kernel::state::WorldStateV1;
use meridian_kernel::todo::TodoItemV1;

use crate::contract::{PlanningWorldV1, WorldBuildError};

/// Task-decomposition world with a runtime-failable appliance.
pub struct Kitchen {
    stove_broken: bool,
}

impl Kitchen {
    /// A kitchen where every appliance works.
    #[must_use]
    pub fn working() -> Self {
        Self {
            stove_broken: false,
        }
    }

    /// A kitchen whose stove fails at execution time.
    #[must_use]
    pub fn with_broken_stove() -> Self {
        Self { stove_broken: true }
    }
}

impl PlanningWorldV1 for Kitchen {
    #[allow(clippy::unnecessary_literal_bound)]
    fn world_id(&self) -> &str {
        "kitchen"
    }

    fn domain(&self) -> Result<DomainV1, WorldBuildError> {
        let mut domain = DomainV1::new("kitchen");
        domain
            .declare_action(
                "heat_stove",
                action_fn(|state, _| {
                    if state.get_fact("broken", "stove") == Some(&true.into()) {
                        return Err("stove is broken".to_string());
                    }
                    let mut next = state.clone();
                    next.set_fact("heated", "meal", true);
                    Ok(next)
                }),
            )
            .map_err(build_failure)?;
        domain
            .declare_action(
                "microwave",
                action_fn(|state, _| {
                    let mut next = state.clone();
                    next.set_fact("heated", "meal", true);
                    Ok(next)
                }),
            )
            .map_err(build_failure)?;
        domain
            .declare_action(
                "serve",
                action_fn(|state, _| {
                    if state.get_fact("heated", "meal") != Some(&true.into()) {
                        return Err("meal is not heated".to_string());
                    }
                    let mut next = state.clone();
                    next.set_fact("served", "meal", true);
                    Ok(next)
                }),
            )
            .map_err(build_failure)?;
        domain
            .declare_task_methods(
                "cook",
                vec![
                    task_method("use_stove", |_, _| {
                        Ok(vec![
                            TodoItemV1::action("heat_stove", Vec::new()),
                            TodoItemV1::action("serve", Vec::new()),
                        ])
                    }),
                    task_method("use_microwave", |_, _| {
                        Ok(vec![
                            TodoItemV1::action("microwave", Vec::new()),
                            TodoItemV1::action("serve", Vec::new()),
                        ])
                    }),
                ],
            )
            .map_err(build_failure)?;
        Ok(domain)
    }

    fn initial_state(&self) -> WorldStateV1 {
        let state = WorldStateV1::new("kitchen");
        if self.stove_broken {
            state.with_fact("broken", "stove", true)
        } else {
            state
        }
    }

    fn todos(&self) -> Vec<TodoItemV1> {
        vec![TodoItemV1::task("cook", Vec::new())]
    }
}

fn build_failure(e: meridian_kernel::domain::DomainBuildError) -> WorldBuildError {
    WorldBuildError::BuildFailure {
        detail: e.to_string(),
    }
}
