//! `BlocksMini`: minimal goal-driven world for planner testing.
//!
//! Three blocks on a table, one `pos` predicate, one `move` action. Unigoal
//! methods achieve `pos` goals directly; multigoals rely on the planner's
//! default split expansion (this world declares no multigoal method on
//! purpose — it exercises that fallback).
//!
//! The initial layout is `a`, `b`, `c` all on the table. The default todo
//! list stacks `a` on `b` on the table via a multigoal.

use meridian_kernel::domain::{action_fn, unigoal_method, DomainV1};
use meridian_kernel::state::WorldStateV1;
use meridian_kernel::todo::{GoalV1, MultigoalV1, TodoItemV1};

use crate::contract::{PlanningWorldV1, WorldBuildError};

/// Minimal goal-driven world.
pub struct BlocksMini;

impl PlanningWorldV1 for BlocksMini {
    #[allow(clippy::unnecessary_literal_bound)]
    fn world_id(&self) -> &str {
        "blocks_mini"
    }

    fn domain(&self) -> Result<DomainV1, WorldBuildError> {
        let mut domain = DomainV1::new("blocks_mini");
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
                    if state.get_fact("pos", block).is_none() {
                        return Err(format!("move: unknown block {block}"));
                    }
                    let mut next = state.clone();
                    next.set_fact("pos", block, dest.clone());
                    Ok(next)
                }),
            )
            .map_err(build_failure)?;
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
            .map_err(build_failure)?;
        Ok(domain)
    }

    fn initial_state(&self) -> WorldStateV1 {
        WorldStateV1::new("blocks_mini")
            .with_fact("pos", "a", "table")
            .with_fact("pos", "b", "table")
            .with_fact("pos", "c", "table")
    }

    fn todos(&self) -> Vec<TodoItemV1> {
        vec![TodoItemV1::Multigoal(MultigoalV1::new(
            "stack_ab",
            vec![
                GoalV1::new("pos", "a", "b"),
                GoalV1::new("pos", "b", "table"),
            ],
        ))]
    }
}

fn build_failure(e: meridian_kernel::domain::DomainBuildError) -> WorldBuildError {
    WorldBuildError::BuildFailure {
        detail: e.to_string(),
    }
}
