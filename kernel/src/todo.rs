//! Todo items: the work vocabulary of the planner.
//!
//! A [`TodoItemV1`] is one of four immutable shapes: a directly executable
//! `Action`, a compound `Task`, a single `Goal` over one fact, or an ordered
//! `Multigoal`. Structural equality is derived — the executor relies on it
//! to locate the tree node for a failed action.

use crate::state::WorldStateV1;
use crate::value::{render_args, FactValueV1};

/// A single-fact goal: `predicate(subject) = value`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GoalV1 {
    pub predicate: String,
    pub subject: String,
    pub value: FactValueV1,
}

impl GoalV1 {
    /// Construct a goal.
    #[must_use]
    pub fn new(
        predicate: impl Into<String>,
        subject: impl Into<String>,
        value: impl Into<FactValueV1>,
    ) -> Self {
        Self {
            predicate: predicate.into(),
            subject: subject.into(),
            value: value.into(),
        }
    }

    /// Whether the state already holds this goal's fact, by exact equality.
    #[must_use]
    pub fn satisfied_in(&self, state: &WorldStateV1) -> bool {
        state.get_fact(&self.predicate, &self.subject) == Some(&self.value)
    }

    /// Project to a `serde_json::Value` for artifact rendering.
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "predicate": self.predicate,
            "subject": self.subject,
            "value": self.value.to_json_value(),
        })
    }
}

impl std::fmt::Display for GoalV1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})={}", self.predicate, self.subject, self.value)
    }
}

/// An ordered conjunction of goals.
///
/// Order is meaningful: the default expansion produces one child per
/// unsatisfied goal in the multigoal's original relative order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MultigoalV1 {
    /// Diagnostic name (e.g. `"final_layout"`).
    pub name: String,
    pub goals: Vec<GoalV1>,
}

impl MultigoalV1 {
    /// Construct a multigoal.
    #[must_use]
    pub fn new(name: impl Into<String>, goals: Vec<GoalV1>) -> Self {
        Self {
            name: name.into(),
            goals,
        }
    }

    /// Whether every member goal is satisfied. An empty goal list is
    /// vacuously satisfied.
    #[must_use]
    pub fn satisfied_in(&self, state: &WorldStateV1) -> bool {
        self.goals.iter().all(|g| g.satisfied_in(state))
    }

    /// The member goals not yet satisfied, preserving original relative order.
    #[must_use]
    pub fn unsatisfied_goals(&self, state: &WorldStateV1) -> Vec<GoalV1> {
        self.goals
            .iter()
            .filter(|g| !g.satisfied_in(state))
            .cloned()
            .collect()
    }

    /// Project to a `serde_json::Value` for artifact rendering.
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "goals": self.goals.iter().map(GoalV1::to_json_value).collect::<Vec<_>>(),
        })
    }
}

impl std::fmt::Display for MultigoalV1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[", self.name)?;
        for (i, g) in self.goals.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{g}")?;
        }
        write!(f, "]")
    }
}

/// One item of work: action, task, goal, or multigoal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TodoItemV1 {
    /// A directly executable primitive.
    Action {
        name: String,
        args: Vec<FactValueV1>,
    },
    /// A compound task decomposed by task methods.
    Task {
        name: String,
        args: Vec<FactValueV1>,
    },
    /// A single-fact goal decomposed by unigoal methods.
    Goal(GoalV1),
    /// An ordered goal conjunction decomposed by multigoal methods.
    Multigoal(MultigoalV1),
}

impl TodoItemV1 {
    /// Construct an `Action` item.
    #[must_use]
    pub fn action(name: impl Into<String>, args: Vec<FactValueV1>) -> Self {
        Self::Action {
            name: name.into(),
            args,
        }
    }

    /// Construct a `Task` item.
    #[must_use]
    pub fn task(name: impl Into<String>, args: Vec<FactValueV1>) -> Self {
        Self::Task {
            name: name.into(),
            args,
        }
    }

    /// Construct a `Goal` item.
    #[must_use]
    pub fn goal(
        predicate: impl Into<String>,
        subject: impl Into<String>,
        value: impl Into<FactValueV1>,
    ) -> Self {
        Self::Goal(GoalV1::new(predicate, subject, value))
    }

    /// The `(name, args)` pair if this is an `Action`.
    #[must_use]
    pub fn as_action(&self) -> Option<(&str, &[FactValueV1])> {
        match self {
            Self::Action { name, args } => Some((name, args)),
            _ => None,
        }
    }

    /// Project to a `serde_json::Value` for artifact rendering.
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            Self::Action { name, args } => serde_json::json!({
                "kind": "action",
                "name": name,
                "args": args.iter().map(FactValueV1::to_json_value).collect::<Vec<_>>(),
            }),
            Self::Task { name, args } => serde_json::json!({
                "kind": "task",
                "name": name,
                "args": args.iter().map(FactValueV1::to_json_value).collect::<Vec<_>>(),
            }),
            Self::Goal(g) => serde_json::json!({
                "kind": "goal",
                "goal": g.to_json_value(),
            }),
            Self::Multigoal(mg) => serde_json::json!({
                "kind": "multigoal",
                "multigoal": mg.to_json_value(),
            }),
        }
    }
}

impl std::fmt::Display for TodoItemV1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Action { name, args } => write!(f, "{name}({})", render_args(args)),
            Self::Task { name, args } => write!(f, "{name}({})", render_args(args)),
            Self::Goal(g) => write!(f, "{g}"),
            Self::Multigoal(mg) => write!(f, "{mg}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goal_satisfaction_uses_exact_equality() {
        let state = WorldStateV1::new("s").with_fact("pos", "a", "table");
        assert!(GoalV1::new("pos", "a", "table").satisfied_in(&state));
        assert!(!GoalV1::new("pos", "a", "b").satisfied_in(&state));
        assert!(!GoalV1::new("pos", "b", "table").satisfied_in(&state));
    }

    #[test]
    fn empty_multigoal_is_vacuously_satisfied() {
        let state = WorldStateV1::new("s");
        let mg = MultigoalV1::new("empty", Vec::new());
        assert!(mg.satisfied_in(&state));
        assert!(mg.unsatisfied_goals(&state).is_empty());
    }

    #[test]
    fn unsatisfied_goals_preserve_relative_order() {
        let state = WorldStateV1::new("s").with_fact("pos", "b", "table");
        let mg = MultigoalV1::new(
            "layout",
            vec![
                GoalV1::new("pos", "a", "b"),
                GoalV1::new("pos", "b", "table"),
                GoalV1::new("pos", "c", "a"),
            ],
        );
        let unsat = mg.unsatisfied_goals(&state);
        assert_eq!(unsat.len(), 2);
        assert_eq!(unsat[0].subject, "a");
        assert_eq!(unsat[1].subject, "c");
    }

    #[test]
    fn structural_equality_on_actions() {
        let a = TodoItemV1::action("move", vec!["a".into(), "b".into()]);
        let b = TodoItemV1::action("move", vec!["a".into(), "b".into()]);
        let c = TodoItemV1::action("move", vec!["a".into(), "c".into()]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, TodoItemV1::task("move", vec!["a".into(), "b".into()]));
    }

    #[test]
    fn display_renders_conventional_shapes() {
        assert_eq!(
            TodoItemV1::action("move", vec!["a".into(), "b".into()]).to_string(),
            "move(a, b)"
        );
        assert_eq!(TodoItemV1::goal("pos", "a", "table").to_string(), "pos(a)=table");
    }
}
