//! Core solution-tree node types.

use std::collections::BTreeSet;

use meridian_kernel::state::WorldStateV1;
use meridian_kernel::todo::TodoItemV1;
use meridian_kernel::value::FactValueV1;

/// Node identifier: monotonic per tree, never reused within a session.
pub type NodeId = u64;

/// Sentinel method name recorded on the root after [`crate::tree::SolutionTreeV1::expand_root`].
///
/// Never eligible for blacklisting — the backtracking walk-up skips it.
/// Lives in the reserved `<` namespace, which domain registration rejects.
pub const ROOT_EXPANSION: &str = "<root>";

/// Sentinel method name for the default multigoal split expansion (one child
/// goal per unsatisfied triple). Unlike [`ROOT_EXPANSION`], the split IS
/// attributable: blacklisting it at a node is how the executor learns the
/// multigoal has no remaining decomposition there.
pub const MULTIGOAL_SPLIT: &str = "<split>";

/// The work a node represents: the synthetic root, or one todo item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTaskV1 {
    /// Synthetic root wrapping the session's todo list.
    Root { todos: Vec<TodoItemV1> },
    /// One todo item.
    Todo(TodoItemV1),
}

impl NodeTaskV1 {
    /// The `(name, args)` pair if this node represents an `Action` todo.
    #[must_use]
    pub fn as_action(&self) -> Option<(&str, &[FactValueV1])> {
        match self {
            Self::Todo(todo) => todo.as_action(),
            Self::Root { .. } => None,
        }
    }

    /// Project to a `serde_json::Value` for artifact rendering.
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            Self::Root { todos } => serde_json::json!({
                "kind": "root",
                "todos": todos.iter().map(TodoItemV1::to_json_value).collect::<Vec<_>>(),
            }),
            Self::Todo(todo) => todo.to_json_value(),
        }
    }
}

impl std::fmt::Display for NodeTaskV1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Root { todos } => write!(f, "<root of {} todos>", todos.len()),
            Self::Todo(todo) => write!(f, "{todo}"),
        }
    }
}

/// One node of the solution tree.
///
/// `children` order is the authoritative execution/decomposition order and
/// is never re-sorted. `state` is the snapshot as of reaching this node
/// during planning; backtracking re-expands from it unchanged.
#[derive(Debug, Clone)]
pub struct PlanNodeV1 {
    pub node_id: NodeId,
    /// Parent node ID (`None` only for the root).
    pub parent_id: Option<NodeId>,
    pub task: NodeTaskV1,
    pub children: Vec<NodeId>,
    /// State snapshot as of reaching this node.
    pub state: WorldStateV1,
    /// True once children (or terminal status) have been determined.
    pub expanded: bool,
    /// True for terminal leaves: executable actions, or goals/multigoals
    /// recognized as already satisfied.
    pub is_primitive: bool,
    /// The method currently attributed to this node's children.
    pub method_tried: Option<String>,
    /// Methods forbidden specifically at this node.
    pub blacklisted_methods: BTreeSet<String>,
}

impl PlanNodeV1 {
    /// Create an unexpanded node.
    #[must_use]
    pub fn new(
        node_id: NodeId,
        parent_id: Option<NodeId>,
        task: NodeTaskV1,
        state: WorldStateV1,
    ) -> Self {
        Self {
            node_id,
            parent_id,
            task,
            children: Vec::new(),
            state,
            expanded: false,
            is_primitive: false,
            method_tried: None,
            blacklisted_methods: BTreeSet::new(),
        }
    }

    /// The method a descendant failure may be attributed to, if any.
    ///
    /// `None` when unexpanded, primitive, or expanded under the root
    /// sentinel (which is never blacklistable).
    #[must_use]
    pub fn attributable_method(&self) -> Option<&str> {
        match self.method_tried.as_deref() {
            Some(ROOT_EXPANSION) | None => None,
            Some(m) => Some(m),
        }
    }

    /// Project to a `serde_json::Value` for artifact rendering.
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "node_id": self.node_id,
            "parent_id": self.parent_id,
            "task": self.task.to_json_value(),
            "children": self.children,
            "state_fingerprint": self.state.fingerprint().to_string(),
            "expanded": self.expanded,
            "is_primitive": self.is_primitive,
            "method_tried": self.method_tried,
            "blacklisted_methods": self.blacklisted_methods.iter().collect::<Vec<_>>(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributable_method_skips_root_sentinel() {
        let state = WorldStateV1::new("s");
        let mut node = PlanNodeV1::new(0, None, NodeTaskV1::Root { todos: Vec::new() }, state);
        assert_eq!(node.attributable_method(), None);
        node.method_tried = Some(ROOT_EXPANSION.to_string());
        assert_eq!(node.attributable_method(), None);
        node.method_tried = Some("cook_stove".to_string());
        assert_eq!(node.attributable_method(), Some("cook_stove"));
    }

    #[test]
    fn as_action_only_for_action_todos() {
        let state = WorldStateV1::new("s");
        let action = PlanNodeV1::new(
            1,
            Some(0),
            NodeTaskV1::Todo(TodoItemV1::action("move", vec!["a".into()])),
            state.clone(),
        );
        assert!(action.task.as_action().is_some());
        let task = PlanNodeV1::new(
            2,
            Some(0),
            NodeTaskV1::Todo(TodoItemV1::task("cook", Vec::new())),
            state,
        );
        assert!(task.task.as_action().is_none());
    }
}
