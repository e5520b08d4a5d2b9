//! Deterministic linearization: tree → ordered primitive-action sequence.
//!
//! Pre-order depth-first traversal following `children` order only. The
//! node arena's map order never influences the result. Pure and
//! idempotent: the same tree value always yields the same sequence.

use meridian_kernel::value::FactValueV1;

use crate::blacklist::CommandKeyV1;
use crate::node::NodeId;
use crate::tree::SolutionTreeV1;

/// One executable step of the linearized plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearStepV1 {
    /// The primitive action node this step came from.
    pub node_id: NodeId,
    pub name: String,
    pub args: Vec<FactValueV1>,
}

impl LinearStepV1 {
    /// The global-blacklist key for this step.
    #[must_use]
    pub fn command_key(&self) -> CommandKeyV1 {
        CommandKeyV1::new(self.name.clone(), self.args.clone())
    }
}

impl std::fmt::Display for LinearStepV1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.command_key())
    }
}

/// Extract the ordered primitive-action sequence from the tree.
///
/// Emits one step per node with `is_primitive = true` whose task is an
/// `Action`, in pre-order DFS visit order. Satisfied goals/multigoals are
/// primitive leaves too, but contribute no executable step.
#[must_use]
pub fn linearize(tree: &SolutionTreeV1) -> Vec<LinearStepV1> {
    let mut steps = Vec::new();
    let mut stack: Vec<NodeId> = vec![tree.root_id()];
    while let Some(id) = stack.pop() {
        let Some(node) = tree.node(id) else {
            continue;
        };
        if node.is_primitive {
            if let Some((name, args)) = node.task.as_action() {
                steps.push(LinearStepV1 {
                    node_id: node.node_id,
                    name: name.to_string(),
                    args: args.to_vec(),
                });
            }
            continue;
        }
        // Reverse push so children pop in declared order.
        stack.extend(node.children.iter().rev().copied());
    }
    steps
}

/// The linearized sequence projected to `(name, args)` pairs.
#[must_use]
pub fn linearize_actions(tree: &SolutionTreeV1) -> Vec<(String, Vec<FactValueV1>)> {
    linearize(tree)
        .into_iter()
        .map(|s| (s.name, s.args))
        .collect()
}
