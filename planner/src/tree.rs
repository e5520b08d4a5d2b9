//! `SolutionTreeV1`: the versioned decomposition record.
//!
//! An arena of nodes addressed by stable `u64` ids, with parent/children
//! stored as ids. Backtracking replaces only the affected subtree's ids;
//! siblings and ancestors keep their node values untouched. Ids are never
//! reused within one planning/execution session.
//!
//! The node map is a `BTreeMap` so every iteration (serialization,
//! integrity checks) is deterministic; execution order never comes from
//! the map — it always follows `children` vectors.

use std::collections::{BTreeMap, BTreeSet};

use meridian_kernel::state::WorldStateV1;
use meridian_kernel::todo::TodoItemV1;

use crate::blacklist::CommandKeyV1;
use crate::node::{NodeId, NodeTaskV1, PlanNodeV1, ROOT_EXPANSION};

/// Structural-integrity violation detected by [`SolutionTreeV1::check_integrity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeIntegrityErrorV1 {
    /// The root id is missing from the node map.
    MissingRoot { root_id: NodeId },
    /// A non-root node has no parent, or the root has one.
    BadParentLink { node_id: NodeId, detail: String },
    /// A child id does not exist in the node map.
    DanglingChild { node_id: NodeId, child_id: NodeId },
    /// A child's `parent_id` does not point back at the listing node, or it
    /// appears in the parent's `children` more than once.
    ParentChildMismatch { node_id: NodeId, child_id: NodeId },
    /// A node is not reachable from the root.
    Unreachable { node_id: NodeId },
}

impl std::fmt::Display for TreeIntegrityErrorV1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRoot { root_id } => write!(f, "root node {root_id} missing from arena"),
            Self::BadParentLink { node_id, detail } => {
                write!(f, "bad parent link at node {node_id}: {detail}")
            }
            Self::DanglingChild { node_id, child_id } => {
                write!(f, "node {node_id} lists missing child {child_id}")
            }
            Self::ParentChildMismatch { node_id, child_id } => {
                write!(f, "parent/child mismatch between {node_id} and {child_id}")
            }
            Self::Unreachable { node_id } => write!(f, "node {node_id} unreachable from root"),
        }
    }
}

impl std::error::Error for TreeIntegrityErrorV1 {}

/// The solution tree: root id, node arena, global command blacklist.
#[derive(Debug, Clone)]
pub struct SolutionTreeV1 {
    root_id: NodeId,
    nodes: BTreeMap<NodeId, PlanNodeV1>,
    blacklisted_commands: BTreeSet<CommandKeyV1>,
    next_node_id: NodeId,
}

impl SolutionTreeV1 {
    /// Build the initial tree: a single unexpanded root wrapping `todos`.
    #[must_use]
    pub fn create_initial_tree(todos: &[TodoItemV1], state: &WorldStateV1) -> Self {
        let root = PlanNodeV1::new(
            0,
            None,
            NodeTaskV1::Root {
                todos: todos.to_vec(),
            },
            state.clone(),
        );
        let mut nodes = BTreeMap::new();
        nodes.insert(0, root);
        Self {
            root_id: 0,
            nodes,
            blacklisted_commands: BTreeSet::new(),
            next_node_id: 1,
        }
    }

    /// Expand the root: one child per todo item, preserving list order.
    ///
    /// Records the [`ROOT_EXPANSION`] sentinel as the root's method. A
    /// no-op if the root is already expanded.
    pub fn expand_root(&mut self) {
        let root_id = self.root_id;
        let Some(root) = self.nodes.get(&root_id) else {
            return;
        };
        if root.expanded {
            return;
        }
        let (todos, state) = match &root.task {
            NodeTaskV1::Root { todos } => (todos.clone(), root.state.clone()),
            NodeTaskV1::Todo(_) => return,
        };
        for todo in todos {
            self.add_child(root_id, NodeTaskV1::Todo(todo), state.clone());
        }
        // Re-borrow: add_child touched the arena.
        if let Some(root) = self.nodes.get_mut(&root_id) {
            root.expanded = true;
            root.method_tried = Some(ROOT_EXPANSION.to_string());
        }
    }

    /// The root node id.
    #[must_use]
    pub fn root_id(&self) -> NodeId {
        self.root_id
    }

    /// Look up a node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&PlanNodeV1> {
        self.nodes.get(&id)
    }

    /// Mutable node lookup.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut PlanNodeV1> {
        self.nodes.get_mut(&id)
    }

    /// Number of nodes in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena is empty (never true for a constructed tree).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Deterministic iteration over nodes, by ascending id.
    pub fn iter_nodes(&self) -> impl Iterator<Item = &PlanNodeV1> {
        self.nodes.values()
    }

    /// Allocate a new child of `parent_id`, appended to its `children`.
    ///
    /// Returns the new node's id, or `None` if the parent is missing.
    pub fn add_child(
        &mut self,
        parent_id: NodeId,
        task: NodeTaskV1,
        state: WorldStateV1,
    ) -> Option<NodeId> {
        if !self.nodes.contains_key(&parent_id) {
            return None;
        }
        let node_id = self.next_node_id;
        self.next_node_id += 1;
        let node = PlanNodeV1::new(node_id, Some(parent_id), task, state);
        self.nodes.insert(node_id, node);
        if let Some(parent) = self.nodes.get_mut(&parent_id) {
            parent.children.push(node_id);
        }
        Some(node_id)
    }

    /// Discard the subtree below `node_id` and reset the node to unexpanded.
    ///
    /// Removes every descendant from the arena, clears `children`, and
    /// resets `expanded`/`is_primitive`/`method_tried`. The node keeps its
    /// id, its position in its parent's `children`, its state snapshot, and
    /// its `blacklisted_methods`. Returns the number of removed descendants.
    pub fn discard_subtree(&mut self, node_id: NodeId) -> u64 {
        let Some(node) = self.nodes.get_mut(&node_id) else {
            return 0;
        };
        let mut stack: Vec<NodeId> = std::mem::take(&mut node.children);
        node.expanded = false;
        node.is_primitive = false;
        node.method_tried = None;

        let mut removed = 0u64;
        while let Some(id) = stack.pop() {
            if let Some(child) = self.nodes.remove(&id) {
                removed += 1;
                stack.extend(child.children);
            }
        }
        removed
    }

    /// Whether a concrete command is globally blacklisted.
    #[must_use]
    pub fn is_command_blacklisted(&self, key: &CommandKeyV1) -> bool {
        self.blacklisted_commands.contains(key)
    }

    /// Add a command to the global blacklist.
    ///
    /// Returns `false` if it was already present (no progress made).
    pub fn blacklist_command(&mut self, key: CommandKeyV1) -> bool {
        self.blacklisted_commands.insert(key)
    }

    /// The global command blacklist, in key order.
    pub fn blacklisted_commands(&self) -> impl Iterator<Item = &CommandKeyV1> {
        self.blacklisted_commands.iter()
    }

    /// Verify structural integrity: parent/child symmetry, no dangling ids,
    /// full reachability from the root (which also rules out cycles, since
    /// every node has exactly one parent link).
    ///
    /// # Errors
    ///
    /// Returns the first [`TreeIntegrityErrorV1`] found, in deterministic
    /// (ascending node id) order.
    pub fn check_integrity(&self) -> Result<(), TreeIntegrityErrorV1> {
        if !self.nodes.contains_key(&self.root_id) {
            return Err(TreeIntegrityErrorV1::MissingRoot {
                root_id: self.root_id,
            });
        }
        for node in self.nodes.values() {
            match node.parent_id {
                None if node.node_id != self.root_id => {
                    return Err(TreeIntegrityErrorV1::BadParentLink {
                        node_id: node.node_id,
                        detail: "non-root node has no parent".to_string(),
                    });
                }
                Some(_) if node.node_id == self.root_id => {
                    return Err(TreeIntegrityErrorV1::BadParentLink {
                        node_id: node.node_id,
                        detail: "root node has a parent".to_string(),
                    });
                }
                Some(parent_id) => {
                    let Some(parent) = self.nodes.get(&parent_id) else {
                        return Err(TreeIntegrityErrorV1::BadParentLink {
                            node_id: node.node_id,
                            detail: format!("parent {parent_id} missing from arena"),
                        });
                    };
                    let listings = parent
                        .children
                        .iter()
                        .filter(|&&c| c == node.node_id)
                        .count();
                    if listings != 1 {
                        return Err(TreeIntegrityErrorV1::ParentChildMismatch {
                            node_id: parent_id,
                            child_id: node.node_id,
                        });
                    }
                }
                None => {}
            }
            for &child_id in &node.children {
                let Some(child) = self.nodes.get(&child_id) else {
                    return Err(TreeIntegrityErrorV1::DanglingChild {
                        node_id: node.node_id,
                        child_id,
                    });
                };
                if child.parent_id != Some(node.node_id) {
                    return Err(TreeIntegrityErrorV1::ParentChildMismatch {
                        node_id: node.node_id,
                        child_id,
                    });
                }
            }
        }
        // Reachability sweep.
        let mut seen: BTreeSet<NodeId> = BTreeSet::new();
        let mut stack = vec![self.root_id];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(node) = self.nodes.get(&id) {
                stack.extend(node.children.iter().copied());
            }
        }
        for &id in self.nodes.keys() {
            if !seen.contains(&id) {
                return Err(TreeIntegrityErrorV1::Unreachable { node_id: id });
            }
        }
        Ok(())
    }

    /// Project to a `serde_json::Value` for artifact rendering.
    ///
    /// Nodes appear sorted by ascending id.
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "root_id": self.root_id,
            "nodes": self.nodes.values().map(PlanNodeV1::to_json_value).collect::<Vec<_>>(),
            "blacklisted_commands": self
                .blacklisted_commands
                .iter()
                .map(CommandKeyV1::to_json_value)
                .collect::<Vec<_>>(),
        })
    }
}
