//! `DomainV1`: the explicit, immutable action/method registry.
//!
//! A domain is an ordinary value passed to `plan`/`execute` — there is no
//! process-global registration state. Names are resolved to canonical
//! `String` keys exactly once, here; lookups downstream never re-interpret
//! them.
//!
//! # Method ordering
//!
//! Declaration order is authoritative. `lookup_*` returns methods in the
//! order they were declared; the planner's first-applicable-method protocol
//! depends on this and nothing may re-sort it.
//!
//! # Function signatures
//!
//! One fixed signature per callback kind. Alternate legacy shapes (boolean
//! success sentinel, infallible bare-state return) are adapted at this
//! registration boundary via [`action_from_bool`] / [`action_from_state`] —
//! never inside the executor.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::state::WorldStateV1;
use crate::todo::{MultigoalV1, TodoItemV1};
use crate::value::FactValueV1;

/// Method names starting with this character are reserved for planner
/// sentinels (root expansion, default multigoal split).
pub const RESERVED_NAME_PREFIX: char = '<';

/// Action implementation: `(state, args) -> Result<new state, reason>`.
pub type ActionFnV1 =
    Arc<dyn Fn(&WorldStateV1, &[FactValueV1]) -> Result<WorldStateV1, String> + Send + Sync>;

/// Task method: `(state, args) -> Result<subtodos, reason>`.
pub type TaskMethodFnV1 =
    Arc<dyn Fn(&WorldStateV1, &[FactValueV1]) -> Result<Vec<TodoItemV1>, String> + Send + Sync>;

/// Unigoal method: `(state, subject, value) -> Result<subtodos, reason>`.
pub type UnigoalMethodFnV1 = Arc<
    dyn Fn(&WorldStateV1, &str, &FactValueV1) -> Result<Vec<TodoItemV1>, String> + Send + Sync,
>;

/// Multigoal method: `(state, multigoal) -> Result<subtodos, reason>`.
pub type MultigoalMethodFnV1 =
    Arc<dyn Fn(&WorldStateV1, &MultigoalV1) -> Result<Vec<TodoItemV1>, String> + Send + Sync>;

/// A named task-decomposition method.
#[derive(Clone)]
pub struct TaskMethodV1 {
    pub name: String,
    pub func: TaskMethodFnV1,
}

/// A named unigoal-decomposition method.
#[derive(Clone)]
pub struct UnigoalMethodV1 {
    pub name: String,
    pub func: UnigoalMethodFnV1,
}

/// A named multigoal-decomposition method.
#[derive(Clone)]
pub struct MultigoalMethodV1 {
    pub name: String,
    pub func: MultigoalMethodFnV1,
}

impl std::fmt::Debug for TaskMethodV1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskMethodV1").field("name", &self.name).finish_non_exhaustive()
    }
}

impl std::fmt::Debug for UnigoalMethodV1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnigoalMethodV1").field("name", &self.name).finish_non_exhaustive()
    }
}

impl std::fmt::Debug for MultigoalMethodV1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultigoalMethodV1").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Typed failure for domain construction. Fail-closed: a malformed domain
/// is rejected at build time, not discovered mid-plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainBuildError {
    /// An action with this name is already declared.
    DuplicateAction { name: String },
    /// A method with this name is already declared under the same key.
    DuplicateMethod { key: String, name: String },
    /// The name collides with the reserved planner-sentinel namespace.
    ReservedName { name: String },
}

impl std::fmt::Display for DomainBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateAction { name } => write!(f, "duplicate action declaration: {name}"),
            Self::DuplicateMethod { key, name } => {
                write!(f, "duplicate method declaration for {key}: {name}")
            }
            Self::ReservedName { name } => {
                write!(f, "name is in the reserved sentinel namespace: {name}")
            }
        }
    }
}

impl std::error::Error for DomainBuildError {}

/// The explicit, immutable action/method registry.
#[derive(Clone, Default)]
pub struct DomainV1 {
    name: String,
    actions: BTreeMap<String, ActionFnV1>,
    task_methods: BTreeMap<String, Vec<TaskMethodV1>>,
    unigoal_methods: BTreeMap<String, Vec<UnigoalMethodV1>>,
    multigoal_methods: Vec<MultigoalMethodV1>,
}

impl std::fmt::Debug for DomainV1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainV1")
            .field("name", &self.name)
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field("task_methods", &self.task_methods.keys().collect::<Vec<_>>())
            .field(
                "unigoal_methods",
                &self.unigoal_methods.keys().collect::<Vec<_>>(),
            )
            .field(
                "multigoal_methods",
                &self
                    .multigoal_methods
                    .iter()
                    .map(|m| m.name.as_str())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl DomainV1 {
    /// Create an empty domain with a diagnostic name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// The diagnostic name of this domain.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare an action.
    ///
    /// # Errors
    ///
    /// Returns [`DomainBuildError`] on a duplicate or reserved name.
    pub fn declare_action(
        &mut self,
        name: impl Into<String>,
        func: ActionFnV1,
    ) -> Result<(), DomainBuildError> {
        let name = name.into();
        check_name(&name)?;
        if self.actions.contains_key(&name) {
            return Err(DomainBuildError::DuplicateAction { name });
        }
        self.actions.insert(name, func);
        Ok(())
    }

    /// Declare the methods for a task name, in selection order.
    ///
    /// Appends to any methods already declared for the task.
    ///
    /// # Errors
    ///
    /// Returns [`DomainBuildError`] on a duplicate or reserved method name.
    pub fn declare_task_methods(
        &mut self,
        task: impl Into<String>,
        methods: Vec<TaskMethodV1>,
    ) -> Result<(), DomainBuildError> {
        let task = task.into();
        let declared = self.task_methods.entry(task.clone()).or_default();
        // Validate the whole batch before touching the registry.
        check_batch(
            methods.iter().map(|m| m.name.as_str()),
            declared.iter().map(|m| m.name.as_str()),
            &format!("task {task}"),
        )?;
        declared.extend(methods);
        Ok(())
    }

    /// Declare the unigoal methods for a predicate, in selection order.
    ///
    /// # Errors
    ///
    /// Returns [`DomainBuildError`] on a duplicate or reserved method name.
    pub fn declare_unigoal_methods(
        &mut self,
        predicate: impl Into<String>,
        methods: Vec<UnigoalMethodV1>,
    ) -> Result<(), DomainBuildError> {
        let predicate = predicate.into();
        let declared = self.unigoal_methods.entry(predicate.clone()).or_default();
        check_batch(
            methods.iter().map(|m| m.name.as_str()),
            declared.iter().map(|m| m.name.as_str()),
            &format!("predicate {predicate}"),
        )?;
        declared.extend(methods);
        Ok(())
    }

    /// Declare multigoal methods, in selection order.
    ///
    /// # Errors
    ///
    /// Returns [`DomainBuildError`] on a duplicate or reserved method name.
    pub fn declare_multigoal_methods(
        &mut self,
        methods: Vec<MultigoalMethodV1>,
    ) -> Result<(), DomainBuildError> {
        check_batch(
            methods.iter().map(|m| m.name.as_str()),
            self.multigoal_methods.iter().map(|m| m.name.as_str()),
            "multigoal",
        )?;
        self.multigoal_methods.extend(methods);
        Ok(())
    }

    /// Look up an action implementation by name.
    #[must_use]
    pub fn lookup_action(&self, name: &str) -> Option<&ActionFnV1> {
        self.actions.get(name)
    }

    /// The declared methods for a task name, in declaration order.
    /// Empty slice if none are declared.
    #[must_use]
    pub fn lookup_task_methods(&self, task: &str) -> &[TaskMethodV1] {
        self.task_methods.get(task).map_or(&[], Vec::as_slice)
    }

    /// The declared unigoal methods for a predicate, in declaration order.
    #[must_use]
    pub fn lookup_unigoal_methods(&self, predicate: &str) -> &[UnigoalMethodV1] {
        self.unigoal_methods.get(predicate).map_or(&[], Vec::as_slice)
    }

    /// The declared multigoal methods, in declaration order.
    #[must_use]
    pub fn lookup_multigoal_methods(&self) -> &[MultigoalMethodV1] {
        &self.multigoal_methods
    }
}

fn check_name(name: &str) -> Result<(), DomainBuildError> {
    if name.starts_with(RESERVED_NAME_PREFIX) {
        return Err(DomainBuildError::ReservedName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Validate an incoming method batch against names already declared under
/// the same key (and against itself), without mutating anything.
fn check_batch<'a>(
    incoming: impl Iterator<Item = &'a str>,
    declared: impl Iterator<Item = &'a str>,
    key: &str,
) -> Result<(), DomainBuildError> {
    let mut seen: std::collections::BTreeSet<&str> = declared.collect();
    for name in incoming {
        check_name(name)?;
        if !seen.insert(name) {
            return Err(DomainBuildError::DuplicateMethod {
                key: key.to_string(),
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

/// Adapt a boolean-sentinel action body to the canonical signature.
///
/// The body mutates a working copy of the state and reports success with
/// `true`. A `false` return becomes a `Failed` result with a generic reason.
pub fn action_from_bool<F>(f: F) -> ActionFnV1
where
    F: Fn(&mut WorldStateV1, &[FactValueV1]) -> bool + Send + Sync + 'static,
{
    Arc::new(move |state, args| {
        let mut next = state.clone();
        if f(&mut next, args) {
            Ok(next)
        } else {
            Err("action reported failure".to_string())
        }
    })
}

/// Adapt an infallible bare-state action body to the canonical signature.
pub fn action_from_state<F>(f: F) -> ActionFnV1
where
    F: Fn(&WorldStateV1, &[FactValueV1]) -> WorldStateV1 + Send + Sync + 'static,
{
    Arc::new(move |state, args| Ok(f(state, args)))
}

/// Wrap a canonical-signature closure as an [`ActionFnV1`].
pub fn action_fn<F>(f: F) -> ActionFnV1
where
    F: Fn(&WorldStateV1, &[FactValueV1]) -> Result<WorldStateV1, String> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Build a named task method from a closure.
pub fn task_method<F>(name: impl Into<String>, f: F) -> TaskMethodV1
where
    F: Fn(&WorldStateV1, &[FactValueV1]) -> Result<Vec<TodoItemV1>, String> + Send + Sync + 'static,
{
    TaskMethodV1 {
        name: name.into(),
        func: Arc::new(f),
    }
}

/// Build a named unigoal method from a closure.
pub fn unigoal_method<F>(name: impl Into<String>, f: F) -> UnigoalMethodV1
where
    F: Fn(&WorldStateV1, &str, &FactValueV1) -> Result<Vec<TodoItemV1>, String>
        + Send
        + Sync
        + 'static,
{
    UnigoalMethodV1 {
        name: name.into(),
        func: Arc::new(f),
    }
}

/// Build a named multigoal method from a closure.
pub fn multigoal_method<F>(name: impl Into<String>, f: F) -> MultigoalMethodV1
where
    F: Fn(&WorldStateV1, &MultigoalV1) -> Result<Vec<TodoItemV1>, String> + Send + Sync + 'static,
{
    MultigoalMethodV1 {
        name: name.into(),
        func: Arc::new(f),
    }
}
