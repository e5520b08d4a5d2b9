//! Planning world contract: the minimal trait a world must implement.
//!
//! Worlds provide a domain value, an initial state, and a todo list. Worlds
//! may NOT implement planning, execution, or artifact rendering — those are
//! planner/runner concerns.

use meridian_kernel::domain::DomainV1;
use meridian_kernel::state::WorldStateV1;
use meridian_kernel::todo::TodoItemV1;

/// Typed failure for world construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldBuildError {
    /// Domain registration failed.
    BuildFailure { detail: String },
}

impl std::fmt::Display for WorldBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BuildFailure { detail } => write!(f, "world build failure: {detail}"),
        }
    }
}

impl std::error::Error for WorldBuildError {}

/// The contract a world must implement to be run by the harness runner.
///
/// A world provides:
/// - A unique identifier
/// - An immutable domain (actions + methods)
/// - An initial state and a todo list
///
/// A world does NOT provide:
/// - Planning or execution logic (planner's job)
/// - Artifact rendering (runner's job)
pub trait PlanningWorldV1 {
    /// Unique world identifier (e.g. `"blocks_mini"`).
    fn world_id(&self) -> &str;

    /// Build the domain for this world.
    ///
    /// # Errors
    ///
    /// Returns [`WorldBuildError::BuildFailure`] if registration fails.
    fn domain(&self) -> Result<DomainV1, WorldBuildError>;

    /// The initial world state.
    fn initial_state(&self) -> WorldStateV1;

    /// The todo list to plan and execute.
    fn todos(&self) -> Vec<TodoItemV1>;
}
