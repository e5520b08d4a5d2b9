//! `apply_action()`: the single exported action application path.
//!
//! Resolves the action implementation from the domain, invokes it with
//! `(state, args)`, and normalizes every outcome into a data value. A panic
//! in the action body is caught here and becomes
//! [`ActionFailureV1::Panicked`] — the executor must never depend on stack
//! unwinding for control flow.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::domain::DomainV1;
use crate::state::WorldStateV1;
use crate::value::{render_args, FactValueV1};

/// Typed failure for action application. Fail-closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionFailureV1 {
    /// The action name is not declared in the domain.
    UnknownAction { name: String },
    /// The action body returned an error value.
    Failed { name: String, detail: String },
    /// The action body panicked; the payload was captured.
    Panicked { name: String, detail: String },
}

impl ActionFailureV1 {
    /// The action name the failure refers to.
    #[must_use]
    pub fn action_name(&self) -> &str {
        match self {
            Self::UnknownAction { name } | Self::Failed { name, .. } | Self::Panicked { name, .. } => {
                name
            }
        }
    }
}

impl std::fmt::Display for ActionFailureV1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownAction { name } => write!(f, "unknown action: {name}"),
            Self::Failed { name, detail } => write!(f, "action {name} failed: {detail}"),
            Self::Panicked { name, detail } => write!(f, "action {name} panicked: {detail}"),
        }
    }
}

impl std::error::Error for ActionFailureV1 {}

/// Result type for action application.
pub type ApplyActionResult = Result<WorldStateV1, ActionFailureV1>;

/// Apply an action to the current state, producing a new state.
///
/// # Errors
///
/// Returns [`ActionFailureV1`] when the action is undeclared, reports
/// failure, or panics. Never unwinds into the caller.
pub fn apply_action(
    domain: &DomainV1,
    state: &WorldStateV1,
    name: &str,
    args: &[FactValueV1],
) -> ApplyActionResult {
    let Some(func) = domain.lookup_action(name) else {
        return Err(ActionFailureV1::UnknownAction {
            name: name.to_string(),
        });
    };

    let outcome = catch_unwind(AssertUnwindSafe(|| func(state, args)));
    match outcome {
        Ok(Ok(next)) => Ok(next),
        Ok(Err(detail)) => Err(ActionFailureV1::Failed {
            name: name.to_string(),
            detail,
        }),
        Err(payload) => Err(ActionFailureV1::Panicked {
            name: name.to_string(),
            detail: format!(
                "{} (args: {})",
                panic_detail(payload.as_ref()),
                render_args(args)
            ),
        }),
    }
}

/// Downcast a panic payload to a human-readable string when possible.
///
/// Shared with the planner, which normalizes method-body panics the same
/// way this module normalizes action-body panics.
#[must_use]
pub fn panic_detail(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
