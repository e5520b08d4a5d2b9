//! Planner policy: retry budget, expansion budget, diagnostic verbosity.

/// Default retry budget for [`crate::executor::execute`].
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default hard cap on node expansions per expansion pass.
const DEFAULT_MAX_EXPANSIONS: u64 = 10_000;

/// Highest meaningful verbosity level.
const MAX_VERBOSE: u8 = 3;

/// Policy violation detected before planning/execution begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyViolationV1 {
    /// `verbose` is outside `0..=3`.
    InvalidVerbosity { verbose: u8 },
    /// `max_expansions` is zero — no tree could ever be expanded.
    ZeroExpansionBudget,
}

impl std::fmt::Display for PolicyViolationV1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidVerbosity { verbose } => {
                write!(f, "verbose must be in 0..=3, got {verbose}")
            }
            Self::ZeroExpansionBudget => write!(f, "max_expansions must be non-zero"),
        }
    }
}

impl std::error::Error for PolicyViolationV1 {}

/// Budget and verbosity configuration for `plan`/`execute`.
///
/// `verbose` controls diagnostic emission only; it has no behavioral
/// effect on planning or execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerPolicyV1 {
    /// Diagnostic verbosity, `0..=3`.
    pub verbose: u8,
    /// Recovery attempt budget. Zero surfaces the first failure untried.
    pub max_retries: u32,
    /// Hard cap on node expansions per expansion pass (guards unbounded
    /// recursive decomposition).
    pub max_expansions: u64,
}

impl PlannerPolicyV1 {
    /// Validate policy constraints (pre-flight only).
    ///
    /// # Errors
    ///
    /// Returns [`PolicyViolationV1`] for out-of-range options.
    pub fn validate(&self) -> Result<(), PolicyViolationV1> {
        if self.verbose > MAX_VERBOSE {
            return Err(PolicyViolationV1::InvalidVerbosity {
                verbose: self.verbose,
            });
        }
        if self.max_expansions == 0 {
            return Err(PolicyViolationV1::ZeroExpansionBudget);
        }
        Ok(())
    }
}

impl Default for PlannerPolicyV1 {
    fn default() -> Self {
        Self {
            verbose: 0,
            max_retries: DEFAULT_MAX_RETRIES,
            max_expansions: DEFAULT_MAX_EXPANSIONS,
        }
    }
}
