//! `FactValueV1`: the canonical value type for fact values and arguments.
//!
//! One value type flows through the whole system: fact values in
//! [`crate::state::WorldStateV1`], action/method arguments, and goal targets.
//! Names are resolved to canonical `String` keys once at the domain boundary;
//! nothing downstream re-interprets them.
//!
//! The derived `Ord` gives a total order (variant tag, then payload), which
//! keeps every `BTreeMap`/`BTreeSet` keyed on values deterministic.

/// A fact value or argument.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FactValueV1 {
    /// Symbolic constant: entity names, locations, statuses.
    Sym(String),
    /// Integer quantity.
    Int(i64),
    /// Boolean flag.
    Bool(bool),
}

impl FactValueV1 {
    /// Construct a symbolic constant.
    #[must_use]
    pub fn sym(s: impl Into<String>) -> Self {
        Self::Sym(s.into())
    }

    /// The symbolic payload, if this is a `Sym`.
    #[must_use]
    pub fn as_sym(&self) -> Option<&str> {
        match self {
            Self::Sym(s) => Some(s),
            _ => None,
        }
    }

    /// Project to a `serde_json::Value` for artifact rendering.
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            Self::Sym(s) => serde_json::Value::String(s.clone()),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Bool(b) => serde_json::Value::Bool(*b),
        }
    }
}

impl std::fmt::Display for FactValueV1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sym(s) => write!(f, "{s}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for FactValueV1 {
    fn from(s: &str) -> Self {
        Self::Sym(s.to_string())
    }
}

impl From<String> for FactValueV1 {
    fn from(s: String) -> Self {
        Self::Sym(s)
    }
}

impl From<i64> for FactValueV1 {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<bool> for FactValueV1 {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Render an argument list as `a, b, c` for diagnostics.
#[must_use]
pub fn render_args(args: &[FactValueV1]) -> String {
    args.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
