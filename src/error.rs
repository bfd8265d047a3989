//! Error types for policy evaluation

use std::fmt;
use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, GateError>;

/// Evaluation errors
///
/// Any error returned from [`PolicyEngine::evaluate`](crate::PolicyEngine::evaluate)
/// means the request is not allowed. Use [`GateError::is_denied`] to tell an
/// ordinary policy denial apart from a fault worth alerting on.
#[derive(Error, Debug)]
pub enum GateError {
    /// The policy could not be retrieved; evaluation did not run
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An allow clause failed or a deny clause matched
    #[error("{0}")]
    Denied(Denial),

    /// A condition names a match mode with no registered function
    #[error("policy evaluation failed: unknown match mode '{mode}'")]
    UnknownMatchMode { mode: String },

    /// Engine configuration was rejected
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl GateError {
    /// True for an expected "not authorized" outcome, false for faults
    pub fn is_denied(&self) -> bool {
        matches!(self, GateError::Denied(_))
    }

    /// Structured denial context, if this is a denial
    pub fn denial(&self) -> Option<&Denial> {
        match self {
            GateError::Denied(denial) => Some(denial),
            _ => None,
        }
    }
}

/// Policy store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store has no policy to hand out
    #[error("Policy unavailable: {0}")]
    Unavailable(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON policy document could not be parsed
    #[error("Invalid JSON policy: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML policy document could not be parsed
    #[error("Invalid TOML policy: {0}")]
    Toml(#[from] toml::de::Error),

    /// Error raised by a caller-provided store
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// Which rule set produced a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Allow,
    Deny,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Allow => "allow_rules",
            Phase::Deny => "deny_rules",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The clause of a rule that triggered a denial
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Clause {
    /// `headers.all`, with the header key whose condition decided
    HeadersAll(String),
    HeadersAny,
    /// `roles.all`, with the (otherwise ignored) condition label
    RolesAll(String),
    RolesAny,
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::HeadersAll(key) => write!(f, "headers.all.({})", key),
            Clause::HeadersAny => f.write_str("headers.any"),
            Clause::RolesAll(label) => write!(f, "roles.all.({})", label),
            Clause::RolesAny => f.write_str("roles.any"),
        }
    }
}

/// How the clause resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Failed,
    Passed,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Failed => f.write_str("failed"),
            Outcome::Passed => f.write_str("passed"),
        }
    }
}

/// Structured context for a denied request, suitable for audit logging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub phase: Phase,
    pub rule: String,
    pub clause: Clause,
    pub outcome: Outcome,
}

impl Denial {
    pub fn new(phase: Phase, rule: impl Into<String>, clause: Clause, outcome: Outcome) -> Self {
        Denial {
            phase,
            rule: rule.into(),
            clause,
            outcome,
        }
    }

    /// Dotted clause path, e.g. `allow_rules.(r1).roles.all.(x)`
    pub fn path(&self) -> String {
        format!("{}.({}).{}", self.phase, self.rule, self.clause)
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "policy evaluation failed: {} {}",
            self.path(),
            self.outcome
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denial_message_format() {
        let denial = Denial::new(
            Phase::Allow,
            "r1",
            Clause::RolesAll("x".to_string()),
            Outcome::Failed,
        );
        assert_eq!(
            denial.to_string(),
            "policy evaluation failed: allow_rules.(r1).roles.all.(x) failed"
        );

        let denial = Denial::new(
            Phase::Deny,
            "d1",
            Clause::HeadersAll("x-tenant".to_string()),
            Outcome::Passed,
        );
        assert_eq!(
            denial.to_string(),
            "policy evaluation failed: deny_rules.(d1).headers.all.(x-tenant) passed"
        );
    }

    #[test]
    fn test_store_error_is_transparent() {
        let err = GateError::from(StoreError::Unavailable("backend down".to_string()));
        assert_eq!(err.to_string(), "Policy unavailable: backend down");
        assert!(!err.is_denied());
        assert!(err.denial().is_none());
    }

    #[test]
    fn test_is_denied() {
        let err = GateError::Denied(Denial::new(
            Phase::Deny,
            "d1",
            Clause::RolesAny,
            Outcome::Failed,
        ));
        assert!(err.is_denied());
        assert_eq!(err.denial().map(|d| d.rule.as_str()), Some("d1"));

        let err = GateError::UnknownMatchMode {
            mode: "regex".to_string(),
        };
        assert!(!err.is_denied());
    }
}
