//! # policy-gate - Declarative Authorization Decisions
//!
//! `policy-gate` decides whether a request for an operation (an API method name
//! or path) is allowed, given its headers and role claims, by evaluating a
//! policy of named allow and deny rules:
//!
//! - **Glob rule selection**: `*` and `?` patterns pick the rules for a target
//! - **Multi-valued conditions**: header and role claims with several values
//! - **Pluggable match modes**: `equals`, `startsWith`, `endsWith`, `contains`,
//!   or your own
//! - **Two phases**: every applicable allow rule must hold, then any applicable
//!   deny rule can still block the request
//!
//! The policy comes from a [`PolicyStore`] and is fetched again on every call.
//!
//! ## Quick Start
//!
//! ```rust
//! use policy_gate::{Attributes, AuthorizationPolicy, PolicyEngine, StaticPolicyStore};
//!
//! # fn main() -> policy_gate::Result<()> {
//! let policy = AuthorizationPolicy::from_json(r#"{
//!     "allow_rules": {
//!         "orders": {
//!             "paths": ["/api.*.order.*"],
//!             "roles": {"any": {"viewer": {"equals": ["View Orders"]}}}
//!         }
//!     },
//!     "deny_rules": {
//!         "banned": {
//!             "paths": ["*"],
//!             "roles": {"all": {"x": {"equals": ["banned"]}}}
//!         }
//!     }
//! }"#).expect("valid policy");
//!
//! let engine = PolicyEngine::with_defaults("roles", StaticPolicyStore::new(policy));
//!
//! let attrs = Attributes::new().with("roles", ["View Orders"]);
//! engine.evaluate("/api.v1.order.GetOrder", &attrs)?;
//!
//! let attrs = Attributes::new().with("roles", ["View Orders", "banned"]);
//! let err = engine.evaluate("/api.v1.order.GetOrder", &attrs).unwrap_err();
//! assert!(err.is_denied());
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod error;

pub use crate::core::{
    config::EngineConfig,
    iam::{
        condition, glob_match, Attributes, AuthorizationPolicy, Condition, ConditionSet,
        EngineBuilder, FilePolicyStore, GlobMatcher, MatchMode, MatchModeRegistry, MatchPolicy,
        PathMatcher, PolicyEngine, PolicyFormat, PolicyStore, PolicyWarning, RequestAttributes,
        Rule, RuleSet, StaticPolicyStore,
    },
};
pub use crate::error::{Clause, Denial, GateError, Outcome, Phase, Result, StoreError};
