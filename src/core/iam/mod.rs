//! Declarative authorization for operation identifiers
//!
//! Provides allow/deny evaluation with:
//! - JSON (or TOML) policy documents of named allow and deny rules
//! - Glob pattern matching (`*`, `?`) to select rules for a target
//! - Multi-valued header and role conditions
//! - Pluggable match modes (equals, startsWith, endsWith, contains, custom)

mod attributes;
mod builder;
mod condition;
mod engine;
mod pattern;
mod policy;
mod store;

pub use attributes::{Attributes, RequestAttributes};
pub use builder::EngineBuilder;
pub use condition::{contains, ends_with, equals, starts_with, MatchMode, MatchModeRegistry};
pub use engine::PolicyEngine;
pub use pattern::{glob_match, GlobMatcher, PathMatcher};
pub use policy::{
    condition, AuthorizationPolicy, Condition, ConditionSet, MatchPolicy, PolicyWarning, Rule,
    RuleSet,
};
pub use store::{FilePolicyStore, PolicyFormat, PolicyStore, StaticPolicyStore};
