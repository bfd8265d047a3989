//! Policy evaluation engine
//!
//! Evaluation runs in two phases against a freshly fetched policy:
//! - Allow phase: every applicable allow rule must be satisfied
//! - Deny phase: any applicable deny rule whose block condition holds denies
//!
//! A request with no applicable allow rules passes the allow phase, so a
//! policy without deny rules is permissive outside the targets it names.

use super::attributes::RequestAttributes;
use super::builder::EngineBuilder;
use super::condition::{MatchMode, MatchModeRegistry};
use super::pattern::{GlobMatcher, PathMatcher};
use super::policy::{Condition, ConditionSet, Rule, RuleSet};
use super::store::PolicyStore;
use crate::error::{Clause, Denial, GateError, Outcome, Phase, Result};
use parking_lot::RwLock;
use std::fmt;
use tracing::{debug, error, info, warn};

/// Policy evaluation engine
///
/// The match-mode registry sits behind a read-mostly lock, so modes can be
/// registered through a shared reference while other threads evaluate.
pub struct PolicyEngine {
    roles_key: String,
    store: Box<dyn PolicyStore>,
    modes: RwLock<MatchModeRegistry>,
    matcher: Box<dyn PathMatcher>,
}

impl PolicyEngine {
    /// Create an engine with an empty match-mode registry and a custom matcher
    pub fn new(
        roles_key: impl Into<String>,
        store: impl PolicyStore + 'static,
        matcher: impl PathMatcher + 'static,
    ) -> Self {
        Self::from_parts(
            roles_key.into(),
            Box::new(store),
            MatchModeRegistry::empty(),
            Box::new(matcher),
        )
    }

    /// Create an engine with the built-in match modes and the glob matcher
    ///
    /// # Examples
    ///
    /// ```
    /// use policy_gate::{Attributes, AuthorizationPolicy, PolicyEngine, StaticPolicyStore};
    ///
    /// let policy = AuthorizationPolicy::from_json(r#"{
    ///     "allow_rules": {
    ///         "r1": {"paths": ["/a/*"], "roles": {"all": {"x": {"equals": ["admin"]}}}}
    ///     }
    /// }"#).unwrap();
    /// let engine = PolicyEngine::with_defaults("roles", StaticPolicyStore::new(policy));
    ///
    /// assert!(engine.evaluate("/a/b", &Attributes::new().with("roles", ["admin"])).is_ok());
    /// assert!(engine.evaluate("/a/b", &Attributes::new().with("roles", ["user"])).is_err());
    /// ```
    pub fn with_defaults(roles_key: impl Into<String>, store: impl PolicyStore + 'static) -> Self {
        Self::from_parts(
            roles_key.into(),
            Box::new(store),
            MatchModeRegistry::with_defaults(),
            Box::new(GlobMatcher),
        )
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub(crate) fn from_parts(
        roles_key: String,
        store: Box<dyn PolicyStore>,
        modes: MatchModeRegistry,
        matcher: Box<dyn PathMatcher>,
    ) -> Self {
        info!(
            "Policy engine ready: roles key '{}', {} match modes",
            roles_key,
            modes.count()
        );
        PolicyEngine {
            roles_key,
            store,
            modes: RwLock::new(modes),
            matcher,
        }
    }

    /// Attribute key consulted for `roles` conditions
    pub fn roles_key(&self) -> &str {
        &self.roles_key
    }

    /// Register or override a match mode, returning the one it replaced
    pub fn register_match_mode(
        &self,
        name: impl Into<String>,
        mode: impl MatchMode + 'static,
    ) -> Option<Box<dyn MatchMode>> {
        self.modes.write().register(name, mode)
    }

    pub fn unregister_match_mode(&self, name: &str) -> Option<Box<dyn MatchMode>> {
        self.modes.write().unregister(name)
    }

    pub fn match_modes(&self) -> Vec<String> {
        self.modes.read().list_modes()
    }

    /// Decide whether a request for `target` is allowed
    ///
    /// `Ok(())` allows. A [`GateError::Denied`] names the phase, rule and
    /// clause that decided; any other error is a fault and must not be read
    /// as an allow.
    pub fn evaluate<A>(&self, target: &str, attributes: &A) -> Result<()>
    where
        A: RequestAttributes + ?Sized,
    {
        let policy = self.store.authorization_policy().map_err(|err| {
            error!(target_id = target, error = %err, "Failed to load authorization policy");
            GateError::Store(err)
        })?;

        let modes = self.modes.read();
        let evaluation = Evaluation {
            roles_key: &self.roles_key,
            modes: &modes,
            matcher: self.matcher.as_ref(),
            attributes,
        };

        let result = evaluation
            .allow_phase(target, &policy.allow_rules)
            .and_then(|()| evaluation.deny_phase(target, &policy.deny_rules));

        match &result {
            Ok(()) => debug!(target_id = target, "Request allowed"),
            Err(GateError::Denied(denial)) => warn!(
                target_id = target,
                phase = %denial.phase,
                rule = %denial.rule,
                clause = %denial.clause,
                outcome = %denial.outcome,
                "Request denied"
            ),
            Err(err) => error!(target_id = target, error = %err, "Policy evaluation fault"),
        }

        result
    }
}

impl fmt::Debug for PolicyEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyEngine")
            .field("roles_key", &self.roles_key)
            .field("modes", &*self.modes.read())
            .finish_non_exhaustive()
    }
}

/// State borrowed for a single evaluation
struct Evaluation<'a, A: ?Sized> {
    roles_key: &'a str,
    modes: &'a MatchModeRegistry,
    matcher: &'a dyn PathMatcher,
    attributes: &'a A,
}

impl<'a, A: RequestAttributes + ?Sized> Evaluation<'a, A> {
    fn allow_phase(&self, target: &str, rules: &RuleSet) -> Result<()> {
        for (name, rule) in rules.for_target(target, self.matcher) {
            debug!(target_id = target, rule = name, "Checking allow rule");
            self.check_allow_rule(name, rule)?;
        }
        Ok(())
    }

    fn check_allow_rule(&self, name: &str, rule: &Rule) -> Result<()> {
        let deny = |clause| Err(denied(Phase::Allow, name, clause, Outcome::Failed));

        for (key, condition) in rule.headers.all.iter().flatten() {
            if !self.validate(key, condition)? {
                return deny(Clause::HeadersAll(key.clone()));
            }
        }

        if let Some(any) = non_empty(&rule.headers.any) {
            if !self.any_holds(any.iter().map(|(key, c)| (key.as_str(), c)))? {
                return deny(Clause::HeadersAny);
            }
        }

        for (label, condition) in rule.roles.all.iter().flatten() {
            if !self.validate(self.roles_key, condition)? {
                return deny(Clause::RolesAll(label.clone()));
            }
        }

        if let Some(any) = non_empty(&rule.roles.any) {
            if !self.any_holds(any.values().map(|c| (self.roles_key, c)))? {
                return deny(Clause::RolesAny);
            }
        }

        Ok(())
    }

    fn deny_phase(&self, target: &str, rules: &RuleSet) -> Result<()> {
        for (name, rule) in rules.for_target(target, self.matcher) {
            debug!(target_id = target, rule = name, "Checking deny rule");
            self.check_deny_rule(name, rule)?;
        }
        Ok(())
    }

    fn check_deny_rule(&self, name: &str, rule: &Rule) -> Result<()> {
        let deny = |clause, outcome| Err(denied(Phase::Deny, name, clause, outcome));

        for (key, condition) in rule.headers.all.iter().flatten() {
            if self.validate(key, condition)? {
                return deny(Clause::HeadersAll(key.clone()), Outcome::Passed);
            }
        }

        // Gated on headers.any, but the entries checked are roles.any, each
        // looked up by its label. An absent roles.any therefore denies.
        if non_empty(&rule.headers.any).is_some() {
            let entries = rule
                .roles
                .any
                .iter()
                .flatten()
                .map(|(label, c)| (label.as_str(), c));
            if self.all_hold(entries)? {
                return deny(Clause::HeadersAny, Outcome::Failed);
            }
        }

        for (label, condition) in rule.roles.all.iter().flatten() {
            if self.validate(self.roles_key, condition)? {
                return deny(Clause::RolesAll(label.clone()), Outcome::Passed);
            }
        }

        if let Some(any) = non_empty(&rule.roles.any) {
            if self.all_hold(any.values().map(|c| (self.roles_key, c)))? {
                return deny(Clause::RolesAny, Outcome::Failed);
            }
        }

        Ok(())
    }

    fn validate(&self, key: &str, condition: &Condition) -> Result<bool> {
        self.modes.validate(self.attributes.get(key), condition)
    }

    /// Short-circuits on the first condition that holds
    fn any_holds<'c>(
        &self,
        entries: impl Iterator<Item = (&'c str, &'c Condition)>,
    ) -> Result<bool> {
        for (key, condition) in entries {
            if self.validate(key, condition)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Short-circuits on the first condition that does not hold
    fn all_hold<'c>(
        &self,
        entries: impl Iterator<Item = (&'c str, &'c Condition)>,
    ) -> Result<bool> {
        for (key, condition) in entries {
            if !self.validate(key, condition)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn denied(phase: Phase, rule: &str, clause: Clause, outcome: Outcome) -> GateError {
    GateError::Denied(Denial::new(phase, rule, clause, outcome))
}

fn non_empty(set: &Option<ConditionSet>) -> Option<&ConditionSet> {
    set.as_ref().filter(|s| !s.is_empty())
}
