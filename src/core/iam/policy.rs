//! Authorization policy document structure
//!
//! A policy is two named rule sets, `allow_rules` and `deny_rules`. Each rule
//! selects targets by glob patterns and constrains them with header and role
//! conditions. Every field is optional in the serialized form.

use super::condition::MatchModeRegistry;
use super::pattern::PathMatcher;
use crate::error::Phase;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Match mode name -> required values
pub type Condition = BTreeMap<String, Vec<String>>;

/// Label -> condition
///
/// For `headers` the label is the attribute key to look up. For `roles` the
/// label is only used in diagnostics.
pub type ConditionSet = BTreeMap<String, Condition>;

/// `all` / `any` pair of condition sets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPolicy {
    /// Every condition must hold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all: Option<ConditionSet>,

    /// At least one condition must hold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any: Option<ConditionSet>,
}

impl MatchPolicy {
    /// True when neither set carries a condition
    pub fn is_empty(&self) -> bool {
        self.all.as_ref().map_or(true, |s| s.is_empty())
            && self.any.as_ref().map_or(true, |s| s.is_empty())
    }
}

/// A single named rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Target patterns (supports `*` and `?`)
    #[serde(default)]
    pub paths: Vec<String>,

    #[serde(default, skip_serializing_if = "MatchPolicy::is_empty")]
    pub roles: MatchPolicy,

    #[serde(default, skip_serializing_if = "MatchPolicy::is_empty")]
    pub headers: MatchPolicy,
}

impl Rule {
    /// Create a rule with the given patterns and no constraints
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Rule {
            paths: paths.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Add a `roles.all` condition
    pub fn with_roles_all(mut self, label: impl Into<String>, condition: Condition) -> Self {
        self.roles
            .all
            .get_or_insert_with(ConditionSet::new)
            .insert(label.into(), condition);
        self
    }

    /// Add a `roles.any` condition
    pub fn with_roles_any(mut self, label: impl Into<String>, condition: Condition) -> Self {
        self.roles
            .any
            .get_or_insert_with(ConditionSet::new)
            .insert(label.into(), condition);
        self
    }

    /// Add a `headers.all` condition on `key`
    pub fn with_headers_all(mut self, key: impl Into<String>, condition: Condition) -> Self {
        self.headers
            .all
            .get_or_insert_with(ConditionSet::new)
            .insert(key.into(), condition);
        self
    }

    /// Add a `headers.any` condition on `key`
    pub fn with_headers_any(mut self, key: impl Into<String>, condition: Condition) -> Self {
        self.headers
            .any
            .get_or_insert_with(ConditionSet::new)
            .insert(key.into(), condition);
        self
    }

    /// Check if any of this rule's patterns selects the target
    pub fn applies_to(&self, target: &str, matcher: &dyn PathMatcher) -> bool {
        matcher.find(target, &self.paths)
    }
}

/// Build a single-mode condition, e.g. `condition("equals", ["admin"])`
pub fn condition<I, S>(mode: impl Into<String>, values: I) -> Condition
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut condition = Condition::new();
    condition.insert(mode.into(), values.into_iter().map(Into::into).collect());
    condition
}

/// Named rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet(BTreeMap<String, Rule>);

impl RuleSet {
    pub fn new() -> Self {
        RuleSet(BTreeMap::new())
    }

    /// Insert a rule, returning any rule previously stored under `name`
    pub fn insert(&mut self, name: impl Into<String>, rule: Rule) -> Option<Rule> {
        self.0.insert(name.into(), rule)
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.0.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    /// Lazily yield the rules whose patterns select `target`
    ///
    /// Patterns of rules past the point where the consumer stops are never
    /// evaluated.
    pub fn for_target<'a>(
        &'a self,
        target: &'a str,
        matcher: &'a dyn PathMatcher,
    ) -> impl Iterator<Item = (&'a str, &'a Rule)> + 'a {
        self.iter()
            .filter(move |(_, rule)| rule.applies_to(target, matcher))
    }
}

impl<S: Into<String>> FromIterator<(S, Rule)> for RuleSet {
    fn from_iter<I: IntoIterator<Item = (S, Rule)>>(iter: I) -> Self {
        RuleSet(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Complete authorization policy document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationPolicy {
    #[serde(default, skip_serializing_if = "RuleSet::is_empty")]
    pub allow_rules: RuleSet,

    #[serde(default, skip_serializing_if = "RuleSet::is_empty")]
    pub deny_rules: RuleSet,
}

impl AuthorizationPolicy {
    /// Create an empty policy (allows everything)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_allow_rule(mut self, name: impl Into<String>, rule: Rule) -> Self {
        self.allow_rules.insert(name, rule);
        self
    }

    pub fn with_deny_rule(mut self, name: impl Into<String>, rule: Rule) -> Self {
        self.deny_rules.insert(name, rule);
        self
    }

    /// Parse policy from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse policy from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml)
    }

    /// Serialize policy to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Report constructs that load fine but probably do not do what the
    /// author meant. Never rejects a policy.
    pub fn lint(&self, modes: &MatchModeRegistry) -> Vec<PolicyWarning> {
        let mut warnings = Vec::new();

        for (phase, rules) in [(Phase::Allow, &self.allow_rules), (Phase::Deny, &self.deny_rules)] {
            for (name, rule) in rules.iter() {
                let mut warn = |message: String| {
                    warnings.push(PolicyWarning {
                        phase,
                        rule: name.to_string(),
                        message,
                    })
                };

                if rule.paths.is_empty() {
                    warn("rule has no paths and is never selected".to_string());
                }

                if phase == Phase::Deny
                    && rule.headers.any.as_ref().map_or(false, |s| !s.is_empty())
                {
                    warn(
                        "headers.any in a deny rule validates the rule's roles.any entries \
                         (looked up by label), not its own conditions"
                            .to_string(),
                    );
                }

                let sets = [
                    ("roles.all", &rule.roles.all),
                    ("roles.any", &rule.roles.any),
                    ("headers.all", &rule.headers.all),
                    ("headers.any", &rule.headers.any),
                ];
                for (clause, set) in sets {
                    let Some(set) = set else { continue };
                    if set.is_empty() && clause.ends_with(".any") {
                        warn(format!("{} is present but empty and is ignored", clause));
                    }
                    for (label, condition) in set {
                        for (mode, values) in condition {
                            if !modes.has_mode(mode) {
                                warn(format!(
                                    "{}.({}) uses unregistered match mode '{}'",
                                    clause, label, mode
                                ));
                            }
                            if values.is_empty() {
                                warn(format!(
                                    "{}.({}) mode '{}' lists no values and always holds",
                                    clause, label, mode
                                ));
                            }
                        }
                    }
                }
            }
        }

        warnings
    }
}

/// A non-fatal finding from [`AuthorizationPolicy::lint`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyWarning {
    pub phase: Phase,
    pub rule: String,
    pub message: String,
}

impl fmt::Display for PolicyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.({}): {}", self.phase, self.rule, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::iam::GlobMatcher;

    #[test]
    fn test_parse_minimal_rule() {
        let policy = AuthorizationPolicy::from_json(
            r#"{"allow_rules": {"r1": {"paths": ["/a/*"]}}}"#,
        )
        .unwrap();

        let rule = policy.allow_rules.get("r1").unwrap();
        assert_eq!(rule.paths, vec!["/a/*".to_string()]);
        assert!(rule.roles.all.is_none());
        assert!(rule.headers.any.is_none());
        assert!(policy.deny_rules.is_empty());
    }

    #[test]
    fn test_parse_full_rule() {
        let policy = AuthorizationPolicy::from_json(
            r#"{
                "deny_rules": {
                    "d1": {
                        "paths": ["/admin/*"],
                        "roles": {"all": {"x": {"equals": ["banned"]}}},
                        "headers": {"any": {"x-env": {"startsWith": ["prod"], "endsWith": ["-1"]}}}
                    }
                }
            }"#,
        )
        .unwrap();

        let rule = policy.deny_rules.get("d1").unwrap();
        let roles_all = rule.roles.all.as_ref().unwrap();
        assert_eq!(roles_all["x"]["equals"], vec!["banned".to_string()]);
        let headers_any = rule.headers.any.as_ref().unwrap();
        assert_eq!(headers_any["x-env"].len(), 2);
    }

    #[test]
    fn test_parse_empty_document() {
        let policy = AuthorizationPolicy::from_json("{}").unwrap();
        assert!(policy.allow_rules.is_empty());
        assert!(policy.deny_rules.is_empty());
    }

    #[test]
    fn test_parse_toml() {
        let policy = AuthorizationPolicy::from_toml(
            r#"
            [allow_rules.orders]
            paths = ["/api.v1.order.*"]

            [allow_rules.orders.roles.any.viewer]
            equals = ["View Orders"]
            "#,
        )
        .unwrap();

        let rule = policy.allow_rules.get("orders").unwrap();
        let any = rule.roles.any.as_ref().unwrap();
        assert_eq!(any["viewer"]["equals"], vec!["View Orders".to_string()]);
    }

    #[test]
    fn test_json_serialization_skips_absent_sets() {
        let policy = AuthorizationPolicy::new().with_allow_rule(
            "r1",
            Rule::new(["/a/*"]).with_roles_all("x", condition("equals", ["admin"])),
        );

        let json = policy.to_json().unwrap();
        assert!(!json.contains("deny_rules"));
        assert!(!json.contains("headers"));
        assert!(!json.contains("\"any\""));
        assert_eq!(AuthorizationPolicy::from_json(&json).unwrap(), policy);
    }

    #[test]
    fn test_for_target_filters_rules() {
        let rules: RuleSet = [
            ("admin", Rule::new(["/admin/*"])),
            ("orders", Rule::new(["/api.*.order.*", "/orders"])),
            ("nothing", Rule::new(Vec::<String>::new())),
        ]
        .into_iter()
        .collect();

        let selected: Vec<&str> = rules
            .for_target("/orders", &GlobMatcher)
            .map(|(name, _)| name)
            .collect();
        assert_eq!(selected, vec!["orders"]);

        let selected: Vec<&str> = rules
            .for_target("/admin/users", &GlobMatcher)
            .map(|(name, _)| name)
            .collect();
        assert_eq!(selected, vec!["admin"]);

        assert_eq!(rules.for_target("", &GlobMatcher).count(), 0);
    }

    #[test]
    fn test_for_target_is_lazy() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct CountingMatcher(AtomicUsize);
        impl PathMatcher for CountingMatcher {
            fn matches(&self, _target: &str, _pattern: &str) -> bool {
                self.0.fetch_add(1, Ordering::SeqCst);
                true
            }
        }

        let rules: RuleSet = (0..10)
            .map(|i| (format!("rule-{}", i), Rule::new(["*"])))
            .collect();
        let matcher = CountingMatcher(AtomicUsize::new(0));

        let first = rules.for_target("/x", &matcher).next();
        assert!(first.is_some());
        assert_eq!(matcher.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_lint_findings() {
        let policy = AuthorizationPolicy::from_json(
            r#"{
                "allow_rules": {
                    "no-paths": {},
                    "odd-mode": {"paths": ["*"], "roles": {"all": {"x": {"regex": ["a.*"]}}}},
                    "empty-values": {"paths": ["*"], "headers": {"all": {"x-id": {"equals": []}}}}
                },
                "deny_rules": {
                    "quirk": {"paths": ["*"], "headers": {"any": {"x-id": {"equals": ["1"]}}}}
                }
            }"#,
        )
        .unwrap();

        let warnings = policy.lint(&MatchModeRegistry::default());
        let rendered: Vec<String> = warnings.iter().map(ToString::to_string).collect();

        assert!(rendered
            .iter()
            .any(|w| w.starts_with("allow_rules.(no-paths)") && w.contains("never selected")));
        assert!(rendered
            .iter()
            .any(|w| w.starts_with("allow_rules.(odd-mode)") && w.contains("'regex'")));
        assert!(rendered
            .iter()
            .any(|w| w.starts_with("allow_rules.(empty-values)") && w.contains("always holds")));
        assert!(rendered
            .iter()
            .any(|w| w.starts_with("deny_rules.(quirk)") && w.contains("roles.any")));
    }

    #[test]
    fn test_lint_clean_policy() {
        let policy = AuthorizationPolicy::new().with_allow_rule(
            "r1",
            Rule::new(["/a/*"]).with_roles_all("x", condition("equals", ["admin"])),
        );
        assert!(policy.lint(&MatchModeRegistry::default()).is_empty());
    }
}
