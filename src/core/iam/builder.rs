//! Builder for [`PolicyEngine`]

use super::condition::{MatchMode, MatchModeRegistry};
use super::engine::PolicyEngine;
use super::pattern::{GlobMatcher, PathMatcher};
use super::store::{FilePolicyStore, PolicyStore};
use crate::core::config::EngineConfig;
use crate::error::{GateError, Result};

/// Assembles an engine from a store, match modes and a path matcher
///
/// # Examples
///
/// ```
/// use policy_gate::{AuthorizationPolicy, PolicyEngine, StaticPolicyStore};
///
/// let engine = PolicyEngine::builder()
///     .roles_key("x-roles")
///     .store(StaticPolicyStore::new(AuthorizationPolicy::new()))
///     .match_mode("equalsIgnoreCase", |a: &str, r: &str| a.eq_ignore_ascii_case(r))
///     .build()
///     .unwrap();
///
/// assert_eq!(engine.roles_key(), "x-roles");
/// ```
pub struct EngineBuilder {
    roles_key: String,
    store: Option<Box<dyn PolicyStore>>,
    modes: MatchModeRegistry,
    matcher: Box<dyn PathMatcher>,
}

impl EngineBuilder {
    /// Start from the defaults: roles key `roles`, built-in match modes, glob
    /// matcher, no store
    pub fn new() -> Self {
        EngineBuilder {
            roles_key: EngineConfig::DEFAULT_ROLES_KEY.to_string(),
            store: None,
            modes: MatchModeRegistry::with_defaults(),
            matcher: Box::new(GlobMatcher),
        }
    }

    /// Apply a validated configuration
    ///
    /// When the configuration names a policy file, a [`FilePolicyStore`] for
    /// it becomes the store.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        config.check()?;

        let mut builder = Self::new().roles_key(config.roles_key.clone());
        if let Some(path) = &config.policy_path {
            builder = builder.store(FilePolicyStore::new(path.clone()));
        }
        Ok(builder)
    }

    pub fn roles_key(mut self, key: impl Into<String>) -> Self {
        self.roles_key = key.into();
        self
    }

    pub fn store(mut self, store: impl PolicyStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    /// Replace the whole match-mode registry
    pub fn match_modes(mut self, modes: MatchModeRegistry) -> Self {
        self.modes = modes;
        self
    }

    /// Register or override a single match mode
    pub fn match_mode(mut self, name: impl Into<String>, mode: impl MatchMode + 'static) -> Self {
        self.modes.register(name, mode);
        self
    }

    pub fn path_matcher(mut self, matcher: impl PathMatcher + 'static) -> Self {
        self.matcher = Box::new(matcher);
        self
    }

    pub fn build(self) -> Result<PolicyEngine> {
        if self.roles_key.is_empty() {
            return Err(GateError::InvalidConfig(
                "roles key cannot be empty".to_string(),
            ));
        }
        let store = self
            .store
            .ok_or_else(|| GateError::InvalidConfig("no policy store configured".to_string()))?;

        Ok(PolicyEngine::from_parts(
            self.roles_key,
            store,
            self.modes,
            self.matcher,
        ))
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
