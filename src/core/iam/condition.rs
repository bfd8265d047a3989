//! Condition evaluation for authorization rules
//!
//! A condition maps match-mode names to required values. It holds when every
//! required value is satisfied by at least one actual attribute value.
//!
//! Built-in match modes:
//! - `equals` - exact string equality
//! - `startsWith` - actual value has the required prefix
//! - `endsWith` - actual value has the required suffix
//! - `contains` - actual value contains the required substring

use super::policy::Condition;
use crate::error::{GateError, Result};
use std::collections::BTreeMap;
use std::fmt;

/// A named binary string comparison
pub trait MatchMode: Send + Sync {
    /// Compare one actual attribute value with one required value
    fn matches(&self, actual: &str, required: &str) -> bool;
}

impl<F> MatchMode for F
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    fn matches(&self, actual: &str, required: &str) -> bool {
        self(actual, required)
    }
}

/// `equals`: exact, case-sensitive equality
pub fn equals(actual: &str, required: &str) -> bool {
    actual == required
}

/// `startsWith`: the actual value begins with the required prefix
pub fn starts_with(actual: &str, required: &str) -> bool {
    actual.starts_with(required)
}

/// `endsWith`: the actual value ends with the required suffix
pub fn ends_with(actual: &str, required: &str) -> bool {
    actual.ends_with(required)
}

/// `contains`: the required value occurs anywhere in the actual value
pub fn contains(actual: &str, required: &str) -> bool {
    actual.contains(required)
}

/// Registry of match modes keyed by name
pub struct MatchModeRegistry {
    modes: BTreeMap<String, Box<dyn MatchMode>>,
}

impl MatchModeRegistry {
    /// Create a registry with no match modes
    pub fn empty() -> Self {
        MatchModeRegistry {
            modes: BTreeMap::new(),
        }
    }

    /// Create a registry seeded with the built-in modes
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register("equals", equals);
        registry.register("startsWith", starts_with);
        registry.register("endsWith", ends_with);
        registry.register("contains", contains);
        registry
    }

    /// Register a match mode, returning the one it replaced
    pub fn register(
        &mut self,
        name: impl Into<String>,
        mode: impl MatchMode + 'static,
    ) -> Option<Box<dyn MatchMode>> {
        self.modes.insert(name.into(), Box::new(mode))
    }

    pub fn unregister(&mut self, name: &str) -> Option<Box<dyn MatchMode>> {
        self.modes.remove(name)
    }

    pub fn has_mode(&self, name: &str) -> bool {
        self.modes.contains_key(name)
    }

    pub fn list_modes(&self) -> Vec<String> {
        self.modes.keys().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.modes.len()
    }

    /// Check a condition against the actual values of one attribute
    ///
    /// Fails fast on the first required value no actual value satisfies. An
    /// empty condition holds. A mode with no registered function is an error
    /// as soon as the condition reaches it, even if its value list is empty.
    pub fn validate(&self, actual: &[String], condition: &Condition) -> Result<bool> {
        for (name, required_values) in condition {
            let mode = self
                .modes
                .get(name)
                .ok_or_else(|| GateError::UnknownMatchMode { mode: name.clone() })?;

            for required in required_values {
                if !actual.iter().any(|value| mode.matches(value, required)) {
                    return Ok(false);
                }
            }
        }

        Ok(true)
    }
}

impl Default for MatchModeRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for MatchModeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchModeRegistry")
            .field("modes", &self.modes.keys().collect::<Vec<_>>())
            .finish()
    }
}
