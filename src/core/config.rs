//! Engine configuration
//!
//! Loaded from TOML:
//!
//! ```toml
//! roles_key = "x-roles"
//! policy_path = "/etc/policy-gate/policy.json"
//! ```

use crate::error::{GateError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

/// Engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Attribute key holding the caller's role claims
    #[serde(default = "default_roles_key")]
    #[validate(length(min = 1, message = "roles_key cannot be empty"))]
    pub roles_key: String,

    /// Policy file for a [`FilePolicyStore`](crate::FilePolicyStore)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_path: Option<PathBuf>,
}

fn default_roles_key() -> String {
    EngineConfig::DEFAULT_ROLES_KEY.to_string()
}

impl EngineConfig {
    pub const DEFAULT_ROLES_KEY: &'static str = "roles";

    /// Parse and validate a TOML configuration
    pub fn from_toml(source: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(source)
            .map_err(|e| GateError::InvalidConfig(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| GateError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&source)
    }

    /// Run field validation
    pub fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|e| GateError::InvalidConfig(e.to_string()))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            roles_key: default_roles_key(),
            policy_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_toml("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.roles_key, "roles");
        assert!(config.policy_path.is_none());
    }

    #[test]
    fn test_full_config() {
        let config = EngineConfig::from_toml(
            r#"
            roles_key = "x-roles"
            policy_path = "/etc/policy-gate/policy.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.roles_key, "x-roles");
        assert_eq!(
            config.policy_path.as_deref(),
            Some(Path::new("/etc/policy-gate/policy.json"))
        );
    }

    #[test]
    fn test_empty_roles_key_rejected() {
        let err = EngineConfig::from_toml(r#"roles_key = """#).unwrap_err();
        assert!(err.to_string().contains("roles_key"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(EngineConfig::from_toml("cache_size = 10").is_err());
    }
}
