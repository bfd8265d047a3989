//! Policy sources
//!
//! The engine asks its store for the policy on every evaluation and never
//! caches the result itself. Stores decide how fresh that policy is.

use super::policy::AuthorizationPolicy;
use crate::error::StoreError;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Supplies the authorization policy for each evaluation
pub trait PolicyStore: Send + Sync {
    fn authorization_policy(&self) -> Result<Arc<AuthorizationPolicy>, StoreError>;
}

impl<S: PolicyStore + ?Sized> PolicyStore for Arc<S> {
    fn authorization_policy(&self) -> Result<Arc<AuthorizationPolicy>, StoreError> {
        (**self).authorization_policy()
    }
}

/// Closures work as ad-hoc stores
impl<F> PolicyStore for F
where
    F: Fn() -> Result<Arc<AuthorizationPolicy>, StoreError> + Send + Sync,
{
    fn authorization_policy(&self) -> Result<Arc<AuthorizationPolicy>, StoreError> {
        self()
    }
}

/// In-memory store whose policy can be swapped atomically
///
/// Evaluations already holding the previous policy finish against it.
#[derive(Debug, Default)]
pub struct StaticPolicyStore {
    policy: RwLock<Arc<AuthorizationPolicy>>,
}

impl StaticPolicyStore {
    pub fn new(policy: AuthorizationPolicy) -> Self {
        StaticPolicyStore {
            policy: RwLock::new(Arc::new(policy)),
        }
    }

    /// Install a new policy, returning the previous one
    pub fn replace(&self, policy: AuthorizationPolicy) -> Arc<AuthorizationPolicy> {
        std::mem::replace(&mut *self.policy.write(), Arc::new(policy))
    }

    pub fn current(&self) -> Arc<AuthorizationPolicy> {
        self.policy.read().clone()
    }
}

impl PolicyStore for StaticPolicyStore {
    fn authorization_policy(&self) -> Result<Arc<AuthorizationPolicy>, StoreError> {
        Ok(self.current())
    }
}

/// Serialized form of a policy document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyFormat {
    Json,
    Toml,
}

impl PolicyFormat {
    /// Pick a format from the file extension, defaulting to JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => PolicyFormat::Toml,
            _ => PolicyFormat::Json,
        }
    }

    pub fn parse(&self, source: &str) -> Result<AuthorizationPolicy, StoreError> {
        match self {
            PolicyFormat::Json => Ok(AuthorizationPolicy::from_json(source)?),
            PolicyFormat::Toml => Ok(AuthorizationPolicy::from_toml(source)?),
        }
    }
}

/// Store that re-reads a policy file on every call
#[derive(Debug, Clone)]
pub struct FilePolicyStore {
    path: PathBuf,
    format: PolicyFormat,
}

impl FilePolicyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = PolicyFormat::from_path(&path);
        FilePolicyStore { path, format }
    }

    pub fn with_format(mut self, format: PolicyFormat) -> Self {
        self.format = format;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the file once
    pub fn load(&self) -> Result<AuthorizationPolicy, StoreError> {
        let source = std::fs::read_to_string(&self.path)?;
        let policy = self.format.parse(&source)?;
        debug!(
            "Loaded policy from {:?}: {} allow rules, {} deny rules",
            self.path,
            policy.allow_rules.len(),
            policy.deny_rules.len()
        );
        Ok(policy)
    }
}

impl PolicyStore for FilePolicyStore {
    fn authorization_policy(&self) -> Result<Arc<AuthorizationPolicy>, StoreError> {
        self.load().map(Arc::new)
    }
}
