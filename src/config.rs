use serde::{Deserialize, Serialize};

use crate::core::{Result, StoreError};

/// What the object store hands to its persister after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitPolicy {
    /// Persist only the touched record when its slot is reused in place,
    /// the whole container otherwise.
    #[default]
    Refined,
    /// Persist the whole container on every mutation.
    WholeContainer,
}

/// Object store configuration
///
/// ```
/// use memrepo::{CommitPolicy, StoreConfig};
///
/// let config = StoreConfig::new()
///     .commit_policy(CommitPolicy::WholeContainer)
///     .default_page_size(50);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Commit granularity for put/put_all
    pub commit_policy: CommitPolicy,

    /// Page size used when a page is requested without a pageable argument
    pub default_page_size: usize,

    /// Whether a successful transaction stores the container root
    pub transaction_commit: bool,
}

impl StoreConfig {
    pub fn new() -> Self {
        Self {
            commit_policy: CommitPolicy::Refined,
            default_page_size: 20,
            transaction_commit: true,
        }
    }

    /// Set the commit policy
    pub fn commit_policy(mut self, policy: CommitPolicy) -> Self {
        self.commit_policy = policy;
        self
    }

    /// Set the default page size
    pub fn default_page_size(mut self, size: usize) -> Self {
        self.default_page_size = size;
        self
    }

    /// Enable or disable the root commit after a transaction
    pub fn transaction_commit(mut self, enabled: bool) -> Self {
        self.transaction_commit = enabled;
        self
    }

    /// Parse from a JSON document, missing keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate().map_err(StoreError::Config)?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.default_page_size == 0 {
            return Err("default_page_size must be > 0".to_string());
        }

        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new()
    }
}
