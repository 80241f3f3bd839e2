//! License gate for plan execution
//!
//! The plan executor only needs a yes/no answer plus a human-readable reason;
//! how a key is actually verified stays behind [`Authorizer`].

use super::config::LicenseConfig;
use serde::{Deserialize, Serialize};

/// Outcome of an authorization check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Authorization {
    /// The credential is valid
    Granted,
    /// The credential is missing or invalid
    Denied {
        /// Why the credential was refused.
        reason: String,
    },
}

impl Authorization {
    /// Returns true if access was granted
    #[must_use]
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Decides whether a caller-supplied credential is valid
pub trait Authorizer: Send + Sync {
    /// Checks the credential
    fn authorize(&self, credential: Option<&str>) -> Authorization;
}

/// Accepts any non-empty key, or only listed keys when a list is configured
#[derive(Debug, Clone, Default)]
pub struct KeyAuthorizer {
    accepted_keys: Vec<String>,
}

impl KeyAuthorizer {
    /// Creates an authorizer accepting any non-empty key
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an authorizer from configuration
    #[must_use]
    pub fn from_config(config: &LicenseConfig) -> Self {
        Self {
            accepted_keys: config.accepted_keys.clone(),
        }
    }

    /// Restricts accepted keys
    #[must_use]
    pub fn with_accepted_key(mut self, key: impl Into<String>) -> Self {
        self.accepted_keys.push(key.into());
        self
    }
}

impl Authorizer for KeyAuthorizer {
    fn authorize(&self, credential: Option<&str>) -> Authorization {
        let Some(key) = credential.map(str::trim).filter(|k| !k.is_empty()) else {
            return Authorization::Denied {
                reason: "No license key provided".to_string(),
            };
        };

        if self.accepted_keys.is_empty() || self.accepted_keys.iter().any(|k| k == key) {
            Authorization::Granted
        } else {
            Authorization::Denied {
                reason: "License key is not valid".to_string(),
            }
        }
    }
}

/// Grants every request, for callers that do not license execution
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysGranted;

impl Authorizer for AlwaysGranted {
    fn authorize(&self, _credential: Option<&str>) -> Authorization {
        Authorization::Granted
    }
}
