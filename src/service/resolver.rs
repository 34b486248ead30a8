//! Option Resolver
//!
//! Merges caller options with the default credentials and checks the result
//! against a service's schema.

use super::coerce::coerce;
use super::options::{OptionKey, OptionMap, RawOptions, ResolvedOptions};
use super::schema::OptionSchema;
use crate::credentials::{CredentialProvider, Credentials};
use crate::error::{Result, ServiceError};
use crate::warning::{self, WarningSink};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Prefix of the warning emitted for undeclared options
pub const UNRECOGNIZED_PREFIX: &str = "Unrecognized arguments: ";

/// Which default credentials take part in the merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialScope {
    /// Every default credential
    #[default]
    All,
    /// Only credentials the service schema declares
    Declared,
}

impl CredentialScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Declared => "declared",
        }
    }
}

/// Resolves raw caller options into validated, coerced options
pub struct OptionResolver<'a> {
    credentials: &'a dyn CredentialProvider,
    warnings: &'a dyn WarningSink,
    scope: CredentialScope,
}

impl<'a> OptionResolver<'a> {
    pub fn new(credentials: &'a dyn CredentialProvider, warnings: &'a dyn WarningSink) -> Self {
        Self {
            credentials,
            warnings,
            scope: CredentialScope::default(),
        }
    }

    pub fn with_scope(mut self, scope: CredentialScope) -> Self {
        self.scope = scope;
        self
    }

    /// Resolve `raw` against `schema`
    ///
    /// A config object that configures the service itself is returned as is.
    /// Otherwise caller options override default credentials, null options
    /// remove the key entirely, string values are coerced, undeclared keys
    /// produce one warning and missing required keys fail the resolution.
    pub fn resolve(&self, raw: &RawOptions, schema: &OptionSchema) -> Result<ResolvedOptions> {
        let settings;
        let pairs: &[(String, Value)] = match raw {
            RawOptions::Config(object) if object.config_service() => {
                tracing::debug!("Config object configures the service itself");
                return Ok(ResolvedOptions::Config(object.clone()));
            }
            RawOptions::Config(object) => {
                settings = object.settings();
                &settings
            }
            RawOptions::Map(pairs) => pairs,
        };

        let mut supplied = OptionMap::new();
        let mut suppressed = BTreeSet::new();
        for (key, value) in pairs {
            let key = OptionKey::from(key.as_str());
            if value.is_null() {
                supplied.remove(&key);
                suppressed.insert(key);
            } else {
                suppressed.remove(&key);
                supplied.insert(key, value.clone());
            }
        }

        let mut merged = self.defaults(schema);
        merged.retain(|key, value| !value.is_null() && !suppressed.contains(key));
        tracing::debug!(
            "Using defaults for: {:?}",
            merged
                .keys()
                .filter(|key| !supplied.contains_key(*key))
                .collect::<Vec<_>>()
        );
        merged.extend(supplied);

        for value in merged.values_mut() {
            *value = coerce(std::mem::take(value));
        }

        let unrecognized = schema.unrecognized(&merged);
        if !unrecognized.is_empty() {
            warning::deliver(self.warnings, &unrecognized_message(&unrecognized));
        }

        let missing = schema.missing(&merged);
        if !missing.is_empty() {
            return Err(ServiceError::missing(missing));
        }

        Ok(ResolvedOptions::Map(merged))
    }

    /// Snapshot of the default credentials, filtered by scope
    fn defaults(&self, schema: &OptionSchema) -> Credentials {
        let mut credentials = match self.credentials.current_credentials() {
            Ok(credentials) => credentials,
            Err(e) => {
                tracing::error!("Failed to read default credentials: {}", e);
                Credentials::new()
            }
        };
        if self.scope == CredentialScope::Declared {
            credentials.retain(|key, _| schema.is_declared(key.as_str()));
        }
        credentials
    }
}

/// Format the warning for undeclared option keys
pub fn unrecognized_message(keys: &[&OptionKey]) -> String {
    let mut names: Vec<&str> = keys.iter().map(|key| key.as_str()).collect();
    names.sort_unstable();
    format!("{}{}", UNRECOGNIZED_PREFIX, names.join(", "))
}
