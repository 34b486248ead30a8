//! Option keys and option maps
//!
//! Raw options arrive from callers with string keys and loosely typed values.
//! Resolved options are keyed by normalized [`OptionKey`]s and never contain
//! null values.

use super::schema::OptionSchema;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Placeholder printed instead of secret option values
pub const REDACTED: &str = "[REDACTED]";

/// Normalized option key
///
/// Plain strings and symbol-style spellings (`":api_key"`) normalize to
/// the same key, so `OptionKey::from(":api_key") == OptionKey::from("api_key")`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OptionKey(String);

impl OptionKey {
    /// Normalize a raw key
    pub fn new(raw: &str) -> Self {
        Self(raw.strip_prefix(':').unwrap_or(raw).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OptionKey {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for OptionKey {
    fn from(raw: String) -> Self {
        match raw.strip_prefix(':') {
            Some(stripped) => Self(stripped.to_string()),
            None => Self(raw),
        }
    }
}

impl From<&String> for OptionKey {
    fn from(raw: &String) -> Self {
        Self::new(raw)
    }
}

impl Borrow<str> for OptionKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for OptionKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Symbol-keyed option map
pub type OptionMap = BTreeMap<OptionKey, Value>;

/// An object that can carry a complete service configuration by itself
///
/// When [`ConfigObject::config_service`] returns true the resolver hands the
/// object to the service untouched: no global credentials are read, nothing
/// is coerced, warned about or validated.
pub trait ConfigObject: fmt::Debug + Send + Sync {
    /// Whether this object configures the service on its own
    fn config_service(&self) -> bool;

    /// Look up a single setting
    fn option(&self, _key: &str) -> Option<Value> {
        None
    }

    /// Settings to resolve normally when the object does not configure the
    /// service itself
    fn settings(&self) -> Vec<(String, Value)> {
        Vec::new()
    }
}

/// Options as supplied by the caller
#[derive(Debug, Clone)]
pub enum RawOptions {
    /// Key/value pairs in insertion order; a later pair wins over an earlier
    /// one that normalizes to the same key
    Map(Vec<(String, Value)>),
    /// An opaque configuration object
    Config(Arc<dyn ConfigObject>),
}

impl Default for RawOptions {
    fn default() -> Self {
        Self::Map(Vec::new())
    }
}

impl RawOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a configuration object
    pub fn config(object: Arc<dyn ConfigObject>) -> Self {
        Self::Config(object)
    }

    /// Add an option
    ///
    /// Config objects carry their own settings, so options added to one are
    /// dropped with a warning.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(key.into(), value.into());
        self
    }

    /// Add an explicit null, suppressing any global value for `key`
    pub fn with_null(mut self, key: impl Into<String>) -> Self {
        self.push(key.into(), Value::Null);
        self
    }

    fn push(&mut self, key: String, value: Value) {
        match self {
            Self::Map(pairs) => pairs.push((key, value)),
            Self::Config(_) => {
                tracing::warn!("Ignoring option '{}' added to a config object", key);
            }
        }
    }

    /// True when no options were given at all
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Map(pairs) => pairs.is_empty(),
            Self::Config(_) => false,
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for RawOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::Map(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<Map<String, Value>> for RawOptions {
    fn from(map: Map<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

/// Options after resolution
#[derive(Debug, Clone)]
pub enum ResolvedOptions {
    Map(OptionMap),
    Config(Arc<dyn ConfigObject>),
}

impl ResolvedOptions {
    /// Get a resolved value (always `None` for config objects)
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map()?.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn as_map(&self) -> Option<&OptionMap> {
        match self {
            Self::Map(map) => Some(map),
            Self::Config(_) => None,
        }
    }

    pub fn as_config(&self) -> Option<&Arc<dyn ConfigObject>> {
        match self {
            Self::Map(_) => None,
            Self::Config(object) => Some(object),
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Resolved keys in sorted order
    pub fn keys(&self) -> Vec<&OptionKey> {
        self.as_map()
            .map(|map| map.keys().collect())
            .unwrap_or_default()
    }

    /// JSON rendering with the schema's secret values masked
    pub fn redacted(&self, schema: &OptionSchema) -> Value {
        match self {
            Self::Map(map) => Value::Object(
                map.iter()
                    .map(|(key, value)| {
                        let value = if schema.is_secret(key.as_str()) {
                            Value::String(REDACTED.to_string())
                        } else {
                            value.clone()
                        };
                        (key.to_string(), value)
                    })
                    .collect(),
            ),
            Self::Config(object) => Value::String(format!("{:?}", object)),
        }
    }

    /// JSON rendering including secret values
    pub fn to_json(&self) -> Value {
        match self {
            Self::Map(map) => Value::Object(
                map.iter()
                    .map(|(key, value)| (key.to_string(), value.clone()))
                    .collect(),
            ),
            Self::Config(object) => Value::String(format!("{:?}", object)),
        }
    }
}

impl PartialEq for ResolvedOptions {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Map(a), Self::Map(b)) => a == b,
            // Config objects compare by identity
            (Self::Config(a), Self::Config(b)) => {
                Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
            }
            _ => false,
        }
    }
}

impl PartialEq<OptionMap> for ResolvedOptions {
    fn eq(&self, other: &OptionMap) -> bool {
        self.as_map() == Some(other)
    }
}
