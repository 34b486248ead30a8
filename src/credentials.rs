//! Default credentials
//!
//! Process-wide credential values used to fill in options a caller did not
//! supply. Credentials are read as a whole snapshot each time a service is
//! resolved; the resolver never writes to them.
//!
//! [`FileCredentials`] reads the YAML format of `~/.fog`:
//!
//! ```yaml
//! :default:
//!   :generic_api_key: abc123
//!   :generic_user: bob
//! staging:
//!   generic_api_key: def456
//! ```

use crate::error::{Result, ServiceError};
use crate::service::options::{OptionKey, OptionMap};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Name of the credential group used when none is selected
pub const DEFAULT_GROUP: &str = "default";

/// Environment variable overriding the credentials file location
pub const CREDENTIALS_PATH_ENV: &str = "FOG_RC";

/// Environment variable selecting the credential group
pub const CREDENTIAL_GROUP_ENV: &str = "FOG_CREDENTIAL";

/// Snapshot of default credential values
pub type Credentials = OptionMap;

/// Source of default credentials
pub trait CredentialProvider: Send + Sync {
    /// Return the complete current credential set
    fn current_credentials(&self) -> Result<Credentials>;
}

/// In-memory credentials, replaceable at runtime
#[derive(Debug, Default)]
pub struct StaticCredentials {
    values: RwLock<Credentials>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole credential set
    pub fn replace(&self, credentials: Credentials) {
        match self.values.write() {
            Ok(mut values) => *values = credentials,
            Err(poisoned) => *poisoned.into_inner() = credentials,
        }
    }

    /// Set a single credential value
    pub fn set(&self, key: impl Into<OptionKey>, value: impl Into<Value>) {
        let (key, value) = (key.into(), value.into());
        match self.values.write() {
            Ok(mut values) => values.insert(key, value),
            Err(poisoned) => poisoned.into_inner().insert(key, value),
        };
    }
}

impl<K: Into<OptionKey>, V: Into<Value>> FromIterator<(K, V)> for StaticCredentials {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: RwLock::new(
                iter.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl CredentialProvider for StaticCredentials {
    fn current_credentials(&self) -> Result<Credentials> {
        self.values
            .read()
            .map(|values| values.clone())
            .map_err(|_| ServiceError::credentials("credential store lock poisoned"))
    }
}

/// Credentials read from a YAML file with named groups
#[derive(Debug, Clone)]
pub struct FileCredentials {
    path: PathBuf,
    group: String,
}

impl FileCredentials {
    pub fn new(path: impl Into<PathBuf>, group: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            group: group.into(),
        }
    }

    /// Use the file and group selected by the environment
    pub fn from_env() -> Self {
        Self::new(default_credentials_path(), default_group())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn group(&self) -> &str {
        &self.group
    }
}

impl CredentialProvider for FileCredentials {
    fn current_credentials(&self) -> Result<Credentials> {
        if !self.path.exists() {
            tracing::debug!("No credentials file at {:?}", self.path);
            return Ok(Credentials::new());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            ServiceError::credentials(format!("failed to read {:?}: {}", self.path, e))
        })?;

        parse_credentials(&content, &self.group)
    }
}

/// Parse a credentials document and extract one group
///
/// Group names and option keys may use symbol-style spelling (`:default`).
pub fn parse_credentials(content: &str, group: &str) -> Result<Credentials> {
    if content.trim().is_empty() {
        return Ok(Credentials::new());
    }

    let document: serde_yaml::Value = serde_yaml::from_str(content)
        .map_err(|e| ServiceError::credentials(format!("invalid credentials YAML: {}", e)))?;

    let Some(groups) = document.as_mapping() else {
        return Err(ServiceError::credentials(
            "credentials file must be a mapping of group names",
        ));
    };

    let wanted = OptionKey::from(group);
    let selected = groups.iter().find_map(|(name, values)| {
        let name = name.as_str().map(OptionKey::from)?;
        (name == wanted).then_some(values)
    });

    let Some(values) = selected else {
        tracing::debug!("Credential group '{}' not found", wanted);
        return Ok(Credentials::new());
    };

    let Some(values) = values.as_mapping() else {
        return Err(ServiceError::credentials(format!(
            "credential group '{}' must be a mapping",
            wanted
        )));
    };

    let mut credentials = Credentials::new();
    for (key, value) in values {
        let Some(key) = key.as_str() else {
            tracing::warn!("Skipping non-string credential key in group '{}'", wanted);
            continue;
        };
        let value = serde_json::to_value(value).map_err(|e| {
            ServiceError::credentials(format!("unsupported value for '{}': {}", key, e))
        })?;
        credentials.insert(OptionKey::from(key), value);
    }

    Ok(credentials)
}

/// Credentials file location (`FOG_RC`, then `~/.fog`)
pub fn default_credentials_path() -> PathBuf {
    if let Ok(path) = std::env::var(CREDENTIALS_PATH_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".fog");
    }
    PathBuf::from(".fog")
}

/// Selected credential group (`FOG_CREDENTIAL`, then `default`)
pub fn default_group() -> String {
    match std::env::var(CREDENTIAL_GROUP_ENV) {
        Ok(group) if !group.trim().is_empty() => group.trim().to_string(),
        _ => DEFAULT_GROUP.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FOG_FILE: &str = r#"
:default:
  :generic_api_key: abc123
  :generic_user: bob
  :port: 8443
staging:
  generic_api_key: def456
  connection_options:
    headers:
      User-Agent: tfog
"#;

    #[test]
    fn test_parse_symbol_style_group() {
        let credentials = parse_credentials(FOG_FILE, "default").unwrap();
        assert_eq!(credentials.len(), 3);
        assert_eq!(credentials["generic_api_key"], json!("abc123"));
        assert_eq!(credentials["port"], json!(8443));
    }

    #[test]
    fn test_parse_plain_group_with_nested_values() {
        let credentials = parse_credentials(FOG_FILE, ":staging").unwrap();
        assert_eq!(credentials["generic_api_key"], json!("def456"));
        assert_eq!(
            credentials["connection_options"],
            json!({"headers": {"User-Agent": "tfog"}})
        );
    }

    #[test]
    fn test_missing_group_is_empty() {
        assert!(parse_credentials(FOG_FILE, "production").unwrap().is_empty());
        assert!(parse_credentials("", "default").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_documents_fail() {
        assert!(parse_credentials("- just\n- a list\n", "default").is_err());
        assert!(parse_credentials("default: 5\n", "default").is_err());
        assert!(parse_credentials("default: [unclosed\n", "default").is_err());
    }

    #[test]
    fn test_static_credentials_snapshot() {
        let store: StaticCredentials = [("generic_user", "fog")].into_iter().collect();
        let before = store.current_credentials().unwrap();
        store.set("generic_api_key", "abc");
        assert_eq!(before.len(), 1);
        assert_eq!(store.current_credentials().unwrap().len(), 2);

        store.replace(Credentials::new());
        assert!(store.current_credentials().unwrap().is_empty());
    }

    #[test]
    fn test_file_credentials_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileCredentials::new(dir.path().join("absent.yml"), DEFAULT_GROUP);
        assert!(provider.current_credentials().unwrap().is_empty());
    }

    #[test]
    fn test_file_credentials_reads_group() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fog.yml");
        std::fs::write(&path, FOG_FILE).unwrap();

        let provider = FileCredentials::new(&path, "staging");
        assert_eq!(provider.group(), "staging");
        let credentials = provider.current_credentials().unwrap();
        assert_eq!(credentials["generic_api_key"], json!("def456"));
    }
}
