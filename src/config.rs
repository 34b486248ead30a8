//! Configuration Management
//!
//! Persistent configuration for tfog plus environment overrides.

use crate::credentials::{
    FileCredentials, CREDENTIALS_PATH_ENV, CREDENTIAL_GROUP_ENV, DEFAULT_GROUP,
};
use crate::service::factory::{parse_flag, MockingToggle, MOCK_ENV};
use crate::service::resolver::CredentialScope;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Credentials file location
    #[serde(default)]
    pub credentials_path: Option<PathBuf>,
    /// Credential group within the credentials file
    #[serde(default)]
    pub credential: Option<String>,
    /// Construct mock services instead of real ones
    #[serde(default)]
    pub mock: Option<bool>,
    /// Which default credentials take part in option merging
    #[serde(default)]
    pub credential_scope: Option<CredentialScope>,
}

/// Settings after applying environment overrides and defaults
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveSettings {
    pub credentials_path: PathBuf,
    pub credential: String,
    pub mock: bool,
    pub credential_scope: CredentialScope,
}

impl EffectiveSettings {
    pub fn credentials(&self) -> FileCredentials {
        FileCredentials::new(&self.credentials_path, &self.credential)
    }

    pub fn mocking(&self) -> MockingToggle {
        MockingToggle::new(self.mock)
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tfog").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from a specific file, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;

        Ok(())
    }

    /// Apply process environment overrides (env > config > default)
    pub fn effective(&self) -> EffectiveSettings {
        self.effective_with(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn effective_with<F>(&self, lookup: F) -> EffectiveSettings
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let credentials_path = env(CREDENTIALS_PATH_ENV)
            .map(PathBuf::from)
            .or_else(|| self.credentials_path.clone())
            .unwrap_or_else(crate::credentials::default_credentials_path);

        let credential = env(CREDENTIAL_GROUP_ENV)
            .map(|v| v.trim().to_string())
            .or_else(|| self.credential.clone())
            .unwrap_or_else(|| DEFAULT_GROUP.to_string());

        let mock = env(MOCK_ENV)
            .map(|v| parse_flag(&v))
            .or(self.mock)
            .unwrap_or(false);

        EffectiveSettings {
            credentials_path,
            credential,
            mock,
            credential_scope: self.credential_scope.unwrap_or_default(),
        }
    }

    /// Set credential group and save
    pub fn set_credential(&mut self, group: &str) -> Result<()> {
        self.credential = Some(group.to_string());
        self.save()
    }

    /// Set mocking default and save
    pub fn set_mock(&mut self, mock: bool) -> Result<()> {
        self.mock = Some(mock);
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_config_values_used_without_env() {
        let config = Config {
            credentials_path: Some(PathBuf::from("/etc/fog.yml")),
            credential: Some("staging".to_string()),
            mock: Some(true),
            credential_scope: Some(CredentialScope::Declared),
        };
        let settings = config.effective_with(lookup(&[]));
        assert_eq!(settings.credentials_path, PathBuf::from("/etc/fog.yml"));
        assert_eq!(settings.credential, "staging");
        assert!(settings.mock);
        assert_eq!(settings.credential_scope, CredentialScope::Declared);
    }

    #[test]
    fn test_env_overrides_config() {
        let config = Config {
            credentials_path: Some(PathBuf::from("/etc/fog.yml")),
            credential: Some("staging".to_string()),
            mock: Some(true),
            credential_scope: None,
        };
        let settings = config.effective_with(lookup(&[
            ("FOG_RC", "/tmp/fog.yml"),
            ("FOG_CREDENTIAL", " production "),
            ("FOG_MOCK", "false"),
        ]));
        assert_eq!(settings.credentials_path, PathBuf::from("/tmp/fog.yml"));
        assert_eq!(settings.credential, "production");
        assert!(!settings.mock);
        assert_eq!(settings.credential_scope, CredentialScope::All);
    }

    #[test]
    fn test_defaults() {
        let settings = Config::default().effective_with(lookup(&[("FOG_CREDENTIAL", "  ")]));
        assert_eq!(settings.credential, DEFAULT_GROUP);
        assert!(!settings.mock);
        assert_eq!(settings.credentials().group(), DEFAULT_GROUP);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            credential: Some("ci".to_string()),
            credential_scope: Some(CredentialScope::Declared),
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"declared\""));
        assert_eq!(Config::load_from(&path), config);
    }

    #[test]
    fn test_invalid_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
        assert_eq!(Config::load_from(&dir.path().join("absent.json")), Config::default());
    }
}
