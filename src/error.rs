//! Error types for service construction.

use crate::service::options::OptionKey;
use thiserror::Error;

/// Errors that can occur while resolving options or constructing a service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Missing required arguments: {}", join_keys(.keys))]
    MissingRequiredOption { keys: Vec<OptionKey> },

    #[error("unknown service: {name}")]
    UnknownService { name: String },

    #[error("credentials unavailable: {0}")]
    Credentials(String),
}

impl ServiceError {
    #[must_use]
    pub fn missing(mut keys: Vec<OptionKey>) -> Self {
        keys.sort();
        Self::MissingRequiredOption { keys }
    }

    #[must_use]
    pub fn unknown_service(name: impl Into<String>) -> Self {
        Self::UnknownService { name: name.into() }
    }

    #[must_use]
    pub fn credentials(msg: impl Into<String>) -> Self {
        Self::Credentials(msg.into())
    }

    /// True for errors caused by the arguments the caller passed in.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::MissingRequiredOption { .. } | Self::UnknownService { .. }
        )
    }
}

fn join_keys(keys: &[OptionKey]) -> String {
    keys.iter()
        .map(OptionKey::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, ServiceError>;
