//! Service Factory
//!
//! Resolves options for a service type and constructs either its real or its
//! mock implementation, depending on the mocking toggle.

use super::options::{RawOptions, ResolvedOptions};
use super::registry::ServiceRegistry;
use super::resolver::{CredentialScope, OptionResolver};
use super::schema::OptionSchema;
use crate::credentials::CredentialProvider;
use crate::error::{Result, ServiceError};
use crate::warning::{TracingWarningSink, WarningSink};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Environment variable that enables mocking when set to `true` or `1`
pub const MOCK_ENV: &str = "FOG_MOCK";

/// Which implementation of a service was constructed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Real,
    Mock,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Real => "real",
            Self::Mock => "mock",
        }
    }
}

/// Capability shared by real and mock service implementations
pub trait Service: fmt::Debug + Send + Sync {
    /// Options the service was constructed with
    fn options(&self) -> &ResolvedOptions;

    fn variant(&self) -> Variant;
}

/// A service implementation constructible from resolved options
pub trait Backend: Service + Sized {
    fn new(options: ResolvedOptions) -> Self;
}

/// A service type: a schema plus interchangeable real and mock implementations
pub trait ServiceType: 'static {
    /// Service name used for registry lookups and logging
    const NAME: &'static str;

    type Real: Backend + 'static;
    type Mock: Backend + 'static;

    /// Schema, built once per service type
    fn schema() -> &'static OptionSchema;
}

/// A constructed service of type `S`
pub enum ServiceInstance<S: ServiceType> {
    Real(S::Real),
    Mock(S::Mock),
}

impl<S: ServiceType> ServiceInstance<S> {
    pub fn options(&self) -> &ResolvedOptions {
        match self {
            Self::Real(service) => service.options(),
            Self::Mock(service) => service.options(),
        }
    }

    pub fn variant(&self) -> Variant {
        match self {
            Self::Real(_) => Variant::Real,
            Self::Mock(_) => Variant::Mock,
        }
    }

    pub fn is_mock(&self) -> bool {
        matches!(self, Self::Mock(_))
    }

    pub fn into_boxed(self) -> Box<dyn Service> {
        match self {
            Self::Real(service) => Box::new(service),
            Self::Mock(service) => Box::new(service),
        }
    }
}

impl<S: ServiceType> fmt::Debug for ServiceInstance<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Security: never print secret option values
        f.debug_struct(S::NAME)
            .field("variant", &self.variant())
            .field("options", &self.options().redacted(S::schema()))
            .finish()
    }
}

/// Source of the process-wide mocking flag
pub trait MockingSource: Send + Sync {
    fn is_mocking_enabled(&self) -> bool;
}

impl MockingSource for bool {
    fn is_mocking_enabled(&self) -> bool {
        *self
    }
}

/// Runtime-switchable mocking flag
#[derive(Debug, Default)]
pub struct MockingToggle {
    enabled: AtomicBool,
}

impl MockingToggle {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
        }
    }

    /// Initialize from `FOG_MOCK`
    pub fn from_env() -> Self {
        let enabled = std::env::var(MOCK_ENV)
            .map(|v| parse_flag(&v))
            .unwrap_or(false);
        Self::new(enabled)
    }

    /// Enable mocking
    pub fn mock(&self) {
        self.set(true);
    }

    /// Disable mocking
    pub fn unmock(&self) {
        self.set(false);
    }

    pub fn set(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        tracing::debug!("Mocking {}", if enabled { "enabled" } else { "disabled" });
    }
}

impl MockingSource for MockingToggle {
    fn is_mocking_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

/// Parse a boolean flag value (`true`/`1`, case-insensitive)
pub fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1")
}

/// Creates services from raw options
#[derive(Clone)]
pub struct ServiceFactory {
    credentials: Arc<dyn CredentialProvider>,
    mocking: Arc<dyn MockingSource>,
    warnings: Arc<dyn WarningSink>,
    scope: CredentialScope,
}

impl ServiceFactory {
    /// Create a factory that reports warnings through `tracing`
    pub fn new(credentials: Arc<dyn CredentialProvider>, mocking: Arc<dyn MockingSource>) -> Self {
        Self {
            credentials,
            mocking,
            warnings: Arc::new(TracingWarningSink),
            scope: CredentialScope::default(),
        }
    }

    pub fn with_warning_sink(mut self, warnings: Arc<dyn WarningSink>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn with_scope(mut self, scope: CredentialScope) -> Self {
        self.scope = scope;
        self
    }

    fn resolver(&self) -> OptionResolver<'_> {
        OptionResolver::new(self.credentials.as_ref(), self.warnings.as_ref())
            .with_scope(self.scope)
    }

    /// Resolve options against a schema without constructing anything
    pub fn resolve(&self, raw: &RawOptions, schema: &OptionSchema) -> Result<ResolvedOptions> {
        self.resolver().resolve(raw, schema)
    }

    /// Create a service of type `S`
    pub fn create<S: ServiceType>(&self, raw: RawOptions) -> Result<ServiceInstance<S>> {
        let options = self.resolve(&raw, S::schema())?;
        let variant = self.variant();
        tracing::debug!("Creating {} service ({})", S::NAME, variant.as_str());

        Ok(match variant {
            Variant::Real => ServiceInstance::Real(<S::Real as Backend>::new(options)),
            Variant::Mock => ServiceInstance::Mock(<S::Mock as Backend>::new(options)),
        })
    }

    /// Create a registered service by name
    pub fn create_named(
        &self,
        registry: &ServiceRegistry,
        name: &str,
        raw: RawOptions,
    ) -> Result<Box<dyn Service>> {
        let definition = registry
            .get(name)
            .ok_or_else(|| ServiceError::unknown_service(name))?;

        let options = self.resolve(&raw, definition.schema())?;
        let variant = self.variant();
        tracing::debug!("Creating {} service ({})", definition.name(), variant.as_str());

        Ok(definition.construct(options, variant))
    }

    /// Single read of the mocking flag for one construction
    fn variant(&self) -> Variant {
        if self.mocking.is_mocking_enabled() {
            Variant::Mock
        } else {
            Variant::Real
        }
    }
}
