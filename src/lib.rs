//! tfog - service construction resolver
//!
//! Validates and normalizes service options, merges them over process-wide
//! default credentials and constructs the real or mock implementation of a
//! service.

pub mod config;
pub mod credentials;
pub mod error;
pub mod service;
pub mod warning;

pub use credentials::{CredentialProvider, Credentials, FileCredentials, StaticCredentials};
pub use error::{Result, ServiceError};
pub use service::coerce::coerce;
pub use service::factory::{
    Backend, MockingSource, MockingToggle, Service, ServiceFactory, ServiceInstance, ServiceType,
    Variant,
};
pub use service::options::{ConfigObject, OptionKey, OptionMap, RawOptions, ResolvedOptions};
pub use service::registry::{ServiceDefinition, ServiceRegistry};
pub use service::resolver::{CredentialScope, OptionResolver};
pub use service::schema::{OptionSchema, OptionSchemaBuilder};
pub use warning::{TracingWarningSink, WarningSink};
