//! Service Registry
//!
//! Named service definitions, so services can be created from a name
//! supplied at runtime (CLI, config files) instead of a Rust type.

use super::factory::{Backend, Service, ServiceType, Variant};
use super::options::ResolvedOptions;
use super::schema::OptionSchema;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Builds a service implementation for a variant
pub type Constructor = Arc<dyn Fn(ResolvedOptions, Variant) -> Box<dyn Service> + Send + Sync>;

/// A named schema with its real and mock constructors
#[derive(Clone)]
pub struct ServiceDefinition {
    name: String,
    description: String,
    schema: OptionSchema,
    constructor: Constructor,
}

impl ServiceDefinition {
    pub fn new<F>(name: impl Into<String>, schema: OptionSchema, constructor: F) -> Self
    where
        F: Fn(ResolvedOptions, Variant) -> Box<dyn Service> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: String::new(),
            schema,
            constructor: Arc::new(constructor),
        }
    }

    /// Definition of a statically typed service
    pub fn of<S: ServiceType>() -> Self {
        Self::new(
            S::NAME,
            S::schema().clone(),
            |options, variant| -> Box<dyn Service> {
                match variant {
                    Variant::Real => Box::new(<S::Real as Backend>::new(options)),
                    Variant::Mock => Box::new(<S::Mock as Backend>::new(options)),
                }
            },
        )
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn schema(&self) -> &OptionSchema {
        &self.schema
    }

    /// Construct the implementation for `variant`
    pub fn construct(&self, options: ResolvedOptions, variant: Variant) -> Box<dyn Service> {
        (self.constructor)(options, variant)
    }
}

impl fmt::Debug for ServiceDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDefinition")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// Registered service definitions by name
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    definitions: BTreeMap<String, ServiceDefinition>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in catalog
    pub fn with_catalog() -> Self {
        let mut registry = Self::new();
        for definition in super::catalog::definitions() {
            registry.register(definition);
        }
        registry
    }

    /// Register a definition, replacing any previous one with the same name
    pub fn register(&mut self, definition: ServiceDefinition) {
        if self.definitions.contains_key(definition.name()) {
            tracing::warn!("Replacing service definition '{}'", definition.name());
        }
        self.definitions
            .insert(definition.name().to_string(), definition);
    }

    /// Register a statically typed service
    pub fn register_type<S: ServiceType>(&mut self) {
        self.register(ServiceDefinition::of::<S>());
    }

    pub fn get(&self, name: &str) -> Option<&ServiceDefinition> {
        self.definitions.get(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.definitions.keys().map(|s| s.as_str()).collect()
    }

    pub fn definitions(&self) -> impl Iterator<Item = &ServiceDefinition> {
        self.definitions.values()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
