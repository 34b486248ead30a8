//! Built-in Service Catalog - load service schemas from JSON
//!
//! Schemas for common services are embedded at compile time. Catalog
//! services have no provider code of their own: both variants simply hold
//! the resolved options, which is enough to inspect what a real client would
//! be constructed with.

use super::factory::{Service, Variant};
use super::options::ResolvedOptions;
use super::registry::ServiceDefinition;
use super::schema::OptionSchema;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Embedded catalog JSON files (compiled into the binary)
const CATALOG_FILES: &[&str] = &[include_str!("../resources/services.json")];

/// Service schema from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceDef {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default)]
    pub recognizes: Vec<String>,
    /// Options whose values are masked when displayed
    #[serde(default)]
    pub secrets: Vec<String>,
}

impl ServiceDef {
    pub fn schema(&self) -> OptionSchema {
        OptionSchema::builder()
            .requires_all(&self.requires)
            .recognizes_all(&self.recognizes)
            .secret_all(&self.secrets)
            .build()
    }
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub services: HashMap<String, ServiceDef>,
}

static CATALOG: OnceLock<CatalogConfig> = OnceLock::new();

/// Get the catalog (parsed from embedded JSON on first access)
pub fn get_catalog() -> &'static CatalogConfig {
    CATALOG.get_or_init(|| {
        let mut catalog = CatalogConfig {
            services: HashMap::new(),
        };

        for content in CATALOG_FILES {
            let partial: CatalogConfig = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded service catalog: {}", e));
            catalog.services.extend(partial.services);
        }

        catalog
    })
}

/// Get a catalog entry by name
pub fn get_service_def(name: &str) -> Option<&'static ServiceDef> {
    get_catalog().services.get(name)
}

/// Registry definitions for every catalog entry
pub fn definitions() -> Vec<ServiceDefinition> {
    get_catalog()
        .services
        .iter()
        .map(|(name, def)| {
            let service = name.clone();
            let schema = Arc::new(def.schema());
            ServiceDefinition::new(
                name.as_str(),
                schema.as_ref().clone(),
                move |options, variant| -> Box<dyn Service> {
                    match variant {
                        Variant::Real => Box::new(Real::new(&service, schema.clone(), options)),
                        Variant::Mock => Box::new(Mock::new(&service, schema.clone(), options)),
                    }
                },
            )
            .with_description(def.description.as_str())
        })
        .collect()
}

/// Debug rendering shared by both variants; secret values are masked
fn debug_service(
    f: &mut fmt::Formatter<'_>,
    kind: &str,
    service: &str,
    schema: &OptionSchema,
    options: &ResolvedOptions,
) -> fmt::Result {
    f.debug_struct(kind)
        .field("service", &service)
        .field("options", &options.redacted(schema))
        .finish()
}

/// Real variant of a catalog service
pub struct Real {
    service: String,
    schema: Arc<OptionSchema>,
    options: ResolvedOptions,
}

impl Real {
    pub fn new(service: &str, schema: Arc<OptionSchema>, options: ResolvedOptions) -> Self {
        Self {
            service: service.to_string(),
            schema,
            options,
        }
    }
}

impl fmt::Debug for Real {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_service(f, "Real", &self.service, &self.schema, &self.options)
    }
}

impl Service for Real {
    fn options(&self) -> &ResolvedOptions {
        &self.options
    }

    fn variant(&self) -> Variant {
        Variant::Real
    }
}

/// Mock variant of a catalog service
pub struct Mock {
    service: String,
    schema: Arc<OptionSchema>,
    options: ResolvedOptions,
}

impl Mock {
    pub fn new(service: &str, schema: Arc<OptionSchema>, options: ResolvedOptions) -> Self {
        Self {
            service: service.to_string(),
            schema,
            options,
        }
    }
}

impl fmt::Debug for Mock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_service(f, "Mock", &self.service, &self.schema, &self.options)
    }
}

impl Service for Mock {
    fn options(&self) -> &ResolvedOptions {
        &self.options
    }

    fn variant(&self) -> Variant {
        Variant::Mock
    }
}
