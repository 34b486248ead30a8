//! Service construction
//!
//! This module turns caller-supplied options into a constructed service:
//! options are normalized, merged over the default credentials, coerced and
//! validated against the service's schema, then either the real or the mock
//! implementation is built.
//!
//! # Module Structure
//!
//! - [`options`] - Option keys, raw and resolved option maps, config objects
//! - [`coerce`] - String to boolean/integer coercion
//! - [`schema`] - Required and recognized option declarations
//! - [`resolver`] - The merge/coerce/validate pipeline
//! - [`factory`] - Real vs mock selection and construction
//! - [`registry`] - Named service definitions
//! - [`catalog`] - Built-in service schemas embedded from JSON
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tfog::{FileCredentials, MockingToggle, RawOptions, ServiceFactory, ServiceRegistry};
//!
//! fn example() -> tfog::Result<()> {
//!     let factory = ServiceFactory::new(
//!         Arc::new(FileCredentials::from_env()),
//!         Arc::new(MockingToggle::from_env()),
//!     );
//!     let registry = ServiceRegistry::with_catalog();
//!     let service = factory.create_named(&registry, "generic", RawOptions::new())?;
//!     println!("{:?}", service.variant());
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod coerce;
pub mod factory;
pub mod options;
pub mod registry;
pub mod resolver;
pub mod schema;
