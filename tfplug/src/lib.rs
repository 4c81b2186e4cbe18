//! tfplug - host plug-in interface for infrastructure providers
//!
//! The traits and values a provider is written against: providers,
//! resources and data sources, the dynamic value tree the host exchanges with
//! them, schemas with validators and defaults, and helpers for acceptance
//! tests.

// Core modules
pub mod context;
pub mod error;
pub mod schema;
pub mod types;

// Provider API modules
pub mod data_source;
pub mod provider;
pub mod resource;

// Helper modules
pub mod defaults;
pub mod import;
pub mod testing;
pub mod validators;

// Re-exports for convenience
pub use context::Context;
pub use data_source::{DataSource, DataSourceWithConfigure};
pub use error::{Result, TfplugError};
pub use import::import_state_passthrough_id;
pub use provider::{DataSourceFactory, Provider, ResourceFactory};
pub use resource::{Resource, ResourceWithConfigure, ResourceWithImportState};
pub use schema::{
    AttributeBuilder, AttributeType, NestedBlockBuilder, NestingMode, Schema, SchemaBuilder,
};
pub use types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
