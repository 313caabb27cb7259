//! Formschema - OpenAPI request schemas from field trees and class metadata
//!
//! Two builders feed one [`Schema`] representation:
//!
//! - [`form::FormDescriber`] walks a [`field::Field`] tree into a nested or a
//!   flattened object schema.
//! - [`object::MetadataModelDescriber`] turns class metadata into object
//!   schemas, reached through the shared [`object::ObjectDescriber`].
//!
//! [`request_body::RequestBodyContent`] then decides which media types a
//! request body accepts.

pub mod config;
pub mod error;
pub mod field;
pub mod form;
pub mod name_resolver;
pub mod object;
pub mod processor;
pub mod request_body;

pub use config::GeneratorConfig;
pub use error::{Result, SchemaError};
pub use field::{Field, FieldCursor, FieldDefinition, FieldFactory, FieldRegistry, TypeCategory};
pub use form::FormDescriber;
pub use request_body::RequestBodyContent;

// Re-export the wire model so users don't need to depend on formschema_core directly
pub use formschema_core::{
    Discriminator, HttpMethod, MediaType, RequestBody, Schema, SchemaType, openapi, route, schema,
};
