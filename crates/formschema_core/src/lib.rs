//! OpenAPI structure definitions produced by the `formschema` generators.

pub mod openapi;
pub mod route;
pub mod schema;

pub use route::{HttpMethod, MediaType, RequestBody};
pub use schema::{Discriminator, Schema, SchemaType};
