//! Object-metadata schema builder.

pub mod describer;
pub mod exclusion;
pub mod metadata;
pub mod model;
pub mod registry;

pub use describer::{Definition, ObjectDescriber, RegistryObjectDescriber};
pub use metadata::{
    ClassMetadata, InMemoryMetadataProvider, Metadata, MetadataProvider, PropertyMetadata,
    TypeDescriptor,
};
pub use model::MetadataModelDescriber;
pub use registry::{ModelRegistry, RegisteredModel};
