use std::cell::RefCell;

use formschema_core::Schema;
use tracing::debug;

use super::metadata::MetadataProvider;
use super::model::MetadataModelDescriber;
use super::registry::ModelRegistry;
use crate::config::GeneratorConfig;
use crate::error::{Result, SchemaError};

/// An object type to describe, as seen through a set of serialization groups.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Definition {
    class_name: String,
    serialization_groups: Vec<String>,
}

impl Definition {
    pub fn new(class_name: impl Into<String>, serialization_groups: Vec<String>) -> Self {
        Self {
            class_name: class_name.into(),
            serialization_groups,
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn serialization_groups(&self) -> &[String] {
        &self.serialization_groups
    }
}

/// Shared re-entry point resolving a named object type to a schema. Both
/// the field-tree and the metadata builders go through it for nested types.
pub trait ObjectDescriber {
    fn describe(&self, definition: &Definition) -> Result<Schema>;
}

/// [`ObjectDescriber`] backed by class metadata, caching results in a
/// [`ModelRegistry`].
///
/// Types currently being described are tracked; re-entering one of them
/// fails with [`SchemaError::CyclicType`] instead of recursing forever.
pub struct RegistryObjectDescriber<'a> {
    model: MetadataModelDescriber<'a>,
    registry: &'a ModelRegistry,
    default_groups: Vec<String>,
    in_progress: RefCell<Vec<Definition>>,
}

impl<'a> RegistryObjectDescriber<'a> {
    pub fn new(
        provider: &'a dyn MetadataProvider,
        registry: &'a ModelRegistry,
        config: &GeneratorConfig,
    ) -> Self {
        Self {
            model: MetadataModelDescriber::new(provider, config.api_version.clone()),
            registry,
            default_groups: config.default_groups.clone(),
            in_progress: RefCell::new(Vec::new()),
        }
    }

    fn normalize(&self, definition: &Definition) -> Definition {
        if definition.serialization_groups.is_empty() {
            Definition::new(definition.class_name.clone(), self.default_groups.clone())
        } else {
            definition.clone()
        }
    }

    fn describe_uncached(&self, definition: &Definition) -> Result<Schema> {
        let mut schema = Schema::default();
        self.model.describe_in_schema(&mut schema, definition, self)?;
        Ok(schema)
    }
}

impl ObjectDescriber for RegistryObjectDescriber<'_> {
    fn describe(&self, definition: &Definition) -> Result<Schema> {
        let definition = self.normalize(definition);
        if let Some(schema) = self.registry.schema_for(&definition) {
            return Ok(schema);
        }

        {
            let mut in_progress = self.in_progress.borrow_mut();
            if in_progress.contains(&definition) {
                let mut chain: Vec<String> =
                    in_progress.iter().map(|d| d.class_name.clone()).collect();
                chain.push(definition.class_name.clone());
                return Err(SchemaError::CyclicType(chain));
            }
            in_progress.push(definition.clone());
        }

        debug!(class = definition.class_name(), "describing object");
        let result = self.describe_uncached(&definition);
        self.in_progress.borrow_mut().pop();

        let schema = result?;
        self.registry.register(&definition, schema.clone());
        Ok(schema)
    }
}
