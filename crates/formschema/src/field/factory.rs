use std::collections::HashMap;

use serde_json::Value;
use tracing::trace;

use super::{Field, OPTION_VALIDATION_GROUPS};
use crate::error::{Result, SchemaError};

/// Request for a standalone field tree: a registered type name plus the
/// validation groups it is built for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldDefinition {
    pub type_name: String,
    pub validation_groups: Vec<String>,
}

impl FieldDefinition {
    pub fn new(type_name: impl Into<String>, validation_groups: Vec<String>) -> Self {
        Self {
            type_name: type_name.into(),
            validation_groups,
        }
    }
}

/// Builds standalone field trees for collection entries and polymorphic
/// variants.
pub trait FieldFactory {
    fn create(&self, definition: &FieldDefinition) -> Result<Field>;
}

/// In-memory [`FieldFactory`] keyed by type name.
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    types: HashMap<String, Field>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the tree produced for `type_name`. Builtin scalar types used
    /// as collection entries are registered as childless fields.
    pub fn register(&mut self, type_name: impl Into<String>, field: Field) {
        self.types.insert(type_name.into(), field);
    }

    #[must_use]
    pub fn with_type(mut self, type_name: impl Into<String>, field: Field) -> Self {
        self.register(type_name, field);
        self
    }
}

impl FieldFactory for FieldRegistry {
    fn create(&self, definition: &FieldDefinition) -> Result<Field> {
        let mut field = self
            .types
            .get(&definition.type_name)
            .cloned()
            .ok_or_else(|| {
                SchemaError::NotFound(format!(
                    "no field type registered as {}",
                    definition.type_name
                ))
            })?;

        if !definition.validation_groups.is_empty() {
            let groups = definition
                .validation_groups
                .iter()
                .cloned()
                .map(Value::String)
                .collect();
            field.set_option(OPTION_VALIDATION_GROUPS, Value::Array(groups));
        }

        trace!(type_name = %definition.type_name, "created field tree");
        Ok(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_clones_registered_tree_with_groups() {
        let registry = FieldRegistry::new().with_type(
            "line",
            Field::custom("line", "line").with_child(Field::builtin("qty", "integer")),
        );

        let field = registry
            .create(&FieldDefinition::new("line", vec!["create".to_string()]))
            .unwrap();

        assert_eq!(field.name(), "line");
        assert_eq!(field.children().len(), 1);
        assert_eq!(field.validation_groups(), vec!["create"]);
    }

    #[test]
    fn create_unknown_type_is_not_found() {
        let err = FieldRegistry::new()
            .create(&FieldDefinition::new("missing", Vec::new()))
            .unwrap_err();
        assert!(matches!(err, SchemaError::NotFound(msg) if msg.contains("missing")));
    }
}
