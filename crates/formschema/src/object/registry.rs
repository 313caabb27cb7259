use std::cell::RefCell;

use formschema_core::Schema;
use tracing::{debug, warn};

use super::describer::Definition;

/// A described object type and the name it is published under.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredModel {
    pub definition: Definition,
    pub reference_name: String,
    pub schema: Schema,
}

/// Per-document store of described object schemas.
///
/// Deduplicates by definition (class plus groups): the first registration
/// wins. Interior mutability keeps it `!Sync`, so one registry cannot be
/// shared across concurrent document builds.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: RefCell<Vec<RegisteredModel>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `schema` for `definition` and return its reference name.
    pub fn register(&self, definition: &Definition, schema: Schema) -> String {
        let mut models = self.models.borrow_mut();
        if let Some(existing) = models.iter().find(|m| &m.definition == definition) {
            return existing.reference_name.clone();
        }

        let base = short_class_name(definition.class_name());
        let mut reference_name = base.to_string();
        let mut suffix = 1;
        while models.iter().any(|m| m.reference_name == reference_name) {
            suffix += 1;
            reference_name = format!("{base}{suffix}");
        }
        if suffix > 1 {
            warn!(
                class = definition.class_name(),
                reference = %reference_name,
                "reference name already taken, using suffixed name"
            );
        }

        debug!(class = definition.class_name(), reference = %reference_name, "registered model");
        models.push(RegisteredModel {
            definition: definition.clone(),
            reference_name: reference_name.clone(),
            schema,
        });
        reference_name
    }

    pub fn schema_for(&self, definition: &Definition) -> Option<Schema> {
        self.models
            .borrow()
            .iter()
            .find(|m| &m.definition == definition)
            .map(|m| m.schema.clone())
    }

    /// Registered models in registration order.
    pub fn referenced_models(&self) -> Vec<RegisteredModel> {
        self.models.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.models.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.borrow().is_empty()
    }
}

/// Last segment of a namespaced class name.
fn short_class_name(class_name: &str) -> &str {
    class_name
        .rsplit(['\\', ':', '.'])
        .find(|segment| !segment.is_empty())
        .unwrap_or(class_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("App\\Model\\User", "User")]
    #[case("app::model::User", "User")]
    #[case("User", "User")]
    fn short_name(#[case] class_name: &str, #[case] expected: &str) {
        assert_eq!(short_class_name(class_name), expected);
    }

    #[test]
    fn first_registration_wins() {
        let registry = ModelRegistry::new();
        let definition = Definition::new("App\\User", vec!["api".to_string()]);

        let first = registry.register(&definition, Schema::object());
        let second = registry.register(&definition, Schema::string());

        assert_eq!(first, "User");
        assert_eq!(second, "User");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.schema_for(&definition), Some(Schema::object()));
    }

    #[test]
    fn colliding_names_get_suffix() {
        let registry = ModelRegistry::new();
        let a = registry.register(&Definition::new("App\\User", Vec::new()), Schema::object());
        let b = registry.register(&Definition::new("Admin\\User", Vec::new()), Schema::object());
        let c = registry.register(
            &Definition::new("App\\User", vec!["admin".to_string()]),
            Schema::object(),
        );

        assert_eq!((a.as_str(), b.as_str(), c.as_str()), ("User", "User2", "User3"));
        let names: Vec<_> = registry
            .referenced_models()
            .into_iter()
            .map(|m| m.reference_name)
            .collect();
        assert_eq!(names, vec!["User", "User2", "User3"]);
    }
}
