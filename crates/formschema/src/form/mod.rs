//! Field-tree schema builder.
//!
//! A field tree is rendered in two shapes: the nested ("deep") shape mirrors
//! the tree, the flattened shape folds it into one object keyed by compound
//! names (`address[street]`).

pub mod property;
pub mod requirements;

use std::cell::RefCell;

use formschema_core::{HttpMethod, Schema};
use tracing::{debug, trace};

use crate::config::GeneratorConfig;
use crate::error::{Result, SchemaError};
use crate::field::{Field, FieldCursor, FieldDefinition, FieldFactory, TypeCategory};
use crate::name_resolver::{FlatNameResolver, NameResolver, PrefixedFlatArray};

pub use property::{BuiltinPropertyDescriber, PropertyDescriber};
pub use requirements::{ConstraintRequirementsDescriber, RequirementsDescriber};

pub struct FormDescriber<'a> {
    factory: &'a dyn FieldFactory,
    property_describer: &'a dyn PropertyDescriber,
    requirements_describer: &'a dyn RequirementsDescriber,
    max_depth: usize,
    /// Block prefixes of the trees currently being walked.
    stack: RefCell<Vec<String>>,
}

/// Pops the traversal stack when a nesting level is left.
struct LevelGuard<'s> {
    stack: &'s RefCell<Vec<String>>,
}

impl Drop for LevelGuard<'_> {
    fn drop(&mut self) {
        self.stack.borrow_mut().pop();
    }
}

impl<'a> FormDescriber<'a> {
    pub fn new(
        factory: &'a dyn FieldFactory,
        property_describer: &'a dyn PropertyDescriber,
        requirements_describer: &'a dyn RequirementsDescriber,
        config: &GeneratorConfig,
    ) -> Self {
        Self {
            factory,
            property_describer,
            requirements_describer,
            max_depth: config.max_depth,
            stack: RefCell::new(Vec::new()),
        }
    }

    /// Schema for a single field, dispatched on its structural kind.
    pub fn create_schema(
        &self,
        field: &FieldCursor<'_>,
        names: &dyn NameResolver,
        method: HttpMethod,
    ) -> Result<Schema> {
        let field_def = field.field();
        let mut schema = match field_def.category() {
            TypeCategory::BuiltinCollection => self.describe_collection(field, names, method)?,
            TypeCategory::BuiltinPolymorphicCollection => {
                self.describe_polymorphic_collection(field, names, method)?
            }
            TypeCategory::BuiltinScalar | TypeCategory::Custom => {
                let mut schema = Schema::default();
                self.property_describer
                    .describe(&mut schema, field_def.block_prefix(), field)?;
                schema
            }
        };

        self.requirements_describer.describe(&mut schema, field);
        Ok(schema)
    }

    /// Nested shape: leaves become schemas, compound fields become objects.
    pub fn add_deep_schema(
        &self,
        field: &FieldCursor<'_>,
        names: &dyn NameResolver,
        method: HttpMethod,
    ) -> Result<Schema> {
        let _level = self.enter(field)?;

        let mut schema = if field.field().is_leaf() {
            let mut schema = self.create_schema(field, names, method)?;
            Self::handle_required_for_parent(&mut schema, field, names);
            schema
        } else {
            let mut schema = Schema::object();
            for child in field.children() {
                if child.field().is_builtin() {
                    self.add_parameter_to_schema(&mut schema, names, &child, method)?;
                } else {
                    let child_schema = self.add_deep_schema(&child, names, method)?;
                    let name = names.property_name(&child);
                    schema.insert_property(name.clone(), child_schema);
                    Self::handle_required_property(&mut schema, name, &child, method);
                }
            }
            schema
        };

        schema.normalize_required();
        Ok(schema)
    }

    /// Flat shape: one object whose keys are full paths.
    pub fn add_flatten_schema(
        &self,
        field: &FieldCursor<'_>,
        names: &dyn FlatNameResolver,
        method: HttpMethod,
    ) -> Result<Schema> {
        let mut schema = Schema::object();
        self.add_parameters_to_flatten_schema(&mut schema, field, names, method)?;
        Ok(schema)
    }

    /// Required in its parent's `required` list.
    ///
    /// Nothing is required on PATCH. A required field below an optional,
    /// non-root parent is only required once the parent is sent, so it is
    /// not promoted.
    pub fn is_form_property_required(field: &FieldCursor<'_>, method: HttpMethod) -> bool {
        if method.is_patch() {
            return false;
        }
        if !field.field().is_required() {
            return false;
        }
        field.optional_parent().is_none()
    }

    fn add_parameters_to_flatten_schema(
        &self,
        schema: &mut Schema,
        field: &FieldCursor<'_>,
        names: &dyn FlatNameResolver,
        method: HttpMethod,
    ) -> Result<()> {
        let _level = self.enter(field)?;

        if field.field().is_leaf() {
            self.add_parameter_to_schema(schema, names, field, method)?;
        } else {
            for child in field.children() {
                let child_def = child.field();
                if !child_def.is_builtin() {
                    self.add_parameters_to_flatten_schema(schema, &child, names, method)?;
                } else if child_def.category() == TypeCategory::BuiltinCollection {
                    let entry = self.create_entry(child_def)?;
                    if entry.is_leaf() {
                        // scalar entries: the collection is a plain array leaf
                        self.add_parameter_to_schema(schema, names, &child, method)?;
                    } else {
                        let prefixed = PrefixedFlatArray::new(names.property_name(&child));
                        trace!(collection = child.name(), "flattening collection entries");
                        self.add_parameters_to_flatten_schema(
                            schema,
                            &FieldCursor::root(&entry),
                            &prefixed,
                            method,
                        )?;
                    }
                } else {
                    self.add_parameter_to_schema(schema, names, &child, method)?;
                }
            }
        }

        schema.normalize_required();
        Ok(())
    }

    fn add_parameter_to_schema(
        &self,
        schema: &mut Schema,
        names: &dyn NameResolver,
        field: &FieldCursor<'_>,
        method: HttpMethod,
    ) -> Result<()> {
        let mut child_schema = self.create_schema(field, names, method)?;
        Self::handle_required_for_parent(&mut child_schema, field, names);

        let name = names.property_name(field);
        schema.insert_property(name.clone(), child_schema);
        Self::handle_required_property(schema, name, field, method);
        Ok(())
    }

    fn describe_collection(
        &self,
        field: &FieldCursor<'_>,
        names: &dyn NameResolver,
        method: HttpMethod,
    ) -> Result<Schema> {
        let entry = self.create_entry(field.field())?;
        let entry_cursor = FieldCursor::attached(&entry, field);
        let items = self.add_deep_schema(&entry_cursor, names, method)?;
        Ok(Schema::array(items))
    }

    fn describe_polymorphic_collection(
        &self,
        field: &FieldCursor<'_>,
        names: &dyn NameResolver,
        method: HttpMethod,
    ) -> Result<Schema> {
        let field_def = field.field();
        let discriminator = field_def.discriminator_field_name().ok_or_else(|| {
            SchemaError::UnsupportedConfiguration(format!(
                "polymorphic collection {} has no discriminator field name",
                field.name()
            ))
        })?;
        let entry_types = field_def.entry_types();
        if entry_types.is_empty() {
            return Err(SchemaError::UnsupportedConfiguration(format!(
                "polymorphic collection {} has no entry types",
                field.name()
            )));
        }

        let groups = field_def.validation_groups();
        let variants = entry_types
            .iter()
            .map(|entry_type| {
                let entry = self
                    .factory
                    .create(&FieldDefinition::new(entry_type.clone(), groups.clone()))?;
                let entry_cursor = FieldCursor::root(&entry);
                match names.as_flat() {
                    Some(flat) => self.add_flatten_schema(&entry_cursor, flat, method),
                    None => self.add_deep_schema(&entry_cursor, names, method),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            field = field.name(),
            variants = variants.len(),
            "described polymorphic collection"
        );
        Ok(Schema::array(Schema::one_of(variants, discriminator)))
    }

    fn create_entry(&self, collection: &Field) -> Result<Field> {
        let entry_type = collection.entry_type().ok_or_else(|| {
            SchemaError::UnsupportedConfiguration(format!(
                "collection {} has no entry type",
                collection.name()
            ))
        })?;
        self.factory.create(&FieldDefinition::new(
            entry_type,
            collection.validation_groups(),
        ))
    }

    fn handle_required_for_parent(
        schema: &mut Schema,
        field: &FieldCursor<'_>,
        names: &dyn NameResolver,
    ) {
        if !field.field().is_required() {
            return;
        }
        if let Some(parent) = field.optional_parent() {
            schema.append_description(&format!(
                "Field required for {}",
                names.property_name(parent)
            ));
        }
    }

    fn handle_required_property(
        schema: &mut Schema,
        name: String,
        field: &FieldCursor<'_>,
        method: HttpMethod,
    ) {
        if Self::is_form_property_required(field, method) {
            schema.add_required(name);
        }
    }

    fn enter(&self, field: &FieldCursor<'_>) -> Result<LevelGuard<'_>> {
        let mut stack = self.stack.borrow_mut();
        if stack.len() >= self.max_depth {
            let mut chain = stack.clone();
            chain.push(field.field().block_prefix().to_string());
            return Err(SchemaError::CyclicType(chain));
        }
        stack.push(field.field().block_prefix().to_string());
        Ok(LevelGuard { stack: &self.stack })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldRegistry, OPTION_DISCRIMINATOR_FIELD_NAME, OPTION_ENTRY_TYPE};
    use crate::name_resolver::{FlatArray, FormName};
    use formschema_core::SchemaType;
    use rstest::rstest;
    use serde_json::json;

    fn registry() -> FieldRegistry {
        FieldRegistry::new()
            .with_type("text", Field::builtin("text", "text"))
            .with_type(
                "line",
                Field::custom("line", "line")
                    .with_child(Field::builtin("name", "text"))
                    .with_child(Field::builtin("qty", "integer")),
            )
            .with_type(
                "circle",
                Field::custom("circle", "circle")
                    .with_child(Field::builtin("kind", "text"))
                    .with_child(Field::builtin("radius", "number")),
            )
            .with_type(
                "square",
                Field::custom("square", "square")
                    .with_child(Field::builtin("kind", "text"))
                    .with_child(Field::builtin("side", "integer").optional()),
            )
            .with_type(
                "node",
                Field::custom("node", "node")
                    .with_child(Field::builtin("label", "text"))
                    .with_child(Field::collection("children", "node")),
            )
    }

    fn with_describer<R>(f: impl FnOnce(&FormDescriber<'_>) -> R) -> R {
        let registry = registry();
        let property = BuiltinPropertyDescriber::new();
        let requirements = ConstraintRequirementsDescriber;
        let config = GeneratorConfig {
            max_depth: 8,
            ..GeneratorConfig::default()
        };
        let describer = FormDescriber::new(&registry, &property, &requirements, &config);
        f(&describer)
    }

    fn deep(field: &Field, method: HttpMethod) -> Result<Schema> {
        with_describer(|d| d.add_deep_schema(&FieldCursor::root(field), &FormName, method))
    }

    fn flat(field: &Field, method: HttpMethod) -> Result<Schema> {
        with_describer(|d| d.add_flatten_schema(&FieldCursor::root(field), &FlatArray, method))
    }

    fn keys(schema: &Schema) -> Vec<String> {
        schema
            .properties
            .as_ref()
            .map(|p| p.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn order_form() -> Field {
        Field::custom("order", "order")
            .with_child(Field::builtin("title", "text"))
            .with_child(
                Field::custom("address", "address")
                    .optional()
                    .with_child(Field::builtin("street", "text"))
                    .with_child(Field::builtin("city", "text").optional()),
            )
    }

    fn assert_required_never_empty(schema: &Schema) {
        assert_ne!(schema.required, Some(Vec::new()));
        for property in schema.properties.iter().flat_map(|p| p.values()) {
            assert_required_never_empty(property);
        }
        if let Some(items) = &schema.items {
            assert_required_never_empty(items);
        }
        for variant in schema.one_of.iter().flatten() {
            assert_required_never_empty(variant);
        }
    }

    #[test]
    fn deep_schema_nests_custom_children() {
        let schema = deep(&order_form(), HttpMethod::Post).unwrap();
        let json = serde_json::to_string_pretty(&schema).unwrap();
        insta::assert_snapshot!(json, @r#"
        {
          "type": "object",
          "properties": {
            "title": {
              "type": "string"
            },
            "address": {
              "type": "object",
              "properties": {
                "street": {
                  "type": "string",
                  "description": "Field required for address"
                },
                "city": {
                  "type": "string"
                }
              }
            }
          },
          "required": [
            "title"
          ]
        }
        "#);
    }

    #[test]
    fn required_parent_promotes_required_children() {
        let form = Field::custom("order", "order").with_child(
            Field::custom("address", "address")
                .with_child(Field::builtin("street", "text"))
                .with_child(Field::builtin("city", "text").optional()),
        );
        let schema = deep(&form, HttpMethod::Put).unwrap();

        assert_eq!(schema.required, Some(vec!["address".to_string()]));
        let address = schema.property("address").unwrap();
        assert_eq!(address.required, Some(vec!["street".to_string()]));
        assert!(address.property("street").unwrap().description.is_none());
    }

    #[test]
    fn patch_requires_nothing() {
        let form = order_form();
        let deep_schema = deep(&form, HttpMethod::Patch).unwrap();
        let flat_schema = flat(&form, HttpMethod::Patch).unwrap();

        assert!(deep_schema.required.is_none());
        assert!(flat_schema.required.is_none());
        assert_required_never_empty(&deep_schema);
    }

    #[rstest]
    #[case(true, true, HttpMethod::Post, true)]
    #[case(true, true, HttpMethod::Patch, false)]
    #[case(false, true, HttpMethod::Post, false)]
    #[case(true, false, HttpMethod::Post, false)]
    #[case(false, false, HttpMethod::Put, false)]
    fn form_property_required(
        #[case] child_required: bool,
        #[case] parent_required: bool,
        #[case] method: HttpMethod,
        #[case] expected: bool,
    ) {
        let form = Field::custom("root", "root").with_child(
            Field::custom("parent", "parent")
                .required(parent_required)
                .with_child(Field::builtin("child", "text").required(child_required)),
        );
        let root = FieldCursor::root(&form);
        let parent = root.child(&form.children()[0]);
        let child = parent.child(&parent.field().children()[0]);

        assert_eq!(FormDescriber::is_form_property_required(&child, method), expected);
    }

    #[test]
    fn top_level_fields_ignore_root_required_flag() {
        let form = Field::custom("root", "root")
            .optional()
            .with_child(Field::builtin("name", "text"));
        let root = FieldCursor::root(&form);
        let name = root.child(&form.children()[0]);
        assert!(FormDescriber::is_form_property_required(&name, HttpMethod::Post));
    }

    #[test]
    fn required_note_is_appended_to_help() {
        let form = Field::custom("root", "root").with_child(
            Field::custom("billing", "billing")
                .optional()
                .with_child(Field::builtin("iban", "text").with_option("help", json!("Bank account"))),
        );
        let schema = deep(&form, HttpMethod::Post).unwrap();
        let iban = schema.property("billing").unwrap().property("iban").unwrap();
        assert_eq!(
            iban.description.as_deref(),
            Some("Bank account<br>\nField required for billing")
        );
    }

    #[test]
    fn flatten_folds_nested_fields_into_compound_keys() {
        let form = Field::custom("root", "root").with_child(
            Field::custom("a", "a")
                .with_child(Field::builtin("b", "text"))
                .with_child(Field::builtin("c", "text")),
        );
        let schema = flat(&form, HttpMethod::Post).unwrap();

        assert_eq!(schema.schema_type, Some(SchemaType::Object));
        assert_eq!(keys(&schema), vec!["a[b]", "a[c]"]);
        assert_eq!(schema.required, Some(vec!["a[b]".to_string(), "a[c]".to_string()]));
        assert!(schema.property("a").is_none());
    }

    #[test]
    fn flat_note_uses_flat_parent_name() {
        let schema = flat(&order_form(), HttpMethod::Post).unwrap();

        assert_eq!(keys(&schema), vec!["title", "address[street]", "address[city]"]);
        assert_eq!(schema.required, Some(vec!["title".to_string()]));
        assert_eq!(
            schema.property("address[street]").unwrap().description.as_deref(),
            Some("Field required for address")
        );
    }

    #[test]
    fn collection_entries_are_prefixed_when_flattened() {
        let form = Field::custom("root", "root").with_child(Field::collection("items", "line"));
        let schema = flat(&form, HttpMethod::Post).unwrap();
        assert_eq!(keys(&schema), vec!["items[name]", "items[qty]"]);
        assert_eq!(
            schema.property("items[qty]").unwrap().schema_type,
            Some(SchemaType::Integer)
        );
    }

    #[test]
    fn collection_entries_are_nested_in_deep_shape() {
        let form = Field::custom("root", "root").with_child(Field::collection("items", "line"));
        let schema = deep(&form, HttpMethod::Post).unwrap();

        let items = schema.property("items").unwrap();
        assert!(items.is_array());
        let entry = items.items.as_deref().unwrap();
        assert_eq!(keys(entry), vec!["name", "qty"]);
        assert_eq!(
            entry.required,
            Some(vec!["name".to_string(), "qty".to_string()])
        );
        assert_eq!(schema.required, Some(vec!["items".to_string()]));
    }

    #[test]
    fn scalar_collection_stays_an_array_leaf() {
        let form = Field::custom("root", "root").with_child(Field::collection("tags", "text").optional());
        let expected = Schema {
            description: Some("Field required for tags".to_string()),
            ..Schema::string()
        };

        for schema in [deep(&form, HttpMethod::Post).unwrap(), flat(&form, HttpMethod::Post).unwrap()] {
            assert_eq!(keys(&schema), vec!["tags"]);
            let tags = schema.property("tags").unwrap();
            assert_eq!(tags.items.as_deref(), Some(&expected));
            assert!(schema.required.is_none());
        }
    }

    #[test]
    fn polymorphic_collection_uses_one_of_per_entry_type() {
        let form = Field::custom("root", "root").with_child(Field::polymorphic_collection(
            "shapes",
            "kind",
            ["circle", "square"],
        ));

        let schema = deep(&form, HttpMethod::Post).unwrap();
        let items = schema.property("shapes").unwrap().items.as_deref().unwrap();
        assert!(items.schema_type.is_none());
        assert!(items.properties.is_none());
        assert_eq!(items.discriminator.as_ref().unwrap().property_name, "kind");
        let variants = items.one_of.as_ref().unwrap();
        assert_eq!(keys(&variants[0]), vec!["kind", "radius"]);
        assert_eq!(keys(&variants[1]), vec!["kind", "side"]);
        assert_eq!(variants[1].required, Some(vec!["kind".to_string()]));
    }

    #[test]
    fn polymorphic_variants_are_flattened_under_flat_names() {
        let form = Field::custom("root", "root").with_child(
            Field::polymorphic_collection("shapes", "kind", ["circle"]),
        );

        let schema = flat(&form, HttpMethod::Post).unwrap();
        let items = schema.property("shapes").unwrap().items.as_deref().unwrap();
        let variants = items.one_of.as_ref().unwrap();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].schema_type, Some(SchemaType::Object));
        assert_eq!(keys(&variants[0]), vec!["kind", "radius"]);
    }

    #[rstest]
    #[case(Field::collection("items", "line").with_option(OPTION_ENTRY_TYPE, json!(null)))]
    #[case(Field::polymorphic_collection("shapes", "kind", Vec::<String>::new()))]
    #[case(Field::polymorphic_collection("shapes", "kind", ["circle"])
        .with_option(OPTION_DISCRIMINATOR_FIELD_NAME, json!(null)))]
    fn misconfigured_collection_is_unsupported(#[case] collection: Field) {
        let form = Field::custom("root", "root").with_child(collection);
        let err = deep(&form, HttpMethod::Post).unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedConfiguration(_)));
    }

    #[test]
    fn unknown_entry_type_is_not_found() {
        let form = Field::custom("root", "root").with_child(Field::collection("items", "missing"));
        let err = flat(&form, HttpMethod::Post).unwrap_err();
        assert!(matches!(err, SchemaError::NotFound(_)));
    }

    #[test]
    fn self_referencing_entry_type_hits_depth_cap() {
        let form = Field::custom("root", "root").with_child(Field::collection("tree", "node"));

        let err = deep(&form, HttpMethod::Post).unwrap_err();
        assert!(matches!(err, SchemaError::CyclicType(chain) if chain.len() == 9));

        let err = flat(&form, HttpMethod::Post).unwrap_err();
        assert!(matches!(err, SchemaError::CyclicType(_)));
    }

    #[test]
    fn entry_fields_of_optional_collection_name_the_entry() {
        let form = Field::custom("root", "root").with_child(Field::collection("items", "line").optional());
        let schema = deep(&form, HttpMethod::Post).unwrap();

        let entry = schema.property("items").unwrap().items.as_deref().unwrap();
        assert!(entry.required.is_none());
        for name in ["name", "qty"] {
            assert_eq!(
                entry.property(name).unwrap().description.as_deref(),
                Some("Field required for line")
            );
        }
    }

    #[test]
    fn optional_tree_has_no_empty_required_lists() {
        let form = Field::custom("root", "root")
            .with_child(Field::builtin("a", "text").optional())
            .with_child(
                Field::custom("b", "b")
                    .optional()
                    .with_child(Field::builtin("c", "text").optional()),
            )
            .with_child(Field::collection("items", "line").optional());

        for method in [HttpMethod::Post, HttpMethod::Patch] {
            assert_required_never_empty(&deep(&form, method).unwrap());
            assert_required_never_empty(&flat(&form, method).unwrap());
        }
    }
}
