//! Leaf schemas for builtin field types.

use formschema_core::schema::FORMAT_DATE_TIME;
use formschema_core::{Schema, SchemaType};
use serde_json::Value;
use tracing::trace;

use crate::error::{Result, SchemaError};
use crate::field::FieldCursor;
use crate::object::{Definition, ObjectDescriber};

/// Option naming the object type a field maps to.
pub const OPTION_CLASS: &str = "class";
/// Option overriding the serialization groups used for [`OPTION_CLASS`].
pub const OPTION_SERIALIZATION_GROUPS: &str = "serialization_groups";
pub const OPTION_CHOICES: &str = "choices";
pub const OPTION_MULTIPLE: &str = "multiple";

/// Fills a schema for a field described by its block prefix.
pub trait PropertyDescriber {
    fn describe(&self, schema: &mut Schema, block_prefix: &str, field: &FieldCursor<'_>) -> Result<()>;
}

/// [`PropertyDescriber`] for the core field types.
///
/// Fields carrying a `class` option reference an object type and are
/// resolved through the object describer, when one is attached.
#[derive(Default)]
pub struct BuiltinPropertyDescriber<'a> {
    object_describer: Option<&'a dyn ObjectDescriber>,
}

impl<'a> BuiltinPropertyDescriber<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object_describer(object_describer: &'a dyn ObjectDescriber) -> Self {
        Self {
            object_describer: Some(object_describer),
        }
    }

    fn describe_object(&self, class_name: &str, field: &FieldCursor<'_>) -> Result<Schema> {
        let describer = self.object_describer.ok_or_else(|| {
            SchemaError::UnsupportedConfiguration(format!(
                "field {} references {class_name} but no object describer is configured",
                field.name()
            ))
        })?;
        let field_def = field.field();
        let groups = match field_def.option(OPTION_SERIALIZATION_GROUPS) {
            Some(Value::Array(groups)) => groups
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => field_def.validation_groups(),
        };
        describer.describe(&Definition::new(class_name, groups))
    }
}

impl PropertyDescriber for BuiltinPropertyDescriber<'_> {
    fn describe(&self, schema: &mut Schema, block_prefix: &str, field: &FieldCursor<'_>) -> Result<()> {
        let field_def = field.field();
        if let Some(class_name) = field_def.option_str(OPTION_CLASS) {
            *schema = self.describe_object(class_name, field)?;
            return Ok(());
        }

        let multiple = field_def.option_bool(OPTION_MULTIPLE);
        let leaf = match block_prefix {
            "integer" => Schema::integer(),
            "number" | "money" | "percent" => Schema::number(),
            "checkbox" => Schema::boolean(),
            "file" => Schema::binary(),
            "datetime" => Schema::string().with_format(FORMAT_DATE_TIME),
            "choice" | "enum" => choice_schema(field_def.option(OPTION_CHOICES)),
            "text" | "textarea" | "email" | "url" | "password" | "search" | "tel" | "hidden"
            | "color" | "date" | "time" | "birthday" | "uuid" | "country" | "language"
            | "locale" | "currency" | "timezone" => Schema::string(),
            other => {
                trace!(block_prefix = other, field = field.name(), "unknown block prefix, using string");
                Schema::string()
            }
        };

        let described = if multiple { Schema::array(leaf) } else { leaf };
        schema.schema_type = described.schema_type;
        schema.format = described.format;
        schema.items = described.items;
        schema.r#enum = described.r#enum;
        Ok(())
    }
}

/// String enum from a list of values or a label-to-value map. Integer-only
/// choices become an integer enum.
fn choice_schema(choices: Option<&Value>) -> Schema {
    let values: Vec<Value> = match choices {
        Some(Value::Array(values)) => values.clone(),
        Some(Value::Object(map)) => map.values().cloned().collect(),
        _ => Vec::new(),
    };
    if values.is_empty() {
        return Schema::string();
    }

    let schema_type = if values.iter().all(Value::is_i64) {
        SchemaType::Integer
    } else {
        SchemaType::String
    };
    Schema {
        r#enum: Some(values),
        ..Schema::new(schema_type)
    }
}
