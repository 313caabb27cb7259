//! Object schemas from class metadata.

use formschema_core::schema::FORMAT_DATE_TIME;
use formschema_core::{Schema, SchemaType};
use indexmap::IndexMap;
use tracing::trace;

use super::describer::{Definition, ObjectDescriber};
use super::exclusion::{excluded_by_version, in_groups};
use super::metadata::{ClassMetadata, Metadata, MetadataProvider, PropertyMetadata, TypeDescriptor};
use crate::error::{Result, SchemaError};

/// Describes classes property by property, filtered by serialization group
/// and API version.
pub struct MetadataModelDescriber<'a> {
    provider: &'a dyn MetadataProvider,
    api_version: Option<String>,
}

impl<'a> MetadataModelDescriber<'a> {
    pub fn new(provider: &'a dyn MetadataProvider, api_version: Option<String>) -> Self {
        Self {
            provider,
            api_version,
        }
    }

    /// Replace `schema` with the object schema of `definition`.
    ///
    /// Nested object types are resolved through `describer`; inline
    /// properties are spliced into this schema's property map.
    pub fn describe_in_schema(
        &self,
        schema: &mut Schema,
        definition: &Definition,
        describer: &dyn ObjectDescriber,
    ) -> Result<()> {
        let mut inline_chain = Vec::new();
        let properties = self.describe_properties(definition, describer, &mut inline_chain)?;

        schema.schema_type = Some(SchemaType::Object);
        schema.properties = Some(properties);
        Ok(())
    }

    fn describe_properties(
        &self,
        definition: &Definition,
        describer: &dyn ObjectDescriber,
        inline_chain: &mut Vec<String>,
    ) -> Result<IndexMap<String, Schema>> {
        let metadata = self.class_metadata(definition.class_name())?;
        let groups = definition.serialization_groups();
        let mut properties = IndexMap::new();

        for property in metadata
            .properties
            .iter()
            .filter(|p| in_groups(p, groups))
        {
            if excluded_by_version(property, self.api_version.as_deref()) {
                trace!(property = %property.name, "skipped for API version");
                continue;
            }

            if property.inline {
                let nested = property.type_descriptor.as_ref().ok_or_else(|| {
                    SchemaError::UnsupportedConfiguration(format!(
                        "inline property {}::{} has no type",
                        metadata.name, property.name
                    ))
                })?;
                if inline_chain.contains(&nested.name) || nested.name == metadata.name {
                    let mut chain = inline_chain.clone();
                    chain.push(metadata.name.clone());
                    chain.push(nested.name.clone());
                    return Err(SchemaError::CyclicType(chain));
                }

                inline_chain.push(metadata.name.clone());
                let inline_definition = Definition::new(nested.name.clone(), groups.to_vec());
                let inlined = self.describe_properties(&inline_definition, describer, inline_chain);
                inline_chain.pop();
                properties.extend(inlined?);
                continue;
            }

            let schema = self.property_schema(&metadata, property, groups, describer)?;
            properties.insert(property.serialized_name.clone(), schema);
        }

        if metadata.should_add_discriminator_property()
            && let Some(field_name) = metadata.discriminator_field_name.as_deref()
        {
            let mut property = properties
                .get(field_name)
                .cloned()
                .unwrap_or_else(Schema::string);
            if let Some(values) = metadata.discriminator_enum() {
                property.r#enum = Some(values);
            }
            properties.insert(field_name.to_string(), property);
        }

        Ok(properties)
    }

    fn property_schema(
        &self,
        metadata: &ClassMetadata,
        property: &PropertyMetadata,
        groups: &[String],
        describer: &dyn ObjectDescriber,
    ) -> Result<Schema> {
        let untyped = TypeDescriptor::new("string");
        let descriptor = property.type_descriptor.as_ref().unwrap_or(&untyped);

        if let Some(element) = descriptor.nested_array_type() {
            let items = describer.describe(&Definition::new(element, groups.to_vec()))?;
            return Ok(Schema::array(items));
        }

        let schema = match descriptor.name.as_str() {
            "string" => {
                let mut schema = Schema::string();
                if metadata.is_discriminator_field(&property.serialized_name) {
                    schema.r#enum = metadata.discriminator_enum();
                }
                schema
            }
            "array" => Schema::array(Schema::string()),
            "bool" | "boolean" => Schema::boolean(),
            "int" | "integer" => Schema::integer(),
            format @ ("double" | "float") => Schema::number().with_format(format),
            "DateTime" | "DateTimeImmutable" => Schema::string().with_format(FORMAT_DATE_TIME),
            class_name => describer.describe(&Definition::new(class_name, groups.to_vec()))?,
        };
        Ok(schema)
    }

    fn class_metadata(&self, class_name: &str) -> Result<ClassMetadata> {
        match self.provider.metadata_for(class_name) {
            Some(Metadata::Class(metadata)) => Ok(metadata),
            Some(other) => Err(SchemaError::TypeMismatch {
                expected: "class metadata".to_string(),
                found: other.kind().to_string(),
            }),
            None => Err(SchemaError::NotFound(format!(
                "no metadata found for class {class_name}"
            ))),
        }
    }
}
