//! Content negotiation for request bodies built from field trees.
//!
//! - no file property at all: `application/json` (nested) and
//!   `application/x-www-form-urlencoded` (flattened)
//! - a required file property outside PATCH: `multipart/form-data` only
//! - otherwise: JSON and URL-encoded without the file properties, plus
//!   multipart with everything

use formschema_core::route::{
    CONTENT_TYPE_APPLICATION_FORM, CONTENT_TYPE_APPLICATION_JSON,
    CONTENT_TYPE_MULTIPART_FORM_DATA,
};
use formschema_core::{HttpMethod, MediaType, RequestBody, Schema};
use indexmap::IndexMap;
use tracing::debug;

use crate::error::Result;
use crate::field::{Field, FieldCursor};
use crate::form::FormDescriber;
use crate::name_resolver::{FlatArray, FormName};

pub struct RequestBodyContent<'a> {
    form_describer: &'a FormDescriber<'a>,
}

impl<'a> RequestBodyContent<'a> {
    pub const fn new(form_describer: &'a FormDescriber<'a>) -> Self {
        Self { form_describer }
    }

    /// Media types accepted for `field` under `method`, in negotiation order.
    pub fn describe(&self, field: &Field, method: HttpMethod) -> Result<IndexMap<String, MediaType>> {
        let root = FieldCursor::root(field);
        let json_schema = self.form_describer.add_deep_schema(&root, &FormName, method)?;
        let form_data_schema = self
            .form_describer
            .add_flatten_schema(&root, &FlatArray, method)?;

        let mut content = IndexMap::new();

        if !schema_has_file_properties(&json_schema) {
            debug!(field = field.name(), %method, "no file properties");
            content.insert(
                CONTENT_TYPE_APPLICATION_JSON.to_string(),
                MediaType::new(json_schema),
            );
            content.insert(
                CONTENT_TYPE_APPLICATION_FORM.to_string(),
                MediaType::new(form_data_schema),
            );
            return Ok(content);
        }

        let multipart_only =
            !method.is_patch() && schema_contains_required_file_properties(&json_schema);
        debug!(field = field.name(), %method, multipart_only, "file properties present");

        if !multipart_only {
            content.insert(
                CONTENT_TYPE_APPLICATION_JSON.to_string(),
                MediaType::new(schema_without_file_properties(&json_schema)),
            );
            content.insert(
                CONTENT_TYPE_APPLICATION_FORM.to_string(),
                MediaType::new(schema_without_file_properties(&form_data_schema)),
            );
        }
        content.insert(
            CONTENT_TYPE_MULTIPART_FORM_DATA.to_string(),
            MediaType::new(form_data_schema),
        );

        Ok(content)
    }

    /// Request body object wrapping [`Self::describe`].
    pub fn request_body(&self, field: &Field, method: HttpMethod) -> Result<RequestBody> {
        Ok(RequestBody {
            description: None,
            required: Some(true),
            content: self.describe(field, method)?,
        })
    }
}

/// Whether any schema in the tree, through properties and array items, is a
/// binary leaf.
pub fn schema_has_file_properties(schema: &Schema) -> bool {
    if schema.is_binary() {
        return true;
    }
    let in_properties = schema
        .properties
        .as_ref()
        .is_some_and(|props| props.values().any(schema_has_file_properties));
    in_properties
        || schema
            .items
            .as_deref()
            .is_some_and(schema_has_file_properties)
}

/// Whether a binary property is listed in the `required` set of the object
/// that owns it, at any nesting level.
pub fn schema_contains_required_file_properties(schema: &Schema) -> bool {
    if let Some(props) = &schema.properties {
        let required_here = props
            .iter()
            .any(|(name, property)| property.is_binary() && schema.is_required(name));
        if required_here || props.values().any(schema_contains_required_file_properties) {
            return true;
        }
    }
    schema
        .items
        .as_deref()
        .is_some_and(schema_contains_required_file_properties)
}

/// Deep copy of `schema` without binary properties and arrays of binaries.
///
/// Only the items of array properties are descended into; binaries nested
/// under plain object properties are kept.
pub fn schema_without_file_properties(schema: &Schema) -> Schema {
    let mut stripped = schema.clone();
    remove_file_properties(&mut stripped);
    stripped
}

fn remove_file_properties(schema: &mut Schema) {
    let Some(props) = schema.properties.as_mut() else {
        return;
    };
    props.retain(|_, property| !property.is_binary() && !property.is_binary_array());

    for property in props.values_mut().filter(|p| p.is_array()) {
        if let Some(items) = property.items.as_deref_mut() {
            remove_file_properties(items);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload_schema(required: bool) -> Schema {
        let mut schema = Schema::object();
        schema.insert_property("title", Schema::string());
        schema.insert_property("file", Schema::binary());
        if required {
            schema.add_required("file");
        }
        schema
    }

    #[test]
    fn detects_binary_in_properties_and_items() {
        assert!(schema_has_file_properties(&upload_schema(false)));
        assert!(schema_has_file_properties(&Schema::array(Schema::binary())));

        let mut nested = Schema::object();
        nested.insert_property("doc", upload_schema(false));
        assert!(schema_has_file_properties(&nested));

        let mut plain = Schema::object();
        plain.insert_property("title", Schema::string());
        assert!(!schema_has_file_properties(&plain));
    }

    #[test]
    fn required_file_is_checked_at_owning_level() {
        assert!(schema_contains_required_file_properties(&upload_schema(true)));
        assert!(!schema_contains_required_file_properties(&upload_schema(false)));

        let mut nested = Schema::object();
        nested.insert_property("doc", upload_schema(true));
        assert!(schema_contains_required_file_properties(&nested));

        // required at the outer level, but the binary lives one level down
        let mut outer = Schema::object();
        outer.insert_property("doc", upload_schema(false));
        outer.add_required("doc");
        assert!(!schema_contains_required_file_properties(&outer));
    }

    #[test]
    fn strips_binary_and_binary_arrays() {
        let mut schema = upload_schema(true);
        schema.insert_property("gallery", Schema::array(Schema::binary()));
        schema.insert_property("tags", Schema::array(Schema::string()));

        let stripped = schema_without_file_properties(&schema);
        let keys: Vec<_> = stripped.properties.as_ref().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["title", "tags"]);
        // original untouched
        assert!(schema.property("file").is_some());
    }

    #[test]
    fn strips_inside_array_items() {
        let mut schema = Schema::object();
        schema.insert_property("entries", Schema::array(upload_schema(false)));

        let stripped = schema_without_file_properties(&schema);
        let items = stripped.property("entries").unwrap().items.as_deref().unwrap();
        assert!(items.property("file").is_none());
        assert!(items.property("title").is_some());
        assert!(schema_has_file_properties(&schema));
    }

    #[test]
    fn binary_under_plain_object_is_kept() {
        // stripping does not descend into object properties
        let mut schema = Schema::object();
        schema.insert_property("doc", upload_schema(false));

        let stripped = schema_without_file_properties(&schema);
        assert_eq!(stripped, schema);
        assert!(schema_has_file_properties(&stripped));
    }

    #[test]
    fn stripping_without_files_is_identity_and_idempotent() {
        let mut schema = Schema::object();
        schema.insert_property("title", Schema::string());
        schema.insert_property("tags", Schema::array(Schema::string()));
        schema.add_required("title");

        let once = schema_without_file_properties(&schema);
        assert_eq!(once, schema);
        assert_eq!(schema_without_file_properties(&once), once);

        let with_file = upload_schema(false);
        let stripped = schema_without_file_properties(&with_file);
        assert_eq!(schema_without_file_properties(&stripped), stripped);
    }
}
