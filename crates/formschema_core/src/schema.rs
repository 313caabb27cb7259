//! Schema-related structure definitions

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Format tag marking a leaf as uploaded file content.
pub const FORMAT_BINARY: &str = "binary";

/// Format tag for date-time strings.
pub const FORMAT_DATE_TIME: &str = "date-time";

/// JSON Schema type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Null,
}

/// Serialize `Option<f64>` as integer when the value has no fractional part.
///
/// Keeps `minimum`/`maximum` taken from integer field options rendered as `0`
/// instead of `0.0`.
#[allow(clippy::ref_option)] // serde serialize_with mandates &Option<T> signature
fn serialize_number_constraint<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match value {
        Some(v) if v.fract() == 0.0 => {
            #[allow(clippy::cast_possible_truncation)]
            let int_val = *v as i64;
            serializer.serialize_some(&int_val)
        }
        Some(v) => serializer.serialize_some(v),
        None => serializer.serialize_none(),
    }
}

/// OpenAPI Schema Object.
///
/// `properties` keeps insertion order, which is the order fields and
/// metadata properties were discovered in. `required` is never serialized as
/// an empty list: builders call [`Schema::normalize_required`] before handing
/// a schema back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Schema type
    #[serde(rename = "type")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,
    /// Format (for numbers or strings)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    // Number constraints
    /// Minimum value
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_number_constraint"
    )]
    pub minimum: Option<f64>,
    /// Maximum value
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_number_constraint"
    )]
    pub maximum: Option<f64>,

    // String constraints
    /// Minimum length
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    /// Maximum length
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Pattern (regex)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Array item schema
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,

    /// Property definitions, in discovery order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, Schema>>,
    /// List of required properties
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,

    /// Enum values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#enum: Option<Vec<serde_json::Value>>,
    /// Exactly one variant must match; the variants own the shape
    #[serde(skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<Schema>>,
    /// Discriminator for `oneOf` variants
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<Discriminator>,
}

impl Schema {
    /// Create a new schema
    #[must_use]
    pub fn new(schema_type: SchemaType) -> Self {
        Self {
            schema_type: Some(schema_type),
            ..Self::default()
        }
    }

    /// Create a string schema
    #[must_use]
    pub fn string() -> Self {
        Self::new(SchemaType::String)
    }

    /// Create an integer schema
    #[must_use]
    pub fn integer() -> Self {
        Self::new(SchemaType::Integer)
    }

    /// Create a number schema
    #[must_use]
    pub fn number() -> Self {
        Self::new(SchemaType::Number)
    }

    /// Create a boolean schema
    #[must_use]
    pub fn boolean() -> Self {
        Self::new(SchemaType::Boolean)
    }

    /// Create a string schema carrying file content
    #[must_use]
    pub fn binary() -> Self {
        Self::string().with_format(FORMAT_BINARY)
    }

    /// Create an array schema
    #[must_use]
    pub fn array(items: Self) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::new(SchemaType::Array)
        }
    }

    /// Create an object schema with no properties yet
    #[must_use]
    pub fn object() -> Self {
        Self::new(SchemaType::Object)
    }

    /// Create a polymorphic schema: one of `variants`, selected by `property_name`
    #[must_use]
    pub fn one_of(variants: Vec<Self>, property_name: impl Into<String>) -> Self {
        Self {
            one_of: Some(variants),
            discriminator: Some(Discriminator::new(property_name)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    #[must_use]
    pub fn is_binary(&self) -> bool {
        self.format.as_deref() == Some(FORMAT_BINARY)
    }

    #[must_use]
    pub fn is_array(&self) -> bool {
        self.schema_type == Some(SchemaType::Array)
    }

    /// Array of binary leaves (e.g. a multiple file upload).
    #[must_use]
    pub fn is_binary_array(&self) -> bool {
        self.is_array() && self.items.as_deref().is_some_and(Self::is_binary)
    }

    /// Look up a property by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Self> {
        self.properties.as_ref().and_then(|props| props.get(name))
    }

    /// Insert or replace a property.
    ///
    /// Replacing keeps the original position of the key.
    pub fn insert_property(&mut self, name: impl Into<String>, schema: Self) {
        self.properties
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), schema);
    }

    /// Mark a property as required. Names are kept unique.
    pub fn add_required(&mut self, name: impl Into<String>) {
        let name = name.into();
        let required = self.required.get_or_insert_with(Vec::new);
        if !required.contains(&name) {
            required.push(name);
        }
    }

    #[must_use]
    pub fn is_required(&self, name: &str) -> bool {
        self.required
            .as_ref()
            .is_some_and(|required| required.iter().any(|r| r == name))
    }

    /// Collapse an empty `required` list to absent.
    pub fn normalize_required(&mut self) {
        if self.required.as_ref().is_some_and(Vec::is_empty) {
            self.required = None;
        }
    }

    /// Append a line to the description. Every line break of the result is
    /// rendered as an HTML line break.
    pub fn append_description(&mut self, text: &str) {
        let joined = match self.description.take() {
            Some(existing) if !existing.is_empty() => format!("{existing}\n{text}"),
            _ => text.to_string(),
        };
        self.description = Some(html_line_breaks(&joined));
    }
}

/// Insert `<br>` before every line break not already preceded by one.
fn html_line_breaks(text: &str) -> String {
    let mut html = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let Some(body) = line.strip_suffix('\n') else {
            html.push_str(line);
            continue;
        };
        let body = body.strip_suffix('\r').unwrap_or(body);
        html.push_str(body);
        if !body.ends_with("<br>") {
            html.push_str("<br>");
        }
        html.push_str(&line[body.len()..]);
    }
    html
}

/// Discriminator object for polymorphism support
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discriminator {
    /// The name of the property in the payload that will hold the discriminator value
    pub property_name: String,
}

impl Discriminator {
    #[must_use]
    pub fn new(property_name: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
        }
    }
}
