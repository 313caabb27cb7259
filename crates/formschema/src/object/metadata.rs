//! Class metadata: the serialized shape of an object type.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::Value;

/// Declared type of a property, e.g. `array<string, App\Line>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub name: String,
    pub params: Vec<TypeDescriptor>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// `array<element>`
    pub fn array_of(element: impl Into<String>) -> Self {
        Self {
            name: "array".to_string(),
            params: vec![Self::new(element)],
        }
    }

    /// `array<key, element>`
    pub fn map_of(key: impl Into<String>, element: impl Into<String>) -> Self {
        Self {
            name: "array".to_string(),
            params: vec![Self::new(key), Self::new(element)],
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: Vec<Self>) -> Self {
        self.params = params;
        self
    }

    /// Element type of an array or collection descriptor. A keyed array uses
    /// its second parameter.
    pub fn nested_array_type(&self) -> Option<&str> {
        if self.name != "array" && self.name != "ArrayCollection" {
            return None;
        }
        self.params
            .get(1)
            .or_else(|| self.params.first())
            .map(|param| param.name.as_str())
    }
}

/// One serialized property of a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyMetadata {
    pub name: String,
    pub serialized_name: String,
    pub type_descriptor: Option<TypeDescriptor>,
    /// Splice the nested type's properties into the owner instead of nesting.
    pub inline: bool,
    pub groups: Vec<String>,
    pub since_version: Option<String>,
    pub until_version: Option<String>,
}

impl PropertyMetadata {
    pub fn new(name: impl Into<String>, type_descriptor: TypeDescriptor) -> Self {
        let name = name.into();
        Self {
            serialized_name: name.clone(),
            name,
            type_descriptor: Some(type_descriptor),
            inline: false,
            groups: Vec::new(),
            since_version: None,
            until_version: None,
        }
    }

    /// A property without declared type.
    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            type_descriptor: None,
            ..Self::new(name, TypeDescriptor::new("string"))
        }
    }

    #[must_use]
    pub fn serialized_as(mut self, serialized_name: impl Into<String>) -> Self {
        self.serialized_name = serialized_name.into();
        self
    }

    #[must_use]
    pub fn inline(mut self) -> Self {
        self.inline = true;
        self
    }

    #[must_use]
    pub fn in_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn since(mut self, version: impl Into<String>) -> Self {
        self.since_version = Some(version.into());
        self
    }

    #[must_use]
    pub fn until(mut self, version: impl Into<String>) -> Self {
        self.until_version = Some(version.into());
        self
    }
}

/// Class-level metadata with discriminator configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMetadata {
    pub name: String,
    pub properties: Vec<PropertyMetadata>,
    pub discriminator_field_name: Option<String>,
    /// Fixed value for a concrete subclass.
    pub discriminator_value: Option<String>,
    /// Discriminator value to class name, in declaration order.
    pub discriminator_map: IndexMap<String, String>,
    pub discriminator_base_class: Option<String>,
    pub discriminator_disabled: bool,
}

impl ClassMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
            discriminator_field_name: None,
            discriminator_value: None,
            discriminator_map: IndexMap::new(),
            discriminator_base_class: None,
            discriminator_disabled: false,
        }
    }

    #[must_use]
    pub fn with_property(mut self, property: PropertyMetadata) -> Self {
        self.properties.push(property);
        self
    }

    /// Make this class the base of a discriminated hierarchy.
    #[must_use]
    pub fn with_discriminator<I, K, V>(mut self, field_name: impl Into<String>, map: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.discriminator_field_name = Some(field_name.into());
        self.discriminator_map = map.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self.discriminator_base_class = Some(self.name.clone());
        self
    }

    #[must_use]
    pub fn with_discriminator_value(mut self, value: impl Into<String>) -> Self {
        self.discriminator_value = Some(value.into());
        self
    }

    #[must_use]
    pub fn with_discriminator_base_class(mut self, base_class: impl Into<String>) -> Self {
        self.discriminator_base_class = Some(base_class.into());
        self
    }

    #[must_use]
    pub fn disable_discriminator(mut self) -> Self {
        self.discriminator_disabled = true;
        self
    }

    /// Allowed discriminator values: the fixed value if set, else every map key.
    pub fn discriminator_enum(&self) -> Option<Vec<Value>> {
        if let Some(value) = &self.discriminator_value {
            return Some(vec![Value::String(value.clone())]);
        }
        if self.discriminator_map.is_empty() {
            return None;
        }
        Some(
            self.discriminator_map
                .keys()
                .cloned()
                .map(Value::String)
                .collect(),
        )
    }

    pub fn is_discriminator_field(&self, serialized_name: &str) -> bool {
        self.discriminator_field_name.as_deref() == Some(serialized_name)
    }

    /// The discriminator property has to be synthesized: this class defines
    /// the discriminator and does not declare the property itself.
    pub fn should_add_discriminator_property(&self) -> bool {
        let Some(field_name) = self.discriminator_field_name.as_deref() else {
            return false;
        };
        if self.discriminator_disabled {
            return false;
        }
        if self.discriminator_base_class.as_deref() != Some(self.name.as_str()) {
            return false;
        }
        !self
            .properties
            .iter()
            .any(|p| p.name == field_name || p.serialized_name == field_name)
    }
}

/// What a provider knows about an identifier. Only class-level metadata can
/// be described.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Metadata {
    Class(ClassMetadata),
    Other { kind: String },
}

impl Metadata {
    pub fn kind(&self) -> &str {
        match self {
            Self::Class(_) => "class metadata",
            Self::Other { kind } => kind,
        }
    }
}

pub trait MetadataProvider {
    /// `None` when nothing is known about `class_name`.
    fn metadata_for(&self, class_name: &str) -> Option<Metadata>;
}

/// [`MetadataProvider`] over a fixed set of classes.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetadataProvider {
    entries: HashMap<String, Metadata>,
}

impl InMemoryMetadataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, metadata: ClassMetadata) {
        self.entries
            .insert(metadata.name.clone(), Metadata::Class(metadata));
    }

    #[must_use]
    pub fn with_class(mut self, metadata: ClassMetadata) -> Self {
        self.register(metadata);
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, class_name: impl Into<String>, metadata: Metadata) -> Self {
        self.entries.insert(class_name.into(), metadata);
        self
    }
}

impl MetadataProvider for InMemoryMetadataProvider {
    fn metadata_for(&self, class_name: &str) -> Option<Metadata> {
        self.entries.get(class_name).cloned()
    }
}
