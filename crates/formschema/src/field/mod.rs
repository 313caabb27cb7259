//! Field trees: the typed, hierarchical description of a request input.

mod factory;

pub use factory::{FieldDefinition, FieldFactory, FieldRegistry};

use serde_json::{Map, Value};

pub const BLOCK_COLLECTION: &str = "collection";
pub const BLOCK_POLYMORPHIC_COLLECTION: &str = "polymorphic_collection";

pub const OPTION_ENTRY_TYPE: &str = "entry_type";
pub const OPTION_ENTRY_TYPES: &str = "entry_types";
pub const OPTION_VALIDATION_GROUPS: &str = "validation_groups";
pub const OPTION_DISCRIMINATOR_FIELD_NAME: &str = "discriminator_field_name";

/// Structural kind of a field, attached by whoever builds the tree.
///
/// Everything except [`TypeCategory::Custom`] is a builtin type: it is
/// described directly as a leaf. Custom types are user-defined compounds whose
/// children get walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    BuiltinScalar,
    BuiltinCollection,
    BuiltinPolymorphicCollection,
    Custom,
}

/// One node of a field tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    block_prefix: String,
    category: TypeCategory,
    required: bool,
    options: Map<String, Value>,
    children: Vec<Field>,
}

impl Field {
    fn new(name: impl Into<String>, block_prefix: impl Into<String>, category: TypeCategory) -> Self {
        Self {
            name: name.into(),
            block_prefix: block_prefix.into(),
            category,
            required: true,
            options: Map::new(),
            children: Vec::new(),
        }
    }

    /// A builtin scalar field such as `text`, `integer` or `file`.
    pub fn builtin(name: impl Into<String>, block_prefix: impl Into<String>) -> Self {
        Self::new(name, block_prefix, TypeCategory::BuiltinScalar)
    }

    /// A user-defined compound field.
    pub fn custom(name: impl Into<String>, block_prefix: impl Into<String>) -> Self {
        Self::new(name, block_prefix, TypeCategory::Custom)
    }

    /// A repeatable field whose entries are built from `entry_type`.
    pub fn collection(name: impl Into<String>, entry_type: impl Into<String>) -> Self {
        Self::new(name, BLOCK_COLLECTION, TypeCategory::BuiltinCollection)
            .with_option(OPTION_ENTRY_TYPE, Value::String(entry_type.into()))
    }

    /// A repeatable field whose entries are one of `entry_types`, told apart
    /// by `discriminator_field_name`.
    pub fn polymorphic_collection<I, S>(
        name: impl Into<String>,
        discriminator_field_name: impl Into<String>,
        entry_types: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry_types = entry_types
            .into_iter()
            .map(|t| Value::String(t.into()))
            .collect();
        Self::new(
            name,
            BLOCK_POLYMORPHIC_COLLECTION,
            TypeCategory::BuiltinPolymorphicCollection,
        )
        .with_option(
            OPTION_DISCRIMINATOR_FIELD_NAME,
            Value::String(discriminator_field_name.into()),
        )
        .with_option(OPTION_ENTRY_TYPES, Value::Array(entry_types))
    }

    #[must_use]
    pub fn optional(self) -> Self {
        self.required(false)
    }

    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    pub(crate) fn set_option(&mut self, key: impl Into<String>, value: Value) {
        self.options.insert(key.into(), value);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn block_prefix(&self) -> &str {
        &self.block_prefix
    }

    pub const fn category(&self) -> TypeCategory {
        self.category
    }

    /// The field's own required flag, ignoring its ancestors.
    pub const fn is_required(&self) -> bool {
        self.required
    }

    pub fn children(&self) -> &[Self] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_builtin(&self) -> bool {
        self.category != TypeCategory::Custom
    }

    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }

    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.option(key).and_then(Value::as_str)
    }

    pub fn option_bool(&self, key: &str) -> bool {
        self.option(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn entry_type(&self) -> Option<&str> {
        self.option_str(OPTION_ENTRY_TYPE)
    }

    pub fn discriminator_field_name(&self) -> Option<&str> {
        self.option_str(OPTION_DISCRIMINATOR_FIELD_NAME)
    }

    pub fn entry_types(&self) -> Vec<String> {
        string_list(self.option(OPTION_ENTRY_TYPES))
    }

    /// Validation groups; a single string counts as a one-element list.
    pub fn validation_groups(&self) -> Vec<String> {
        string_list(self.option(OPTION_VALIDATION_GROUPS))
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(values)) => values
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// A field together with the chain of ancestors it was reached through.
///
/// Trees are owned values without back-links; the cursor supplies the parent
/// view while walking. A cursor with no parent is a tree root.
#[derive(Debug, Clone, Copy)]
pub struct FieldCursor<'a> {
    field: &'a Field,
    parent: Option<&'a FieldCursor<'a>>,
}

impl<'a> FieldCursor<'a> {
    pub const fn root(field: &'a Field) -> Self {
        Self {
            field,
            parent: None,
        }
    }

    /// Attach a standalone tree below `parent`.
    pub const fn attached(field: &'a Field, parent: &'a FieldCursor<'a>) -> Self {
        Self {
            field,
            parent: Some(parent),
        }
    }

    pub fn child<'b>(&'b self, field: &'b Field) -> FieldCursor<'b> {
        FieldCursor {
            field,
            parent: Some(self),
        }
    }

    pub fn children<'b>(&'b self) -> impl Iterator<Item = FieldCursor<'b>> + 'b {
        self.field.children.iter().map(move |field| self.child(field))
    }

    pub const fn field(&self) -> &'a Field {
        self.field
    }

    pub const fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn name(&self) -> &'a str {
        &self.field.name
    }

    /// Required taking ancestors into account: a field below an optional
    /// parent is never effectively required.
    pub fn is_effectively_required(&self) -> bool {
        self.field.required && self.parent.is_none_or(FieldCursor::is_effectively_required)
    }

    /// Optional, non-root parent. Required descendants of such a parent are
    /// only required once the parent is sent.
    pub fn optional_parent(&self) -> Option<&'a FieldCursor<'a>> {
        self.parent
            .filter(|parent| !parent.is_root() && !parent.is_effectively_required())
    }

    /// Names from the topmost non-root ancestor down to this field.
    pub fn name_path(&self) -> Vec<&'a str> {
        let mut names = vec![self.name()];
        let mut current = self.parent;
        while let Some(parent) = current {
            if parent.is_root() {
                break;
            }
            names.push(parent.name());
            current = parent.parent;
        }
        names.reverse();
        names
    }
}
