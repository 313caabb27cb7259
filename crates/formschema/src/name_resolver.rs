//! Property naming strategies for field-tree schemas.
//!
//! The nested shape names a property after its own field. The flat shapes
//! fold the whole path from the root into one key.

use crate::field::FieldCursor;

pub trait NameResolver {
    fn property_name(&self, field: &FieldCursor<'_>) -> String;

    /// `Some` for resolvers producing compound, single-level keys.
    fn as_flat(&self) -> Option<&dyn FlatNameResolver> {
        None
    }
}

/// Marker for resolvers whose names are full paths.
pub trait FlatNameResolver: NameResolver {}

/// The field's own name.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormName;

impl NameResolver for FormName {
    fn property_name(&self, field: &FieldCursor<'_>) -> String {
        field.name().to_string()
    }
}

/// `a[b][c]`: first segment as is, the rest in brackets.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatArray;

impl NameResolver for FlatArray {
    fn property_name(&self, field: &FieldCursor<'_>) -> String {
        match field.name_path().split_first() {
            Some((first, rest)) => bracketed(first, rest),
            None => String::new(),
        }
    }

    fn as_flat(&self) -> Option<&dyn FlatNameResolver> {
        Some(self)
    }
}

impl FlatNameResolver for FlatArray {}

/// Like [`FlatArray`], but every segment is bracketed under a fixed prefix.
///
/// Keeps collection-entry properties namespaced under the collection's own
/// key, e.g. `items[qty]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixedFlatArray {
    prefix: String,
}

impl PrefixedFlatArray {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl NameResolver for PrefixedFlatArray {
    fn property_name(&self, field: &FieldCursor<'_>) -> String {
        bracketed(&self.prefix, &field.name_path())
    }

    fn as_flat(&self) -> Option<&dyn FlatNameResolver> {
        Some(self)
    }
}

impl FlatNameResolver for PrefixedFlatArray {}

/// Path segments joined with a plain separator, e.g. `a.b.c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatJoined {
    separator: String,
}

impl FlatJoined {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }
}

impl Default for FlatJoined {
    fn default() -> Self {
        Self::new(".")
    }
}

impl NameResolver for FlatJoined {
    fn property_name(&self, field: &FieldCursor<'_>) -> String {
        field.name_path().join(&self.separator)
    }

    fn as_flat(&self) -> Option<&dyn FlatNameResolver> {
        Some(self)
    }
}

impl FlatNameResolver for FlatJoined {}

fn bracketed(first: &str, rest: &[&str]) -> String {
    rest.iter().fold(first.to_string(), |mut name, segment| {
        name.push('[');
        name.push_str(segment);
        name.push(']');
        name
    })
}
