//! Request-related structure definitions

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::schema::Schema;

pub const CONTENT_TYPE_APPLICATION_JSON: &str = "application/json";
pub const CONTENT_TYPE_APPLICATION_FORM: &str = "application/x-www-form-urlencoded";
pub const CONTENT_TYPE_MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Trace,
}

impl HttpMethod {
    /// Partial updates: nothing is required.
    #[must_use]
    pub const fn is_patch(self) -> bool {
        matches!(self, Self::Patch)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Trace => "TRACE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Media type definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaType {
    /// Inline schema
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

impl MediaType {
    #[must_use]
    pub const fn new(schema: Schema) -> Self {
        Self {
            schema: Some(schema),
        }
    }
}

/// Request body definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBody {
    /// Request body description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the body must be sent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Content by media type, in negotiation order
    pub content: IndexMap<String, MediaType>,
}
