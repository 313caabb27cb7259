//! Generator configuration

use serde::Deserialize;

use crate::error::Result;
use crate::object::exclusion::DEFAULT_GROUP;

const DEFAULT_MAX_DEPTH: usize = 32;

/// Settings shared by one generation pass.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// API version compared against property `since`/`until` versions.
    /// `None` disables version exclusion.
    pub api_version: Option<String>,
    /// Nesting cap for field-tree traversal.
    pub max_depth: usize,
    /// Serialization groups used when a definition asks for none.
    pub default_groups: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_version: None,
            max_depth: DEFAULT_MAX_DEPTH,
            default_groups: vec![DEFAULT_GROUP.to_string()],
        }
    }
}

impl GeneratorConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }
}
