//! Components section assembly.

use std::collections::BTreeMap;

use formschema_core::openapi::{Components, SecurityScheme, SecuritySchemeType};

use crate::object::ModelRegistry;

/// A security scheme as configured by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityDefinition {
    pub key: String,
    pub scheme_type: SecuritySchemeType,
    pub description: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub scheme: Option<String>,
    pub bearer_format: Option<String>,
}

impl SecurityDefinition {
    pub fn new(key: impl Into<String>, scheme_type: SecuritySchemeType) -> Self {
        Self {
            key: key.into(),
            scheme_type,
            description: None,
            name: None,
            location: None,
            scheme: None,
            bearer_format: None,
        }
    }

    /// HTTP bearer authentication.
    pub fn bearer(key: impl Into<String>, bearer_format: impl Into<String>) -> Self {
        Self {
            scheme: Some("bearer".to_string()),
            bearer_format: Some(bearer_format.into()),
            ..Self::new(key, SecuritySchemeType::Http)
        }
    }

    /// API key sent in `location` under `name`.
    pub fn api_key(key: impl Into<String>, name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            location: Some(location.into()),
            ..Self::new(key, SecuritySchemeType::ApiKey)
        }
    }

    fn to_scheme(&self) -> SecurityScheme {
        SecurityScheme {
            r#type: self.scheme_type.clone(),
            description: non_empty(self.description.as_ref()),
            name: non_empty(self.name.as_ref()),
            r#in: non_empty(self.location.as_ref()),
            scheme: non_empty(self.scheme.as_ref()),
            bearer_format: non_empty(self.bearer_format.as_ref()),
        }
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.is_empty()).cloned()
}

/// Components from every registered model, sorted by reference name, and
/// the given security definitions. `schemas` is left out when no model was
/// registered.
pub fn build_components(registry: &ModelRegistry, security: &[SecurityDefinition]) -> Components {
    let schemas: BTreeMap<_, _> = registry
        .referenced_models()
        .into_iter()
        .map(|model| (model.reference_name, model.schema))
        .collect();

    let security_schemes: BTreeMap<_, _> = security
        .iter()
        .map(|definition| (definition.key.clone(), definition.to_scheme()))
        .collect();

    Components {
        schemas: (!schemas.is_empty()).then_some(schemas),
        security_schemes: (!security_schemes.is_empty()).then_some(security_schemes),
    }
}
