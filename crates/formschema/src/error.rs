use thiserror::Error;

pub type Result<T> = std::result::Result<T, SchemaError>;

/// Errors aborting a generation pass. None of them is recoverable: the
/// caller decides whether to fail the whole document or skip the endpoint.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("type mismatch: expected {expected}, got {found}")]
    TypeMismatch { expected: String, found: String },
    #[error("unsupported configuration: {0}")]
    UnsupportedConfiguration(String),
    #[error("cyclic type reference: {}", .0.join(" -> "))]
    CyclicType(Vec<String>),
    #[error("config: {0}")]
    Config(#[from] toml::de::Error),
}
