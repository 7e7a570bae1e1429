use crate::metadata::FieldType;
use thiserror::Error;

/// Failures of the store/metadata layer that callers branch on.
/// I/O and parse failures stay `anyhow` errors with context.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("configuration file not loaded: {file}")]
    FileNotLoaded { file: String },

    #[error("`{key}` not found in {file}")]
    NotFound { file: String, key: String },

    #[error("invalid value {value:?} for `{key}` (expected {expected})")]
    InvalidValue {
        key: String,
        value: String,
        expected: FieldType,
    },

    #[error("`{key}` in {file} is not a boolean")]
    NotBool { file: String, key: String },

    #[error("no metadata for `{key}`")]
    UnknownKey { key: String },

    #[error("no bound field at index {index}")]
    NoSuchField { index: usize },
}
