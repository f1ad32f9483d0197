use serde_json::Value;
use thiserror::Error;

/// Errors raised while projecting fields onto a raw mapping.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttrError {
    /// A field without a default was read before its key existed.
    #[error("`{key}` is not found")]
    MissingField { key: String },
    /// The object used as a model cannot supply a raw mapping.
    #[error("{type_name} does not provide a raw mapping")]
    Contract { type_name: &'static str },
    #[error("key `{key}` is not found")]
    KeyNotFound { key: String },
    #[error("index {index} is out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("`{key}` holds a {found}, expected a {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
    /// A load or dump function rejected its input.
    #[error("cannot convert `{key}`: {message}")]
    Conversion { key: String, message: String },
}

impl AttrError {
    /// Conversion failure raised from inside a load/dump function.
    ///
    /// The key is filled in by the field that invoked the function.
    pub fn conversion(message: impl Into<String>) -> Self {
        Self::Conversion {
            key: String::new(),
            message: message.into(),
        }
    }

    pub(crate) fn mismatch(expected: &'static str, found: &Value) -> Self {
        Self::TypeMismatch {
            key: String::new(),
            expected,
            found: kind_of(found),
        }
    }

    /// Attaches `key` to conversion and mismatch errors that do not carry one yet.
    pub(crate) fn at_key(self, key: &str) -> Self {
        match self {
            Self::Conversion { key: k, message } if k.is_empty() => Self::Conversion {
                key: key.to_string(),
                message,
            },
            Self::TypeMismatch {
                key: k,
                expected,
                found,
            } if k.is_empty() => Self::TypeMismatch {
                key: key.to_string(),
                expected,
                found,
            },
            other => other,
        }
    }
}

impl From<serde_json::Error> for AttrError {
    fn from(err: serde_json::Error) -> Self {
        Self::conversion(err.to_string())
    }
}

/// Human-readable name of a raw value's kind.
pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}
