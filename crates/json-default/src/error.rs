use thiserror::Error;

/// Errors raised while converting a value into JSON.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// No converter is registered for the type, exactly or by capability.
    #[error("object of type {type_name} is not JSON serializable")]
    UnsupportedType { type_name: String },
    /// A registered converter rejected the value.
    #[error("cannot convert {type_name}: {message}")]
    Conversion { type_name: String, message: String },
}

impl ConvertError {
    pub fn unsupported(type_name: impl Into<String>) -> Self {
        Self::UnsupportedType {
            type_name: type_name.into(),
        }
    }

    /// Conversion failure for a value of type `T`.
    pub fn conversion<T: ?Sized>(message: impl Into<String>) -> Self {
        Self::Conversion {
            type_name: std::any::type_name::<T>().to_string(),
            message: message.into(),
        }
    }
}
