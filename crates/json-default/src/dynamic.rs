//! Documents mixing plain JSON with values only a [`Converter`] can encode.

use std::any::{type_name, Any};
use std::fmt;

use serde_json::{Map, Value};

use crate::error::ConvertError;
use crate::registry::Converter;

/// A value of arbitrary type awaiting conversion, tagged with its type name.
pub struct Opaque {
    type_name: &'static str,
    value: Box<dyn Any + Send + Sync>,
}

impl Opaque {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn value(&self) -> &(dyn Any + Send + Sync) {
        self.value.as_ref()
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Opaque").field(&self.type_name).finish()
    }
}

/// A JSON-shaped tree whose leaves may be opaque values.
///
/// Natively representable parts pass through serialization untouched;
/// each opaque leaf is handed to the converter.
#[derive(Debug)]
pub enum Dynamic {
    Json(Value),
    Array(Vec<Dynamic>),
    /// Entries keep their insertion order.
    Object(Vec<(String, Dynamic)>),
    Opaque(Opaque),
}

impl Dynamic {
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Self::Opaque(Opaque {
            type_name: type_name::<T>(),
            value: Box::new(value),
        })
    }

    pub fn array<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Dynamic>,
    {
        Self::Array(items.into_iter().map(Into::into).collect())
    }

    pub fn object<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Dynamic>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<Value> for Dynamic {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl Converter {
    /// Serializes `doc` into a JSON value, converting opaque leaves.
    ///
    /// The first leaf no entry accepts aborts the whole conversion.
    pub fn to_value(&self, doc: &Dynamic) -> Result<Value, ConvertError> {
        match doc {
            Dynamic::Json(value) => Ok(value.clone()),
            Dynamic::Array(items) => items
                .iter()
                .map(|item| self.to_value(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Dynamic::Object(entries) => {
                let mut map = Map::new();
                for (key, item) in entries {
                    map.insert(key.clone(), self.to_value(item)?);
                }
                Ok(Value::Object(map))
            }
            Dynamic::Opaque(opaque) => self.convert_any(opaque.value.as_ref(), opaque.type_name),
        }
    }

    /// Serializes `doc` into compact JSON text.
    pub fn to_string(&self, doc: &Dynamic) -> Result<String, ConvertError> {
        let value = self.to_value(doc)?;
        serde_json::to_string(&value).map_err(|e| ConvertError::conversion::<Value>(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_json_passes_through_an_empty_registry() {
        let doc = Dynamic::object([("a", Dynamic::array([json!(1), json!(null)]))]);
        assert_eq!(Converter::new().to_value(&doc).unwrap(), json!({"a": [1, null]}));
    }

    #[test]
    fn unsupported_leaf_names_its_type() {
        struct Widget;
        let doc = Dynamic::array([Dynamic::Json(json!(1)), Dynamic::opaque(Widget)]);
        let err = Converter::new().to_value(&doc).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::UnsupportedType { ref type_name } if type_name.ends_with("Widget")
        ));
    }

    #[test]
    fn object_keeps_entry_order() {
        let doc = Dynamic::object([("z", json!(1)), ("a", json!(2))]);
        assert_eq!(Converter::new().to_string(&doc).unwrap(), r#"{"z":1,"a":2}"#);
    }
}
