//! Load/dump function pairs shared by every field kind.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AttrError;
use crate::model::{dump_model, FromRaw, RawMapping};
use crate::RawMap;

/// Raw value → typed value conversion applied on read.
pub type LoadFn<T> = Arc<dyn Fn(&Value) -> Result<T, AttrError> + Send + Sync>;

/// Typed value → raw value conversion applied on write.
pub type DumpFn<T> = Arc<dyn Fn(&T) -> Result<Value, AttrError> + Send + Sync>;

pub(crate) struct Codec<T> {
    pub(crate) load: LoadFn<T>,
    pub(crate) dump: DumpFn<T>,
}

impl<T> Clone for Codec<T> {
    fn clone(&self) -> Self {
        Self {
            load: Arc::clone(&self.load),
            dump: Arc::clone(&self.dump),
        }
    }
}

impl<T: Serialize + DeserializeOwned + 'static> Codec<T> {
    /// Passes raw values through serde. For `T = Value` this is the identity.
    pub(crate) fn serde() -> Self {
        Self {
            load: Arc::new(|raw: &Value| -> Result<T, AttrError> { Ok(T::deserialize(raw)?) }),
            dump: Arc::new(|value: &T| -> Result<Value, AttrError> {
                Ok(serde_json::to_value(value)?)
            }),
        }
    }
}

impl<T: FromRaw<RawMap> + RawMapping + 'static> Codec<T> {
    /// Wraps a sub-mapping as a model on read and extracts it on write.
    pub(crate) fn model() -> Self {
        Self {
            load: Arc::new(|raw: &Value| -> Result<T, AttrError> {
                match raw {
                    Value::Object(map) => Ok(T::from_raw(map.clone())),
                    other => Err(AttrError::mismatch("mapping", other)),
                }
            }),
            dump: Arc::new(|value: &T| dump_model(value)),
        }
    }
}

impl<T> Codec<T> {
    pub(crate) fn load(&self, raw: &Value, key: &str) -> Result<T, AttrError> {
        (self.load)(raw).map_err(|err| err.at_key(key))
    }

    pub(crate) fn dump(&self, value: &T, key: &str) -> Result<Value, AttrError> {
        (self.dump)(value).map_err(|err| err.at_key(key))
    }
}

/// Name, key override and conversions common to all field declarations.
pub(crate) struct Slot<T> {
    pub(crate) name: String,
    pub(crate) key: Option<String>,
    pub(crate) codec: Codec<T>,
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            key: self.key.clone(),
            codec: self.codec.clone(),
        }
    }
}

impl<T> Slot<T> {
    pub(crate) fn new(name: String, codec: Codec<T>) -> Self {
        Self {
            name,
            key: None,
            codec,
        }
    }

    pub(crate) fn key(&self) -> &str {
        self.key.as_deref().unwrap_or(&self.name)
    }

    pub(crate) fn missing(&self) -> AttrError {
        AttrError::MissingField {
            key: self.key().to_string(),
        }
    }

    pub(crate) fn is_set<I: RawMapping + ?Sized>(&self, instance: &I) -> Result<bool, AttrError> {
        Ok(instance.raw_mapping()?.contains_key(self.key()))
    }

    pub(crate) fn delete<I: RawMapping + ?Sized>(&self, instance: &mut I) -> Result<(), AttrError> {
        let key = self.key();
        match instance.raw_mapping_mut()?.shift_remove(key) {
            Some(_) => Ok(()),
            None => Err(AttrError::KeyNotFound {
                key: key.to_string(),
            }),
        }
    }

    pub(crate) fn store<I: RawMapping + ?Sized>(
        &self,
        instance: &mut I,
        raw: Value,
    ) -> Result<(), AttrError> {
        instance
            .raw_mapping_mut()?
            .insert(self.key().to_string(), raw);
        Ok(())
    }

    /// Borrows the sub-mapping at this slot's key as a model.
    pub(crate) fn project<'a, I, M>(&self, instance: &'a mut I) -> Result<M, AttrError>
    where
        I: RawMapping + ?Sized,
        M: FromRaw<&'a mut RawMap>,
    {
        let key = self.key();
        match instance.raw_mapping_mut()?.get_mut(key) {
            Some(Value::Object(map)) => Ok(M::from_raw(map)),
            Some(other) => Err(AttrError::mismatch("mapping", other).at_key(key)),
            None => Err(self.missing()),
        }
    }
}
