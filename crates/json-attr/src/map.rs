//! Mapping-of-values fields and the live view they produce.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::trace;

use crate::codec::{Codec, Slot};
use crate::error::AttrError;
use crate::model::{FromRaw, RawMapping};
use crate::omit::MaybeOmit;
use crate::RawMap;

/// A field whose raw value is a string-keyed mapping, read through a [`MapView`].
pub struct MapField<T> {
    slot: Slot<T>,
    default: MaybeOmit<Vec<(String, T)>>,
}

impl<T: Serialize + DeserializeOwned + 'static> MapField<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_codec(name.into(), Codec::serde())
    }
}

impl<T: FromRaw<RawMap> + RawMapping + 'static> MapField<T> {
    /// Declares a mapping whose values are owned models.
    pub fn model(name: impl Into<String>) -> Self {
        Self::from_codec(name.into(), Codec::model())
    }
}

impl<T: 'static> MapField<T> {
    /// Declares a mapping field with explicit per-value load and dump functions.
    pub fn with_fns<L, D>(name: impl Into<String>, load: L, dump: D) -> Self
    where
        L: Fn(&Value) -> Result<T, AttrError> + Send + Sync + 'static,
        D: Fn(&T) -> Result<Value, AttrError> + Send + Sync + 'static,
    {
        Self::from_codec(
            name.into(),
            Codec {
                load: Arc::new(load),
                dump: Arc::new(dump),
            },
        )
    }

    pub fn with_load<L>(mut self, load: L) -> Self
    where
        L: Fn(&Value) -> Result<T, AttrError> + Send + Sync + 'static,
    {
        self.slot.codec.load = Arc::new(load);
        self
    }

    pub fn with_dump<D>(mut self, dump: D) -> Self
    where
        D: Fn(&T) -> Result<Value, AttrError> + Send + Sync + 'static,
    {
        self.slot.codec.dump = Arc::new(dump);
        self
    }
}

impl<T> MapField<T> {
    fn from_codec(name: String, codec: Codec<T>) -> Self {
        Self {
            slot: Slot::new(name, codec),
            default: MaybeOmit::Omitted,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.slot.key = Some(key.into());
        self
    }

    /// Entries written to the raw mapping the first time an absent key is viewed.
    pub fn with_default<K, It>(mut self, default: It) -> Self
    where
        K: Into<String>,
        It: IntoIterator<Item = (K, T)>,
    {
        let entries = default.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.default = MaybeOmit::Given(entries);
        self
    }

    pub fn name(&self) -> &str {
        &self.slot.name
    }

    pub fn key(&self) -> &str {
        self.slot.key()
    }

    /// Returns a live view over the raw mapping under this field's key.
    pub fn get<'a, I: RawMapping + ?Sized>(
        &self,
        instance: &'a mut I,
    ) -> Result<MapView<'a, T>, AttrError> {
        let key = self.key();
        let raw = instance.raw_mapping_mut()?;
        if !raw.contains_key(key) {
            let MaybeOmit::Given(default) = &self.default else {
                return Err(self.slot.missing());
            };
            let mut entries = RawMap::new();
            for (name, value) in default {
                let dumped = self.slot.codec.dump(value, &entry_key(key, name))?;
                entries.insert(name.clone(), dumped);
            }
            trace!(key, len = entries.len(), "materializing mapping default");
            raw.insert(key.to_string(), Value::Object(entries));
        }
        match raw.get_mut(key) {
            Some(Value::Object(entries)) => Ok(MapView {
                key: key.to_string(),
                entries,
                codec: self.slot.codec.clone(),
            }),
            Some(other) => Err(AttrError::mismatch("mapping", other).at_key(key)),
            None => Err(self.slot.missing()),
        }
    }

    /// Replaces the whole raw mapping with the dumped `entries`.
    pub fn set<I, K, It>(&self, instance: &mut I, entries: It) -> Result<(), AttrError>
    where
        I: RawMapping + ?Sized,
        K: Into<String>,
        It: IntoIterator<Item = (K, T)>,
    {
        let key = self.key();
        let mut raw = RawMap::new();
        for (name, value) in entries {
            let name = name.into();
            let dumped = self.slot.codec.dump(&value, &entry_key(key, &name))?;
            raw.insert(name, dumped);
        }
        self.slot.store(instance, Value::Object(raw))
    }

    pub fn delete<I: RawMapping + ?Sized>(&self, instance: &mut I) -> Result<(), AttrError> {
        self.slot.delete(instance)
    }

    pub fn is_set<I: RawMapping + ?Sized>(&self, instance: &I) -> Result<bool, AttrError> {
        self.slot.is_set(instance)
    }
}

impl<T: Clone> Clone for MapField<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
            default: self.default.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for MapField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapField")
            .field("name", &self.slot.name)
            .field("key", &self.key())
            .field("default", &self.default)
            .finish()
    }
}

fn entry_key(key: &str, name: &str) -> String {
    format!("{key}.{name}")
}

/// Mutable view over a raw mapping nested inside a parent mapping.
///
/// Iteration follows the raw mapping's insertion order.
pub struct MapView<'a, T> {
    key: String,
    entries: &'a mut RawMap,
    codec: Codec<T>,
}

impl<'a, T> MapView<'a, T> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// The raw mapping, the same one stored in the parent mapping.
    pub fn raw(&self) -> &RawMap {
        &*self.entries
    }

    pub fn get(&self, name: &str) -> Result<T, AttrError> {
        match self.entries.get(name) {
            Some(raw) => self.codec.load(raw, &entry_key(&self.key, name)),
            None => Err(AttrError::KeyNotFound {
                key: name.to_string(),
            }),
        }
    }

    /// Dumps `item` and stores it under `name`, replacing any existing entry.
    pub fn insert(&mut self, name: impl Into<String>, item: T) -> Result<(), AttrError> {
        let name = name.into();
        let raw = self.codec.dump(&item, &entry_key(&self.key, &name))?;
        self.entries.insert(name, raw);
        Ok(())
    }

    /// Removes `name`, keeping the order of the remaining entries.
    pub fn remove(&mut self, name: &str) -> Result<(), AttrError> {
        match self.entries.shift_remove(name) {
            Some(_) => Ok(()),
            None => Err(AttrError::KeyNotFound {
                key: name.to_string(),
            }),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    /// Entries with their values loaded lazily.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Result<T, AttrError>)> + '_ {
        self.entries.iter().map(|(name, raw)| {
            let item = self.codec.load(raw, &entry_key(&self.key, name));
            (name.as_str(), item)
        })
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Views the mapping stored under `name` as model `M`, in place.
    pub fn project<'s, M>(&'s mut self, name: &str) -> Result<M, AttrError>
    where
        M: FromRaw<&'s mut RawMap>,
    {
        match self.entries.get_mut(name) {
            Some(Value::Object(map)) => Ok(M::from_raw(map)),
            Some(other) => {
                Err(AttrError::mismatch("mapping", other).at_key(&entry_key(&self.key, name)))
            }
            None => Err(AttrError::KeyNotFound {
                key: name.to_string(),
            }),
        }
    }
}

impl<T> fmt::Debug for MapView<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapView")
            .field("key", &self.key)
            .field("entries", &self.entries)
            .finish()
    }
}
