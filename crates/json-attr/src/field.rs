//! Scalar field declarations.
//!
//! A [`Field`] maps one typed attribute of a model onto one key of the
//! model's raw mapping. Reads apply the load function, writes apply the
//! dump function, and both go straight to the mapping: nothing is cached.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::codec::{Codec, Slot};
use crate::error::AttrError;
use crate::model::{FromRaw, RawMapping};
use crate::omit::MaybeOmit;
use crate::RawMap;

/// A typed attribute stored under one key of a raw mapping.
pub struct Field<T> {
    slot: Slot<T>,
    default: MaybeOmit<T>,
}

impl<T: Serialize + DeserializeOwned + 'static> Field<T> {
    /// Declares a field named `name`, converting raw values with serde.
    ///
    /// `Field<Value>` returns and stores raw values unchanged.
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_codec(name.into(), Codec::serde())
    }
}

impl<T: FromRaw<RawMap> + RawMapping + 'static> Field<T> {
    /// Declares a field holding an owned model.
    ///
    /// Reads wrap a copy of the sub-mapping, writes store the model's raw
    /// mapping. Use [`Field::project`] to work on the sub-mapping in place.
    pub fn model(name: impl Into<String>) -> Self {
        Self::from_codec(name.into(), Codec::model())
    }
}

impl<T: 'static> Field<T> {
    /// Declares a field with explicit load and dump functions.
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

impl<T> Field<T> {
    fn from_codec(name: String, codec: Codec<T>) -> Self {
        Self {
            slot: Slot::new(name, codec),
            default: MaybeOmit::Omitted,
        }
    }

    /// Stores the field under `key` instead of its declared name.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.slot.key = Some(key.into());
        self
    }

    /// Value returned, unconverted, when the key is absent.
    pub fn with_default(mut self, default: T) -> Self {
        self.default = MaybeOmit::Given(default);
        self
    }

    pub fn name(&self) -> &str {
        &self.slot.name
    }

    /// The raw mapping key: the explicit key if one was given, else the name.
    pub fn key(&self) -> &str {
        self.slot.key()
    }

    pub fn default_value(&self) -> &MaybeOmit<T> {
        &self.default
    }

    pub fn get<I: RawMapping + ?Sized>(&self, instance: &I) -> Result<T, AttrError>
    where
        T: Clone,
    {
        let key = self.key();
        match instance.raw_mapping()?.get(key) {
            Some(raw) => self.slot.codec.load(raw, key),
            None => match &self.default {
                MaybeOmit::Given(default) => Ok(default.clone()),
                MaybeOmit::Omitted => Err(self.slot.missing()),
            },
        }
    }

    /// Dumps `value` and stores it, replacing any existing entry.
    pub fn set<I: RawMapping + ?Sized>(&self, instance: &mut I, value: T) -> Result<(), AttrError> {
        let raw = self.slot.codec.dump(&value, self.key())?;
        self.slot.store(instance, raw)
    }

    pub fn delete<I: RawMapping + ?Sized>(&self, instance: &mut I) -> Result<(), AttrError> {
        self.slot.delete(instance)
    }

    /// Whether the key is present in the raw mapping. Defaults do not count.
    pub fn is_set<I: RawMapping + ?Sized>(&self, instance: &I) -> Result<bool, AttrError> {
        self.slot.is_set(instance)
    }

    /// Views the sub-mapping under this field's key as model `M`, in place.
    ///
    /// Unlike [`Field::get`] this never falls back to the default: the key
    /// must hold a mapping.
    pub fn project<'a, I, M>(&self, instance: &'a mut I) -> Result<M, AttrError>
    where
        I: RawMapping + ?Sized,
        M: FromRaw<&'a mut RawMap>,
    {
        self.slot.project(instance)
    }
}

impl<T: Clone> Clone for Field<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
            default: self.default.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.slot.name)
            .field("key", &self.key())
            .field("default", &self.default)
            .finish()
    }
}
