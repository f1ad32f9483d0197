//! Sequence fields and the live list view they produce.

use std::fmt;
use std::ops::{Bound, Range, RangeBounds};
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

/// A field whose raw value is a list, read through a [`SeqView`].
pub struct SeqField<T> {
    slot: Slot<T>,
    default: MaybeOmit<Vec<T>>,
}

impl<T: Serialize + DeserializeOwned + 'static> SeqField<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_codec(name.into(), Codec::serde())
    }
}

impl<T: FromRaw<RawMap> + RawMapping + 'static> SeqField<T> {
    /// Declares a list of owned models.
    pub fn model(name: impl Into<String>) -> Self {
        Self::from_codec(name.into(), Codec::model())
    }
}

impl<T: 'static> SeqField<T> {
    /// Declares a list field with explicit per-item load and dump functions.
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

impl<T> SeqField<T> {
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

    /// Items written to the raw mapping the first time an absent key is viewed.
    pub fn with_default(mut self, default: Vec<T>) -> Self {
        self.default = MaybeOmit::Given(default);
        self
    }

    pub fn name(&self) -> &str {
        &self.slot.name
    }

    pub fn key(&self) -> &str {
        self.slot.key()
    }

    /// Returns a live view over the raw list under this field's key.
    ///
    /// An absent key is filled with the dumped default first, so the view
    /// always points into the instance's mapping.
    pub fn get<'a, I: RawMapping + ?Sized>(
        &self,
        instance: &'a mut I,
    ) -> Result<SeqView<'a, T>, AttrError> {
        let key = self.key();
        let raw = instance.raw_mapping_mut()?;
        if !raw.contains_key(key) {
            let MaybeOmit::Given(default) = &self.default else {
                return Err(self.slot.missing());
            };
            let items = dump_items(&self.slot.codec, key, 0, default)?;
            trace!(key, len = items.len(), "materializing sequence default");
            raw.insert(key.to_string(), Value::Array(items));
        }
        match raw.get_mut(key) {
            Some(Value::Array(items)) => Ok(SeqView {
                key: key.to_string(),
                items,
                codec: self.slot.codec.clone(),
            }),
            Some(other) => Err(AttrError::mismatch("list", other).at_key(key)),
            None => Err(self.slot.missing()),
        }
    }

    /// Replaces the whole raw list with the dumped `items`.
    pub fn set<I, It>(&self, instance: &mut I, items: It) -> Result<(), AttrError>
    where
        I: RawMapping + ?Sized,
        It: IntoIterator<Item = T>,
    {
        let key = self.key();
        let raw = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| self.slot.codec.dump(&item, &element_key(key, index)))
            .collect::<Result<Vec<_>, _>>()?;
        self.slot.store(instance, Value::Array(raw))
    }

    pub fn delete<I: RawMapping + ?Sized>(&self, instance: &mut I) -> Result<(), AttrError> {
        self.slot.delete(instance)
    }

    pub fn is_set<I: RawMapping + ?Sized>(&self, instance: &I) -> Result<bool, AttrError> {
        self.slot.is_set(instance)
    }
}

impl<T: Clone> Clone for SeqField<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
            default: self.default.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for SeqField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeqField")
            .field("name", &self.slot.name)
            .field("key", &self.key())
            .field("default", &self.default)
            .finish()
    }
}

fn element_key(key: &str, index: usize) -> String {
    format!("{key}[{index}]")
}

fn dump_items<T>(
    codec: &Codec<T>,
    key: &str,
    offset: usize,
    items: &[T],
) -> Result<Vec<Value>, AttrError> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| codec.dump(item, &element_key(key, offset + i)))
        .collect()
}

/// Mutable, index-addressable view over a raw list inside a parent mapping.
///
/// Items are loaded one at a time as they are read; writes are dumped and
/// applied to the raw list immediately.
pub struct SeqView<'a, T> {
    key: String,
    items: &'a mut Vec<Value>,
    codec: Codec<T>,
}

impl<'a, T> SeqView<'a, T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The raw list, the same one stored in the parent mapping.
    pub fn raw(&self) -> &[Value] {
        self.items.as_slice()
    }

    pub fn get(&self, index: usize) -> Result<T, AttrError> {
        let raw = self.items.get(index).ok_or_else(|| self.out_of_range(index))?;
        self.codec.load(raw, &element_key(&self.key, index))
    }

    /// Loads a sub-range into a new vector. The result is detached from the
    /// raw list.
    pub fn get_slice<R: RangeBounds<usize>>(&self, range: R) -> Result<Vec<T>, AttrError> {
        let range = self.resolve(range)?;
        let start = range.start;
        self.items[range]
            .iter()
            .enumerate()
            .map(|(i, raw)| self.codec.load(raw, &element_key(&self.key, start + i)))
            .collect()
    }

    pub fn set(&mut self, index: usize, item: T) -> Result<(), AttrError> {
        let len = self.items.len();
        if index >= len {
            return Err(AttrError::IndexOutOfRange { index, len });
        }
        self.items[index] = self.codec.dump(&item, &element_key(&self.key, index))?;
        Ok(())
    }

    /// Replaces a sub-range with the dumped `items`; the list may grow or shrink.
    pub fn set_slice<R, It>(&mut self, range: R, items: It) -> Result<(), AttrError>
    where
        R: RangeBounds<usize>,
        It: IntoIterator<Item = T>,
    {
        let range = self.resolve(range)?;
        let items: Vec<T> = items.into_iter().collect();
        let raw = dump_items(&self.codec, &self.key, range.start, &items)?;
        self.items.splice(range, raw);
        Ok(())
    }

    /// Inserts before `index`; `index == len()` appends.
    pub fn insert(&mut self, index: usize, item: T) -> Result<(), AttrError> {
        let len = self.items.len();
        if index > len {
            return Err(AttrError::IndexOutOfRange { index, len });
        }
        let raw = self.codec.dump(&item, &element_key(&self.key, index))?;
        self.items.insert(index, raw);
        Ok(())
    }

    pub fn push(&mut self, item: T) -> Result<(), AttrError> {
        let index = self.items.len();
        let raw = self.codec.dump(&item, &element_key(&self.key, index))?;
        self.items.push(raw);
        Ok(())
    }

    /// Appends every item. Nothing is written if any item fails to dump.
    pub fn extend<It: IntoIterator<Item = T>>(&mut self, items: It) -> Result<(), AttrError> {
        let items: Vec<T> = items.into_iter().collect();
        let raw = dump_items(&self.codec, &self.key, self.items.len(), &items)?;
        self.items.extend(raw);
        Ok(())
    }

    /// Removes the last raw item and returns it loaded.
    pub fn pop(&mut self) -> Result<Option<T>, AttrError> {
        let index = self.items.len().saturating_sub(1);
        match self.items.pop() {
            Some(raw) => self
                .codec
                .load(&raw, &element_key(&self.key, index))
                .map(Some),
            None => Ok(None),
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn delete(&mut self, index: usize) -> Result<(), AttrError> {
        let len = self.items.len();
        if index >= len {
            return Err(AttrError::IndexOutOfRange { index, len });
        }
        self.items.remove(index);
        Ok(())
    }

    pub fn delete_slice<R: RangeBounds<usize>>(&mut self, range: R) -> Result<(), AttrError> {
        let range = self.resolve(range)?;
        self.items.drain(range);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = Result<T, AttrError>> + '_ {
        self.items
            .iter()
            .enumerate()
            .map(|(i, raw)| self.codec.load(raw, &element_key(&self.key, i)))
    }

    pub fn to_vec(&self) -> Result<Vec<T>, AttrError> {
        self.iter().collect()
    }

    /// Views the mapping at `index` as model `M`, in place.
    pub fn project<'s, M>(&'s mut self, index: usize) -> Result<M, AttrError>
    where
        M: FromRaw<&'s mut RawMap>,
    {
        let len = self.items.len();
        match self.items.get_mut(index) {
            Some(Value::Object(map)) => Ok(M::from_raw(map)),
            Some(other) => {
                Err(AttrError::mismatch("mapping", other).at_key(&element_key(&self.key, index)))
            }
            None => Err(AttrError::IndexOutOfRange { index, len }),
        }
    }

    fn out_of_range(&self, index: usize) -> AttrError {
        AttrError::IndexOutOfRange {
            index,
            len: self.items.len(),
        }
    }

    fn resolve<R: RangeBounds<usize>>(&self, range: R) -> Result<Range<usize>, AttrError> {
        let len = self.items.len();
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&e) => e.saturating_add(1),
            Bound::Excluded(&e) => e,
            Bound::Unbounded => len,
        };
        if end > len {
            return Err(AttrError::IndexOutOfRange { index: end, len });
        }
        if start > end {
            return Err(AttrError::IndexOutOfRange { index: start, len });
        }
        Ok(start..end)
    }
}

impl<T> fmt::Debug for SeqView<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeqView")
            .field("key", &self.key)
            .field("items", &self.items)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(v: Value) -> RawMap {
        match v {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn non_list_value_is_a_mismatch() {
        let mut raw = object(json!({"items": "abc"}));
        let err = SeqField::<i64>::new("items").get(&mut raw).unwrap_err();
        assert_eq!(
            err,
            AttrError::TypeMismatch {
                key: "items".into(),
                expected: "list",
                found: "string"
            }
        );
    }

    #[test]
    fn resolve_rejects_bad_ranges() {
        let mut raw = object(json!({"items": [1, 2, 3]}));
        let field = SeqField::<i64>::new("items");
        let view = field.get(&mut raw).unwrap();
        assert_eq!(view.resolve(..).unwrap(), 0..3);
        assert_eq!(view.resolve(1..=2).unwrap(), 1..3);
        assert!(view.resolve(2..5).is_err());
        #[allow(clippy::reversed_empty_ranges)]
        let reversed = 3..1;
        assert!(view.resolve(reversed).is_err());
    }

    #[test]
    fn element_errors_carry_index() {
        let mut raw = object(json!({"items": [1, "x"]}));
        let field = SeqField::<i64>::new("items");
        let view = field.get(&mut raw).unwrap();
        let err = view.get(1).unwrap_err();
        assert!(matches!(err, AttrError::Conversion { ref key, .. } if key == "items[1]"));
    }

    #[test]
    fn pop_loads_last_item() {
        let mut raw = object(json!({"items": [1, 2]}));
        let field = SeqField::<i64>::new("items");
        let mut view = field.get(&mut raw).unwrap();
        assert_eq!(view.pop().unwrap(), Some(2));
        assert_eq!(view.pop().unwrap(), Some(1));
        assert_eq!(view.pop().unwrap(), None);
        assert_eq!(raw, object(json!({"items": []})));
    }
}
