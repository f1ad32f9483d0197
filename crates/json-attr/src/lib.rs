//! Typed attribute views over loosely-typed JSON mappings.
//!
//! A model wraps a raw [`RawMap`] (for example one parsed from JSON) and
//! exposes typed attributes through field declarations:
//!
//! * [`Field`] reads and writes one converted value under one key.
//! * [`SeqField`] yields a [`SeqView`], a live list view that loads items on
//!   read and dumps them on write.
//! * [`MapField`] yields a [`MapView`], the same idea for nested mappings.
//!
//! Every write lands in the raw mapping immediately.
//!
//! Nested models come in two forms. `Field::model(..).get` returns an owned
//! copy of the sub-mapping: writes to it never reach the parent. To change
//! a nested model in place, borrow it with [`Field::project`] (or
//! [`SeqView::project`] / [`MapView::project`] for items), which views the
//! parent's own sub-mapping without copying.
//!
//! ```
//! use json_attr::{DictModel, Field, SeqField};
//! use serde_json::json;
//!
//! let mut raw = json!({"name": "test user", "items": [1, 2]});
//! let mut user = DictModel::new(raw.as_object_mut().unwrap());
//!
//! let name: String = Field::new("name").get(&user).unwrap();
//! assert_eq!(name, "test user");
//!
//! let items = SeqField::<i64>::new("items").with_dump(|v| Ok(json!(v * 2)));
//! items.set(&mut user, [3, 4, 5]).unwrap();
//! items.get(&mut user).unwrap().set(1, 10).unwrap();
//!
//! assert_eq!(raw["items"], json!([6, 20, 10]));
//! ```

mod codec;
mod error;
pub mod field;
pub mod map;
pub mod model;
pub mod omit;
pub mod seq;

pub use codec::{DumpFn, LoadFn};
pub use error::AttrError;
pub use field::Field;
pub use map::{MapField, MapView};
pub use model::{dump_model, DictModel, FromRaw, RawMapping};
pub use omit::{MaybeOmit, Omit, OMIT};
pub use seq::{SeqField, SeqView};

/// A raw mapping: string keys to arbitrary JSON values, in insertion order.
pub type RawMap = serde_json::Map<String, serde_json::Value>;
