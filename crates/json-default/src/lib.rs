//! Fallback conversion of arbitrary Rust values into JSON.
//!
//! A [`Converter`] maps types that have no native JSON form onto
//! [`serde_json::Value`]s. Dispatch first looks up the value's exact type,
//! then scans registered [`Capability`] entries in order. [`common`] returns
//! a registry preloaded with date, byte-string and collection conversions.
//!
//! [`Dynamic`] documents mix plain JSON with opaque leaves so a whole
//! document can be serialized in one call:
//!
//! ```
//! use json_default::{Converter, Dynamic};
//! use serde_json::json;
//!
//! struct Foo {
//!     a: i64,
//! }
//!
//! let mut conv = Converter::new();
//! conv.register(|foo: &Foo| Ok(json!({"a": foo.a})));
//!
//! let doc = Dynamic::array([Dynamic::opaque(Foo { a: 1 }), json!(2).into()]);
//! assert_eq!(conv.to_value(&doc).unwrap(), json!([{"a": 1}, 2]));
//! ```

mod common;
mod dynamic;
mod error;
mod registry;

pub use common::{common, ITERABLE};
pub use dynamic::{Dynamic, Opaque};
pub use error::ConvertError;
pub use registry::{Capability, ConvertFn, Converter, PredicateFn};
