//! The prebuilt [`common`] registry.

use std::any::{Any, TypeId};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{
    DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc,
};
use serde::Serialize;
use serde_json::Value;

use crate::error::ConvertError;
use crate::registry::{Capability, Converter};

/// Name of the capability that turns collections into JSON arrays.
pub const ITERABLE: &str = "iterable";

/// Builds a registry with the common conversions installed:
///
/// * `NaiveDate` → `YYYY-MM-DD`, `NaiveTime` → `HH:MM:SS[.fraction]`,
///   `NaiveDateTime` → `YYYY-MM-DDTHH:MM:SS[.fraction]`.
/// * `DateTime<Utc>`, `DateTime<Local>` and `DateTime<FixedOffset>` →
///   RFC 3339 with a `+HH:MM` offset.
/// * `Vec<u8>`, `&'static [u8]` and `Box<[u8]>` → standard base64 with
///   padding.
/// * `Vec`, `VecDeque`, `BTreeSet` and `HashSet` of integers, `bool`,
///   `char` and strings, `Vec`/`VecDeque` of floats, `Value`s and
///   `(String, Value)` / `(String, i64)` pairs → a JSON array in iteration
///   order. Maps and their key views are not covered; collect them into one
///   of these first, or register a converter for the concrete type.
///
/// ```
/// use chrono::NaiveDate;
/// use serde_json::json;
///
/// let conv = json_default::common();
/// let date = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
/// assert_eq!(conv.convert(&date).unwrap(), json!("2000-01-01"));
/// assert_eq!(conv.convert(&b"abc".to_vec()).unwrap(), json!("YWJj"));
/// ```
pub fn common() -> Converter {
    let mut conv = Converter::new();
    conv.register(|d: &NaiveDate| Ok(string(d.format("%Y-%m-%d"))))
        .register(|t: &NaiveTime| Ok(string(t.format("%H:%M:%S%.f"))))
        .register(|dt: &NaiveDateTime| Ok(string(dt.format("%Y-%m-%dT%H:%M:%S%.f"))))
        .register(|dt: &DateTime<Utc>| Ok(rfc3339(dt)))
        .register(|dt: &DateTime<Local>| Ok(rfc3339(dt)))
        .register(|dt: &DateTime<FixedOffset>| Ok(rfc3339(dt)))
        .register(|b: &Vec<u8>| Ok(Value::String(STANDARD.encode(b))))
        .register(|b: &&'static [u8]| Ok(Value::String(STANDARD.encode(b))))
        .register(|b: &Box<[u8]>| Ok(Value::String(STANDARD.encode(b))));

    let table = Arc::new(iterable_table());
    let accepts = Arc::clone(&table);
    conv.register_capability(
        Capability::new(ITERABLE, move |value: &dyn Any| {
            accepts.contains_key(&value.type_id())
        }),
        move |value: &dyn Any| {
            table
                .get(&value.type_id())
                .and_then(|probe| probe(value))
                .unwrap_or_else(|| Err(ConvertError::unsupported(ITERABLE)))
        },
    );
    conv
}

fn string(display: impl std::fmt::Display) -> Value {
    Value::String(display.to_string())
}

fn rfc3339<Tz: chrono::TimeZone>(dt: &DateTime<Tz>) -> Value
where
    Tz::Offset: std::fmt::Display,
{
    Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, false))
}

type Probe = fn(&dyn Any) -> Option<Result<Value, ConvertError>>;

/// Serializes every element of a collection of type `C` into a JSON array.
/// Returns `None` when `value` is not a `C`.
fn seq_of<C, E>(value: &dyn Any) -> Option<Result<Value, ConvertError>>
where
    C: Any,
    for<'a> &'a C: IntoIterator<Item = &'a E>,
    E: Serialize + 'static,
{
    let items = value.downcast_ref::<C>()?;
    let converted = items
        .into_iter()
        .map(|item| {
            serde_json::to_value(item).map_err(|e| ConvertError::conversion::<C>(e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array);
    Some(converted)
}

macro_rules! collections_of {
    ($table:ident; ordered: $($ord:ty),*; unordered: $($any:ty),*) => {
        $(
            $table.insert(TypeId::of::<Vec<$ord>>(), seq_of::<Vec<$ord>, $ord> as Probe);
            $table.insert(TypeId::of::<VecDeque<$ord>>(), seq_of::<VecDeque<$ord>, $ord> as Probe);
            $table.insert(TypeId::of::<BTreeSet<$ord>>(), seq_of::<BTreeSet<$ord>, $ord> as Probe);
            $table.insert(TypeId::of::<HashSet<$ord>>(), seq_of::<HashSet<$ord>, $ord> as Probe);
        )*
        $(
            $table.insert(TypeId::of::<Vec<$any>>(), seq_of::<Vec<$any>, $any> as Probe);
            $table.insert(TypeId::of::<VecDeque<$any>>(), seq_of::<VecDeque<$any>, $any> as Probe);
        )*
    };
}

fn iterable_table() -> HashMap<TypeId, Probe> {
    let mut table: HashMap<TypeId, Probe> = HashMap::new();
    collections_of!(
        table;
        ordered: bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize,
            String, &'static str;
        unordered: f32, f64, Value, (String, Value), (String, i64)
    );
    table
}
