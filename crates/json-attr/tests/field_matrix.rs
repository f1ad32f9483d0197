//! Scalar field behaviour: key resolution, defaults, load/dump, deletion and
//! nested model composition.

use std::borrow::BorrowMut;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use json_attr::{dict_model, AttrError, DictModel, Field, RawMap, RawMapping};
use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

fn object(v: Value) -> RawMap {
    match v {
        Value::Object(map) => map,
        other => panic!("fixture must be an object, got {other}"),
    }
}

fn parse_int(raw: &Value) -> Result<i64, AttrError> {
    match raw {
        Value::String(s) => s
            .parse()
            .map_err(|e: std::num::ParseIntError| AttrError::conversion(e.to_string())),
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| AttrError::conversion(format!("{n} is not an integer"))),
        other => Err(AttrError::conversion(format!("{other} is not an integer"))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    A = 100,
    B = 200,
}

fn load_label(raw: &Value) -> Result<Label, AttrError> {
    match raw.as_i64() {
        Some(100) => Ok(Label::A),
        Some(200) => Ok(Label::B),
        _ => Err(AttrError::conversion(format!("{raw} is not a valid Label"))),
    }
}

fn dump_label(label: &Label) -> Result<Value, AttrError> {
    Ok(json!(*label as i64))
}

dict_model! {
    #[derive(Debug, Clone)]
    struct Child;
}

impl<R: BorrowMut<RawMap>> Child<R> {
    fn field1(&self) -> Result<i64, AttrError> {
        Field::new("field1").with_load(parse_int).get(self)
    }

    fn set_field1(&mut self, value: i64) -> Result<(), AttrError> {
        Field::<i64>::new("field1").set(self, value)
    }
}

dict_model! {
    struct Parent;
}

impl<R: BorrowMut<RawMap>> Parent<R> {
    fn child() -> Field<Child> {
        Field::model("field1")
    }

    fn field1(&self) -> Result<Child, AttrError> {
        Self::child().get(self)
    }

    fn field1_mut(&mut self) -> Result<Child<&mut RawMap>, AttrError> {
        Self::child().project(self)
    }

    fn set_field1(&mut self, child: Child) -> Result<(), AttrError> {
        Self::child().set(self, child)
    }

    fn field2(&self) -> Result<Label, AttrError> {
        Field::with_fns("field2", load_label, dump_label).get(self)
    }
}

// ---------------------------------------------------------------------------
// Key resolution and defaults
// ---------------------------------------------------------------------------

#[test]
fn reads_by_name_renamed_key_and_default() {
    let mut raw = object(json!({"field1": "field1_value", "field_2": "field2_value"}));
    let model = DictModel::new(&mut raw);

    let field1 = Field::<String>::new("field1");
    let field2 = Field::<String>::new("field2").with_key("field_2");
    let field3 = Field::<String>::new("field3").with_default("default_field3".to_string());

    assert_eq!(field1.get(&model).unwrap(), "field1_value");
    assert_eq!(field2.get(&model).unwrap(), "field2_value");
    assert_eq!(field3.get(&model).unwrap(), "default_field3");
}

#[test]
fn renamed_field_never_touches_its_own_name() {
    let mut raw = RawMap::new();
    let field = Field::<i64>::new("k1").with_key("k2");
    field.set(&mut raw, 5).unwrap();
    assert_eq!(raw, object(json!({"k2": 5})));
    assert_eq!(field.get(&raw).unwrap(), 5);
    assert!(!raw.contains_key("k1"));
}

#[test]
fn missing_field_without_default_fails() {
    let raw = RawMap::new();
    let err = Field::<String>::new("name").get(&raw).unwrap_err();
    assert_eq!(err, AttrError::MissingField { key: "name".into() });
}

#[test]
fn null_default_is_still_a_default() {
    let raw = RawMap::new();
    let field = Field::<Value>::new("v").with_default(Value::Null);
    assert_eq!(field.get(&raw).unwrap(), Value::Null);
}

#[test]
fn default_is_returned_without_loading() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let field = Field::<i64>::new("n")
        .with_load(move |raw| {
            seen.fetch_add(1, Ordering::SeqCst);
            parse_int(raw)
        })
        .with_default(-1);

    let mut raw = RawMap::new();
    assert_eq!(field.get(&raw).unwrap(), -1);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    raw.insert("n".into(), json!("12"));
    assert_eq!(field.get(&raw).unwrap(), 12);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// ---------------------------------------------------------------------------
// Load / dump
// ---------------------------------------------------------------------------

#[test]
fn loader_builds_models_and_enums() {
    let mut raw = object(json!({
        "field1": {"field1": "100", "field2": "200"},
        "field2": 200,
    }));
    let parent = Parent::new(&mut raw);

    let child = parent.field1().unwrap();
    assert_eq!(child.field1().unwrap(), 100);
    assert_eq!(parent.field2().unwrap(), Label::B);
}

#[test]
fn set_without_dump_stores_value_as_is() {
    let mut raw = RawMap::new();
    Field::<String>::new("field1")
        .set(&mut raw, "abc".into())
        .unwrap();
    assert_eq!(raw, object(json!({"field1": "abc"})));
}

#[test]
fn asymmetric_dump_converts_on_write() {
    let mut raw = RawMap::new();
    let field = Field::<String>::new("field1").with_dump(|s| {
        s.parse::<i64>()
            .map(Value::from)
            .map_err(|e| AttrError::conversion(e.to_string()))
    });
    field.set(&mut raw, "1000".into()).unwrap();
    assert_eq!(raw, object(json!({"field1": 1000})));
}

#[test]
fn dump_failure_leaves_mapping_untouched() {
    let mut raw = object(json!({"field1": 1}));
    let field = Field::<String>::new("field1")
        .with_dump(|_| Err(AttrError::conversion("rejected")));
    let err = field.set(&mut raw, "x".into()).unwrap_err();
    assert_eq!(
        err,
        AttrError::Conversion {
            key: "field1".into(),
            message: "rejected".into()
        }
    );
    assert_eq!(raw, object(json!({"field1": 1})));
}

#[test]
fn model_value_is_dumped_as_its_raw_mapping() {
    let mut raw = object(json!({"field1": {"field1": "1"}}));
    let mut parent = Parent::new(&mut raw);
    parent
        .set_field1(Child::new(object(json!({"field1": "2"}))))
        .unwrap();
    assert_eq!(parent.field1().unwrap().field1().unwrap(), 2);
    assert_eq!(raw, object(json!({"field1": {"field1": "2"}})));
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Point {
    x: i32,
    y: i32,
}

#[test]
fn serde_types_convert_without_explicit_functions() {
    let mut raw = object(json!({"origin": {"x": 1, "y": 2}}));
    let field = Field::<Point>::new("origin");
    assert_eq!(field.get(&raw).unwrap(), Point { x: 1, y: 2 });

    field.set(&mut raw, Point { x: -3, y: 0 }).unwrap();
    assert_eq!(raw, object(json!({"origin": {"x": -3, "y": 0}})));

    raw.insert("origin".into(), json!({"x": "one"}));
    assert!(matches!(
        field.get(&raw),
        Err(AttrError::Conversion { ref key, .. }) if key == "origin"
    ));
}

#[test]
fn non_mapping_value_breaks_model_contract() {
    let raw = json!(["not", "a", "mapping"]);
    let err = Field::<i64>::new("x").get(&raw).unwrap_err();
    assert_eq!(err, AttrError::Contract { type_name: "list" });
}

proptest! {
    #[test]
    fn inverse_load_dump_round_trips(x in any::<i64>()) {
        let field = Field::<i64>::new("n")
            .with_load(parse_int)
            .with_dump(|v| Ok(json!(v.to_string())));
        let mut raw = RawMap::new();
        field.set(&mut raw, x).unwrap();
        prop_assert_eq!(raw["n"].clone(), json!(x.to_string()));
        prop_assert_eq!(field.get(&raw).unwrap(), x);
    }
}

// ---------------------------------------------------------------------------
// Deletion
// ---------------------------------------------------------------------------

#[test]
fn delete_removes_key() {
    let mut raw = object(json!({"field1": "abc"}));
    let field = Field::<String>::new("field1");
    field.delete(&mut raw).unwrap();
    assert!(raw.is_empty());
    assert_eq!(
        field.delete(&mut raw).unwrap_err(),
        AttrError::KeyNotFound {
            key: "field1".into()
        }
    );
}

// ---------------------------------------------------------------------------
// Nested composition
// ---------------------------------------------------------------------------

#[test]
fn projected_child_writes_into_parent_mapping() {
    let mut raw = object(json!({"field1": {"field1": "100"}, "other": true}));
    {
        let mut parent = Parent::new(&mut raw);
        let mut child = parent.field1_mut().unwrap();
        assert_eq!(child.field1().unwrap(), 100);
        child.set_field1(7).unwrap();
    }
    assert_eq!(
        raw,
        object(json!({"field1": {"field1": 7}, "other": true}))
    );
}

#[test]
fn projection_shares_the_nested_mapping() {
    let mut raw = object(json!({"field1": {"field1": 1}}));
    let nested: *const RawMap = raw["field1"].as_object().unwrap();
    let mut parent = Parent::new(&mut raw);
    let child = parent.field1_mut().unwrap();
    assert!(std::ptr::eq(child.raw_mapping().unwrap(), nested));
}

#[test]
fn loaded_child_is_a_detached_copy() {
    let mut raw = object(json!({"field1": {"field1": 1}}));
    let parent = Parent::new(&mut raw);
    let mut child = parent.field1().unwrap();
    child.set_field1(2).unwrap();
    assert_eq!(raw, object(json!({"field1": {"field1": 1}})));
}

#[test]
fn projection_of_missing_key_fails() {
    let mut raw = RawMap::new();
    let mut parent = Parent::new(&mut raw);
    assert_eq!(
        parent.field1_mut().unwrap_err(),
        AttrError::MissingField {
            key: "field1".into()
        }
    );
}
