//! A user record over a plain JSON document, with a date attribute stored as
//! an ISO 8601 string.
//!
//! Run with `cargo run -p json-attr --example user_model`.

use std::borrow::BorrowMut;

use chrono::NaiveDate;
use json_attr::{dict_model, AttrError, Field, RawMap};
use serde_json::{json, Value};

fn load_date(raw: &Value) -> Result<NaiveDate, AttrError> {
    let text = raw
        .as_str()
        .ok_or_else(|| AttrError::conversion(format!("{raw} is not a date string")))?;
    NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|e| AttrError::conversion(e.to_string()))
}

fn dump_date(date: &NaiveDate) -> Result<Value, AttrError> {
    Ok(Value::String(date.format("%Y-%m-%d").to_string()))
}

dict_model! {
    /// A registered user.
    pub struct User;
}

impl<R: BorrowMut<RawMap>> User<R> {
    fn registered_field() -> Field<NaiveDate> {
        Field::with_fns("registered", load_date, dump_date)
    }

    pub fn name(&self) -> Result<String, AttrError> {
        Field::new("name").get(self)
    }

    pub fn age(&self) -> Result<u32, AttrError> {
        Field::new("age").get(self)
    }

    pub fn registered(&self) -> Result<NaiveDate, AttrError> {
        Self::registered_field().get(self)
    }

    pub fn set_registered(&mut self, date: NaiveDate) -> Result<(), AttrError> {
        Self::registered_field().set(self, date)
    }
}

fn main() -> Result<(), AttrError> {
    let mut document = json!({"name": "test user", "age": 20, "registered": "2000-01-01"});
    let raw = document
        .as_object_mut()
        .ok_or_else(|| AttrError::conversion("document is not a mapping"))?;

    {
        let mut user = User::new(&mut *raw);
        println!("{} ({})", user.name()?, user.age()?);
        println!("{:?}", user.registered()?);

        let date = NaiveDate::from_ymd_opt(2999, 1, 1)
            .ok_or_else(|| AttrError::conversion("invalid date"))?;
        user.set_registered(date)?;
    }

    // {"name":"test user","age":20,"registered":"2999-01-01"}
    println!("{document}");
    Ok(())
}
