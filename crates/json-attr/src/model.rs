//! The model protocol and the minimal base model.

use std::borrow::{Borrow, BorrowMut};

use serde_json::Value;

use crate::error::{kind_of, AttrError};
use crate::RawMap;

/// Capability of producing the raw mapping that backs an object.
///
/// Field declarations resolve their storage through this trait, and dump
/// a model-typed value by extracting the mapping it returns.
pub trait RawMapping {
    fn raw_mapping(&self) -> Result<&RawMap, AttrError>;
    fn raw_mapping_mut(&mut self) -> Result<&mut RawMap, AttrError>;
}

/// Types that can be built as a typed view over raw storage `R`.
///
/// `R` is either an owned [`RawMap`] or a `&mut RawMap` borrowed from a
/// parent structure.
pub trait FromRaw<R>: Sized {
    fn from_raw(raw: R) -> Self;
}

impl RawMapping for RawMap {
    fn raw_mapping(&self) -> Result<&RawMap, AttrError> {
        Ok(self)
    }

    fn raw_mapping_mut(&mut self) -> Result<&mut RawMap, AttrError> {
        Ok(self)
    }
}

/// A raw value acts as a model only when it is a mapping.
impl RawMapping for Value {
    fn raw_mapping(&self) -> Result<&RawMap, AttrError> {
        match self {
            Value::Object(map) => Ok(map),
            other => Err(AttrError::Contract {
                type_name: kind_of(other),
            }),
        }
    }

    fn raw_mapping_mut(&mut self) -> Result<&mut RawMap, AttrError> {
        match self {
            Value::Object(map) => Ok(map),
            other => Err(AttrError::Contract {
                type_name: kind_of(other),
            }),
        }
    }
}

/// Base model over a raw mapping.
///
/// `DictModel<&mut RawMap>` wraps a caller's mapping without copying it, so
/// every field write is visible to whoever owns the mapping.
/// `DictModel<RawMap>` owns its mapping outright.
///
/// Nothing is validated at construction: a missing key only surfaces when a
/// field reads it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DictModel<R = RawMap> {
    values: R,
}

impl<R: BorrowMut<RawMap>> DictModel<R> {
    pub fn new(values: R) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &RawMap {
        <R as Borrow<RawMap>>::borrow(&self.values)
    }

    pub fn values_mut(&mut self) -> &mut RawMap {
        <R as BorrowMut<RawMap>>::borrow_mut(&mut self.values)
    }

    pub fn into_inner(self) -> R {
        self.values
    }
}

impl<R: BorrowMut<RawMap>> RawMapping for DictModel<R> {
    fn raw_mapping(&self) -> Result<&RawMap, AttrError> {
        Ok(self.values())
    }

    fn raw_mapping_mut(&mut self) -> Result<&mut RawMap, AttrError> {
        Ok(self.values_mut())
    }
}

impl<R: BorrowMut<RawMap>> FromRaw<R> for DictModel<R> {
    fn from_raw(raw: R) -> Self {
        Self::new(raw)
    }
}

/// Extracts a model's raw mapping as a raw value.
pub fn dump_model<M: RawMapping + ?Sized>(model: &M) -> Result<Value, AttrError> {
    Ok(Value::Object(model.raw_mapping()?.clone()))
}

/// Declares a model type backed by a [`DictModel`].
///
/// The generated struct is generic over its storage, defaulting to an owned
/// [`RawMap`], and implements [`RawMapping`] and [`FromRaw`].
///
/// ```
/// use json_attr::{dict_model, Field, AttrError, RawMap};
/// use std::borrow::BorrowMut;
///
/// dict_model! {
///     /// A user record.
///     pub struct User;
/// }
///
/// impl<R: BorrowMut<RawMap>> User<R> {
///     pub fn name(&self) -> Result<String, AttrError> {
///         Field::new("name").get(self)
///     }
/// }
///
/// let mut raw = serde_json::json!({"name": "ann"});
/// let user = User::new(raw.as_object_mut().unwrap());
/// assert_eq!(user.name().unwrap(), "ann");
/// ```
#[macro_export]
macro_rules! dict_model {
    ($(#[$meta:meta])* $vis:vis struct $name:ident;) => {
        $(#[$meta])*
        $vis struct $name<R = $crate::RawMap>($crate::DictModel<R>);

        #[allow(dead_code)]
        impl<R: ::std::borrow::BorrowMut<$crate::RawMap>> $name<R> {
            pub fn new(values: R) -> Self {
                Self($crate::DictModel::new(values))
            }

            pub fn values(&self) -> &$crate::RawMap {
                self.0.values()
            }

            pub fn into_inner(self) -> R {
                self.0.into_inner()
            }
        }

        impl<R: ::std::borrow::BorrowMut<$crate::RawMap>> $crate::RawMapping for $name<R> {
            fn raw_mapping(&self) -> ::std::result::Result<&$crate::RawMap, $crate::AttrError> {
                $crate::RawMapping::raw_mapping(&self.0)
            }

            fn raw_mapping_mut(
                &mut self,
            ) -> ::std::result::Result<&mut $crate::RawMap, $crate::AttrError> {
                $crate::RawMapping::raw_mapping_mut(&mut self.0)
            }
        }

        impl<R: ::std::borrow::BorrowMut<$crate::RawMap>> $crate::FromRaw<R> for $name<R> {
            fn from_raw(raw: R) -> Self {
                Self::new(raw)
            }
        }
    };
}
