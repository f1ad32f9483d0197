//! The converter registry: exact-type entries plus ordered capability entries.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace};

use crate::error::ConvertError;

/// Type-erased converter applied to a value the registry has matched.
pub type ConvertFn = Arc<dyn Fn(&dyn Any) -> Result<Value, ConvertError> + Send + Sync>;

/// Predicate deciding whether a capability entry accepts a value.
pub type PredicateFn = Arc<dyn Fn(&dyn Any) -> bool + Send + Sync>;

/// A named family of types matched by predicate rather than by exact type.
///
/// Capabilities are consulted only when no exact-type converter exists.
#[derive(Clone)]
pub struct Capability {
    name: String,
    predicate: PredicateFn,
}

impl Capability {
    pub fn new<P>(name: impl Into<String>, predicate: P) -> Self
    where
        P: Fn(&dyn Any) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// A capability accepting exactly the values of type `T`.
    pub fn of<T: Any>(name: impl Into<String>) -> Self {
        Self::new(name, |value: &dyn Any| value.is::<T>())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn accepts(&self, value: &dyn Any) -> bool {
        (self.predicate)(value)
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
struct Exact {
    type_name: &'static str,
    convert: ConvertFn,
}

/// Extensible, type-dispatched conversion of values into JSON.
///
/// Dispatch tries the exact runtime type first, then each capability in
/// registration order. A value nothing matches fails with
/// [`ConvertError::UnsupportedType`].
#[derive(Clone, Default)]
pub struct Converter {
    exact: HashMap<TypeId, Exact>,
    capabilities: Vec<(Capability, ConvertFn)>,
}

impl Converter {
    /// An empty registry: every value is unsupported.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a converter for values of exactly type `T`.
    ///
    /// A later registration for the same type replaces the earlier one.
    pub fn register<T, F>(&mut self, convert: F) -> &mut Self
    where
        T: Any,
        F: Fn(&T) -> Result<Value, ConvertError> + Send + Sync + 'static,
    {
        let type_name = type_name::<T>();
        let convert: ConvertFn = Arc::new(move |value: &dyn Any| {
            match value.downcast_ref::<T>() {
                Some(value) => convert(value),
                None => Err(ConvertError::unsupported(type_name)),
            }
        });
        let entry = Exact { type_name, convert };
        if self.exact.insert(TypeId::of::<T>(), entry).is_some() {
            debug!(type_name, "replaced exact converter");
        }
        self
    }

    /// Registers a fallback converter for every value `capability` accepts.
    ///
    /// A capability with the same name replaces the earlier entry and keeps
    /// its position in the scan order.
    pub fn register_capability<F>(&mut self, capability: Capability, convert: F) -> &mut Self
    where
        F: Fn(&dyn Any) -> Result<Value, ConvertError> + Send + Sync + 'static,
    {
        let convert: ConvertFn = Arc::new(convert);
        match self
            .capabilities
            .iter_mut()
            .find(|(existing, _)| existing.name == capability.name)
        {
            Some(slot) => {
                debug!(capability = %capability.name, "replaced capability converter");
                *slot = (capability, convert);
            }
            None => self.capabilities.push((capability, convert)),
        }
        self
    }

    /// Builder form of [`Converter::register`].
    pub fn with<T, F>(mut self, convert: F) -> Self
    where
        T: Any,
        F: Fn(&T) -> Result<Value, ConvertError> + Send + Sync + 'static,
    {
        self.register::<T, F>(convert);
        self
    }

    /// Builder form of [`Converter::register_capability`].
    pub fn with_capability<F>(mut self, capability: Capability, convert: F) -> Self
    where
        F: Fn(&dyn Any) -> Result<Value, ConvertError> + Send + Sync + 'static,
    {
        self.register_capability(capability, convert);
        self
    }

    pub fn is_registered<T: Any>(&self) -> bool {
        self.exact.contains_key(&TypeId::of::<T>())
    }

    /// Names of the capability entries in scan order.
    pub fn capabilities(&self) -> impl Iterator<Item = &str> + '_ {
        self.capabilities.iter().map(|(c, _)| c.name())
    }

    /// Converts `value` into a JSON-representable value.
    pub fn convert<T: Any>(&self, value: &T) -> Result<Value, ConvertError> {
        self.convert_any(value, type_name::<T>())
    }

    /// Converts a type-erased value. `type_name` only appears in errors and
    /// trace events.
    pub fn convert_any(&self, value: &dyn Any, type_name: &str) -> Result<Value, ConvertError> {
        if let Some(exact) = self.exact.get(&value.type_id()) {
            trace!(type_name = exact.type_name, "exact converter");
            return (exact.convert)(value);
        }
        for (capability, convert) in &self.capabilities {
            if capability.accepts(value) {
                trace!(type_name, capability = %capability.name, "capability converter");
                return (convert)(value);
            }
        }
        Err(ConvertError::unsupported(type_name))
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut exact: Vec<&str> = self.exact.values().map(|e| e.type_name).collect();
        exact.sort_unstable();
        f.debug_struct("Converter")
            .field("exact", &exact)
            .field("capabilities", &self.capabilities().collect::<Vec<_>>())
            .finish()
    }
}
