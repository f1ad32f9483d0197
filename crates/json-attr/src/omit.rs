//! Omission sentinel for optional arguments.
//!
//! [`Omit`] marks "nothing was supplied". It is distinct from `Option`, so a
//! given `None` or `Value::Null` still counts as a default.

/// The unique "omitted" marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Omit;

/// Shorthand for [`Omit`].
pub const OMIT: Omit = Omit;

/// Either a supplied value or the omission marker.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MaybeOmit<T> {
    #[default]
    Omitted,
    Given(T),
}

impl<T> MaybeOmit<T> {
    pub fn is_omitted(&self) -> bool {
        matches!(self, Self::Omitted)
    }

    pub fn is_given(&self) -> bool {
        !self.is_omitted()
    }

    pub fn as_given(&self) -> Option<&T> {
        match self {
            Self::Given(value) => Some(value),
            Self::Omitted => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Given(value) => Some(value),
            Self::Omitted => None,
        }
    }
}

impl<T> From<Omit> for MaybeOmit<T> {
    fn from(_: Omit) -> Self {
        Self::Omitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn default_is_omitted() {
        let d: MaybeOmit<i32> = MaybeOmit::default();
        assert!(d.is_omitted());
        assert_eq!(MaybeOmit::<i32>::from(OMIT), MaybeOmit::Omitted);
    }

    #[test]
    fn null_is_a_real_value() {
        let d = MaybeOmit::Given(Value::Null);
        assert!(d.is_given());
        assert_eq!(d.as_given(), Some(&Value::Null));
        assert_ne!(d, MaybeOmit::Omitted);
    }

    #[test]
    fn given_none_is_not_omitted() {
        let d: MaybeOmit<Option<u8>> = MaybeOmit::Given(None);
        assert_eq!(d.into_option(), Some(None));
    }
}
