use std::{fmt, sync::Arc};

use serde::{Serialize, Serializer};

/// A value stored under a key in a [`ContextMapping`](crate::ContextMapping).
///
/// Primitive values are kept as-is; anything else is type-erased and rendered
/// through serde when the mapping is turned into a message. Cloning is cheap,
/// boxed values are shared.
#[derive(Clone)]
pub struct ContextValue(ContextValueInner);

#[derive(Clone)]
enum ContextValueInner {
    Null,
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    String(String),
    Json(serde_json::Value),
    Debug(Arc<dyn fmt::Debug + Send + Sync + 'static>),
    Display(Arc<dyn fmt::Display + Send + Sync + 'static>),
    Error(Arc<dyn std::error::Error + Send + Sync + 'static>),
    Serde(Arc<dyn erased_serde::Serialize + Send + Sync + 'static>),
}

impl From<ContextValueInner> for ContextValue {
    fn from(inner: ContextValueInner) -> Self {
        Self(inner)
    }
}

impl ContextValue {
    #[must_use]
    pub const fn null() -> Self {
        Self(ContextValueInner::Null)
    }

    pub fn serde<S>(value: S) -> Self
    where
        S: Serialize + Send + Sync + 'static,
    {
        ContextValueInner::Serde(Arc::new(value)).into()
    }

    pub fn display<T>(value: T) -> Self
    where
        T: fmt::Display + Send + Sync + 'static,
    {
        ContextValueInner::Display(Arc::new(value)).into()
    }

    pub fn debug<T>(value: T) -> Self
    where
        T: fmt::Debug + Send + Sync + 'static,
    {
        ContextValueInner::Debug(Arc::new(value)).into()
    }

    pub fn error<T>(value: T) -> Self
    where
        T: std::error::Error + Send + Sync + 'static,
    {
        ContextValueInner::Error(Arc::new(value)).into()
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self.0, ContextValueInner::Null)
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self.0 {
            ContextValueInner::Bool(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self.0 {
            ContextValueInner::I64(value) => Some(value),
            ContextValueInner::U64(value) => i64::try_from(value).ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self.0 {
            ContextValueInner::U64(value) => Some(value),
            ContextValueInner::I64(value) => u64::try_from(value).ok(),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self.0 {
            ContextValueInner::F64(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match &self.0 {
            ContextValueInner::String(value) => Some(value),
            ContextValueInner::Json(serde_json::Value::String(value)) => Some(value),
            _ => None,
        }
    }

    /// Renders the value as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if a type-erased serde value fails to serialize, for
    /// example a map with non-string keys.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

impl Serialize for ContextValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.0 {
            ContextValueInner::Null => serializer.serialize_unit(),
            ContextValueInner::Bool(value) => serializer.serialize_bool(*value),
            ContextValueInner::I64(value) => serializer.serialize_i64(*value),
            ContextValueInner::U64(value) => serializer.serialize_u64(*value),
            ContextValueInner::F64(value) => serializer.serialize_f64(*value),
            ContextValueInner::String(value) => serializer.serialize_str(value),
            ContextValueInner::Json(value) => value.serialize(serializer),
            ContextValueInner::Debug(value) => serializer.collect_str(&format_args!("{value:?}")),
            ContextValueInner::Display(value) => serializer.collect_str(value),
            ContextValueInner::Error(value) => serializer.collect_str(value),
            ContextValueInner::Serde(value) => erased_serde::serialize(&**value, serializer),
        }
    }
}

impl fmt::Debug for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            ContextValueInner::Null => f.write_str("null"),
            ContextValueInner::Bool(value) => fmt::Debug::fmt(value, f),
            ContextValueInner::I64(value) => fmt::Debug::fmt(value, f),
            ContextValueInner::U64(value) => fmt::Debug::fmt(value, f),
            ContextValueInner::F64(value) => fmt::Debug::fmt(value, f),
            ContextValueInner::String(value) => fmt::Debug::fmt(value, f),
            ContextValueInner::Json(value) => fmt::Debug::fmt(value, f),
            ContextValueInner::Debug(value) => fmt::Debug::fmt(value, f),
            ContextValueInner::Display(value) => write!(f, "{value}"),
            ContextValueInner::Error(value) => write!(f, "{value}"),
            ContextValueInner::Serde(_) => f.write_str("<serde>"),
        }
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        ContextValueInner::String(value.to_owned()).into()
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        ContextValueInner::String(value).into()
    }
}

impl From<bool> for ContextValue {
    fn from(value: bool) -> Self {
        ContextValueInner::Bool(value).into()
    }
}

impl From<f64> for ContextValue {
    fn from(value: f64) -> Self {
        ContextValueInner::F64(value).into()
    }
}

impl From<f32> for ContextValue {
    fn from(value: f32) -> Self {
        ContextValueInner::F64(value.into()).into()
    }
}

impl From<serde_json::Value> for ContextValue {
    fn from(value: serde_json::Value) -> Self {
        ContextValueInner::Json(value).into()
    }
}

impl<T: Into<Self>> From<Option<T>> for ContextValue {
    fn from(value: Option<T>) -> Self {
        value.map_or_else(Self::null, Into::into)
    }
}

macro_rules! impl_from_int {
    ($variant:ident: $target:ty => $($ty:ty),+) => {
        $(
            impl From<$ty> for ContextValue {
                fn from(value: $ty) -> Self {
                    ContextValueInner::$variant(<$target>::from(value)).into()
                }
            }
        )+
    };
}

impl_from_int!(I64: i64 => i8, i16, i32, i64);
impl_from_int!(U64: u64 => u8, u16, u32, u64);

// Pointer-sized integers are at most 64 bits wide on every supported target.
#[allow(clippy::cast_possible_truncation)]
impl From<usize> for ContextValue {
    fn from(value: usize) -> Self {
        ContextValueInner::U64(value as u64).into()
    }
}

#[allow(clippy::cast_possible_truncation)]
impl From<isize> for ContextValue {
    fn from(value: isize) -> Self {
        ContextValueInner::I64(value as i64).into()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[derive(Serialize)]
    struct Operation {
        action: &'static str,
        attempts: u32,
    }

    #[test]
    fn test_primitive_values() {
        assert_eq!(ContextValue::from(42).as_i64(), Some(42));
        assert_eq!(ContextValue::from(42_u8).as_u64(), Some(42));
        assert_eq!(ContextValue::from(-1).as_u64(), None);
        assert_eq!(ContextValue::from(true).as_bool(), Some(true));
        assert_eq!(ContextValue::from("bar").as_str(), Some("bar"));
        assert!(ContextValue::from(None::<i32>).is_null());
    }

    #[test]
    fn test_values_to_json() {
        let operation = ContextValue::serde(Operation {
            action: "login",
            attempts: 2,
        });
        assert_eq!(
            operation.to_json().unwrap(),
            json!({ "action": "login", "attempts": 2 })
        );

        let display = ContextValue::display(std::net::Ipv4Addr::LOCALHOST);
        assert_eq!(display.to_json().unwrap(), json!("127.0.0.1"));

        let debug = ContextValue::debug(vec![1, 2]);
        assert_eq!(debug.to_json().unwrap(), json!("[1, 2]"));

        let error = ContextValue::error(std::io::Error::other("boom"));
        assert_eq!(error.to_json().unwrap(), json!("boom"));
    }
}
