//! The mutable key/value mapping accumulated during a unit of work.

use std::{collections::BTreeMap, sync::Arc};

use parking_lot::Mutex;
use serde::{Serialize, Serializer};

use crate::{ContextValue, StaticCowStr};

/// Plain, ordered contents of a [`ContextMapping`].
pub type ContextFields = BTreeMap<StaticCowStr, ContextValue>;

/// A shared handle to the context mapping of one execution context.
///
/// Clones of the handle point to the same mapping: a value inserted through
/// one clone is visible through every other. The mapping is created by the
/// [`ContextStore`](crate::ContextStore) and stays reachable through it until
/// the owning session exits or the entry is cleared; handles kept past that
/// point are detached from the store.
///
/// # Examples
///
/// ```
/// use metlog_context::ContextMapping;
///
/// let mapping = ContextMapping::new();
/// let alias = mapping.clone();
///
/// alias.insert("foo", 42);
/// assert_eq!(mapping.get("foo").and_then(|value| value.as_i64()), Some(42));
/// assert!(mapping.ptr_eq(&alias));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ContextMapping {
    inner: Arc<Mutex<ContextFields>>,
}

impl ContextMapping {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, returning the previous value stored under the key.
    pub fn insert(
        &self,
        key: impl Into<StaticCowStr>,
        value: impl Into<ContextValue>,
    ) -> Option<ContextValue> {
        self.inner.lock().insert(key.into(), value.into())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<ContextValue> {
        self.inner.lock().get(key).cloned()
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.lock().contains_key(key)
    }

    pub fn remove(&self, key: &str) -> Option<ContextValue> {
        self.inner.lock().remove(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    #[must_use]
    pub fn keys(&self) -> Vec<StaticCowStr> {
        self.inner.lock().keys().cloned().collect()
    }

    /// Replaces the whole contents, keeping the mapping identity.
    pub fn replace(&self, fields: ContextFields) -> ContextFields {
        std::mem::replace(&mut *self.inner.lock(), fields)
    }

    /// Returns a copy of the current contents.
    #[must_use]
    pub fn snapshot(&self) -> ContextFields {
        self.inner.lock().clone()
    }

    /// Returns `true` if both handles refer to the same mapping.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Renders the current contents as a JSON object.
    ///
    /// # Errors
    ///
    /// Returns an error if one of the stored values fails to serialize.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

impl Serialize for ContextMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Serialize a snapshot so that user serializers never run under the lock.
        self.snapshot().serialize(serializer)
    }
}

impl<K, V> FromIterator<(K, V)> for ContextMapping
where
    K: Into<StaticCowStr>,
    V: Into<ContextValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let fields = iter
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self {
            inner: Arc::new(Mutex::new(fields)),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_mapping_shared_between_clones() {
        let mapping = ContextMapping::new();
        assert!(mapping.is_empty());

        let alias = mapping.clone();
        alias.insert("foo", "bar");
        alias.insert("answer", 42);

        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.get("foo").unwrap().as_str(), Some("bar"));
        assert!(mapping.ptr_eq(&alias));
        assert!(!mapping.ptr_eq(&ContextMapping::new()));
    }

    #[test]
    fn test_mapping_replace_keeps_identity() {
        let mapping: ContextMapping = [("foo", 432_432)].into_iter().collect();
        let alias = mapping.clone();

        let previous = mapping.replace(ContextFields::from([("bar".into(), "baz".into())]));
        assert_eq!(previous.len(), 1);
        assert!(!alias.contains_key("foo"));
        assert_eq!(alias.get("bar").unwrap().as_str(), Some("baz"));
    }

    #[test]
    fn test_mapping_to_json() {
        let mapping = ContextMapping::new();
        mapping.insert("foo", 42);
        mapping.insert("user", ContextValue::null());
        mapping.remove("missing");

        assert_eq!(
            mapping.to_json().unwrap(),
            json!({ "foo": 42, "user": null })
        );
        assert_eq!(mapping.keys(), vec!["foo", "user"]);
    }
}
