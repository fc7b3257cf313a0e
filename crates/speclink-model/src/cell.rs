use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde::de::{DeserializeOwned, Error as _};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A field that holds either an inline value or a `$ref` to one.
///
/// Inline cells are bound from construction. Reference cells start unbound
/// and are bound exactly once by the resolver; every cell bound to the same
/// target shares one `Arc`, so identity survives resolution and recursive
/// schemas point back at themselves instead of being copied.
pub struct Ref<T> {
    reference: Option<String>,
    slot: RwLock<Option<Arc<T>>>,
}

impl<T> Ref<T> {
    /// An inline value.
    pub fn inline(value: T) -> Self {
        Self::shared(Arc::new(value))
    }

    /// An inline cell that shares an existing handle.
    pub fn shared(value: Arc<T>) -> Self {
        Self {
            reference: None,
            slot: RwLock::new(Some(value)),
        }
    }

    /// An unresolved `$ref`.
    pub fn pointer(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            slot: RwLock::new(None),
        }
    }

    /// The `$ref` string, if this cell was written as a reference.
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn is_reference(&self) -> bool {
        self.reference.is_some()
    }

    pub fn is_resolved(&self) -> bool {
        self.read().is_some()
    }

    /// The bound value, or `None` for an unresolved reference.
    pub fn get(&self) -> Option<Arc<T>> {
        self.read().clone()
    }

    /// Bind a reference cell to its target. Returns `false` when the cell was
    /// already bound (the existing binding is kept) or is an inline cell.
    pub fn bind(&self, target: Arc<T>) -> bool {
        if self.reference.is_none() {
            return false;
        }
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return false;
        }
        *slot = Some(target);
        true
    }

    /// Swap an inline value for `target` when the two are equal, so a
    /// location decoded twice keeps one identity. Reference cells and
    /// unequal values are left alone.
    pub fn adopt(&self, target: Arc<T>) -> bool
    where
        T: PartialEq,
    {
        if self.reference.is_some() {
            return false;
        }
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some(current) if Arc::ptr_eq(current, &target) => false,
            Some(current) if **current == *target => {
                *slot = Some(target);
                true
            }
            _ => false,
        }
    }

    /// Drop the binding of a reference cell. Inline cells keep their value.
    pub(crate) fn unbind(&self) -> Option<Arc<T>> {
        if self.reference.is_none() {
            return None;
        }
        self.slot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Whether both cells are bound to the identical instance.
    pub fn same_target(&self, other: &Ref<T>) -> bool {
        match (self.get(), other.get()) {
            (Some(a), Some(b)) => Arc::ptr_eq(&a, &b),
            _ => false,
        }
    }

    /// Whether this cell is bound to the given handle.
    pub fn points_to(&self, target: &Arc<T>) -> bool {
        self.get().is_some_and(|value| Arc::ptr_eq(&value, target))
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<Arc<T>>> {
        self.slot.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: DeserializeOwned> Ref<T> {
    /// Decode from an untyped node: `{"$ref": "..."}` becomes a reference
    /// cell (sibling keys are ignored), anything else an inline value.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        if let Value::Object(map) = &value {
            if let Some(reference) = map.get("$ref") {
                return match reference.as_str() {
                    Some(reference) => Ok(Self::pointer(reference)),
                    None => Err(serde_json::Error::custom("$ref must be a string")),
                };
            }
        }
        T::deserialize(value).map(Self::inline)
    }
}

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        Self {
            reference: self.reference.clone(),
            slot: RwLock::new(self.get()),
        }
    }
}

impl<T> From<T> for Ref<T> {
    fn from(value: T) -> Self {
        Self::inline(value)
    }
}

// Never follows a reference, so comparing cyclic graphs terminates.
impl<T: PartialEq> PartialEq for Ref<T> {
    fn eq(&self, other: &Self) -> bool {
        match (&self.reference, &other.reference) {
            (Some(a), Some(b)) => a == b,
            (None, None) => match (self.get(), other.get()) {
                (Some(a), Some(b)) => Arc::ptr_eq(&a, &b) || *a == *b,
                (None, None) => true,
                _ => false,
            },
            _ => false,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reference {
            Some(reference) => f
                .debug_struct("Ref")
                .field("reference", reference)
                .field("resolved", &self.is_resolved())
                .finish(),
            None => match self.get() {
                Some(value) => fmt::Debug::fmt(&*value, f),
                None => f.write_str("Ref(<empty>)"),
            },
        }
    }
}

impl<T: Serialize> Serialize for Ref<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let Some(reference) = &self.reference {
            let mut map = serializer.serialize_map(Some(1))?;
            map.serialize_entry("$ref", reference)?;
            return map.end();
        }
        match self.get() {
            Some(value) => value.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Ref<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(D::Error::custom)
    }
}
