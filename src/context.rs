//! Request context passed through to endpoints.
//!
//! The dispatcher never looks inside the context. It is handed to the endpoint
//! as `&mut RequestContext`, so anything the endpoint inserts or changes is
//! visible to the caller once the call returns.
//!
//! Values are type-erased: any `Send + Sync + 'static` value can be stored
//! (connection handles, domain structs, callbacks) and read back with the
//! typed accessors. [`RequestContext::to_json`] renders a JSON view for
//! display.

use serde_json::{Map, Value};
use std::any::Any;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// A stored context value
pub type ContextValue = Box<dyn Any + Send + Sync>;

/// Opaque bag of string keys to caller-supplied values.
#[derive(Default)]
pub struct RequestContext {
    values: HashMap<String, ContextValue>,
}

impl RequestContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value, returning the previous one
    pub fn insert<T>(&mut self, key: impl Into<String>, value: T) -> Option<ContextValue>
    where
        T: Any + Send + Sync,
    {
        self.values.insert(key.into(), Box::new(value))
    }

    /// Borrow the value under `key` as a `T`; `None` if absent or another type
    #[must_use]
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.values.get(key).and_then(|v| (**v).downcast_ref::<T>())
    }

    #[must_use]
    pub fn get_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.values.get_mut(key).and_then(|v| (**v).downcast_mut::<T>())
    }

    /// Get a string value by key (`String` or `&'static str`)
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        let value = self.values.get(key)?;
        if let Some(s) = (**value).downcast_ref::<String>() {
            Some(s.as_str())
        } else if let Some(s) = (**value).downcast_ref::<&'static str>() {
            Some(*s)
        } else {
            (**value).downcast_ref::<Value>().and_then(Value::as_str)
        }
    }

    /// Remove and return the value under `key` if it is a `T`.
    ///
    /// A value of another type is left in place.
    pub fn take<T: Any>(&mut self, key: &str) -> Option<T> {
        self.get::<T>(key)?;
        let boxed = self.values.remove(key)?;
        boxed.downcast::<T>().ok().map(|b| *b)
    }

    pub fn remove(&mut self, key: &str) -> Option<ContextValue> {
        self.values.remove(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Keys currently present, sorted
    #[must_use]
    pub fn keys(&self) -> BTreeSet<&str> {
        self.values.keys().map(String::as_str).collect()
    }

    /// JSON view of the context.
    ///
    /// JSON values, strings, booleans and plain numbers are rendered as
    /// themselves; any other type is opaque and renders as `null`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), json_view(&**v)))
            .collect();
        Value::Object(map)
    }
}

fn json_view(value: &(dyn Any + Send + Sync)) -> Value {
    if let Some(v) = value.downcast_ref::<Value>() {
        v.clone()
    } else if let Some(s) = value.downcast_ref::<String>() {
        Value::from(s.as_str())
    } else if let Some(s) = value.downcast_ref::<&'static str>() {
        Value::from(*s)
    } else if let Some(b) = value.downcast_ref::<bool>() {
        Value::from(*b)
    } else if let Some(n) = value.downcast_ref::<i64>() {
        Value::from(*n)
    } else if let Some(n) = value.downcast_ref::<i32>() {
        Value::from(*n)
    } else if let Some(n) = value.downcast_ref::<u64>() {
        Value::from(*n)
    } else if let Some(n) = value.downcast_ref::<u32>() {
        Value::from(*n)
    } else if let Some(n) = value.downcast_ref::<f64>() {
        Value::from(*n)
    } else {
        Value::Null
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("keys", &self.keys())
            .finish()
    }
}

impl<K, V> FromIterator<(K, V)> for RequestContext
where
    K: Into<String>,
    V: Any + Send + Sync,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut ctx = Self::new();
        for (k, v) in iter {
            ctx.insert(k, v);
        }
        ctx
    }
}
