//! Key/value execution context.
//!
//! The engine never looks inside the context. Actions and guards are the
//! only parties that read or write it. [`Context`] is the storage contract
//! and [`SimpleContext`] the in-memory implementation.

use super::error::{codes, ActionError};
use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Errors raised by typed context reads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("No value stored under key '{key}'")]
    Missing { key: String },

    #[error("Value under key '{key}' is not a {expected}")]
    TypeMismatch { key: String, expected: &'static str },
}

impl ContextError {
    pub fn code(&self) -> u32 {
        match self {
            ContextError::Missing { .. } => codes::CONTEXT,
            ContextError::TypeMismatch { .. } => codes::CONTEXT_TYPE_MISMATCH,
        }
    }
}

impl From<ContextError> for ActionError {
    fn from(err: ContextError) -> Self {
        ActionError::from_error(err.code(), &err)
    }
}

/// Storage contract for execution contexts.
///
/// # Example
///
/// ```rust
/// use gameflow::core::{Context, ContextError, SimpleContext};
///
/// let mut ctx = SimpleContext::new();
/// ctx.put("free_spins", 3i32);
///
/// assert_eq!(*ctx.get::<i32>("free_spins").unwrap(), 3);
/// assert!(matches!(
///     ctx.get::<String>("free_spins"),
///     Err(ContextError::TypeMismatch { .. })
/// ));
/// assert!(ctx.remove("free_spins"));
/// assert!(!ctx.exists("free_spins"));
/// ```
pub trait Context {
    /// Store a value, replacing any previous value under the key.
    fn put<V: Any + Send + Sync>(&mut self, key: impl Into<String>, value: V);

    /// Read a value with an expected type.
    fn get<V: Any>(&self, key: &str) -> Result<&V, ContextError>;

    /// Read a value without a type expectation.
    fn get_untyped(&self, key: &str) -> Option<&(dyn Any + Send + Sync)>;

    /// Remove a value. Returns whether anything was removed.
    fn remove(&mut self, key: &str) -> bool;

    fn exists(&self, key: &str) -> bool;

    fn clear(&mut self);
}

/// In-memory context backed by a hash map.
#[derive(Default)]
pub struct SimpleContext {
    values: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl SimpleContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store every pair from the iterator.
    pub fn put_all<K, V, I>(&mut self, values: I)
    where
        K: Into<String>,
        V: Any + Send + Sync,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in values {
            self.put(key, value);
        }
    }

    /// Mutable typed access.
    pub fn get_mut<V: Any>(&mut self, key: &str) -> Result<&mut V, ContextError> {
        let value = self.values.get_mut(key).ok_or_else(|| ContextError::Missing {
            key: key.to_string(),
        })?;
        value
            .downcast_mut::<V>()
            .ok_or_else(|| ContextError::TypeMismatch {
                key: key.to_string(),
                expected: type_name::<V>(),
            })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl Context for SimpleContext {
    fn put<V: Any + Send + Sync>(&mut self, key: impl Into<String>, value: V) {
        self.values.insert(key.into(), Box::new(value));
    }

    fn get<V: Any>(&self, key: &str) -> Result<&V, ContextError> {
        let value = self.values.get(key).ok_or_else(|| ContextError::Missing {
            key: key.to_string(),
        })?;
        value
            .downcast_ref::<V>()
            .ok_or_else(|| ContextError::TypeMismatch {
                key: key.to_string(),
                expected: type_name::<V>(),
            })
    }

    fn get_untyped(&self, key: &str) -> Option<&(dyn Any + Send + Sync)> {
        self.values.get(key).map(|value| value.as_ref())
    }

    fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    fn exists(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    fn clear(&mut self) {
        self.values.clear();
    }
}

impl fmt::Debug for SimpleContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.keys().collect();
        keys.sort_unstable();
        f.debug_struct("SimpleContext").field("keys", &keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_returns_value() {
        let mut ctx = SimpleContext::new();
        ctx.put("bet", 10u64);
        assert_eq!(*ctx.get::<u64>("bet").unwrap(), 10);
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn put_replaces_previous_value() {
        let mut ctx = SimpleContext::new();
        ctx.put("bet", 10u64);
        ctx.put("bet", "ten".to_string());
        assert_eq!(ctx.get::<String>("bet").unwrap(), "ten");
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn missing_key_reports_context_code() {
        let ctx = SimpleContext::new();
        let err = ctx.get::<u64>("nope").unwrap_err();
        assert_eq!(err, ContextError::Missing { key: "nope".into() });
        assert_eq!(err.code(), codes::CONTEXT);
    }

    #[test]
    fn wrong_type_reports_mismatch_with_expected_name() {
        let mut ctx = SimpleContext::new();
        ctx.put("bet", 10u64);
        let err = ctx.get::<i32>("bet").unwrap_err();
        assert_eq!(err.code(), codes::CONTEXT_TYPE_MISMATCH);
        assert!(err.to_string().contains("i32"));
    }

    #[test]
    fn context_error_converts_to_action_error_with_code_as_tag() {
        let err: ActionError = ContextError::Missing { key: "k".into() }.into();
        assert_eq!(err.tag(), codes::CONTEXT);
    }

    #[test]
    fn get_mut_allows_in_place_update() {
        let mut ctx = SimpleContext::new();
        ctx.put("spins", 2i32);
        *ctx.get_mut::<i32>("spins").unwrap() -= 1;
        assert_eq!(*ctx.get::<i32>("spins").unwrap(), 1);
    }

    #[test]
    fn untyped_get_allows_downcast() {
        let mut ctx = SimpleContext::new();
        ctx.put("name", "reel".to_string());
        let any = ctx.get_untyped("name").unwrap();
        assert_eq!(any.downcast_ref::<String>().unwrap(), "reel");
        assert!(ctx.get_untyped("other").is_none());
    }

    #[test]
    fn put_all_remove_and_clear() {
        let mut ctx = SimpleContext::new();
        ctx.put_all(vec![("a", 1i32), ("b", 2i32)]);
        assert!(ctx.exists("a"));
        assert!(ctx.remove("a"));
        assert!(!ctx.remove("a"));
        ctx.clear();
        assert!(ctx.is_empty());
    }
}
