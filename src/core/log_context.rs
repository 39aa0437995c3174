//! Structured key-value context attached to records
//!
//! This module provides:
//! - `LogContext`: the `extra` map carried by a record
//! - `LoggerContext`: fields shared by every record of one logger
//! - `ContextGuard`: RAII guard for a field scoped to the current thread

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

struct ScopedField {
    context: u64,
    guard: u64,
    key: String,
    value: FieldValue,
}

thread_local! {
    // Fields pushed by live guards on this thread, oldest first
    static SCOPED: RefCell<Vec<ScopedField>> = const { RefCell::new(Vec::new()) };
}

/// Value type for structured logging fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(fl) => write!(f, "{}", fl),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Null => write!(f, "null"),
        }
    }
}

impl FieldValue {
    /// Convert to serde_json::Value for JSON serialization
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            FieldValue::String(s) => serde_json::Value::String(s.clone()),
            FieldValue::Int(i) => serde_json::Value::Number((*i).into()),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::Bool(b) => serde_json::Value::Bool(*b),
            FieldValue::Null => serde_json::Value::Null,
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<&String> for FieldValue {
    fn from(s: &String) -> Self {
        FieldValue::String(s.clone())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(i64::from(i))
    }
}

impl From<u32> for FieldValue {
    fn from(i: u32) -> Self {
        FieldValue::Int(i64::from(i))
    }
}

impl From<u64> for FieldValue {
    fn from(i: u64) -> Self {
        i64::try_from(i)
            .map(FieldValue::Int)
            .unwrap_or_else(|_| FieldValue::String(i.to_string()))
    }
}

impl From<usize> for FieldValue {
    fn from(i: usize) -> Self {
        FieldValue::from(i as u64)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// Ordered key-value fields of a single record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogContext {
    fields: BTreeMap<String, FieldValue>,
}

impl LogContext {
    /// Create a new empty log context
    pub fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Add a field to the context
    #[must_use]
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Add a field to the context (mutable version)
    pub fn add_field<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Get all fields
    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    /// Check if context has any fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Overlay `other` on top of this context; its fields win on conflict
    pub fn extend(&mut self, other: &LogContext) {
        for (key, value) in &other.fields {
            self.fields.insert(key.clone(), value.clone());
        }
    }

    /// Format fields as key=value pairs
    pub fn format_fields(&self) -> String {
        self.fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json_value()))
                .collect(),
        )
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_fields())
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for LogContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Logger-level persistent context
///
/// `LoggerContext` stores fields that are merged into the `extra` map of
/// every record the logger builds, underneath any per-call fields.
/// Fields from [`set`](Self::set) are shared by all threads; fields from
/// [`scoped`](Self::scoped) are visible only on the thread holding the guard
/// and shadow shared fields of the same name.
///
/// Thread-safe: Can be safely shared across threads. Clones share both the
/// fields and the scoped overlay.
///
/// # Example
///
/// ```
/// use sinklog::core::LoggerContext;
///
/// let ctx = LoggerContext::new();
/// ctx.set("service", "api-gateway");
/// ctx.set("version", "1.2.3");
///
/// let fields = ctx.to_log_context();
/// assert_eq!(fields.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct LoggerContext {
    id: u64,
    fields: Arc<RwLock<BTreeMap<String, FieldValue>>>,
}

impl LoggerContext {
    /// Create a new empty logger context
    pub fn new() -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            fields: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Set a field in the context
    ///
    /// If the field already exists, it will be overwritten.
    pub fn set<K, V>(&self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields.write().insert(key.into(), value.into());
    }

    /// Remove a shared field from the context
    pub fn remove(&self, key: &str) -> Option<FieldValue> {
        self.fields.write().remove(key)
    }

    /// Clear all shared fields; scoped fields live until their guards drop
    pub fn clear(&self) {
        self.fields.write().clear();
    }

    /// Value seen by records built on the current thread
    pub fn get(&self, key: &str) -> Option<FieldValue> {
        let scoped = SCOPED.with(|stack| {
            stack
                .borrow()
                .iter()
                .rev()
                .find(|field| field.context == self.id && field.key == key)
                .map(|field| field.value.clone())
        });
        scoped.or_else(|| self.fields.read().get(key).cloned())
    }

    /// Check if the current thread sees no fields
    pub fn is_empty(&self) -> bool {
        self.to_log_context().is_empty()
    }

    /// Number of distinct fields seen on the current thread
    pub fn len(&self) -> usize {
        self.to_log_context().len()
    }

    /// Set a field on the current thread for the lifetime of the returned guard
    ///
    /// Guards nest: dropping one reveals whatever value was visible before it,
    /// in whatever order the guards are dropped.
    #[must_use = "the field is removed as soon as the guard is dropped"]
    pub fn scoped<K, V>(&self, key: K, value: V) -> ContextGuard
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let guard = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        SCOPED.with(|stack| {
            stack.borrow_mut().push(ScopedField {
                context: self.id,
                guard,
                key: key.into(),
                value: value.into(),
            })
        });
        ContextGuard {
            guard,
            _not_send: PhantomData,
        }
    }

    /// Snapshot the fields seen on the current thread as a `LogContext`
    pub fn to_log_context(&self) -> LogContext {
        let mut fields = self.fields.read().clone();
        SCOPED.with(|stack| {
            for field in stack.borrow().iter().filter(|field| field.context == self.id) {
                fields.insert(field.key.clone(), field.value.clone());
            }
        });
        LogContext { fields }
    }

    /// Build the `extra` map of a record: these fields, overlaid by `per_call`
    pub fn merged_with(&self, per_call: &LogContext) -> LogContext {
        let mut merged = self.to_log_context();
        merged.extend(per_call);
        merged
    }
}

impl Default for LoggerContext {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard for a context field scoped to the creating thread
///
/// Not `Send`: the field is registered on the thread that created the guard.
///
/// # Example
///
/// ```
/// use sinklog::core::LoggerContext;
///
/// let ctx = LoggerContext::new();
/// {
///     let _guard = ctx.scoped("request_id", "abc-123");
///     assert!(ctx.get("request_id").is_some());
/// }
/// assert!(ctx.get("request_id").is_none());
/// ```
pub struct ContextGuard {
    guard: u64,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        // try_with: the thread-local may already be gone during thread exit
        let _ = SCOPED.try_with(|stack| {
            stack.borrow_mut().retain(|field| field.guard != self.guard);
        });
    }
}

impl fmt::Debug for ContextGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextGuard").field("guard", &self.guard).finish()
    }
}
