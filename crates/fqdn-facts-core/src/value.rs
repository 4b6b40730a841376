// # Fact Values
//
// The value model shared by facts, converters and binding contexts.
//
// A fact is either already resolved (a scalar, list or map) or still pending
// as a `Function` that the assembler invokes until nothing pending remains.
// Functions never see ambient variables: everything they may read is handed
// to them explicitly through a `Context`.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::error::{Error, Result};

/// Context key holding the full FQDN being resolved
pub const FQDN_KEY: &str = "fqdn";
/// Context key holding the ordered component → raw segment map
pub const COMPONENTS_KEY: &str = "components";
/// Context key holding the handler priority
pub const PRIORITY_KEY: &str = "priority";
/// Context key holding the handler identifier
pub const HANDLER_CLASS_KEY: &str = "handler_class";

/// A fact value
#[derive(Clone, Default)]
pub enum Value {
    /// Absent value (missing capture, missing binding)
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Symbolic value; stringified before facts are returned
    Symbol(String),
    List(Vec<Value>),
    /// Ordered mapping
    Map(IndexMap<String, Value>),
    /// Pending value, resolved by the assembler
    Function(FactFn),
}

impl Value {
    /// Create a pending value from a function of the binding context
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&Context) -> Result<Value> + Send + Sync + 'static,
    {
        Value::Function(FactFn::new(f))
    }

    /// Whether this value is dropped from the final fact set
    ///
    /// Only `Nil` and blank strings count as empty. Zero, `false` and empty
    /// collections are kept.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Nil => true,
            Value::Str(s) | Value::Symbol(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Whether this value is still pending
    pub fn is_function(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    /// Borrow the string content of `Str` and `Symbol` values
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) | Value::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// Replace a symbol with its string form
    pub fn stringify_symbol(self) -> Self {
        match self {
            Value::Symbol(s) => Value::Str(s),
            other => other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) | Value::Symbol(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str("}")
            }
            Value::Function(_) => f.write_str("<function>"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("Nil"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Value::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Value::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Value::Symbol(s) => f.debug_tuple("Symbol").field(s).finish(),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Map(map) => f.debug_tuple("Map").field(map).finish(),
            Value::Function(_) => f.write_str("Function(<function>)"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Nil => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Str(s) | Value::Symbol(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::Function(_) => Err(S::Error::custom(
                "cannot serialize an unresolved fact function",
            )),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(map: IndexMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl From<FactFn> for Value {
    fn from(f: FactFn) -> Self {
        Value::Function(f)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

/// A function producing a fact from the binding context
#[derive(Clone)]
pub struct FactFn(Arc<dyn Fn(&Context) -> Result<Value> + Send + Sync>);

impl FactFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Context) -> Result<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, ctx: &Context) -> Result<Value> {
        (self.0)(ctx)
    }

    /// Identity comparison; two functions are equal only if they are the same allocation
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for FactFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FactFn(<function>)")
    }
}

/// A function converting a raw value, with the binding context in scope
#[derive(Clone)]
pub struct TransformFn(Arc<dyn Fn(&Value, &Context) -> Result<Value> + Send + Sync>);

impl TransformFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &Context) -> Result<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, raw: &Value, ctx: &Context) -> Result<Value> {
        (self.0)(raw, ctx)
    }
}

impl fmt::Debug for TransformFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TransformFn(<function>)")
    }
}

/// Explicit binding context handed to fact and converter functions
///
/// Holds a snapshot of the working fact set at the time of the call, plus
/// the reserved bindings `fqdn`, `components`, `priority` and
/// `handler_class`. Reserved bindings shadow facts of the same name.
#[derive(Debug, Clone, Default)]
pub struct Context {
    bindings: IndexMap<String, Value>,
}

impl Context {
    pub(crate) fn new(bindings: IndexMap<String, Value>) -> Self {
        Self { bindings }
    }

    /// Look up a binding
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// Look up a binding, yielding `Nil` when absent
    ///
    /// A binding that is itself still pending is returned as the pending
    /// function; a fact that forwards it will be re-evaluated on a later pass.
    pub fn value(&self, name: &str) -> Value {
        self.bindings.get(name).cloned().unwrap_or_default()
    }

    /// Render a binding as text (`""` when absent)
    ///
    /// # Errors
    ///
    /// `PendingBinding` if the binding is still a function. Inside a dynamic
    /// fact, propagate it with `?` and the fact is retried on the next pass.
    pub fn text(&self, name: &str) -> Result<String> {
        match self.bindings.get(name) {
            Some(Value::Function(_)) => Err(Error::PendingBinding(name.to_string())),
            Some(value) => Ok(value.to_string()),
            None => Ok(String::new()),
        }
    }

    /// The full FQDN being resolved
    pub fn fqdn(&self) -> &str {
        self.get(FQDN_KEY).and_then(Value::as_str).unwrap_or_default()
    }

    /// The identifier of the handler doing the resolving
    pub fn handler_class(&self) -> &str {
        self.get(HANDLER_CLASS_KEY)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}
