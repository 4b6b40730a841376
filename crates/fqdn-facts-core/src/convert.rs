//! Conversion of raw component values into typed fact values
//!
//! A [`Converter`] is applied to one raw value. Components with sub-patterns
//! carry one converter per sub-pattern name; other components carry at most
//! one direct converter. Both shapes are wrapped in a [`Conversion`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::value::{Context, FactFn, TransformFn, Value};

/// Primitive static coercions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coercion {
    ToInt,
    ToFloat,
    ToString,
    /// Wrap a scalar in a one-element list; lists pass through
    ToArray,
    ToSymbol,
}

impl Coercion {
    /// Apply the coercion
    ///
    /// `Nil` passes through every coercion unchanged.
    ///
    /// # Parameters
    ///
    /// - `key`: Fact key, used in error messages
    /// - `raw`: Value to coerce
    pub fn apply(self, key: &str, raw: &Value) -> Result<Value> {
        if matches!(raw, Value::Nil) {
            return Ok(Value::Nil);
        }
        match self {
            Coercion::ToInt => match raw {
                Value::Int(i) => Ok(Value::Int(*i)),
                Value::Float(x) => Ok(Value::Int(*x as i64)),
                Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
                other => {
                    let text = other.to_string();
                    text.trim()
                        .parse::<i64>()
                        .map(Value::Int)
                        .map_err(|e| {
                            Error::conversion(key, format!("'{}' is not an integer: {}", text, e))
                        })
                }
            },
            Coercion::ToFloat => match raw {
                Value::Float(x) => Ok(Value::Float(*x)),
                Value::Int(i) => Ok(Value::Float(*i as f64)),
                other => {
                    let text = other.to_string();
                    text.trim()
                        .parse::<f64>()
                        .map(Value::Float)
                        .map_err(|e| {
                            Error::conversion(key, format!("'{}' is not a float: {}", text, e))
                        })
                }
            },
            Coercion::ToString => Ok(Value::Str(raw.to_string())),
            Coercion::ToArray => match raw {
                Value::List(items) => Ok(Value::List(items.clone())),
                other => Ok(Value::List(vec![other.clone()])),
            },
            Coercion::ToSymbol => Ok(Value::Symbol(raw.to_string())),
        }
    }
}

/// A converter for one raw value
#[derive(Debug, Clone)]
pub enum Converter {
    /// Primitive coercion
    Coerce(Coercion),
    /// Translation table; values without an entry pass through unchanged
    Lookup(IndexMap<String, Value>),
    /// Function of the binding context only
    Contextual(FactFn),
    /// Function of the raw value and the binding context
    Transform(TransformFn),
}

impl Converter {
    /// Converter calling `f(raw, ctx)`
    pub fn transform<F>(f: F) -> Self
    where
        F: Fn(&Value, &Context) -> Result<Value> + Send + Sync + 'static,
    {
        Converter::Transform(TransformFn::new(f))
    }

    /// Converter calling `f(ctx)`; the raw value is not passed
    pub fn contextual<F>(f: F) -> Self
    where
        F: Fn(&Context) -> Result<Value> + Send + Sync + 'static,
    {
        Converter::Contextual(FactFn::new(f))
    }

    /// Translation-table converter
    pub fn lookup<I, K, V>(table: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Converter::Lookup(
            table
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Convert `raw`, storing symbolic function results as strings
    pub fn convert(&self, key: &str, raw: &Value, ctx: &Context) -> Result<Value> {
        match self {
            Converter::Coerce(coercion) => coercion.apply(key, raw),
            Converter::Lookup(table) => Ok(raw
                .as_str()
                .and_then(|s| table.get(s))
                .cloned()
                .unwrap_or_else(|| raw.clone())),
            Converter::Contextual(f) => f.call(ctx).map(Value::stringify_symbol),
            Converter::Transform(f) => f.call(raw, ctx).map(Value::stringify_symbol),
        }
    }
}

impl From<Coercion> for Converter {
    fn from(coercion: Coercion) -> Self {
        Converter::Coerce(coercion)
    }
}

/// The converter(s) registered for one component
#[derive(Debug, Clone)]
pub enum Conversion {
    /// Applied to the component's own value
    Direct(Converter),
    /// Applied per sub-pattern name
    Sub(IndexMap<String, Converter>),
}

impl Conversion {
    /// Per-sub-pattern conversion from `(name, converter)` pairs
    pub fn sub<I, K, C>(converters: I) -> Self
    where
        I: IntoIterator<Item = (K, C)>,
        K: Into<String>,
        C: Into<Converter>,
    {
        Conversion::Sub(
            converters
                .into_iter()
                .map(|(k, c)| (k.into(), c.into()))
                .collect(),
        )
    }

    /// Combine with a newly installed conversion
    ///
    /// Two sub-pattern mappings merge shallowly with the new entries winning;
    /// any other combination is a replacement.
    pub fn merge(self, new: Conversion) -> Conversion {
        match (self, new) {
            (Conversion::Sub(mut existing), Conversion::Sub(new)) => {
                existing.extend(new);
                Conversion::Sub(existing)
            }
            (_, new) => new,
        }
    }

    /// Converter for a sub-pattern name, if this is a sub-pattern mapping
    pub fn for_sub(&self, name: &str) -> Option<&Converter> {
        match self {
            Conversion::Sub(map) => map.get(name),
            Conversion::Direct(_) => None,
        }
    }

    /// Converter for the component value, if this is a direct conversion
    pub fn direct(&self) -> Option<&Converter> {
        match self {
            Conversion::Direct(c) => Some(c),
            Conversion::Sub(_) => None,
        }
    }
}

impl From<Converter> for Conversion {
    fn from(converter: Converter) -> Self {
        Conversion::Direct(converter)
    }
}

impl From<Coercion> for Conversion {
    fn from(coercion: Coercion) -> Self {
        Conversion::Direct(Converter::Coerce(coercion))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> Context {
        Context::default()
    }

    #[test]
    fn test_static_coercions() {
        let raw = Value::from("01");
        assert_eq!(Coercion::ToInt.apply("k", &raw).unwrap(), Value::Int(1));
        assert_eq!(Coercion::ToFloat.apply("k", &raw).unwrap(), Value::Float(1.0));
        assert_eq!(Coercion::ToString.apply("k", &Value::Int(7)).unwrap(), Value::from("7"));
        assert_eq!(
            Coercion::ToArray.apply("k", &raw).unwrap(),
            Value::List(vec![Value::from("01")])
        );
        assert_eq!(
            Coercion::ToSymbol.apply("k", &raw).unwrap(),
            Value::Symbol("01".into())
        );
        assert_eq!(Coercion::ToInt.apply("k", &Value::Nil).unwrap(), Value::Nil);
    }

    #[test]
    fn test_failed_coercion_names_key() {
        let err = Coercion::ToInt.apply("host_id", &Value::from("abc")).unwrap_err();
        assert!(matches!(err, Error::Conversion { ref key, .. } if key == "host_id"));
    }

    #[test]
    fn test_lookup_passes_misses_through() {
        let c = Converter::lookup([("m", "master"), ("s", "slave")]);
        assert_eq!(c.convert("k", &Value::from("m"), &ctx()).unwrap(), Value::from("master"));
        assert_eq!(c.convert("k", &Value::from("x"), &ctx()).unwrap(), Value::from("x"));
    }

    #[test]
    fn test_function_results_are_stringified() {
        let c = Converter::transform(|raw, _| Ok(Value::Symbol(format!("{}!", raw))));
        assert_eq!(c.convert("k", &Value::from("a"), &ctx()).unwrap(), Value::from("a!"));

        let c = Converter::contextual(|_| Ok(Value::Symbol("x".into())));
        assert_eq!(c.convert("k", &Value::Nil, &ctx()).unwrap(), Value::from("x"));
    }

    #[test]
    fn test_sub_conversions_merge_shallowly() {
        let a = Conversion::sub([("id", Coercion::ToInt), ("subtype", Coercion::ToSymbol)]);
        let b = Conversion::sub([("subtype", Coercion::ToString)]);
        let merged = a.merge(b);

        assert!(matches!(merged.for_sub("id"), Some(Converter::Coerce(Coercion::ToInt))));
        assert!(matches!(
            merged.for_sub("subtype"),
            Some(Converter::Coerce(Coercion::ToString))
        ));
    }

    #[test]
    fn test_direct_replaces_sub() {
        let a = Conversion::sub([("id", Coercion::ToInt)]);
        let merged = a.merge(Conversion::from(Coercion::ToString));
        assert!(merged.direct().is_some());
        assert!(merged.for_sub("id").is_none());
    }
}
