// # Template Facts
//
// A template fact renders a string such as `"{sub}.{tld}"` from other facts
// by name. It lets declarative configuration express dependent facts without
// code.
//
// While any referenced fact is still pending, rendering fails with
// `PendingBinding` and the assembler retries the template on its next pass.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::value::{FactFn, Value};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
});

/// Create a dynamic fact rendering `source`
///
/// Placeholders name any binding of the context; absent bindings render as
/// an empty string.
///
/// # Example
///
/// ```rust
/// use fqdn_facts_core::facts::template;
/// use fqdn_facts_core::Value;
///
/// let domain = Value::Function(template("{sub}.{tld}"));
/// assert!(domain.is_function());
/// ```
pub fn template(source: &str) -> FactFn {
    let source = source.to_string();
    let names = placeholders(&source);

    FactFn::new(move |ctx| {
        let mut rendered = HashMap::with_capacity(names.len());
        for name in &names {
            if !rendered.contains_key(name.as_str()) {
                rendered.insert(name.as_str(), ctx.text(name)?);
            }
        }

        let out = PLACEHOLDER.replace_all(&source, |caps: &Captures<'_>| {
            rendered.get(&caps[1]).cloned().unwrap_or_default()
        });
        Ok(Value::Str(out.into_owned()))
    })
}

/// Names referenced by a template, in order of appearance
pub fn placeholders(source: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(source)
        .map(|caps| caps[1].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::value::Context;
    use indexmap::IndexMap;

    fn ctx(pairs: &[(&str, Value)]) -> Context {
        let bindings: IndexMap<String, Value> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        Context::new(bindings)
    }

    #[test]
    fn test_renders_bindings() {
        let f = template("{sub}.{tld}");
        let out = f
            .call(&ctx(&[("sub", "bar".into()), ("tld", "example.com".into())]))
            .unwrap();
        assert_eq!(out, Value::from("bar.example.com"));
    }

    #[test]
    fn test_absent_bindings_render_empty() {
        let f = template("{host}");
        assert_eq!(f.call(&ctx(&[])).unwrap(), Value::from(""));
    }

    #[test]
    fn test_pending_dependency_defers() {
        let f = template("{hostname}");
        let pending = Value::function(|_| Ok(Value::from("x")));
        let err = f.call(&ctx(&[("hostname", pending)])).unwrap_err();
        assert!(matches!(err, Error::PendingBinding(ref name) if name == "hostname"));
    }

    #[test]
    fn test_placeholders_in_order() {
        assert_eq!(placeholders("{a}-{b}.{a}"), vec!["a", "b", "a"]);
    }
}
