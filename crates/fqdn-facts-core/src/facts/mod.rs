//! Fact assembly
//!
//! Turns a handler and an FQDN into the final, sorted fact set.
//!
//! ## Pipeline
//!
//! ```text
//! handler facts ──┐
//!                 ├─ seed working set
//! fqdn segments ──┘        │
//!                          v
//!            sub-pattern extraction + conversion   ("<component>_<sub>")
//!                          │
//!                          v
//!            direct component conversion           (in place)
//!                          │
//!                          v
//!            resolve pending functions to a fixed point (capped)
//!                          │
//!                          v
//!            stringify symbols → drop empty → only/prefix → sort
//! ```
//!
//! Assembly is a pure function of the handler and the FQDN: the handler's
//! declared facts and conversions are never modified, and two calls with the
//! same inputs yield identical fact sets.

pub mod template;

pub use template::template;

use std::collections::BTreeMap;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::handler::Handler;
use crate::pattern::Rule;
use crate::value::{COMPONENTS_KEY, Context, FQDN_KEY, HANDLER_CLASS_KEY, PRIORITY_KEY, Value};

/// Final fact set, sorted by name
pub type Facts = BTreeMap<String, Value>;

/// Options applied to an assembled fact set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactOptions {
    /// Prefix for every returned fact name (`"<prefix>_<name>"`)
    pub prefix: Option<String>,
    /// Restrict the result to these (unprefixed) fact names
    pub only: Option<Vec<String>>,
}

impl FactOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Restrict the result to the given names
    pub fn with_only<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only = Some(names.into_iter().map(Into::into).collect());
        self
    }
}

/// Assembles facts for one handler
pub struct FactAssembler<'h> {
    handler: &'h Handler,
}

impl<'h> FactAssembler<'h> {
    pub fn new(handler: &'h Handler) -> Self {
        Self { handler }
    }

    /// Assemble the fact set for `fqdn`
    ///
    /// # Returns
    ///
    /// - `Ok(Facts)`: Sorted, filtered facts
    /// - `Err(Error::UnresolvableDependency)`: Functions still pending after the pass cap,
    ///   or a converter read a binding that was still pending
    /// - `Err(_)`: Any error raised by a converter or fact function, unchanged
    pub fn assemble(&self, fqdn: &str, options: &FactOptions) -> Result<Facts> {
        let components = self.bind_components(fqdn);

        let mut working: IndexMap<String, Value> = self.handler.facts.clone();
        for (name, value) in &components {
            working.insert(name.clone(), value.clone());
        }

        self.extract_sub_facts(fqdn, &components, &mut working)?;
        self.convert_components(fqdn, &components, &mut working)?;
        self.resolve_pending(fqdn, &components, &mut working)?;

        Ok(self.finalize(working, options))
    }

    /// Pair ordered component names with raw segments
    ///
    /// Components past the end of a short FQDN are bound to `Nil`.
    fn bind_components(&self, fqdn: &str) -> IndexMap<String, Value> {
        let order = &self.handler.order;
        let mut segments = fqdn.splitn(order.len(), '.');
        order
            .iter()
            .map(|name| {
                let value = segments.next().map(Value::from).unwrap_or_default();
                (name.clone(), value)
            })
            .collect()
    }

    fn extract_sub_facts(
        &self,
        fqdn: &str,
        components: &IndexMap<String, Value>,
        working: &mut IndexMap<String, Value>,
    ) -> Result<()> {
        for (name, raw) in components {
            let Some(Rule::SubPatterns(parts)) = self.handler.components.get(name) else {
                continue;
            };
            let Some(raw) = raw.as_str() else {
                continue;
            };
            for (sub, captured) in parts.extract(raw) {
                let key = format!("{}_{}", name, sub);
                let raw_sub = captured.map(Value::from).unwrap_or_default();
                let converter = self
                    .handler
                    .conversions
                    .get(name)
                    .and_then(|c| c.for_sub(sub));
                let value = match converter {
                    Some(converter) => {
                        let ctx = self.context(fqdn, components, working);
                        converter
                            .convert(&key, &raw_sub, &ctx)
                            .map_err(pending_as_unresolvable)?
                    }
                    None => raw_sub,
                };
                trace!(fact = %key, value = %value, "extracted sub-component");
                working.insert(key, value);
            }
        }
        Ok(())
    }

    fn convert_components(
        &self,
        fqdn: &str,
        components: &IndexMap<String, Value>,
        working: &mut IndexMap<String, Value>,
    ) -> Result<()> {
        for name in components.keys() {
            if matches!(self.handler.components.get(name), Some(Rule::SubPatterns(_))) {
                continue;
            }
            let Some(converter) = self
                .handler
                .conversions
                .get(name)
                .and_then(|c| c.direct())
            else {
                continue;
            };
            let current = working.get(name).cloned().unwrap_or_default();
            let ctx = self.context(fqdn, components, working);
            let converted = converter
                .convert(name, &current, &ctx)
                .map_err(pending_as_unresolvable)?;
            working.insert(name.clone(), converted);
        }
        Ok(())
    }

    /// Invoke pending functions until none remain or the pass cap is hit
    fn resolve_pending(
        &self,
        fqdn: &str,
        components: &IndexMap<String, Value>,
        working: &mut IndexMap<String, Value>,
    ) -> Result<()> {
        let max_passes = self.handler.max_fact_passes;
        let mut passes = 0;

        loop {
            let pending: Vec<String> = working
                .iter()
                .filter(|(_, v)| v.is_function())
                .map(|(k, _)| k.clone())
                .collect();

            if pending.is_empty() {
                break;
            }
            if passes >= max_passes {
                return Err(Error::UnresolvableDependency { passes, pending });
            }
            passes += 1;

            for key in pending {
                let Some(Value::Function(f)) = working.get(&key).cloned() else {
                    continue;
                };
                let ctx = self.context(fqdn, components, working);
                match f.call(&ctx) {
                    Ok(value) => {
                        working.insert(key, value);
                    }
                    Err(Error::PendingBinding(binding)) => {
                        trace!(fact = %key, binding = %binding, pass = passes, "deferred");
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        debug!(handler = %self.handler.name, fqdn, passes, "dynamic facts resolved");
        Ok(())
    }

    /// Build a binding context from the current working set
    fn context(
        &self,
        fqdn: &str,
        components: &IndexMap<String, Value>,
        working: &IndexMap<String, Value>,
    ) -> Context {
        let mut bindings = working.clone();
        bindings.insert(FQDN_KEY.to_string(), Value::from(fqdn));
        bindings.insert(COMPONENTS_KEY.to_string(), Value::Map(components.clone()));
        bindings.insert(PRIORITY_KEY.to_string(), Value::Int(self.handler.priority));
        bindings.insert(
            HANDLER_CLASS_KEY.to_string(),
            Value::from(self.handler.name.as_str()),
        );
        Context::new(bindings)
    }

    fn finalize(&self, working: IndexMap<String, Value>, options: &FactOptions) -> Facts {
        let only = options.only.as_ref().filter(|names| !names.is_empty());
        let prefix = options.prefix.as_deref().filter(|p| !p.is_empty());

        working
            .into_iter()
            .map(|(k, v)| (k, v.stringify_symbol()))
            .filter(|(_, v)| !v.is_empty())
            .filter(|(k, _)| only.is_none_or(|names| names.iter().any(|n| n == k)))
            .map(|(k, v)| match prefix {
                Some(p) => (format!("{}_{}", p, k), v),
                None => (k, v),
            })
            .collect()
    }
}

/// Converters run before dynamic facts resolve and cannot be retried
fn pending_as_unresolvable(err: Error) -> Error {
    match err {
        Error::PendingBinding(binding) => Error::UnresolvableDependency {
            passes: 0,
            pending: vec![binding],
        },
        other => other,
    }
}
