// # Handler Builder
//
// Registration-time customization of a handler.
//
// Each method corresponds to one declarative call (priority, order,
// component, convert, add/remove fact). Calls are applied in the order they
// are made; the finished handler is produced by `build()`.
//
// ## Usage
//
// ```rust
// use fqdn_facts_core::{HandlerBuilder, Rule, Value};
//
// let mut builder = HandlerBuilder::new("web");
// builder.priority(5);
// builder.order(["host", "domain"])?;
// builder.component("host", Rule::one_of(["www", "api"]))?;
// builder.add_fact("role", "frontend");
// let handler = builder.build();
//
// assert!(handler.matches("www.example.com"));
// # Ok::<(), fqdn_facts_core::Error>(())
// ```

use tracing::trace;

use super::{
    DEFAULT_ORDER, DEFAULT_PRIORITY, FQDN_FACT, HANDLER_NAME_FACT, Handler, HandlerState,
};
use crate::config::default_max_fact_passes;
use crate::convert::{Conversion, Converter};
use crate::error::{Error, Result};
use crate::pattern::Rule;
use crate::value::{Context, FQDN_KEY, Value};

/// Builder for [`Handler`]s
#[derive(Debug, Clone)]
pub struct HandlerBuilder {
    handler: Handler,
}

impl HandlerBuilder {
    /// Start a fresh handler
    ///
    /// Defaults: priority 1, order `host, sub, tld`, no rules, no
    /// conversions, and the seeded `fqdn` and `handler_name` facts.
    pub fn new(name: impl Into<String>) -> Self {
        let state = HandlerState {
            priority: DEFAULT_PRIORITY,
            order: DEFAULT_ORDER.iter().map(|s| s.to_string()).collect(),
            components: Default::default(),
            conversions: Default::default(),
            facts: Default::default(),
        };
        Self::from_state(name, state)
    }

    /// Start a handler from a deep copy of another handler's state
    ///
    /// The copy keeps the source's priority, order, rules, conversions and
    /// facts; `handler_name` is rebound to the new name.
    pub fn copy_from(name: impl Into<String>, source: &Handler) -> Self {
        let mut builder = Self::from_state(name, source.export_state());
        builder.handler.max_fact_passes = source.max_fact_passes;
        builder
    }

    /// Start a handler from an exported state
    pub fn from_state(name: impl Into<String>, state: HandlerState) -> Self {
        let name = name.into();
        let mut builder = Self {
            handler: Handler {
                name: name.clone(),
                priority: state.priority,
                order: state.order,
                components: state.components,
                conversions: state.conversions,
                facts: state.facts,
                max_fact_passes: default_max_fact_passes(),
            },
        };
        builder.add_fact(FQDN_FACT, Value::function(fqdn_fact));
        builder.add_fact(HANDLER_NAME_FACT, name);
        builder
    }

    /// Name of the handler under construction
    pub fn name(&self) -> &str {
        &self.handler.name
    }

    /// Peek at the handler under construction
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Set the priority; lower values win
    pub fn priority(&mut self, priority: i64) -> &mut Self {
        self.handler.priority = priority;
        self
    }

    /// Replace the component order
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` if `names` is empty.
    pub fn order<I, S>(&mut self, names: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let order: Vec<String> = names.into_iter().map(Into::into).collect();
        if order.is_empty() {
            return Err(Error::invalid_configuration(format!(
                "handler '{}': empty list of components",
                self.handler.name
            )));
        }
        self.handler.order = order;
        Ok(self)
    }

    /// Install or replace the rule for a component
    ///
    /// A sub-pattern rule installed over an existing sub-pattern rule is
    /// merged into it. Changing the rule shape drops any conversion
    /// registered for the component.
    pub fn component(&mut self, name: impl Into<String>, rule: Rule) -> Result<&mut Self> {
        let name = name.into();
        let rule = match (self.handler.components.get(&name), rule) {
            (Some(Rule::SubPatterns(existing)), Rule::SubPatterns(new)) => {
                Rule::SubPatterns(existing.merged_with(&new)?)
            }
            (Some(existing), rule) => {
                if existing.kind() != rule.kind()
                    && self.handler.conversions.shift_remove(&name).is_some()
                {
                    trace!(
                        handler = %self.handler.name,
                        component = %name,
                        "rule shape changed, conversion dropped"
                    );
                }
                rule
            }
            (None, rule) => rule,
        };
        self.handler.components.insert(name, rule);
        Ok(self)
    }

    /// Install a conversion for a component
    ///
    /// Sub-pattern conversions merge into existing sub-pattern conversions;
    /// anything else replaces.
    pub fn convert(
        &mut self,
        name: impl Into<String>,
        conversion: impl Into<Conversion>,
    ) -> &mut Self {
        let name = name.into();
        let conversion = conversion.into();
        let merged = match self.handler.conversions.shift_remove(&name) {
            Some(existing) => existing.merge(conversion),
            None => conversion,
        };
        self.handler.conversions.insert(name, merged);
        self
    }

    /// Install per-sub-pattern converters for a component
    pub fn convert_sub<I, K, C>(&mut self, name: impl Into<String>, converters: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, C)>,
        K: Into<String>,
        C: Into<Converter>,
    {
        self.convert(name, Conversion::sub(converters))
    }

    /// Add (or replace) a static or pending fact
    pub fn add_fact(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.handler.facts.insert(name.into(), value.into());
        self
    }

    /// Add (or replace) a fact computed from the binding context
    pub fn add_dynamic_fact<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&Context) -> Result<Value> + Send + Sync + 'static,
    {
        self.add_fact(name, Value::function(f))
    }

    pub fn remove_fact(&mut self, name: &str) -> &mut Self {
        self.handler.facts.shift_remove(name);
        self
    }

    /// Cap on fixed-point passes during fact assembly
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` if `passes` is 0; every handler carries at
    /// least the pending `fqdn` fact.
    pub fn max_fact_passes(&mut self, passes: usize) -> Result<&mut Self> {
        if passes == 0 {
            return Err(Error::invalid_configuration(format!(
                "handler '{}': max_fact_passes must be > 0",
                self.handler.name
            )));
        }
        self.handler.max_fact_passes = passes;
        Ok(self)
    }

    pub fn build(self) -> Handler {
        self.handler
    }
}

fn fqdn_fact(ctx: &Context) -> Result<Value> {
    Ok(ctx.value(FQDN_KEY))
}
