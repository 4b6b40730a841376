//! Configuration types for FQDN fact handlers
//!
//! This module defines the declarative form of handler registration, so that
//! handler sets can be loaded from JSON instead of being built in code.
//!
//! ## File Format
//!
//! ```json
//! {
//!   "engine": { "max_fact_passes": 32 },
//!   "handlers": [
//!     {
//!       "name": "baseline",
//!       "priority": 10,
//!       "order": ["host", "sub", "tld"],
//!       "components": {
//!         "host": {
//!           "type": "sub_patterns",
//!           "parts": { "type": "^([^\\d]+)", "id": "(\\d+)", "subtype": "([ms]?)" }
//!         },
//!         "tld": { "type": "literal", "value": "example.com" }
//!       },
//!       "conversions": {
//!         "host": { "id": "to_int", "subtype": { "lookup": { "m": "master", "s": "slave" } } }
//!       },
//!       "facts": {
//!         "hostname": { "template": "{host}" },
//!         "domain": { "template": "{sub}.{tld}" }
//!       }
//!     },
//!     { "name": "foo", "copy_from": "baseline", "priority": 15, "order": ["sub", "tld"] }
//!   ]
//! }
//! ```

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::convert::{Coercion, Conversion, Converter};
use crate::error::{Error, Result};
use crate::facts::template;
use crate::handler::HandlerBuilder;
use crate::pattern::{Rule, SubPatterns};
use crate::value::Value;

/// Complete registry configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Handlers, registered in order
    #[serde(default)]
    pub handlers: Vec<HandlerConfig>,
}

impl RegistryConfig {
    /// Parse a configuration from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.engine.validate()?;
        for handler in &self.handlers {
            handler.validate()?;
        }
        Ok(())
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of fixed-point passes when resolving dynamic facts
    ///
    /// Assembly fails with `UnresolvableDependency` once this many passes
    /// have run and functions are still pending.
    ///
    /// Default: 32 passes
    #[serde(default = "default_max_fact_passes")]
    pub max_fact_passes: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_fact_passes == 0 {
            return Err(Error::invalid_configuration("max_fact_passes must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_fact_passes: default_max_fact_passes(),
        }
    }
}

pub(crate) fn default_max_fact_passes() -> usize {
    32
}

/// Declarative form of one handler registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerConfig {
    /// Registered name
    pub name: String,

    /// Existing handler to clone before applying the rest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copy_from: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,

    /// Component order; keeps the default (or cloned) order when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Vec<String>>,

    #[serde(default)]
    pub components: IndexMap<String, RuleConfig>,

    /// Conversions by component, checked against [`ConversionConfig`] shapes
    #[serde(default)]
    pub conversions: IndexMap<String, serde_json::Value>,

    #[serde(default)]
    pub facts: IndexMap<String, FactConfig>,

    /// Facts to remove, applied after `facts`
    #[serde(default)]
    pub remove_facts: Vec<String>,
}

impl HandlerConfig {
    /// Validate the handler configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::invalid_configuration("handler name cannot be empty"));
        }
        if self.order.as_ref().is_some_and(Vec::is_empty) {
            return Err(Error::invalid_configuration(format!(
                "handler '{}': order cannot be empty",
                self.name
            )));
        }
        for (component, raw) in &self.conversions {
            self.conversion(component, raw)?;
        }
        Ok(())
    }

    fn conversion(&self, component: &str, raw: &serde_json::Value) -> Result<ConversionConfig> {
        ConversionConfig::try_from(raw).map_err(|e| match e {
            Error::InvalidConfiguration(msg) => Error::invalid_configuration(format!(
                "handler '{}', conversion for '{}': {}",
                self.name, component, msg
            )),
            other => other,
        })
    }

    /// Replay this configuration against a builder
    ///
    /// Applied in a fixed order: priority, order, components, conversions,
    /// added facts, removed facts.
    pub fn apply(&self, builder: &mut HandlerBuilder) -> Result<()> {
        if let Some(priority) = self.priority {
            builder.priority(priority);
        }
        if let Some(order) = &self.order {
            builder.order(order.iter().cloned())?;
        }
        for (name, rule) in &self.components {
            builder.component(name.clone(), rule.to_rule()?)?;
        }
        for (name, raw) in &self.conversions {
            builder.convert(name.clone(), self.conversion(name, raw)?.to_conversion());
        }
        for (name, fact) in &self.facts {
            builder.add_fact(name.clone(), fact.to_value());
        }
        for name in &self.remove_facts {
            builder.remove_fact(name);
        }
        Ok(())
    }
}

/// Component validation rule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleConfig {
    /// Any non-empty value
    Any,
    /// Exact value
    Literal { value: String },
    /// One of a set of values
    OneOf { values: Vec<String> },
    /// Regular expression
    Pattern { regex: String },
    /// Named sub-patterns, in order; `"any"` stands for `(.+)`
    SubPatterns { parts: IndexMap<String, String> },
}

impl RuleConfig {
    pub fn to_rule(&self) -> Result<Rule> {
        match self {
            RuleConfig::Any => Ok(Rule::Any),
            RuleConfig::Literal { value } => Ok(Rule::literal(value.clone())),
            RuleConfig::OneOf { values } => {
                if values.is_empty() {
                    return Err(Error::invalid_configuration("one_of needs at least one value"));
                }
                Ok(Rule::one_of(values.iter().cloned()))
            }
            RuleConfig::Pattern { regex } => Rule::pattern(regex),
            RuleConfig::SubPatterns { parts } => Ok(Rule::SubPatterns(SubPatterns::new(parts)?)),
        }
    }
}

/// Conversion for a component: one converter, or one per sub-pattern
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConversionConfig {
    Direct(ConverterConfig),
    Sub(IndexMap<String, ConverterConfig>),
}

impl TryFrom<&serde_json::Value> for ConversionConfig {
    type Error = Error;

    fn try_from(raw: &serde_json::Value) -> Result<Self> {
        Self::deserialize(raw).map_err(|_| {
            Error::invalid_configuration(format!(
                "unsupported converter {}: expected a coercion tag, a lookup table, \
                 or a mapping of sub-pattern names to those",
                raw
            ))
        })
    }
}

impl ConversionConfig {
    pub fn to_conversion(&self) -> Conversion {
        match self {
            ConversionConfig::Direct(c) => Conversion::Direct(c.to_converter()),
            ConversionConfig::Sub(map) => Conversion::Sub(
                map.iter()
                    .map(|(k, c)| (k.clone(), c.to_converter()))
                    .collect(),
            ),
        }
    }
}

/// A single static converter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConverterConfig {
    /// `"to_int"`, `"to_float"`, `"to_string"`, `"to_array"` or `"to_symbol"`
    Coerce(Coercion),
    /// `{ "lookup": { "m": "master" } }`
    Lookup(LookupConfig),
}

/// Translation table for a lookup converter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LookupConfig {
    pub lookup: IndexMap<String, serde_json::Value>,
}

impl ConverterConfig {
    pub fn to_converter(&self) -> Converter {
        match self {
            ConverterConfig::Coerce(coercion) => Converter::Coerce(*coercion),
            ConverterConfig::Lookup(LookupConfig { lookup }) => Converter::Lookup(
                lookup
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from(v.clone())))
                    .collect(),
            ),
        }
    }
}

/// A declared fact: a template over other facts, or a static JSON value
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactConfig {
    Template(TemplateConfig),
    Static(serde_json::Value),
}

/// `{ "template": "{sub}.{tld}" }`; any other key makes the object a static fact
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateConfig {
    pub template: String,
}

impl FactConfig {
    pub fn to_value(&self) -> Value {
        match self {
            FactConfig::Template(TemplateConfig { template: source }) => {
                Value::Function(template(source))
            }
            FactConfig::Static(json) => Value::from(json.clone()),
        }
    }
}
