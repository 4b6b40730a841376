//! FQDN fact handlers
//!
//! A [`Handler`] is a named, prioritized bundle of:
//! - an ordered list of component names (how an FQDN is split)
//! - validation rules per component
//! - conversions per component or sub-component
//! - declared facts, static or dynamic
//!
//! Handlers are assembled with a [`HandlerBuilder`] and are immutable once
//! built, so a single instance can be shared between concurrent resolutions.
//! Fact derivation takes the FQDN as an explicit argument and never mutates
//! the handler.

pub mod builder;

pub use builder::HandlerBuilder;

use std::cmp::Ordering;

use indexmap::IndexMap;

use crate::convert::Conversion;
use crate::error::Result;
use crate::facts::{FactAssembler, FactOptions, Facts};
use crate::pattern::{ComponentMatcher, Rule};
use crate::value::Value;

/// Component order used when none is given
pub const DEFAULT_ORDER: [&str; 3] = ["host", "sub", "tld"];

/// Priority used when none is given
pub const DEFAULT_PRIORITY: i64 = 1;

/// Fact holding the FQDN being resolved
pub const FQDN_FACT: &str = "fqdn";

/// Fact holding the handler's registered name
pub const HANDLER_NAME_FACT: &str = "handler_name";

/// A registered FQDN pattern definition
#[derive(Debug, Clone)]
pub struct Handler {
    pub(crate) name: String,
    pub(crate) priority: i64,
    pub(crate) order: Vec<String>,
    pub(crate) components: IndexMap<String, Rule>,
    pub(crate) conversions: IndexMap<String, Conversion>,
    pub(crate) facts: IndexMap<String, Value>,
    pub(crate) max_fact_passes: usize,
}

/// Deep copy of a handler's configurable state
///
/// Produced by [`Handler::export_state`] and consumed by
/// [`HandlerBuilder::copy_from`]. Mutating an exported state never affects
/// the handler it came from.
#[derive(Debug, Clone)]
pub struct HandlerState {
    pub priority: i64,
    pub order: Vec<String>,
    pub components: IndexMap<String, Rule>,
    pub conversions: IndexMap<String, Conversion>,
    pub facts: IndexMap<String, Value>,
}

impl Handler {
    /// Registered name, also exposed as the `handler_name` fact
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Priority; lower values win
    pub fn priority(&self) -> i64 {
        self.priority
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Rule for a component, if one was set
    pub fn component(&self, name: &str) -> Option<&Rule> {
        self.components.get(name)
    }

    pub fn conversion(&self, name: &str) -> Option<&Conversion> {
        self.conversions.get(name)
    }

    /// Declared fact (static value or pending function)
    pub fn declared_fact(&self, name: &str) -> Option<&Value> {
        self.facts.get(name)
    }

    /// Cap on fixed-point passes during fact assembly
    pub fn max_fact_passes(&self) -> usize {
        self.max_fact_passes
    }

    /// Check whether `fqdn` satisfies every component rule
    pub fn matches(&self, fqdn: &str) -> bool {
        ComponentMatcher::new(&self.name, &self.order, &self.components).matches(fqdn)
    }

    /// Derive facts for `fqdn`
    ///
    /// # Parameters
    ///
    /// - `fqdn`: Domain name to derive facts from
    /// - `options`: Optional name filter and prefix
    ///
    /// # Returns
    ///
    /// Facts sorted by name, with empty values removed.
    pub fn facts(&self, fqdn: &str, options: &FactOptions) -> Result<Facts> {
        FactAssembler::new(self).assemble(fqdn, options)
    }

    /// Derive every fact for `fqdn`, optionally prefixing names
    pub fn all(&self, fqdn: &str, prefix: Option<&str>) -> Result<Facts> {
        let options = match prefix {
            Some(p) => FactOptions::new().with_prefix(p),
            None => FactOptions::new(),
        };
        self.facts(fqdn, &options)
    }

    /// Derive a single fact for `fqdn`
    pub fn get_fact(&self, fqdn: &str, name: &str) -> Result<Option<Value>> {
        Ok(self.facts(fqdn, &FactOptions::new())?.remove(name))
    }

    /// Deep copy of all configurable state
    pub fn export_state(&self) -> HandlerState {
        HandlerState {
            priority: self.priority,
            order: self.order.clone(),
            components: self.components.clone(),
            conversions: self.conversions.clone(),
            facts: self.facts.clone(),
        }
    }

    /// Compare priorities only
    pub fn cmp_priority(&self, other: &Handler) -> Ordering {
        self.priority.cmp(&other.priority)
    }
}
