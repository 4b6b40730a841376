//! Validation rules for FQDN components
//!
//! Each positional component of an FQDN (e.g. `host`, `sub`, `tld`) may be
//! constrained by a [`Rule`]. Components without an explicit rule accept any
//! non-empty segment.
//!
//! ## Rule shapes
//!
//! - [`Rule::Any`]: any non-empty segment
//! - [`Rule::Literal`]: exact equality
//! - [`Rule::Enumeration`]: membership in a set of literals
//! - [`Rule::Pattern`]: regular expression (unanchored search)
//! - [`Rule::SubPatterns`]: named sub-patterns laid end to end, one capture
//!   group each, used both for validation and for extracting sub-facts

pub mod matcher;

pub use matcher::{ComponentMatcher, split_fqdn};

use indexmap::IndexMap;
use regex::Regex;

use crate::error::{Error, Result};

/// Source text used for the "match anything" sub-pattern
pub const ANY_SOURCE: &str = "(.+)";

/// Validation rule for a single FQDN component
#[derive(Debug, Clone)]
pub enum Rule {
    /// Any non-empty value
    Any,
    /// Exact string equality
    Literal(String),
    /// Membership in a set of literal values
    Enumeration(Vec<String>),
    /// Regular expression match
    Pattern(Regex),
    /// Ordered, named sub-patterns
    SubPatterns(SubPatterns),
}

/// Discriminant of a [`Rule`], used to detect shape changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Any,
    Literal,
    Enumeration,
    Pattern,
    SubPatterns,
}

impl Rule {
    /// Exact-match rule
    pub fn literal(value: impl Into<String>) -> Self {
        Rule::Literal(value.into())
    }

    /// Membership rule
    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Rule::Enumeration(values.into_iter().map(Into::into).collect())
    }

    /// Compile a regular-expression rule
    pub fn pattern(source: &str) -> Result<Self> {
        Ok(Rule::Pattern(Regex::new(source)?))
    }

    /// Compile a sub-pattern rule from `(name, source)` pairs in declared order
    pub fn sub_patterns<I, K, S>(parts: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: AsRef<str>,
    {
        Ok(Rule::SubPatterns(SubPatterns::new(parts)?))
    }

    pub fn kind(&self) -> RuleKind {
        match self {
            Rule::Any => RuleKind::Any,
            Rule::Literal(_) => RuleKind::Literal,
            Rule::Enumeration(_) => RuleKind::Enumeration,
            Rule::Pattern(_) => RuleKind::Pattern,
            Rule::SubPatterns(_) => RuleKind::SubPatterns,
        }
    }

    /// Test a single component value against this rule
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            Rule::Any => !value.is_empty(),
            Rule::Literal(literal) => value == literal,
            Rule::Enumeration(values) => values.iter().any(|v| v == value),
            Rule::Pattern(re) => re.is_match(value),
            Rule::SubPatterns(parts) => parts.combined().is_match(value),
        }
    }
}

/// Named sub-patterns of one component, kept in declared order
///
/// Validation and extraction both use the concatenation of every source in
/// order, with no separator. Individual sub-patterns are never tested on
/// their own.
#[derive(Debug, Clone)]
pub struct SubPatterns {
    sources: IndexMap<String, String>,
    combined: Regex,
}

impl SubPatterns {
    /// Build from `(name, source)` pairs; a source of `"any"` means [`ANY_SOURCE`]
    pub fn new<I, K, S>(parts: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: AsRef<str>,
    {
        let mut sources = IndexMap::new();
        for (name, source) in parts {
            sources.insert(name.into(), normalize_source(source.as_ref()));
        }
        Self::compile(sources)
    }

    fn compile(sources: IndexMap<String, String>) -> Result<Self> {
        if sources.is_empty() {
            return Err(Error::invalid_configuration(
                "sub-pattern rule must name at least one sub-pattern",
            ));
        }
        let joined: String = sources.values().map(String::as_str).collect();
        let combined = Regex::new(&joined)?;
        Ok(Self { sources, combined })
    }

    /// Merge `other` into `self`: new names win, existing positions are kept,
    /// unseen names are appended
    pub fn merged_with(&self, other: &SubPatterns) -> Result<Self> {
        let mut sources = self.sources.clone();
        for (name, source) in &other.sources {
            sources.insert(name.clone(), source.clone());
        }
        Self::compile(sources)
    }

    /// The concatenated regular expression
    pub fn combined(&self) -> &Regex {
        &self.combined
    }

    /// Sub-pattern names in declared order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    pub fn source(&self, name: &str) -> Option<&str> {
        self.sources.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Scan `value` and pair each sub-pattern name with its capture
    ///
    /// Captures from every match are flattened and paired with names
    /// positionally. Names without a capture are omitted; a group that did
    /// not participate in the match yields `None`.
    pub fn extract<'v>(&self, value: &'v str) -> Vec<(&str, Option<&'v str>)> {
        let captures = self.combined.captures_iter(value).flat_map(|caps| {
            (1..caps.len())
                .map(|i| caps.get(i).map(|m| m.as_str()))
                .collect::<Vec<_>>()
        });
        self.names().zip(captures).collect()
    }
}

fn normalize_source(source: &str) -> String {
    if source == "any" {
        ANY_SOURCE.to_string()
    } else {
        source.to_string()
    }
}
