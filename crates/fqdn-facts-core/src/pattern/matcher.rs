// # Component Matcher
//
// Splits an FQDN into the ordered components of a handler and checks each
// segment against its rule.
//
// The FQDN is split into at most `order.len()` parts, so the final component
// absorbs any remaining dots. An FQDN with fewer labels than the order is
// rejected outright.

use indexmap::IndexMap;
use tracing::{debug, trace};

use super::Rule;

/// Split `fqdn` into exactly `parts` segments
///
/// Returns `None` when the FQDN has fewer labels than requested.
///
/// # Example
///
/// ```rust
/// use fqdn_facts_core::pattern::split_fqdn;
///
/// assert_eq!(
///     split_fqdn("foo01m.bar.example.com", 3),
///     Some(vec!["foo01m", "bar", "example.com"])
/// );
/// assert_eq!(split_fqdn("example.com", 3), None);
/// ```
pub fn split_fqdn(fqdn: &str, parts: usize) -> Option<Vec<&str>> {
    if parts == 0 {
        return None;
    }
    let segments: Vec<&str> = fqdn.splitn(parts, '.').collect();
    (segments.len() == parts).then_some(segments)
}

/// Borrowed view over a handler's order and rules
#[derive(Debug, Clone, Copy)]
pub struct ComponentMatcher<'a> {
    label: &'a str,
    order: &'a [String],
    components: &'a IndexMap<String, Rule>,
}

impl<'a> ComponentMatcher<'a> {
    /// Create a matcher
    ///
    /// # Parameters
    ///
    /// - `label`: Name used in trace output (the handler name)
    /// - `order`: Ordered component names
    /// - `components`: Rules by component name; absent components accept any non-empty value
    pub fn new(
        label: &'a str,
        order: &'a [String],
        components: &'a IndexMap<String, Rule>,
    ) -> Self {
        Self {
            label,
            order,
            components,
        }
    }

    /// Pair each ordered component name with its raw segment
    pub fn bind<'f>(&self, fqdn: &'f str) -> Option<Vec<(&'a str, &'f str)>> {
        let parts = split_fqdn(fqdn, self.order.len())?;
        Some(self.order.iter().map(String::as_str).zip(parts).collect())
    }

    /// Check whether every component of `fqdn` satisfies its rule
    pub fn matches(&self, fqdn: &str) -> bool {
        let Some(bound) = self.bind(fqdn) else {
            debug!(
                handler = self.label,
                fqdn,
                expected = self.order.len(),
                "validation failed: wrong number of labels"
            );
            return false;
        };

        let ok = bound.iter().all(|(name, value)| {
            let accepted = match self.components.get(*name) {
                Some(rule) => rule.accepts(value),
                None => Rule::Any.accepts(value),
            };
            trace!(
                handler = self.label,
                component = *name,
                value = *value,
                accepted,
                "validating component"
            );
            accepted
        });

        debug!(
            handler = self.label,
            fqdn,
            "validation {}",
            if ok { "successful" } else { "failed" }
        );
        ok
    }
}
