//! Contract Test: Clone Isolation
//!
//! Verifies that handlers registered with `copy_from` start from a deep copy
//! of their source and never alter it afterwards.
//!
//! Constraints verified:
//! - Mutating a clone leaves the source's order, rules, conversions and facts intact
//! - Cloning from an unknown handler fails with `HandlerNotFound`
//! - Re-registering a name replaces the handler

mod common;

use common::*;
use fqdn_facts_core::{Coercion, Error, FactOptions, HandlerRegistry, Rule, Value};

#[test]
fn mutating_clone_leaves_source_untouched() {
    let registry = reference_registry();
    let before = registry.get("baseline").unwrap().export_state();

    registry
        .register("mutant", Some("baseline"), |h| {
            h.priority(99);
            h.order(["host", "rest"])?;
            h.component("host", Rule::literal("db01"))?;
            h.convert("rest", Coercion::ToSymbol);
            h.add_fact("role", "database");
            h.remove_fact("domain");
            Ok(())
        })
        .unwrap();

    let baseline = registry.get("baseline").unwrap();
    let after = baseline.export_state();

    assert_eq!(after.priority, before.priority);
    assert_eq!(after.order, before.order);
    assert!(matches!(baseline.component("host"), Some(Rule::SubPatterns(_))));
    assert!(baseline.conversion("host").is_some());
    assert!(baseline.conversion("rest").is_none());
    assert!(baseline.declared_fact("domain").is_some());
    assert!(baseline.declared_fact("role").is_none());

    // literal over sub-patterns is a shape change: the clone lost its conversion
    let mutant = registry.get("mutant").unwrap();
    assert!(mutant.conversion("host").is_none());
}

#[test]
fn clone_inherits_source_behavior() {
    let registry = reference_registry();
    registry
        .register("twin", Some("baseline"), |h| {
            h.priority(20);
            Ok(())
        })
        .unwrap();

    let twin = registry.get("twin").unwrap();
    let facts = twin
        .facts("foo02s.bar.example.com", &FactOptions::new())
        .unwrap();

    assert_eq!(facts.get("host_id"), Some(&Value::Int(2)));
    assert_eq!(facts.get("host_subtype"), Some(&Value::from("slave")));
    assert_eq!(facts.get("handler_name"), Some(&Value::from("twin")));

    // baseline still wins on priority
    assert_eq!(
        registry.resolve("foo02s.bar.example.com").unwrap().name(),
        "baseline"
    );
}

#[test]
fn copy_from_unknown_handler_fails() {
    let registry = HandlerRegistry::new();
    let err = registry
        .register("orphan", Some("missing"), |_| Ok(()))
        .unwrap_err();

    assert!(matches!(err, Error::HandlerNotFound(ref name) if name == "missing"));
    assert!(!registry.contains("orphan"));
}

#[test]
fn reregistering_replaces_handler() {
    let registry = reference_registry();
    registry
        .register("foo", None, |h| {
            h.priority(15);
            h.order(["sub", "tld"])?;
            h.component("tld", Rule::literal("example.net"))?;
            Ok(())
        })
        .unwrap();

    assert_eq!(registry.len(), 2);
    assert!(registry.resolve("bar.example.com").is_err());
    assert_eq!(registry.resolve("bar.example.net").unwrap().name(), "foo");
}
