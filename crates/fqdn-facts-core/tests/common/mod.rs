//! Shared fixtures for handler contract tests
//!
//! Builds the reference registry used across the contract tests: a
//! `baseline` handler for three-label hosts and a `foo` handler cloned from
//! it for two-label names.

#![allow(dead_code)]

use fqdn_facts_core::{Coercion, Converter, Error, HandlerRegistry, Rule, Value};

/// Install a test subscriber so trace output shows up on failure
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

/// Register the `baseline` handler
pub fn register_baseline(registry: &HandlerRegistry) {
    registry
        .register("baseline", None, |h| {
            h.priority(10);
            h.order(["host", "sub", "tld"])?;
            h.component(
                "host",
                Rule::sub_patterns([
                    ("type", r"^([^\d]+)"),
                    ("id", r"(\d+)"),
                    ("subtype", r"([ms]?)"),
                ])?,
            )?;
            h.component("tld", Rule::literal("example.com"))?;
            h.convert_sub(
                "host",
                [
                    (
                        "subtype",
                        Converter::transform(|raw, _| {
                            Ok(match raw.as_str() {
                                Some("m") => Value::from("master"),
                                Some("s") => Value::from("slave"),
                                _ => Value::Nil,
                            })
                        }),
                    ),
                    ("id", Converter::from(Coercion::ToInt)),
                ],
            );
            h.add_dynamic_fact("hname", |ctx| Ok(ctx.value("hostname")));
            h.add_dynamic_fact("hostname", |ctx| Ok(ctx.value("host")));
            h.add_dynamic_fact("domain", |ctx| {
                Ok(Value::from(format!("{}.{}", ctx.text("sub")?, ctx.text("tld")?)))
            });
            Ok(())
        })
        .expect("baseline registers");
}

/// Register `foo`, cloned from `baseline`
pub fn register_foo(registry: &HandlerRegistry) {
    registry
        .register("foo", Some("baseline"), |h| {
            h.priority(15);
            h.order(["sub", "tld"])?;
            Ok(())
        })
        .expect("foo registers");
}

/// Registry holding `baseline` and `foo`
pub fn reference_registry() -> HandlerRegistry {
    init_tracing();
    let registry = HandlerRegistry::new();
    register_baseline(&registry);
    register_foo(&registry);
    registry
}

/// Convenience for asserting an error kind
pub fn is_unresolvable_handler(err: &Error) -> bool {
    matches!(err, Error::UnresolvableHandler(_))
}
