//! Contract Test: Fact Resolution
//!
//! Verifies the fixed-point resolution of dynamic facts and the final
//! filtering of the fact set.
//!
//! Constraints verified:
//! - Chains of dependent facts resolve regardless of declaration order
//! - Binding contexts expose fqdn, components, priority and handler_class
//! - Cyclic dependencies fail with `UnresolvableDependency` instead of looping
//! - Errors raised by fact functions propagate unchanged
//! - Blank strings are dropped; zero, false and empty collections are kept

mod common;

use common::init_tracing;
use fqdn_facts_core::{Coercion, Converter, Error, FactOptions, Handler, HandlerBuilder, Value};
use indexmap::IndexMap;

fn build(configure: impl FnOnce(&mut HandlerBuilder)) -> Handler {
    init_tracing();
    let mut builder = HandlerBuilder::new("test");
    builder
        .order(["host", "sub", "tld"])
        .expect("non-empty order");
    configure(&mut builder);
    builder.build()
}

#[test]
fn dependency_chain_resolves_in_any_order() {
    let handler = build(|h| {
        h.add_dynamic_fact("c", |ctx| Ok(ctx.value("b")));
        h.add_dynamic_fact("b", |ctx| Ok(ctx.value("a")));
        h.add_dynamic_fact("a", |ctx| Ok(Value::from(ctx.text("host")?.to_uppercase())));
    });

    let facts = handler.facts("web.bar.example.com", &FactOptions::new()).unwrap();
    assert_eq!(facts.get("a"), Some(&Value::from("WEB")));
    assert_eq!(facts.get("b"), Some(&Value::from("WEB")));
    assert_eq!(facts.get("c"), Some(&Value::from("WEB")));
}

#[test]
fn text_of_later_declared_fact_waits_for_its_value() {
    let handler = build(|h| {
        h.add_dynamic_fact("shout", |ctx| Ok(Value::from(ctx.text("hostname")?.to_uppercase())));
        h.add_dynamic_fact("hostname", |ctx| Ok(ctx.value("host")));
    });

    let facts = handler.facts("web.bar.example.com", &FactOptions::new()).unwrap();
    assert_eq!(facts.get("shout"), Some(&Value::from("WEB")));
    assert_eq!(facts.get("hostname"), Some(&Value::from("web")));
}

#[test]
fn text_of_never_resolving_fact_hits_the_pass_cap() {
    let handler = build(|h| {
        h.max_fact_passes(4).unwrap();
        h.add_dynamic_fact("left", |ctx| Ok(Value::from(ctx.text("right")?)));
        h.add_dynamic_fact("right", |ctx| Ok(Value::from(ctx.text("left")?)));
    });

    let err = handler.facts("a.b.c", &FactOptions::new()).unwrap_err();
    assert!(matches!(
        err,
        Error::UnresolvableDependency { passes: 4, ref pending } if pending == &["left", "right"]
    ));
}

#[test]
fn context_exposes_reserved_bindings() {
    let handler = build(|h| {
        h.priority(7);
        h.add_dynamic_fact("seen", |ctx| {
            let Some(Value::Map(components)) = ctx.get("components") else {
                return Ok(Value::Nil);
            };
            let names: Vec<Value> = components.keys().map(|k| Value::from(k.as_str())).collect();
            Ok(Value::List(vec![
                Value::from(ctx.fqdn()),
                Value::from(ctx.handler_class()),
                ctx.value("priority"),
                Value::List(names),
            ]))
        });
    });

    let facts = handler.facts("web.bar.example.com", &FactOptions::new()).unwrap();
    assert_eq!(
        facts.get("seen"),
        Some(&Value::List(vec![
            Value::from("web.bar.example.com"),
            Value::from("test"),
            Value::Int(7),
            Value::List(vec![Value::from("host"), Value::from("sub"), Value::from("tld")]),
        ]))
    );
}

#[test]
fn cyclic_facts_hit_the_pass_cap() {
    let handler = build(|h| {
        h.max_fact_passes(8).unwrap();
        h.add_dynamic_fact("ping", |ctx| Ok(ctx.value("pong")));
        h.add_dynamic_fact("pong", |ctx| Ok(ctx.value("ping")));
    });

    let err = handler.facts("a.b.c", &FactOptions::new()).unwrap_err();
    match err {
        Error::UnresolvableDependency { passes, pending } => {
            assert_eq!(passes, 8);
            assert_eq!(pending, vec!["ping".to_string(), "pong".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn fact_function_errors_propagate() {
    let handler = build(|h| {
        h.add_dynamic_fact("boom", |_| Err(Error::fact("boom", "exploded")));
    });

    let err = handler.facts("a.b.c", &FactOptions::new()).unwrap_err();
    assert!(matches!(err, Error::Fact { ref name, .. } if name == "boom"));
}

#[test]
fn conversion_errors_propagate() {
    let handler = build(|h| {
        h.convert("sub", Coercion::ToInt);
    });

    let err = handler.facts("a.b.c", &FactOptions::new()).unwrap_err();
    assert!(matches!(err, Error::Conversion { ref key, .. } if key == "sub"));

    let facts = handler.facts("a.42.c", &FactOptions::new()).unwrap();
    assert_eq!(facts.get("sub"), Some(&Value::Int(42)));
}

#[test]
fn empty_rule_is_asymmetric() {
    let handler = build(|h| {
        h.add_fact("blank", "   ");
        h.add_fact("empty", "");
        h.add_fact("nil", Value::Nil);
        h.add_fact("zero", 0);
        h.add_fact("no", false);
        h.add_fact("none", Value::List(Vec::new()));
        h.add_fact("nothing", Value::Map(IndexMap::new()));
        h.add_dynamic_fact("computed_blank", |_| Ok(Value::from("")));
    });

    let facts = handler.facts("a.b.c", &FactOptions::new()).unwrap();
    for dropped in ["blank", "empty", "nil", "computed_blank"] {
        assert!(!facts.contains_key(dropped), "{} should be dropped", dropped);
    }
    assert_eq!(facts.get("zero"), Some(&Value::Int(0)));
    assert_eq!(facts.get("no"), Some(&Value::Bool(false)));
    assert_eq!(facts.get("none"), Some(&Value::List(Vec::new())));
    assert_eq!(facts.get("nothing"), Some(&Value::Map(IndexMap::new())));
}

#[test]
fn symbols_are_stringified() {
    let handler = build(|h| {
        h.add_fact("kind", Value::Symbol("web".into()));
        h.convert("host", Coercion::ToSymbol);
    });

    let facts = handler.facts("www.b.c", &FactOptions::new()).unwrap();
    assert_eq!(facts.get("kind"), Some(&Value::from("web")));
    assert_eq!(facts.get("host"), Some(&Value::from("www")));
}

#[test]
fn contextual_converter_sees_other_components() {
    let handler = build(|h| {
        h.convert(
            "host",
            Converter::contextual(|ctx| {
                Ok(Value::from(format!("{}@{}", ctx.text("host")?, ctx.text("sub")?)))
            }),
        );
    });

    let facts = handler.facts("www.dc1.example.com", &FactOptions::new()).unwrap();
    assert_eq!(facts.get("host"), Some(&Value::from("www@dc1")));
}

#[test]
fn declared_facts_are_not_mutated_by_assembly() {
    let handler = build(|h| {
        h.add_dynamic_fact("hostname", |ctx| Ok(ctx.value("host")));
    });

    handler.facts("a.b.c", &FactOptions::new()).unwrap();
    assert!(handler.declared_fact("hostname").unwrap().is_function());

    let facts = handler.facts("x.y.z", &FactOptions::new()).unwrap();
    assert_eq!(facts.get("hostname"), Some(&Value::from("x")));
}
