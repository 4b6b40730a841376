//! Minimal embedding example for fqdn-facts-core
//!
//! This example registers handlers in code, resolves a few FQDNs and prints
//! the derived facts as JSON.

use anyhow::Result;
use fqdn_facts_core::{Coercion, Converter, FactOptions, HandlerRegistry, Rule, Value};
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let registry = HandlerRegistry::new();

    registry.register("baseline", None, |h| {
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
                ("id", Converter::from(Coercion::ToInt)),
                ("subtype", Converter::lookup([("m", "master"), ("s", "slave")])),
            ],
        );
        h.add_dynamic_fact("hostname", |ctx| Ok(ctx.value("host")));
        h.add_dynamic_fact("domain", |ctx| {
            Ok(Value::from(format!("{}.{}", ctx.text("sub")?, ctx.text("tld")?)))
        });
        Ok(())
    })?;

    registry.register("foo", Some("baseline"), |h| {
        h.priority(15);
        h.order(["sub", "tld"])?;
        Ok(())
    })?;

    for fqdn in ["foo01m.bar.example.com", "bar.example.com", "mail.example.org"] {
        match registry.resolve(fqdn) {
            Ok(resolved) => {
                let facts = resolved.facts(&FactOptions::new())?;
                info!("{} -> {}", fqdn, resolved.name());
                println!("{}", serde_json::to_string_pretty(&facts)?);
            }
            Err(e) => warn!("{}", e),
        }
    }

    Ok(())
}
