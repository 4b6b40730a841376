//! Configuration-driven example for fqdn-facts-core
//!
//! Loads handler definitions from the JSON file named by `FQDN_FACTS_CONFIG`
//! (or a built-in definition) and prints facts for each FQDN given on the
//! command line.

use anyhow::{Context, Result};
use fqdn_facts_core::{FactOptions, HandlerRegistry, RegistryConfig};
use std::env;
use tracing::{Level, error};
use tracing_subscriber::FmtSubscriber;

const BUILTIN: &str = r#"{
  "handlers": [
    {
      "name": "baseline",
      "priority": 10,
      "components": {
        "host": {
          "type": "sub_patterns",
          "parts": { "type": "^([^\\d]+)", "id": "(\\d+)", "subtype": "([ms]?)" }
        },
        "tld": { "type": "literal", "value": "example.com" }
      },
      "conversions": {
        "host": { "id": "to_int", "subtype": { "lookup": { "m": "master", "s": "slave" } } }
      },
      "facts": {
        "hostname": { "template": "{host}" },
        "domain": { "template": "{sub}.{tld}" }
      }
    },
    { "name": "foo", "copy_from": "baseline", "priority": 15, "order": ["sub", "tld"] }
  ]
}"#;

fn main() -> Result<()> {
    let level = env::var("FQDN_FACTS_LOG_LEVEL")
        .ok()
        .and_then(|l| l.parse::<Level>().ok())
        .unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match env::var("FQDN_FACTS_CONFIG") {
        Ok(path) => RegistryConfig::from_path(&path)
            .with_context(|| format!("loading handler config from {}", path))?,
        Err(_) => RegistryConfig::from_json_str(BUILTIN)?,
    };
    let registry = HandlerRegistry::from_config(&config)?;

    let prefix = env::var("FQDN_FACTS_PREFIX").ok();
    let mut options = FactOptions::new();
    if let Some(prefix) = prefix {
        options = options.with_prefix(prefix);
    }

    let fqdns: Vec<String> = env::args().skip(1).collect();
    let fqdns = if fqdns.is_empty() {
        vec!["foo01m.bar.example.com".to_string(), "bar.example.com".to_string()]
    } else {
        fqdns
    };

    for fqdn in &fqdns {
        match registry.resolve(fqdn).and_then(|r| r.facts(&options)) {
            Ok(facts) => println!("{}", serde_json::to_string_pretty(&facts)?),
            Err(e) => error!("{}: {}", fqdn, e),
        }
    }

    Ok(())
}
