//! Handler registry
//!
//! The registry holds named handlers and resolves an FQDN to the single
//! best-matching one.
//!
//! ## Usage
//!
//! ```rust
//! use fqdn_facts_core::{FactOptions, HandlerRegistry, Rule, Value};
//!
//! let registry = HandlerRegistry::new();
//!
//! registry.register("web", None, |h| {
//!     h.priority(10);
//!     h.component("tld", Rule::literal("example.com"))?;
//!     h.add_dynamic_fact("domain", |ctx| {
//!         Ok(Value::from(format!("{}.{}", ctx.text("sub")?, ctx.text("tld")?)))
//!     });
//!     Ok(())
//! })?;
//!
//! let resolved = registry.resolve("www.bar.example.com")?;
//! let facts = resolved.facts(&FactOptions::new())?;
//! assert_eq!(facts["domain"], Value::from("bar.example.com"));
//! # Ok::<(), fqdn_facts_core::Error>(())
//! ```
//!
//! ## Selection
//!
//! `resolve` keeps every handler whose rules accept the FQDN and returns the
//! one with the lowest priority value. Among equal priorities the handler
//! registered first wins; re-registering a name keeps its original position.

use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::config::{EngineConfig, RegistryConfig};
use crate::error::{Error, Result};
use crate::facts::{FactOptions, Facts};
use crate::handler::{Handler, HandlerBuilder};
use crate::value::Value;

/// Registry of named handlers
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// resolutions and exclusive registrations. Handlers are immutable once
/// registered and are shared through `Arc`.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    /// Registered handlers, in registration order
    handlers: RwLock<IndexMap<String, Arc<Handler>>>,

    /// Engine settings applied to handlers built by this registry
    engine: EngineConfig,
}

impl HandlerRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with engine settings
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` if the engine settings fail validation.
    pub fn with_engine(engine: EngineConfig) -> Result<Self> {
        engine.validate()?;
        Ok(Self {
            handlers: RwLock::default(),
            engine,
        })
    }

    /// Create a registry and register every configured handler in order
    pub fn from_config(config: &RegistryConfig) -> Result<Self> {
        config.validate()?;
        let registry = Self::with_engine(config.engine.clone())?;
        for handler in &config.handlers {
            registry.register(&handler.name, handler.copy_from.as_deref(), |b| {
                handler.apply(b)
            })?;
        }
        Ok(registry)
    }

    /// Register a handler
    ///
    /// # Parameters
    ///
    /// - `name`: Handler name; replaces any handler registered under it
    /// - `copy_from`: Existing handler to clone as the starting point
    /// - `build`: Customization applied to the new handler
    ///
    /// # Returns
    ///
    /// - `Ok(Arc<Handler>)`: The registered handler
    /// - `Err(Error::HandlerNotFound)`: `copy_from` names no registered handler
    /// - `Err(_)`: Any error returned by `build`; nothing is registered
    pub fn register<F>(
        &self,
        name: impl Into<String>,
        copy_from: Option<&str>,
        build: F,
    ) -> Result<Arc<Handler>>
    where
        F: FnOnce(&mut HandlerBuilder) -> Result<()>,
    {
        let name = name.into();

        let mut builder = match copy_from {
            Some(source) => {
                let source = self
                    .get(source)
                    .ok_or_else(|| Error::handler_not_found(source))?;
                HandlerBuilder::copy_from(name.clone(), &source)
            }
            None => {
                let mut builder = HandlerBuilder::new(name.clone());
                builder.max_fact_passes(self.engine.max_fact_passes)?;
                builder
            }
        };

        build(&mut builder)?;
        let handler = Arc::new(builder.build());

        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        handlers.insert(name.clone(), Arc::clone(&handler));
        info!(
            handler = %name,
            copy_from = copy_from.unwrap_or("-"),
            priority = handler.priority(),
            "registered handler"
        );

        Ok(handler)
    }

    /// Resolve an FQDN to the best-matching handler
    ///
    /// # Returns
    ///
    /// - `Ok(ResolvedHandler)`: The winning handler bound to `fqdn`
    /// - `Err(Error::UnresolvableHandler)`: No handler accepts `fqdn`
    pub fn resolve(&self, fqdn: &str) -> Result<ResolvedHandler> {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);

        // min_by_key keeps the first of equal minima, i.e. registration order
        let winner = handlers
            .values()
            .filter(|h| h.matches(fqdn))
            .min_by_key(|h| h.priority())
            .cloned()
            .ok_or_else(|| Error::unresolvable_handler(fqdn))?;

        debug!(fqdn, handler = %winner.name(), priority = winner.priority(), "resolved handler");

        Ok(ResolvedHandler {
            handler: winner,
            fqdn: fqdn.to_string(),
        })
    }

    /// Look up a handler by name
    pub fn get(&self, name: &str) -> Option<Arc<Handler>> {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        handlers.get(name).cloned()
    }

    /// Check if a handler is registered
    pub fn contains(&self, name: &str) -> bool {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        handlers.contains_key(name)
    }

    /// Registered handler names, in registration order
    pub fn names(&self) -> Vec<String> {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        handlers.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }
}

/// A handler selected for one FQDN
#[derive(Debug, Clone)]
pub struct ResolvedHandler {
    handler: Arc<Handler>,
    fqdn: String,
}

impl ResolvedHandler {
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    pub fn name(&self) -> &str {
        self.handler.name()
    }

    /// The FQDN this handler was resolved for
    pub fn fqdn(&self) -> &str {
        &self.fqdn
    }

    /// Derive facts for the bound FQDN
    pub fn facts(&self, options: &FactOptions) -> Result<Facts> {
        self.handler.facts(&self.fqdn, options)
    }

    /// Derive every fact for the bound FQDN, optionally prefixing names
    pub fn all(&self, prefix: Option<&str>) -> Result<Facts> {
        self.handler.all(&self.fqdn, prefix)
    }

    /// Derive a single fact for the bound FQDN
    pub fn get_fact(&self, name: &str) -> Result<Option<Value>> {
        self.handler.get_fact(&self.fqdn, name)
    }
}
