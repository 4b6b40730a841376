// # fqdn-facts-core
//
// Core library for classifying fully-qualified domain names and deriving
// facts from them.
//
// ## Architecture Overview
//
// - **Rule / ComponentMatcher**: Validate the dot-delimited components of an FQDN
// - **Converter / Conversion**: Turn raw component values into typed values
// - **FactAssembler**: Merge static, extracted and dynamic facts to a fixed point
// - **Handler / HandlerBuilder**: A named, prioritized bundle of the above
// - **HandlerRegistry**: Named handlers and best-match resolution
//
// ## Data Flow
//
// ```text
// HandlerRegistry::resolve(fqdn)
//     → keep handlers whose rules accept fqdn
//     → lowest priority wins (first registered on ties)
//     → ResolvedHandler::facts(options)
//     → FactAssembler produces the sorted fact set
// ```
//
// ## Design Principles
//
// 1. **Explicit bindings**: Fact functions receive a `Context`, never ambient state
// 2. **Immutable handlers**: Built once, shared through `Arc`, never rebound
// 3. **Bounded resolution**: The fixed-point loop is capped and fails loudly
// 4. **Library-First**: Registration is plain method calls or declarative config

pub mod config;
pub mod convert;
pub mod error;
pub mod facts;
pub mod handler;
pub mod pattern;
pub mod registry;
pub mod value;

// Re-export core types for convenience
pub use config::{EngineConfig, HandlerConfig, RegistryConfig};
pub use convert::{Coercion, Conversion, Converter};
pub use error::{Error, Result};
pub use facts::{FactAssembler, FactOptions, Facts};
pub use handler::{Handler, HandlerBuilder, HandlerState};
pub use pattern::{Rule, SubPatterns};
pub use registry::{HandlerRegistry, ResolvedHandler};
pub use value::{Context, FactFn, TransformFn, Value};
