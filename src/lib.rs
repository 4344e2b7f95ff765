//! Beckn Usecase Resolver
//!
//! Builds usecase documents that conform to a JSON Schema by layering three
//! sources of values:
//!
//! 1. `const` values embedded in the schema,
//! 2. deployment-specific static values keyed by dot-path,
//! 3. dynamic values fetched from URIs or computed by callables.
//!
//! The result is validated against the schema before it is handed out.
//!
//! # Example
//!
//! ```
//! use beckn_usecase::{Resolver, StaticValues, UsecaseEngine};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "properties": {
//!         "context": {
//!             "type": "object",
//!             "properties": {
//!                 "domain": { "type": "string", "const": "mobility" },
//!                 "version": { "type": "string" }
//!             }
//!         },
//!         "message": {
//!             "type": "object",
//!             "properties": { "intent": { "type": "string" } }
//!         }
//!     }
//! });
//!
//! let mut static_values = StaticValues::new();
//! static_values.insert("context.version".into(), json!("1.0.0"));
//!
//! let mut engine = UsecaseEngine::new(&schema, static_values).unwrap();
//! engine.static_resolve();
//! engine.add_resolver("message.intent", Resolver::literal("search"));
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! runtime.block_on(engine.dynamic_resolve()).unwrap();
//!
//! let usecase = engine.parsed_usecase().unwrap();
//! assert_eq!(usecase["context"]["domain"], "mobility");
//! assert_eq!(usecase["message"]["intent"], "search");
//! ```
//!
//! # Value Precedence
//!
//! | Source | Applied by | Wins over |
//! |--------|------------|-----------|
//! | `const` | [`compile`] | nothing |
//! | static value | [`apply_static`] | `const` and descriptors |
//! | dynamic resolver | [`UsecaseEngine::dynamic_resolve`] | everything before it |
//!
//! A leaf with no value from any source stays a descriptor such as
//! `{"type": "string"}` and fails validation.
//!
//! # Deeplinks
//!
//! A deeplink `beckn://<resolver>/<id>` is turned into a usecase by looking
//! the resolver up in the process-wide [`HostMappingCache`] and fetching
//! `{host}/{id}`; see [`DeeplinkResolver`].

mod deeplink;
mod dynamic;
mod engine;
mod error;
mod host_cache;
mod loader;
mod path;
mod template;
mod types;
mod validator;

pub use deeplink::{is_deeplink, DeeplinkResolver};
pub use dynamic::{resolve_dynamic, BoxFuture, Callable, Resolver, ResolverEntry};
pub use engine::UsecaseEngine;
pub use error::{
    BoxError, DeeplinkError, FetchError, LoadError, PathSegment, ResolveError, SchemaError,
    UsecaseError, ValidateError,
};
pub use host_cache::HostMappingCache;
pub use loader::{
    is_url, load_schema, load_schema_source, load_schema_str, load_schema_url,
    load_static_values, load_static_values_str,
};
pub use path::{get_path, set_path};
pub use template::{apply_static, compile};
pub use types::{
    json_type_name, ClientOptions, HostMapping, StaticValues, DEFAULT_HOST_MAPPING_URL,
    HTTP_TIMEOUT,
};
pub use validator::{compile_validator, strip_meta_schema, validate, validate_with};
