//! The usecase engine: template, static overlay, dynamic resolvers and
//! validation around one mutable document.

use std::path::Path;

use jsonschema::Validator;
use serde_json::Value;

use crate::dynamic::{resolve_dynamic, Resolver, ResolverEntry};
use crate::error::{ResolveError, UsecaseError, ValidateError};
use crate::loader::load_static_values;
use crate::template::{apply_static, compile};
use crate::types::{ClientOptions, StaticValues};
use crate::validator::{compile_validator, strip_meta_schema, validate_with};

/// Builds a usecase document for one schema.
///
/// The current document starts empty. [`static_resolve`](Self::static_resolve)
/// replaces it with the compiled template plus static values, and each
/// [`dynamic_resolve`](Self::dynamic_resolve) replaces it with a copy that
/// has every registered resolver applied. Both take `&mut self`, so one
/// engine never runs two resolutions at once.
pub struct UsecaseEngine {
    schema: Value,
    validator: Validator,
    static_values: StaticValues,
    resolvers: Vec<ResolverEntry>,
    parsed_usecase: Value,
    options: ClientOptions,
}

impl UsecaseEngine {
    /// Create an engine for `schema` with the given static values.
    ///
    /// # Errors
    ///
    /// Returns `ValidateError::InvalidSchema` if the schema does not compile.
    pub fn new(schema: &Value, static_values: StaticValues) -> Result<Self, ValidateError> {
        let schema = strip_meta_schema(schema);
        let validator = compile_validator(&schema)?;
        Ok(Self {
            schema,
            validator,
            static_values,
            resolvers: Vec::new(),
            parsed_usecase: Value::Object(Default::default()),
            options: ClientOptions::default(),
        })
    }

    /// Create an engine reading static values from a YAML file.
    pub fn from_static_file(path: &Path, schema: &Value) -> Result<Self, UsecaseError> {
        let static_values = load_static_values(path)?;
        Ok(Self::new(schema, static_values)?)
    }

    /// Set HTTP options used by URI resolvers.
    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// The schema with `$schema` removed.
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    pub fn static_values(&self) -> &StaticValues {
        &self.static_values
    }

    /// The template compiled from the schema, without any overlay.
    pub fn template(&self) -> Value {
        compile(&self.schema)
    }

    /// Rebuild the document from the template and static values.
    ///
    /// Discards anything dynamic resolution had applied.
    pub fn static_resolve(&mut self) {
        let template = compile(&self.schema);
        self.parsed_usecase = apply_static(&template, &self.static_values);
        tracing::debug!(
            static_values = self.static_values.len(),
            "static resolution applied"
        );
    }

    /// Register a resolver for a dot-path. Entries are never replaced; a
    /// later entry for the same path wins when the pass runs.
    pub fn add_resolver(&mut self, path: impl Into<String>, resolver: Resolver) {
        self.resolvers.push(ResolverEntry {
            path: path.into(),
            resolver,
        });
    }

    /// Register a resolver described by configuration data.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::TypeMismatch` for a value that is neither a
    /// string nor `{"uri": ...}`; nothing is registered in that case.
    pub fn add_resolver_value(&mut self, path: &str, value: &Value) -> Result<(), ResolveError> {
        let resolver = Resolver::from_value(path, value)?;
        self.add_resolver(path, resolver);
        Ok(())
    }

    pub fn resolvers(&self) -> &[ResolverEntry] {
        &self.resolvers
    }

    /// Apply every registered resolver.
    ///
    /// The document is replaced only if all resolvers succeed; on error it
    /// is exactly what it was before the call.
    pub async fn dynamic_resolve(&mut self) -> Result<(), ResolveError> {
        let resolved = resolve_dynamic(&self.parsed_usecase, &self.resolvers, &self.options).await?;
        self.parsed_usecase = resolved;
        tracing::info!(resolvers = self.resolvers.len(), "dynamic resolution committed");
        Ok(())
    }

    /// The current document, without validation.
    pub fn current(&self) -> &Value {
        &self.parsed_usecase
    }

    /// The current document, validated against the schema.
    ///
    /// # Errors
    ///
    /// Returns `ValidateError::Invalid` with every violation sorted by path
    /// and a snapshot of the document.
    pub fn parsed_usecase(&self) -> Result<&Value, ValidateError> {
        validate_with(&self.validator, &self.parsed_usecase)
    }
}

impl std::fmt::Debug for UsecaseEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsecaseEngine")
            .field("schema", &self.schema)
            .field("static_values", &self.static_values)
            .field("resolvers", &self.resolvers)
            .field("parsed_usecase", &self.parsed_usecase)
            .finish_non_exhaustive()
    }
}
