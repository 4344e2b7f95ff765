//! Core types shared across the engine, resolvers and host cache.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::{Map, Value};

/// Where the resolver host mapping is published by default.
pub const DEFAULT_HOST_MAPPING_URL: &str =
    "https://raw.githubusercontent.com/ONDC-Official/deeplink-host-config/refs/heads/master/host_mapping.json";

/// Default timeout for HTTP requests (10 seconds).
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Schema keywords copied onto descriptor leaves.
pub const DESCRIPTOR_KEYWORDS: &[&str] = &[
    "properties",
    "items",
    "required",
    "oneOf",
    "additionalProperties",
];

/// Static overlay: dot-path to value, in file order.
pub type StaticValues = Map<String, Value>;

/// Resolver identifier to endpoint base URL.
pub type HostMapping = HashMap<String, String>;

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Options for the HTTP clients built by the engine and host cache.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Upper bound on every request, connect through body.
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: HTTP_TIMEOUT,
        }
    }
}

impl ClientOptions {
    /// Create options with the default 10 second timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build an async client honoring these options.
    pub(crate) fn build_client(&self) -> Result<reqwest::Client, crate::FetchError> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|source| crate::FetchError::Client { source })
    }
}
