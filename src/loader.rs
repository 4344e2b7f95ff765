//! Schema and static-value loading.
//!
//! Schemas come from files, strings, HTTP URLs or deeplinks. Static values
//! come from YAML files whose top level maps dot-paths to values.

use std::path::Path;

use serde_json::Value;

use crate::deeplink::{is_deeplink, DeeplinkResolver};
use crate::error::{FetchError, LoadError};
use crate::host_cache::HostMappingCache;
use crate::types::{json_type_name, ClientOptions, StaticValues};

/// Load a schema from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// or `LoadError::InvalidJson` if the file isn't valid JSON.
pub fn load_schema(path: &Path) -> Result<Value, LoadError> {
    let content = read_file(path)?;
    load_schema_str(&content)
}

/// Load a schema from a JSON string.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` if the string isn't valid JSON.
pub fn load_schema_str(content: &str) -> Result<Value, LoadError> {
    serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })
}

/// Load a schema from an HTTP/HTTPS URL.
///
/// # Errors
///
/// Returns `LoadError::Fetch` if the request fails or returns a non-success
/// status, or if the response isn't valid JSON.
pub async fn load_schema_url(url: &str, options: &ClientOptions) -> Result<Value, LoadError> {
    let client = options.build_client()?;
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;

    // Check for HTTP errors before parsing
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        }
        .into());
    }

    let schema = response
        .json()
        .await
        .map_err(|source| FetchError::InvalidBody {
            url: url.to_string(),
            source,
        })?;
    Ok(schema)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load a schema from a deeplink, URL or file path.
///
/// Deeplinks are resolved through `cache`.
///
/// # Errors
///
/// Returns appropriate errors based on the source type.
pub async fn load_schema_source(
    source: &str,
    cache: &HostMappingCache,
    options: &ClientOptions,
) -> Result<Value, LoadError> {
    if is_url(source) {
        load_schema_url(source, options).await
    } else if is_deeplink(source) {
        let usecase = DeeplinkResolver::new(source)
            .options(options.clone())
            .fetch_usecase_with(cache)
            .await?;
        Ok(usecase)
    } else {
        load_schema(Path::new(source))
    }
}

/// Load static values from a YAML file.
///
/// Relative paths resolve against the current working directory. An empty
/// file yields no values.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` or `LoadError::ReadError` when the file
/// can't be read, `LoadError::InvalidYaml` when it doesn't parse, and
/// `LoadError::NotAMapping` when the top level isn't a mapping.
pub fn load_static_values(path: &Path) -> Result<StaticValues, LoadError> {
    let content = read_file(path)?;
    parse_static_values(&content, &path.display().to_string())
}

/// Load static values from a YAML string.
pub fn load_static_values_str(content: &str) -> Result<StaticValues, LoadError> {
    parse_static_values(content, "<string>")
}

fn parse_static_values(content: &str, origin: &str) -> Result<StaticValues, LoadError> {
    if content.trim().is_empty() {
        return Ok(StaticValues::new());
    }

    let value: Value = serde_yaml::from_str(content).map_err(|source| LoadError::InvalidYaml {
        origin: origin.to_string(),
        source,
    })?;

    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(StaticValues::new()),
        other => Err(LoadError::NotAMapping {
            origin: origin.to_string(),
            actual: json_type_name(&other).to_string(),
        }),
    }
}

fn read_file(path: &Path) -> Result<String, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })
}
