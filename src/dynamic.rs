//! Dynamic resolvers: values fetched or computed at request time.
//!
//! Each [`ResolverEntry`] pairs a dot-path with a [`Resolver`]. A pass over
//! the entries works on a private copy of the document and hands it back
//! only when every entry resolved, so callers never observe a partial merge.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use reqwest::Url;
use serde_json::Value;

use crate::error::{BoxError, FetchError, ResolveError};
use crate::path::set_path;
use crate::types::{json_type_name, ClientOptions};

/// Boxed future returned by async callables.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

type SyncFn = dyn Fn() -> Result<Value, BoxError> + Send + Sync;
type AsyncFn = dyn Fn() -> BoxFuture<Result<Value, BoxError>> + Send + Sync;

/// A nullary function producing a value, invoked once per pass.
#[derive(Clone)]
pub enum Callable {
    Sync(Arc<SyncFn>),
    Async(Arc<AsyncFn>),
}

impl Callable {
    async fn call(&self) -> Result<Value, BoxError> {
        match self {
            Callable::Sync(f) => f(),
            Callable::Async(f) => f().await,
        }
    }
}

/// Source of a dynamically resolved value.
#[derive(Clone)]
pub enum Resolver {
    /// GET the URL and use the response body as text.
    Uri(Url),
    /// Use the string unchanged.
    Literal(String),
    /// Invoke the function and use its result.
    Callable(Callable),
}

impl Resolver {
    /// URI resolver. `path` only labels the error on a malformed URL.
    pub fn uri(path: &str, uri: &str) -> Result<Self, ResolveError> {
        Url::parse(uri)
            .map(Resolver::Uri)
            .map_err(|e| ResolveError::InvalidUri {
                path: path.to_string(),
                uri: uri.to_string(),
                message: e.to_string(),
            })
    }

    /// Literal string resolver.
    pub fn literal(value: impl Into<String>) -> Self {
        Resolver::Literal(value.into())
    }

    /// Resolver backed by a synchronous function.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn() -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Resolver::Callable(Callable::Sync(Arc::new(f)))
    }

    /// Resolver backed by an async function.
    pub fn from_async_fn<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, BoxError>> + Send + 'static,
    {
        Resolver::Callable(Callable::Async(Arc::new(move || {
            Box::pin(f()) as BoxFuture<Result<Value, BoxError>>
        })))
    }

    /// Build a resolver from configuration data.
    ///
    /// A string is a literal and `{"uri": "..."}` is a URI resolver. Any
    /// other shape is rejected here rather than when the pass runs.
    pub fn from_value(path: &str, value: &Value) -> Result<Self, ResolveError> {
        match value {
            Value::String(s) => Ok(Resolver::literal(s.clone())),
            Value::Object(map) if map.len() == 1 => match map.get("uri") {
                Some(Value::String(uri)) => Resolver::uri(path, uri),
                _ => Err(type_mismatch(path, value)),
            },
            other => Err(type_mismatch(path, other)),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Resolver::Uri(_) => "uri",
            Resolver::Literal(_) => "literal",
            Resolver::Callable(_) => "callable",
        }
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolver::Uri(url) => f.debug_tuple("Uri").field(&url.as_str()).finish(),
            Resolver::Literal(s) => f.debug_tuple("Literal").field(s).finish(),
            Resolver::Callable(Callable::Sync(_)) => f.write_str("Callable(sync)"),
            Resolver::Callable(Callable::Async(_)) => f.write_str("Callable(async)"),
        }
    }
}

/// A resolver registered against a dot-path.
#[derive(Debug, Clone)]
pub struct ResolverEntry {
    pub path: String,
    pub resolver: Resolver,
}

/// Run every entry against a copy of `current` and return the merged copy.
///
/// Entries run in registration order, so when two paths overlap the one
/// registered last wins. One HTTP client serves the whole pass. The first
/// failure aborts the pass and the working copy is dropped.
///
/// # Errors
///
/// Returns `ResolveError::Fetch` on a transport failure or non-success
/// status, and `ResolveError::Callable` when a callable returns an error.
pub async fn resolve_dynamic(
    current: &Value,
    entries: &[ResolverEntry],
    options: &ClientOptions,
) -> Result<Value, ResolveError> {
    let mut working = current.clone();
    if entries.is_empty() {
        return Ok(working);
    }

    let client = options
        .build_client()
        .map_err(|source| ResolveError::Fetch {
            path: entries[0].path.clone(),
            source,
        })?;

    for entry in entries {
        tracing::debug!(path = %entry.path, kind = entry.resolver.kind(), "resolving");
        let value = resolve_entry(&client, entry).await.map_err(|e| {
            tracing::warn!(path = %entry.path, error = %e, "dynamic resolver failed");
            e
        })?;
        set_path(&mut working, &entry.path, value);
    }

    Ok(working)
}

async fn resolve_entry(
    client: &reqwest::Client,
    entry: &ResolverEntry,
) -> Result<Value, ResolveError> {
    match &entry.resolver {
        Resolver::Uri(url) => fetch_text(client, url)
            .await
            .map(Value::String)
            .map_err(|source| ResolveError::Fetch {
                path: entry.path.clone(),
                source,
            }),
        Resolver::Literal(s) => Ok(Value::String(s.clone())),
        Resolver::Callable(callable) => {
            callable
                .call()
                .await
                .map_err(|source| ResolveError::Callable {
                    path: entry.path.clone(),
                    source,
                })
        }
    }
}

async fn fetch_text(client: &reqwest::Client, url: &Url) -> Result<String, FetchError> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response
        .text()
        .await
        .map_err(|source| FetchError::InvalidBody {
            url: url.to_string(),
            source,
        })
}

fn type_mismatch(path: &str, value: &Value) -> ResolveError {
    ResolveError::TypeMismatch {
        path: path.to_string(),
        actual: json_type_name(value).to_string(),
    }
}
