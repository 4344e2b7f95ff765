//! Error types for usecase resolution, host lookup and validation.

use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Boxed error returned by callable resolvers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors from any HTTP call: usecase fetch, host-mapping fetch or URI resolver.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("cannot build HTTP client: {source}")]
    Client {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to fetch {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to fetch {url}: HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("unexpected response body from {url}: {source}")]
    InvalidBody {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// HTTP status of the failed response, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::Transport { source, .. } | FetchError::InvalidBody { source, .. } => {
                source.status().map(|s| s.as_u16())
            }
            FetchError::Client { .. } => None,
        }
    }
}

/// Errors loading schemas and static-value files.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid YAML in {origin}: {source}")]
    InvalidYaml {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("static values in {origin} must be a mapping of dot-paths, got {actual}")]
    NotAMapping { origin: String, actual: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Deeplink(#[from] DeeplinkError),
}

/// Errors resolving a deeplink into a usecase document.
#[derive(Debug, Error)]
pub enum DeeplinkError {
    #[error("invalid deeplink format: {deeplink}")]
    InvalidDeeplink { deeplink: String },

    #[error("resolver host not found for '{resolver}'")]
    ResolverNotFound { resolver: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Errors registering or running dynamic resolvers.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("resolver at {path} must be a URI, a string or a callable, got {actual}")]
    TypeMismatch { path: String, actual: String },

    #[error("invalid resolver URI \"{uri}\" at {path}: {message}")]
    InvalidUri {
        path: String,
        uri: String,
        message: String,
    },

    #[error("resolver at {path} failed: {source}")]
    Callable {
        path: String,
        #[source]
        source: BoxError,
    },

    #[error("resolver at {path}: {source}")]
    Fetch {
        path: String,
        #[source]
        source: FetchError,
    },
}

/// Errors during validation.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },

    #[error("invalid data in schema: {} error(s)", errors.len())]
    Invalid {
        errors: Vec<SchemaError>,
        /// Snapshot of the document that failed.
        document: Value,
    },
}

/// One step in the location of a violation inside a document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(i) => write!(f, "{}", i),
        }
    }
}

/// Single validation error with path context.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaError {
    /// Keys and indices leading to the invalid value.
    pub path: Vec<PathSegment>,
    /// JSON Pointer (RFC 6901) to the invalid value.
    pub pointer: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.pointer, self.message)
    }
}

/// Any failure surfaced by the engine or its collaborators.
#[derive(Debug, Error)]
pub enum UsecaseError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Deeplink(#[from] DeeplinkError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Validate(#[from] ValidateError),
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            LoadError::Fetch(_) => 3,
            LoadError::Deeplink(e) => e.exit_code(),
            _ => 2,
        }
    }
}

impl DeeplinkError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            DeeplinkError::InvalidDeeplink { .. } => 2,
            DeeplinkError::ResolverNotFound { .. } | DeeplinkError::Fetch(_) => 3,
        }
    }
}

impl ResolveError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ResolveError::Fetch { .. } => 3,
            _ => 2,
        }
    }
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::InvalidSchema { .. } => 2,
            ValidateError::Invalid { .. } => 1,
        }
    }
}

impl UsecaseError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            UsecaseError::Load(e) => e.exit_code(),
            UsecaseError::Deeplink(e) => e.exit_code(),
            UsecaseError::Fetch(_) => 3,
            UsecaseError::Resolve(e) => e.exit_code(),
            UsecaseError::Validate(e) => e.exit_code(),
        }
    }
}
