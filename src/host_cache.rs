//! Process-wide cache of resolver hosts.
//!
//! Deeplinks name a resolver by a short identifier. The mapping from
//! identifier to base URL is published as a JSON object at a configurable
//! URL and fetched at most once per process.
//!
//! # Lifecycle
//!
//! The cache starts uninitialized and becomes populated on the first
//! successful fetch. Population is single-flight: concurrent first callers
//! of [`HostMappingCache::get_resolver_host`] share one fetch and all see
//! its result. A failed fetch leaves the cache uninitialized so the next
//! caller retries. [`HostMappingCache::reset`] returns to the uninitialized
//! state and exists for test isolation.

use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tokio::sync::OnceCell;

use crate::error::FetchError;
use crate::types::{ClientOptions, HostMapping, DEFAULT_HOST_MAPPING_URL};

static INSTANCE: OnceLock<HostMappingCache> = OnceLock::new();

/// Lazily populated mapping from resolver identifier to host URL.
#[derive(Debug)]
pub struct HostMappingCache {
    mapping_url: RwLock<String>,
    options: ClientOptions,
    // Swapped wholesale on reset/refetch; readers clone the Arc and await
    // outside the lock.
    mapping: RwLock<Arc<OnceCell<HostMapping>>>,
}

impl HostMappingCache {
    /// Standalone cache fetching from `mapping_url`.
    pub fn new(mapping_url: impl Into<String>) -> Self {
        Self::with_options(mapping_url, ClientOptions::default())
    }

    /// Standalone cache with explicit HTTP options.
    pub fn with_options(mapping_url: impl Into<String>, options: ClientOptions) -> Self {
        Self {
            mapping_url: RwLock::new(mapping_url.into()),
            options,
            mapping: RwLock::new(Arc::new(OnceCell::new())),
        }
    }

    /// The shared process-wide cache, created on first access.
    pub fn instance() -> &'static HostMappingCache {
        INSTANCE.get_or_init(|| HostMappingCache::new(DEFAULT_HOST_MAPPING_URL))
    }

    /// URL the mapping is fetched from.
    pub fn mapping_url(&self) -> String {
        self.mapping_url
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Point the cache at a different mapping source.
    ///
    /// Takes effect on the next fetch; an already populated mapping is kept.
    pub fn set_mapping_url(&self, url: impl Into<String>) {
        *self
            .mapping_url
            .write()
            .unwrap_or_else(PoisonError::into_inner) = url.into();
    }

    /// Whether a mapping has been fetched successfully.
    pub fn is_populated(&self) -> bool {
        self.current_cell().initialized()
    }

    /// Fetch the mapping now and replace any cached one.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` on transport failure, non-success status, or a
    /// body that is not a JSON object of strings.
    pub async fn fetch_mapping(&self) -> Result<(), FetchError> {
        let mapping = request_mapping(&self.mapping_url(), &self.options).await?;
        *self.mapping.write().unwrap_or_else(PoisonError::into_inner) =
            Arc::new(OnceCell::from(mapping));
        Ok(())
    }

    /// Look up the host for a resolver identifier, fetching the mapping on
    /// first use.
    ///
    /// Returns `Ok(None)` when the mapping has no entry for `resolver`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` if the mapping had to be fetched and the fetch
    /// failed.
    pub async fn get_resolver_host(&self, resolver: &str) -> Result<Option<String>, FetchError> {
        let cell = self.current_cell();
        let mapping = cell
            .get_or_try_init(|| async {
                let url = self.mapping_url();
                tracing::debug!(%url, "populating resolver host mapping");
                request_mapping(&url, &self.options).await
            })
            .await?;
        Ok(mapping.get(resolver).cloned())
    }

    /// Drop the cached mapping, returning to the uninitialized state.
    pub fn reset(&self) {
        *self.mapping.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(OnceCell::new());
    }

    fn current_cell(&self) -> Arc<OnceCell<HostMapping>> {
        self.mapping
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

async fn request_mapping(url: &str, options: &ClientOptions) -> Result<HostMapping, FetchError> {
    let client = options.build_client()?;
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!(%url, status = status.as_u16(), "failed to fetch mapping data");
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let mapping: HostMapping = response
        .json()
        .await
        .map_err(|source| FetchError::InvalidBody {
            url: url.to_string(),
            source,
        })?;
    tracing::info!(%url, resolvers = mapping.len(), "resolver host mapping loaded");
    Ok(mapping)
}
