//! Deeplink parsing and usecase fetch.
//!
//! A deeplink has the form `scheme://<resolver-id>/<identifier>`, for
//! example `beckn://resolver.beckn.org/12345`. The resolver id is mapped to
//! a host through the [`HostMappingCache`] and the usecase is served at
//! `{host}/{identifier}`.

use serde_json::Value;

use crate::error::{DeeplinkError, FetchError};
use crate::host_cache::HostMappingCache;
use crate::types::ClientOptions;

/// Scheme separator that marks a string as a deeplink.
const SCHEME_SEPARATOR: &str = "://";

/// Resolves one deeplink into its usecase document.
#[derive(Debug, Clone)]
pub struct DeeplinkResolver {
    deeplink: String,
    options: ClientOptions,
}

impl DeeplinkResolver {
    pub fn new(deeplink: impl Into<String>) -> Self {
        Self {
            deeplink: deeplink.into(),
            options: ClientOptions::default(),
        }
    }

    /// Set HTTP options for the usecase fetch.
    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    pub fn deeplink(&self) -> &str {
        &self.deeplink
    }

    /// Split the deeplink into resolver id and identifier.
    ///
    /// Segments after the identifier are ignored.
    ///
    /// # Errors
    ///
    /// Returns `DeeplinkError::InvalidDeeplink` when there is no `://` or
    /// fewer than two non-empty segments follow it.
    pub fn extract_resolver_and_uuid(&self) -> Result<(&str, &str), DeeplinkError> {
        let invalid = || DeeplinkError::InvalidDeeplink {
            deeplink: self.deeplink.clone(),
        };

        let (_, rest) = self.deeplink.split_once(SCHEME_SEPARATOR).ok_or_else(invalid)?;
        let mut parts = rest.split('/');
        match (parts.next(), parts.next()) {
            (Some(resolver), Some(uuid)) if !resolver.is_empty() && !uuid.is_empty() => {
                Ok((resolver, uuid))
            }
            _ => Err(invalid()),
        }
    }

    /// Fetch the usecase through the process-wide host cache.
    pub async fn fetch_usecase(&self) -> Result<Value, DeeplinkError> {
        self.fetch_usecase_with(HostMappingCache::instance()).await
    }

    /// Fetch the usecase, looking the resolver host up in `cache`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDeeplink` for a malformed deeplink,
    /// `ResolverNotFound` when the cache has no host (or an empty one) for
    /// the resolver, and
    /// `Fetch` on transport failure, non-200 status or a non-JSON body.
    pub async fn fetch_usecase_with(
        &self,
        cache: &HostMappingCache,
    ) -> Result<Value, DeeplinkError> {
        let (resolver, uuid) = self.extract_resolver_and_uuid()?;

        let host = cache
            .get_resolver_host(resolver)
            .await?
            .filter(|host| !host.is_empty())
            .ok_or_else(|| DeeplinkError::ResolverNotFound {
                resolver: resolver.to_string(),
            })?;

        let url = format!("{}/{}", host.trim_end_matches('/'), uuid);
        tracing::debug!(%url, "fetching usecase");

        // reqwest follows redirects by default
        let client = self.options.build_client()?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            }
            .into());
        }

        let usecase = response
            .json()
            .await
            .map_err(|source| FetchError::InvalidBody { url, source })?;
        Ok(usecase)
    }
}

/// Whether `source` looks like a deeplink rather than a path or web URL.
pub fn is_deeplink(source: &str) -> bool {
    match source.split_once(SCHEME_SEPARATOR) {
        Some((scheme, _)) => !scheme.is_empty() && scheme != "http" && scheme != "https",
        None => false,
    }
}
