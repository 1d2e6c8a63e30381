//! Registry of known oEmbed providers.
//!
//! The registry is built once from an oEmbed `providers.json` document and is
//! read-only afterwards. Lookups are pure: matching a URL never touches the
//! network.
//!
//! # Catalog format
//!
//! ```json
//! [
//!   {
//!     "provider_name": "YouTube",
//!     "provider_url": "https://www.youtube.com/",
//!     "endpoints": [
//!       {
//!         "schemes": ["https://*.youtube.com/watch*", "https://youtu.be/*"],
//!         "url": "https://www.youtube.com/oembed",
//!         "discovery": true
//!       }
//!     ]
//!   }
//! ]
//! ```
//!
//! A `*` in a scheme matches any run of characters (any run without `/` when it
//! appears in the host). `http://` and `https://`
//! are interchangeable, and host names compare case-insensitively. An endpoint
//! that lists no schemes claims every URL under its provider's `provider_url`.

use crate::error::{CatalogError, FatalError};
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument};

#[derive(Debug, Deserialize)]
struct ProviderDef {
    provider_name: String,
    #[serde(default)]
    provider_url: String,
    #[serde(default)]
    endpoints: Vec<EndpointDef>,
}

#[derive(Debug, Deserialize)]
struct EndpointDef {
    #[serde(default)]
    url: String,
    #[serde(default)]
    schemes: Vec<String>,
}

/// One endpoint of one provider, with its URL patterns compiled.
#[derive(Debug)]
struct ProviderEntry {
    provider_name: String,
    endpoint: String,
    patterns: Vec<Regex>,
}

/// The provider that claims a URL, borrowed from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderHandle<'a> {
    pub provider_name: &'a str,
    /// The endpoint URL with `{format}` already resolved to `json`.
    pub endpoint: &'a str,
}

/// Immutable set of provider endpoints, searched in catalog order.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    entries: Vec<ProviderEntry>,
}

impl ProviderRegistry {
    /// Read and parse the catalog at `path`.
    ///
    /// # Errors
    ///
    /// A missing, unreadable or malformed catalog is a [`FatalError`]: without
    /// it no author attribution is possible.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Result<Self, FatalError> {
        let bytes = fs::read(path).await.map_err(|source| FatalError::CatalogRead {
            path: path.to_path_buf(),
            source,
        })?;
        let registry = Self::from_json(&bytes).map_err(|source| FatalError::CatalogParse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(endpoints = registry.len(), "Loaded provider catalog");
        Ok(registry)
    }

    /// Build a registry from the raw JSON of a provider catalog.
    pub fn from_json(bytes: &[u8]) -> Result<Self, CatalogError> {
        let defs: Vec<ProviderDef> = serde_json::from_slice(bytes)?;
        let mut entries = Vec::new();

        for def in defs {
            for endpoint in def.endpoints {
                if endpoint.url.trim().is_empty() {
                    return Err(CatalogError::EmptyEndpoint {
                        provider: def.provider_name,
                    });
                }

                let schemes = if endpoint.schemes.is_empty() {
                    vec![format!("{}/*", def.provider_url.trim_end_matches('/'))]
                } else {
                    endpoint.schemes
                };

                let patterns = schemes
                    .iter()
                    .map(|scheme| {
                        scheme_to_regex(scheme).map_err(|reason| CatalogError::InvalidScheme {
                            provider: def.provider_name.clone(),
                            scheme: scheme.clone(),
                            reason,
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                entries.push(ProviderEntry {
                    provider_name: def.provider_name.clone(),
                    endpoint: endpoint.url.replace("{format}", "json"),
                    patterns,
                });
            }
        }

        Ok(Self { entries })
    }

    /// Find the first provider endpoint whose schemes match `url`.
    pub fn find(&self, url: &str) -> Option<ProviderHandle<'_>> {
        let entry = self
            .entries
            .iter()
            .find(|entry| entry.patterns.iter().any(|re| re.is_match(url)))?;
        debug!(%url, provider = %entry.provider_name, "Matched oEmbed provider");
        Some(ProviderHandle {
            provider_name: &entry.provider_name,
            endpoint: &entry.endpoint,
        })
    }

    /// Number of provider endpoints in the registry.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Compile an oEmbed URL scheme such as `https://*.example.com/video/*`.
fn scheme_to_regex(scheme: &str) -> Result<Regex, String> {
    let (protocol, rest) = scheme
        .split_once("://")
        .ok_or_else(|| "missing \"://\"".to_string())?;
    if rest.is_empty() {
        return Err("missing host".to_string());
    }

    let protocol = match protocol.to_ascii_lowercase().as_str() {
        "http" | "https" => "https?".to_string(),
        other => regex::escape(other),
    };
    let (host, path) = match rest.split_once('/') {
        Some((host, path)) => (host, Some(path)),
        None => (rest, None),
    };

    let mut pattern = format!("^(?i:{protocol})://(?i:{})", glob(host, "[^/]*"));
    if let Some(path) = path {
        pattern.push('/');
        pattern.push_str(&glob(path, ".*"));
    }
    pattern.push('$');

    Regex::new(&pattern).map_err(|e| e.to_string())
}

fn glob(segment: &str, wildcard: &str) -> String {
    regex::escape(segment).replace(r"\*", wildcard)
}
