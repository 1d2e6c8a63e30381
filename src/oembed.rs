//! Author attribution through a provider's oEmbed endpoint.
//!
//! [`fetch_oembed`] performs the query and reports every way it can fail as a
//! [`ProviderQueryError`]. [`resolve_author`] is what the pipeline calls: it
//! never fails, degrading to [`AuthorAttribution::not_retrievable`] and
//! leaving a log line behind.

use crate::error::ProviderQueryError;
use crate::fetch::HttpFetch;
use crate::models::{AuthorAttribution, OEmbedInfo};
use crate::providers::ProviderHandle;
use crate::utils::truncate_for_log;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Build the oEmbed request URL for `url` against `endpoint`.
///
/// Query parameters already present on the endpoint are kept.
pub fn request_url(endpoint: &str, url: &str) -> Result<Url, ProviderQueryError> {
    let mut request = Url::parse(endpoint).map_err(|source| ProviderQueryError::Endpoint {
        endpoint: endpoint.to_string(),
        source,
    })?;
    request
        .query_pairs_mut()
        .append_pair("url", url)
        .append_pair("format", "json");
    Ok(request)
}

/// Query the provider's endpoint for `url`.
pub async fn fetch_oembed<F: HttpFetch>(
    fetcher: &F,
    provider: ProviderHandle<'_>,
    url: &str,
) -> Result<OEmbedInfo, ProviderQueryError> {
    let request = request_url(provider.endpoint, url)?;
    let response = fetcher.get(request.as_str()).await?;
    if response.status >= 300 {
        return Err(ProviderQueryError::Status(response.status));
    }

    serde_json::from_str(&response.body).map_err(|e| {
        warn!(
            provider = %provider.provider_name,
            body = %truncate_for_log(&response.body, 200),
            "oEmbed response preview"
        );
        ProviderQueryError::Decode(e)
    })
}

/// Resolve the author of `url` through `provider`, never failing.
#[instrument(level = "info", skip_all, fields(%url, provider = %provider.provider_name))]
pub async fn resolve_author<F: HttpFetch>(
    fetcher: &F,
    provider: ProviderHandle<'_>,
    url: &str,
) -> AuthorAttribution {
    match fetch_oembed(fetcher, provider, url).await {
        Ok(info) => {
            info!(%url, "Resolved oEmbed metadata");
            debug!(
                kind = ?info.kind,
                title = ?info.title,
                author_url = ?info.author_url,
                provider_name = ?info.provider_name,
                "oEmbed payload"
            );
            let author = info
                .author_name
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .map(|author_name| AuthorAttribution { author_name })
                .unwrap_or_default();
            if !author.is_retrieved() {
                debug!("oEmbed response names no author");
            }
            author
        }
        Err(ProviderQueryError::Status(status)) => {
            warn!(status, "oEmbed endpoint returned a non-success status");
            AuthorAttribution::not_retrievable()
        }
        Err(e) => {
            warn!(error = %e, "oEmbed query failed");
            AuthorAttribution::not_retrievable()
        }
    }
}
