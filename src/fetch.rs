//! HTTP transport shared by the page fetch and the oEmbed query.
//!
//! The pipeline and the resolver only see the [`HttpFetch`] trait, so the
//! network can be swapped for a scripted double in tests. [`HttpClient`] is the
//! production implementation over `reqwest`.

use crate::error::{FatalError, FetchError};
use crate::utils::error_chain;
use std::time::Instant;
use tracing::{debug, instrument};

/// A response that arrived, whatever its status.
///
/// The body is already decoded to text using the charset named in the
/// response's `Content-Type` (UTF-8 when absent). Undecodable bytes are
/// replaced, never rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for issuing a blocking-until-complete HTTP GET.
///
/// An `Err` means no response was obtained at all (DNS, connection, TLS,
/// truncated body). HTTP error statuses are returned as `Ok` and left to the
/// caller to judge.
pub trait HttpFetch {
    async fn get(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// `reqwest`-backed [`HttpFetch`] using the transport's default timeouts.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    /// Build a client that identifies itself with `user_agent`.
    ///
    /// With `env_proxy` unset, `HTTP_PROXY`/`HTTPS_PROXY` are ignored.
    pub fn new(user_agent: &str, env_proxy: bool) -> Result<Self, FatalError> {
        let mut builder = reqwest::Client::builder().user_agent(user_agent);
        if !env_proxy {
            builder = builder.no_proxy();
        }
        let inner = builder.build().map_err(FatalError::HttpClient)?;
        Ok(Self { inner })
    }
}

impl HttpFetch for HttpClient {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn get(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let t0 = Instant::now();
        let response = self
            .inner
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Request(error_chain(&e)))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Body(error_chain(&e)))?;

        debug!(
            status,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "HTTP GET complete"
        );
        Ok(FetchedPage { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Route, TestServer};

    fn client() -> HttpClient {
        HttpClient::new("meta_crawler-tests", false).unwrap()
    }

    #[test]
    fn test_success_statuses() {
        let ok = FetchedPage {
            status: 204,
            body: String::new(),
        };
        let redirect = FetchedPage {
            status: 304,
            body: String::new(),
        };
        assert!(ok.is_success());
        assert!(!redirect.is_success());
    }

    #[tokio::test]
    async fn test_get_returns_status_and_body() {
        let server = TestServer::start(vec![(
            "/page",
            Route::html(200, "<html><head><title>t</title></head></html>"),
        )]);
        let page = client().get(&server.url("/page")).await.unwrap();
        assert_eq!(page.status, 200);
        assert!(page.body.starts_with("<html>"));
    }

    #[tokio::test]
    async fn test_body_is_decoded_with_declared_charset() {
        let mut body = b"<html><head><meta property=\"og:title\" content=\"Caf".to_vec();
        body.extend_from_slice(b"\xe9\"></head></html>");
        let server = TestServer::start(vec![(
            "/latin1",
            Route::raw(200, "text/html; charset=iso-8859-1", body),
        )]);
        let page = client().get(&server.url("/latin1")).await.unwrap();
        assert!(page.body.contains("content=\"Caf\u{e9}\""));
    }

    #[tokio::test]
    async fn test_undeclared_non_utf8_body_is_decoded_lossily() {
        let mut body = b"<html><head><meta property=\"og:title\" content=\"Hello\">".to_vec();
        body.extend_from_slice(b"<meta property=\"og:description\" content=\"caf\xe9\">");
        let server = TestServer::start(vec![("/legacy", Route::raw(200, "text/html", body))]);
        let page = client().get(&server.url("/legacy")).await.unwrap();
        assert!(page.body.contains("content=\"Hello\""));
        assert!(page.body.contains("caf\u{fffd}"));
    }

    #[tokio::test]
    async fn test_error_status_is_not_a_fetch_error() {
        let server = TestServer::start(vec![]);
        let page = client().get(&server.url("/missing")).await.unwrap();
        assert_eq!(page.status, 404);
        assert!(!page.is_success());
    }

    #[tokio::test]
    async fn test_refused_connection_is_a_fetch_error() {
        let url = TestServer::unreachable_url("/page");
        let err = client().get(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Request(_)));
        assert!(!err.to_string().is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_url_is_a_fetch_error() {
        let err = client().get("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::Request(_)));
    }
}
