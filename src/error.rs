//! Error types for the crawler.
//!
//! Errors come in two tiers. [`FatalError`] is raised only while the run is
//! being set up (or when the input stops being readable) and ends the process
//! with a non-zero exit. Everything else is scoped to a single URL or a single
//! record and is folded into placeholder values by the pipeline.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Conditions that abort the whole run.
#[derive(Error, Debug)]
pub enum FatalError {
    #[error("cannot read provider catalog {}: {source}", path.display())]
    CatalogRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed provider catalog {}: {source}", path.display())]
    CatalogParse {
        path: PathBuf,
        #[source]
        source: CatalogError,
    },

    #[error("cannot open input {}: {source}", path.display())]
    InputOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed reading input: {0}")]
    InputRead(#[source] io::Error),

    #[error("cannot create output {}: {source}", path.display())]
    OutputCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// A provider catalog that could not be turned into a registry.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("provider {provider:?} has an invalid URL scheme {scheme:?}: {reason}")]
    InvalidScheme {
        provider: String,
        scheme: String,
        reason: String,
    },

    #[error("provider {provider:?} has an endpoint with an empty URL")]
    EmptyEndpoint { provider: String },
}

/// The page (or endpoint) could not be fetched at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("{0}")]
    Request(String),

    #[error("failed reading response body: {0}")]
    Body(String),
}

/// A provider's oEmbed endpoint did not yield usable metadata.
#[derive(Error, Debug)]
pub enum ProviderQueryError {
    #[error("oEmbed request failed: {0}")]
    Transport(#[from] FetchError),

    #[error("oEmbed endpoint answered with status {0}")]
    Status(u16),

    #[error("oEmbed response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("cannot build oEmbed request URL from {endpoint:?}: {source}")]
    Endpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },
}

/// A fetched page body that could not be read for metadata tags.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("page body is binary, not markup (NUL at byte {offset})")]
    Binary { offset: usize },
}

/// A record that could not be written to the output table.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("failed writing record: {0}")]
    Write(#[from] csv::Error),

    #[error("failed flushing output: {0}")]
    Flush(#[from] io::Error),
}
