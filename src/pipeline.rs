//! Per-URL resolution pipeline.
//!
//! For every input URL the pipeline:
//!
//! 1. **Fetches** the page. A transport failure ends processing of that URL
//!    with a degraded record; this is the only early exit.
//! 2. **Resolves the author**: if the registry knows a provider for the URL,
//!    its oEmbed endpoint is queried, otherwise the author is not retrievable
//!    and no request is made.
//! 3. **Extracts page metadata** from the fetched body.
//! 4. **Merges** both into an [`OutputRecord`] and hands it to the sink.
//!
//! Steps 2 and 3 are independent: a failing provider never costs the page
//! fields and an unparseable page never costs the author. URLs are processed
//! one at a time, in input order, and every URL read yields exactly one record.

use crate::error::{FatalError, FetchError};
use crate::extract::{MetaSchema, page_metadata};
use crate::fetch::HttpFetch;
use crate::input::UrlSource;
use crate::models::{AuthorAttribution, NOT_RETRIEVABLE, OutputRecord};
use crate::oembed::resolve_author;
use crate::outputs::RecordSink;
use crate::providers::ProviderRegistry;
use tokio::io::AsyncBufRead;
use tracing::{debug, error, info, instrument, warn};

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// URLs read from input (and records produced).
    pub processed: usize,
    /// URLs whose page could not be fetched.
    pub fetch_failures: usize,
    /// URLs for which a provider named an author.
    pub authors_resolved: usize,
    /// Records the sink rejected.
    pub sink_failures: usize,
}

/// Resolves URLs against a provider registry and the pages themselves.
#[derive(Debug)]
pub struct ResolutionPipeline<'a, F> {
    registry: &'a ProviderRegistry,
    fetcher: &'a F,
    schema: MetaSchema,
}

impl<'a, F: HttpFetch> ResolutionPipeline<'a, F> {
    pub fn new(registry: &'a ProviderRegistry, fetcher: &'a F) -> Self {
        Self {
            registry,
            fetcher,
            schema: MetaSchema::default(),
        }
    }

    /// Resolve a single URL.
    ///
    /// # Errors
    ///
    /// Only a failed page fetch is an error; every later stage degrades to
    /// placeholder values inside the returned record.
    #[instrument(level = "info", skip_all, fields(%url))]
    pub async fn resolve(&self, url: &str) -> Result<OutputRecord, FetchError> {
        let page = self.fetcher.get(url).await?;
        if !page.is_success() {
            warn!(status = page.status, "Page answered with a non-success status; parsing it anyway");
        }

        let author = match self.registry.find(url) {
            Some(provider) => resolve_author(self.fetcher, provider, url).await,
            None => {
                debug!("No oEmbed provider for URL");
                AuthorAttribution::not_retrievable()
            }
        };

        let metadata = page_metadata(url, &page.body, &self.schema);
        Ok(OutputRecord::resolved(url, metadata, author))
    }

    /// Resolve every URL from `input` into `sink`, in order.
    ///
    /// Write failures are logged and skipped. The sink is finished on every
    /// exit path.
    ///
    /// # Errors
    ///
    /// Returns [`FatalError::InputRead`] if the input becomes unreadable
    /// part-way; the records produced before that point are kept.
    #[instrument(level = "info", skip_all)]
    pub async fn run<R, S>(
        &self,
        input: &mut UrlSource<R>,
        sink: &mut S,
    ) -> Result<RunSummary, FatalError>
    where
        R: AsyncBufRead + Unpin,
        S: RecordSink,
    {
        let mut summary = RunSummary::default();

        let outcome = loop {
            let url = match input.next_url().await {
                Ok(Some(url)) => url,
                Ok(None) => break Ok(()),
                Err(e) => {
                    error!(error = %e, processed = summary.processed, "Input became unreadable");
                    break Err(FatalError::InputRead(e));
                }
            };

            let record = match self.resolve(&url).await {
                Ok(record) => {
                    if record.author_name != NOT_RETRIEVABLE {
                        summary.authors_resolved += 1;
                    }
                    record
                }
                Err(e) => {
                    warn!(%url, error = %e, "Metadata could not be extracted");
                    summary.fetch_failures += 1;
                    OutputRecord::fetch_failed(&url, &e.to_string())
                }
            };

            if let Err(e) = sink.write_record(&record) {
                error!(%url, error = %e, "Cannot write record; carrying on");
                summary.sink_failures += 1;
            }
            summary.processed += 1;
        };

        if let Err(e) = sink.finish() {
            error!(error = %e, "Failed to flush output");
        }

        info!(
            processed = summary.processed,
            fetch_failures = summary.fetch_failures,
            authors_resolved = summary.authors_resolved,
            sink_failures = summary.sink_failures,
            "Run finished"
        );
        outcome.map(|()| summary)
    }
}
