//! # meta_crawler
//!
//! Batch-enrich a list of links with page metadata and author attribution.
//!
//! For every URL in the input file the crawler fetches the page, reads its
//! Open Graph tags, asks the matching oEmbed provider (if any) who authored
//! it, and writes one CSV row:
//!
//! ```text
//! URL, Title, ContentType, Description, AuthorName
//! ```
//!
//! ## Usage
//!
//! ```sh
//! meta_crawler --providers providers.json --input test.txt --output result.csv
//! ```
//!
//! ## Failure handling
//!
//! A missing catalog, a missing input file or an output file that cannot be
//! created stop the run before any URL is touched. Everything after that is
//! contained per URL: an unreachable page yields a row carrying the error
//! message and `-` placeholders, and an unreachable provider yields
//! `not retrievable` as the author while keeping the page fields.

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod error;
mod extract;
mod fetch;
mod input;
mod models;
mod oembed;
mod outputs;
mod pipeline;
mod providers;
#[cfg(test)]
mod test_support;
mod utils;

use cli::Cli;
use fetch::HttpClient;
use input::UrlSource;
use outputs::table::CsvSink;
use pipeline::ResolutionPipeline;
use providers::ProviderRegistry;

#[tokio::main(flavor = "current_thread")]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("meta_crawler starting up");

    let args = Cli::parse();
    debug!(?args.providers, ?args.input, ?args.output, "Parsed CLI arguments");

    // ---- Startup: any failure here aborts the run ----
    let registry = match ProviderRegistry::load(&args.providers).await {
        Ok(registry) => registry,
        Err(e) => {
            error!(error = %e, "Cannot load provider catalog");
            return Err(e.into());
        }
    };
    if registry.is_empty() {
        warn!("Provider catalog is empty; no author will be retrievable");
    }

    let client = match HttpClient::new(&args.user_agent, !args.no_proxy) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Cannot build HTTP client");
            return Err(e.into());
        }
    };

    let mut source = match UrlSource::open(&args.input).await {
        Ok(source) => source,
        Err(e) => {
            error!(error = %e, "Cannot open input");
            return Err(e.into());
        }
    };

    let mut sink = match CsvSink::create(&args.output) {
        Ok(sink) => sink,
        Err(e) => {
            error!(error = %e, "Cannot create output");
            return Err(e.into());
        }
    };

    // ---- Resolve every URL, in order ----
    let pipeline = ResolutionPipeline::new(&registry, &client);
    let outcome = pipeline.run(&mut source, &mut sink).await;

    let rows = sink.rows();
    match sink.into_inner() {
        Ok(file) => {
            if let Err(e) = file.sync_all() {
                error!(path = %args.output.display(), error = %e, "Failed to sync output");
            }
        }
        Err(e) => error!(path = %args.output.display(), error = %e, "Failed to flush output"),
    }

    let summary = match outcome {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %e, rows, "Run aborted");
            return Err(e.into());
        }
    };

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        urls = summary.processed,
        rows,
        fetch_failures = summary.fetch_failures,
        path = %args.output.display(),
        "Execution complete"
    );

    Ok(())
}
