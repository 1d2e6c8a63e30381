//! Command-line interface definitions for meta_crawler.
//!
//! Every option has a default, so running the binary with no arguments reads
//! `test.txt`, resolves providers from `providers.json` and writes
//! `result.csv` in the working directory.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for meta_crawler.
///
/// # Examples
///
/// ```sh
/// # Fixed file names in the working directory
/// meta_crawler
///
/// # Explicit paths
/// meta_crawler --providers ./providers.json --input links.txt --output links.csv
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// oEmbed provider catalog (providers.json format)
    #[arg(short, long, default_value = "providers.json")]
    pub providers: PathBuf,

    /// Input file with one URL per line
    #[arg(short, long, default_value = "test.txt")]
    pub input: PathBuf,

    /// Output CSV file, created or truncated
    #[arg(short, long, default_value = "result.csv")]
    pub output: PathBuf,

    /// User-Agent header sent with every request
    #[arg(long, default_value = concat!("meta_crawler/", env!("CARGO_PKG_VERSION")))]
    pub user_agent: String,

    /// Ignore HTTP(S)_PROXY settings from the environment
    #[arg(long)]
    pub no_proxy: bool,
}
