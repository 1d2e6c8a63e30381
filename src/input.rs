//! Line-oriented URL input.

use crate::error::FatalError;
use std::io;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Split};
use tracing::{debug, instrument, warn};

/// Yields one URL per non-empty input line, in order.
///
/// Line terminators (`\n` or `\r\n`) are stripped; nothing else about the
/// line is touched. A last line without a terminator is still read. Bytes that
/// are not UTF-8 become U+FFFD rather than failing the read, so such a line
/// still yields a URL (and a record).
#[derive(Debug)]
pub struct UrlSource<R> {
    lines: Split<R>,
}

impl UrlSource<BufReader<File>> {
    /// Open the input file at `path`.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn open(path: &Path) -> Result<Self, FatalError> {
        let file = File::open(path).await.map_err(|source| FatalError::InputOpen {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: AsyncBufRead + Unpin> UrlSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.split(b'\n'),
        }
    }

    /// The next URL, or `None` at end of input.
    ///
    /// Errors are I/O failures of the underlying reader only.
    pub async fn next_url(&mut self) -> io::Result<Option<String>> {
        while let Some(mut line) = self.lines.next_segment().await? {
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if line.is_empty() {
                debug!("Skipping blank input line");
                continue;
            }
            let url = match String::from_utf8(line) {
                Ok(url) => url,
                Err(e) => {
                    let url = String::from_utf8_lossy(e.as_bytes()).into_owned();
                    warn!(%url, "Input line is not valid UTF-8; invalid bytes replaced");
                    url
                }
            };
            return Ok(Some(url));
        }
        Ok(None)
    }
}
