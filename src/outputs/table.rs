//! CSV table output.
//!
//! Rows have no header and always carry five columns: URL, Title,
//! ContentType, Description, AuthorName. Fields containing the delimiter, a
//! quote or a line break are quoted per RFC 4180.

use super::RecordSink;
use crate::error::{FatalError, SinkError};
use crate::models::OutputRecord;
use csv::{Writer, WriterBuilder};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{info, instrument};

/// [`RecordSink`] writing CSV rows to any [`Write`].
#[derive(Debug)]
pub struct CsvSink<W: Write> {
    writer: Writer<W>,
    rows: usize,
}

impl CsvSink<File> {
    /// Create (or truncate) the output file at `path`.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn create(path: &Path) -> Result<Self, FatalError> {
        let file = File::create(path).map_err(|source| FatalError::OutputCreate {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Created output table");
        Ok(Self::from_writer(file))
    }
}

impl<W: Write> CsvSink<W> {
    pub fn from_writer(inner: W) -> Self {
        let writer = WriterBuilder::new().has_headers(false).from_writer(inner);
        Self { writer, rows: 0 }
    }

    /// Rows written successfully so far.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(self) -> Result<W, SinkError> {
        self.writer
            .into_inner()
            .map_err(|e| SinkError::Flush(e.into_error()))
    }
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn write_record(&mut self, record: &OutputRecord) -> Result<(), SinkError> {
        self.writer.write_record(record.as_row())?;
        self.rows += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}
