//! Output sinks for resolved records.
//!
//! - [`table`]: header-less CSV table, one row per input URL
//!
//! ```text
//! result.csv
//! https://example.com/a,Title A,article,Description A,not retrievable
//! https://unreachable.example/,"error sending request ...",-,-,
//! ```

pub mod table;

use crate::error::SinkError;
use crate::models::OutputRecord;

/// Receives records one at a time, in input order.
///
/// A failed write affects only that record; callers log it and continue.
pub trait RecordSink {
    fn write_record(&mut self, record: &OutputRecord) -> Result<(), SinkError>;

    /// Flush anything buffered. Called once after the last record.
    fn finish(&mut self) -> Result<(), SinkError>;
}
