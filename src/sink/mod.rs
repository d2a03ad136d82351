//! Where finished records go.

mod sqlite;
mod xlsx;

pub use sqlite::SqliteSink;
pub use xlsx::XlsxSink;

use crate::domain::property::PropertyRecord;
use crate::errors::ServerError;

pub trait RecordSink {
    /// Whether a record with this id is already stored; lets a run skip it.
    fn contains(&mut self, id: &str) -> Result<bool, ServerError>;

    fn accept(&mut self, record: &PropertyRecord) -> Result<(), ServerError>;

    /// Called once after the last record.
    fn finish(&mut self) -> Result<(), ServerError> {
        Ok(())
    }
}
