use crate::db::properties;
use crate::db::Database;
use crate::domain::property::PropertyRecord;
use crate::errors::ServerError;
use crate::sink::RecordSink;

/// Upserts each record into `properties`, keyed by listing id.
pub struct SqliteSink {
    db: Database,
}

impl SqliteSink {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl RecordSink for SqliteSink {
    fn contains(&mut self, id: &str) -> Result<bool, ServerError> {
        self.db.with_conn(|conn| properties::exists(conn, id))
    }

    fn accept(&mut self, record: &PropertyRecord) -> Result<(), ServerError> {
        self.db.with_conn(|conn| properties::upsert(conn, record))
    }
}
