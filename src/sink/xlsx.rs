use crate::domain::property::PropertyRecord;
use crate::errors::ServerError;
use crate::sink::RecordSink;
use crate::spreadsheets::records_workbook;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::info;

/// Collects the run's records and writes them as one workbook when the run ends.
/// An id already collected in this run counts as stored, so each id gets one row.
pub struct XlsxSink {
    path: PathBuf,
    records: Vec<PropertyRecord>,
    ids: HashSet<String>,
}

impl XlsxSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: Vec::new(),
            ids: HashSet::new(),
        }
    }
}

impl RecordSink for XlsxSink {
    fn contains(&mut self, id: &str) -> Result<bool, ServerError> {
        Ok(self.ids.contains(id))
    }

    fn accept(&mut self, record: &PropertyRecord) -> Result<(), ServerError> {
        if !self.ids.insert(record.id.clone()) {
            return Err(ServerError::BadRequest(format!(
                "listing {} already in the spreadsheet",
                record.id
            )));
        }
        self.records.push(record.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ServerError> {
        if self.records.is_empty() {
            info!("no records, spreadsheet not written");
            return Ok(());
        }

        let buffer = records_workbook(&self.records)?;
        std::fs::write(&self.path, buffer).map_err(|e| {
            ServerError::XlsxError(format!("Failed to write {}: {e}", self.path.display()))
        })?;

        info!(path = %self.path.display(), rows = self.records.len(), "spreadsheet written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, precio: &str) -> PropertyRecord {
        PropertyRecord {
            id: id.to_string(),
            url: format!("https://www.zonaprop.com.ar/propiedades/depto-{id}.html"),
            precio: precio.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn collected_ids_count_as_stored() {
        let mut sink = XlsxSink::new(std::env::temp_dir().join("unused.xlsx"));
        assert!(!sink.contains("123").unwrap());

        sink.accept(&record("123", "100")).unwrap();

        assert!(sink.contains("123").unwrap());
        assert!(!sink.contains("124").unwrap());
    }

    #[test]
    fn duplicate_id_gets_one_row() {
        let mut sink = XlsxSink::new(std::env::temp_dir().join("unused.xlsx"));
        sink.accept(&record("123", "100")).unwrap();

        assert!(sink.accept(&record("123", "200")).is_err());
        assert_eq!(sink.records.len(), 1);
        assert_eq!(sink.records[0].precio, "100");
    }
}
