use crate::domain::property::{PropertyRecord, COLUMNS};
use crate::errors::ServerError;
use rust_xlsxwriter::Workbook;

pub const SHEET_NAME: &str = "Propiedades";

/// Builds the listings workbook: a header row with [`COLUMNS`], then one row per record.
pub fn records_workbook(records: &[PropertyRecord]) -> Result<Vec<u8>, ServerError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(SHEET_NAME)
        .map_err(|e| ServerError::XlsxError(format!("Failed to name sheet: {e}")))?;

    // Headers
    for (col, header) in COLUMNS.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, *header)
            .map_err(|e| ServerError::XlsxError(format!("Failed to write header '{header}': {e}")))?;
    }

    // Rows
    for (i, record) in records.iter().enumerate() {
        let r = (i + 1) as u32;
        for (col, value) in record.values().iter().enumerate() {
            worksheet.write_string(r, col as u16, *value).map_err(|e| {
                ServerError::XlsxError(format!(
                    "Failed to write {} for listing {}: {e}",
                    COLUMNS[col], record.id
                ))
            })?;
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| ServerError::XlsxError(format!("Failed to save workbook: {e}")))
}
