pub mod export_xlsx;

pub use export_xlsx::records_workbook;
