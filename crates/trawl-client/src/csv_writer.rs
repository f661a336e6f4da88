use std::path::Path;

use trawl_core::error::AppError;
use trawl_core::export::Table;
use trawl_core::traits::TableWriter;

/// Writes tables as comma-separated files with a header row.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvTableWriter;

impl CsvTableWriter {
    pub fn new() -> Self {
        Self
    }
}

impl TableWriter for CsvTableWriter {
    fn write(&self, table: &Table, path: &Path) -> Result<(), AppError> {
        let to_export_error =
            |e: csv::Error| AppError::ExportError(format!("{}: {e}", path.display()));

        let mut writer = csv::Writer::from_path(path).map_err(to_export_error)?;
        writer.write_record(table.columns).map_err(to_export_error)?;
        for row in &table.rows {
            writer.write_record(row).map_err(to_export_error)?;
        }
        writer
            .flush()
            .map_err(|e| AppError::ExportError(format!("{}: {e}", path.display())))
    }
}
