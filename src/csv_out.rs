use std::path::Path;

use csv::WriterBuilder;
use tracing::debug;

use crate::error::ReconcileError;
use crate::model::OutputTable;

pub fn write_csv(path: &Path, table: &OutputTable, delimiter: u8) -> Result<(), ReconcileError> {
    let mut writer = WriterBuilder::new().delimiter(delimiter).from_path(path)?;
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    debug!(path = %path.display(), rows = table.row_count, "wrote csv");
    Ok(())
}

pub fn write_csv_to_string(table: &OutputTable, delimiter: u8) -> Result<String, ReconcileError> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::<u8>::new());
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    let bytes = writer
        .into_inner()
        .map_err(|error| ReconcileError::Io(error.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|error| ReconcileError::InvalidOption(format!("invalid utf-8 csv output: {error}")))
}
