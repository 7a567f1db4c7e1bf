mod cell;
mod classifications;
pub mod column_types;
mod csv_out;
mod error;
mod field;
mod flatten;
mod inflect;
mod input;
mod merge;
mod model;
mod options;
mod reconcile;
mod table;
mod warning;
mod workflow;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::column_types::Registry;
use crate::csv_out::{write_csv, write_csv_to_string};

pub use cell::{Cell, CellStatus, ReconciledRow, Value, column_name};
pub use classifications::{ClassificationExport, read_classifications};
pub use error::ReconcileError;
pub use field::{BoxGeometry, ColumnType, FieldValue, LineGeometry, PointGeometry};
pub use flatten::{AnnotationShape, classify, flatten_annotations, qualified_key};
pub use inflect::plural;
pub use input::{RawTable, read_table, validate_columns};
pub use merge::{RowType, explanations_output, merge, reconciled_output, unreconciled_output};
pub use model::OutputTable;
pub use options::{InputFormat, ReconcileOptions};
pub use reconcile::{Reconciled, SubjectResult, reconcile_table};
pub use table::{ColumnTypes, Row, SubjectGroup, Table};
pub use warning::{ReconcileWarning, WarningCode};
pub use workflow::{DecodedValue, WorkflowStrings};

#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileReport {
    pub subject_count: usize,
    pub row_count: usize,
    pub workflow_id: Option<String>,
    pub workflow_name: Option<String>,
    pub warnings: Vec<ReconcileWarning>,
}

/// Where each output table goes; unset targets are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputTargets {
    pub merged: Option<PathBuf>,
    pub reconciled: Option<PathBuf>,
    pub explanations: Option<PathBuf>,
    pub unreconciled: Option<PathBuf>,
}

impl OutputTargets {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.merged.is_none()
            && self.reconciled.is_none()
            && self.explanations.is_none()
            && self.unreconciled.is_none()
    }
}

/// A read and reconciled input, ready to be laid out as output tables.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub table: Table,
    pub reconciled: Reconciled,
    pub report: ReconcileReport,
}

impl Reconciliation {
    #[must_use]
    pub fn merged(&self, options: &ReconcileOptions) -> OutputTable {
        merge(
            &self.table,
            &self.reconciled,
            &options.group_by,
            &options.row_key,
        )
    }
}

/// Reads `input` in the configured format and reconciles every subject.
pub fn reconcile_text(
    input: &str,
    workflow_csv: Option<&str>,
    options: &ReconcileOptions,
) -> Result<Reconciliation, ReconcileError> {
    let mut warnings = Vec::new();
    let (table, workflow_id, workflow_name) = match options.format {
        InputFormat::Nfn => {
            let export = read_classifications(input, workflow_csv, options)?;
            warnings.extend(export.warnings);
            (
                export.table,
                Some(export.workflow_id),
                Some(export.workflow_name),
            )
        }
        InputFormat::Csv => {
            let raw = RawTable::from_csv(input)?;
            (read_table(&raw, options, &mut warnings)?, None, None)
        }
        InputFormat::Json => {
            let raw = RawTable::from_json(input)?;
            (read_table(&raw, options, &mut warnings)?, None, None)
        }
    };

    let column_types = table.column_types()?;
    debug!(columns = column_types.len(), rows = table.len(), "typed input");
    let reconciled = reconcile_table(&table, &column_types, &Registry::builtin())?;
    info!(
        subjects = reconciled.subjects.len(),
        warnings = warnings.len(),
        "reconciled input"
    );

    let report = ReconcileReport {
        subject_count: reconciled.subjects.len(),
        row_count: table.len(),
        workflow_id,
        workflow_name,
        warnings,
    };

    Ok(Reconciliation {
        table,
        reconciled,
        report,
    })
}

/// Reconciles the file at `input` and writes every requested output.
pub fn reconcile_to_csv(
    input: &Path,
    outputs: &OutputTargets,
    options: &ReconcileOptions,
) -> Result<ReconcileReport, ReconcileError> {
    if outputs.is_empty() {
        return Err(ReconcileError::InvalidOption(
            "at least one output file is required".to_string(),
        ));
    }

    let text = fs::read_to_string(input)?;
    let workflow_csv = options
        .workflow_csv
        .as_deref()
        .map(fs::read_to_string)
        .transpose()?;
    let result = reconcile_text(&text, workflow_csv.as_deref(), options)?;
    let group_by = options.group_by.as_str();

    if let Some(path) = &outputs.merged {
        write_csv(path, &result.merged(options), options.delimiter)?;
    }
    if let Some(path) = &outputs.reconciled {
        let table = reconciled_output(&result.table, &result.reconciled, group_by, &options.row_key);
        write_csv(path, &table, options.delimiter)?;
    }
    if let Some(path) = &outputs.explanations {
        let table = explanations_output(&result.table, &result.reconciled, group_by);
        write_csv(path, &table, options.delimiter)?;
    }
    if let Some(path) = &outputs.unreconciled {
        write_csv(
            path,
            &unreconciled_output(&result.table, group_by),
            options.delimiter,
        )?;
    }

    Ok(result.report)
}

/// Reconciles `input` and returns the merged table as CSV text.
pub fn reconcile_str_to_csv_string(
    input: &str,
    workflow_csv: Option<&str>,
    options: &ReconcileOptions,
) -> Result<(String, ReconcileReport), ReconcileError> {
    let result = reconcile_text(input, workflow_csv, options)?;
    let csv = write_csv_to_string(&result.merged(options), options.delimiter)?;
    Ok((csv, result.report))
}

#[cfg(test)]
mod tests {
    use super::{InputFormat, OutputTargets, ReconcileError, ReconcileOptions, reconcile_str_to_csv_string, reconcile_to_csv};

    fn csv_options() -> ReconcileOptions {
        ReconcileOptions {
            format: InputFormat::Csv,
            group_by: "subject".to_string(),
            row_key: "id".to_string(),
            column_types: vec!["name:text".to_string()],
            ..ReconcileOptions::default()
        }
    }

    #[test]
    fn requires_an_output_target() {
        let err = reconcile_to_csv(
            std::path::Path::new("missing.csv"),
            &OutputTargets::default(),
            &csv_options(),
        )
        .expect_err("no outputs");
        assert!(matches!(err, ReconcileError::InvalidOption(_)));
    }

    #[test]
    fn reconciles_generic_csv_to_string() {
        let (csv, report) = reconcile_str_to_csv_string(
            "id,subject,name\n1,s1,Oak\n2,s1,oak\n",
            None,
            &csv_options(),
        )
        .expect("reconciled");

        assert_eq!(report.subject_count, 1);
        assert_eq!(report.row_count, 2);
        let lines = csv.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "subject,row_type,id,name");
        assert_eq!(lines[1], "s1,1-reconciled,1,Oak");
        assert_eq!(lines.len(), 5);
    }
}
