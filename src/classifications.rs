//! Reader for Notes from Nature classification exports.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{ReconcileError, parse_json};
use crate::field::FieldValue;
use crate::flatten::flatten_annotations;
use crate::input::RawTable;
use crate::options::ReconcileOptions;
use crate::table::{Row, Table};
use crate::warning::ReconcileWarning;
use crate::workflow::WorkflowStrings;

pub const SUBJECT_PREFIX: &str = "subject_";
const DATE_FORMAT: &str = "%d-%b-%Y %H:%M:%S";
const MISC_COLUMNS: [&str; 3] = ["gold_standard", "expert", "workflow_version"];
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S UTC",
    "%m/%d/%Y %H:%M:%S",
];

static NON_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\W+").expect("hardcoded non-word regex is valid"));
static WORKFLOW_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^_]*_").expect("hardcoded workflow prefix regex is valid"));

/// A classification export narrowed to one workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationExport {
    pub table: Table,
    pub workflow_id: String,
    pub workflow_name: String,
    pub warnings: Vec<ReconcileWarning>,
}

struct Columns {
    subject_ids: usize,
    workflow_id: usize,
    workflow_name: usize,
    annotations: usize,
    subject_data: usize,
    metadata: usize,
    row_key: usize,
}

impl Columns {
    fn find(raw: &RawTable, options: &ReconcileOptions) -> Result<Self, ReconcileError> {
        let mut errors = Vec::new();
        let mut require = |name: &str| {
            let index = raw.column(name);
            if index.is_none() {
                errors.push(format!("Column '{name}' not in the input columns"));
            }
            index
        };

        let subject_ids = require("subject_ids");
        let workflow_id = require("workflow_id");
        let annotations = require("annotations");
        let subject_data = require("subject_data");
        let metadata = require("metadata");
        let row_key = require(&options.row_key);
        let workflow_name = raw.column("workflow_name");
        if workflow_name.is_none() {
            errors.push("Workflow name not found in classifications file.".to_string());
        }

        match (
            subject_ids,
            workflow_id,
            workflow_name,
            annotations,
            subject_data,
            metadata,
            row_key,
        ) {
            (
                Some(subject_ids),
                Some(workflow_id),
                Some(workflow_name),
                Some(annotations),
                Some(subject_data),
                Some(metadata),
                Some(row_key),
            ) => Ok(Self {
                subject_ids,
                workflow_id,
                workflow_name,
                annotations,
                subject_data,
                metadata,
                row_key,
            }),
            _ => Err(ReconcileError::Validation(errors)),
        }
    }
}

/// Reads a classification export, decoding coded values with the workflow
/// export in `workflow_csv` when one is given.
pub fn read_classifications(
    csv_text: &str,
    workflow_csv: Option<&str>,
    options: &ReconcileOptions,
) -> Result<ClassificationExport, ReconcileError> {
    let raw = RawTable::from_csv(csv_text)?;
    let columns = Columns::find(&raw, options)?;

    let workflow_id = resolve_workflow_id(&raw, columns.workflow_id, options)?;
    let workflow_name = raw
        .records()
        .first()
        .map(|record| workflow_name(RawTable::cell(record, columns.workflow_name)))
        .unwrap_or_default();

    let workflow_strings = match workflow_csv {
        Some(text) if !workflow_id.is_empty() => {
            WorkflowStrings::from_workflow_csv(text, &workflow_id)?
        }
        _ => WorkflowStrings::default(),
    };
    info!(%workflow_id, %workflow_name, "reading classifications");

    let user_column = options
        .user_column
        .as_deref()
        .filter(|name| !name.is_empty())
        .map(|name| (name, raw.column(name)));
    let misc_columns = MISC_COLUMNS
        .iter()
        .filter_map(|name| raw.column(name).map(|index| (*name, index)))
        .collect::<Vec<_>>();

    let mut table = Table::new();
    let mut warnings = Vec::new();
    for record in raw.records() {
        if RawTable::cell(record, columns.workflow_id).trim() != workflow_id {
            continue;
        }

        let subject_ids = RawTable::cell(record, columns.subject_ids);
        let group_key = subject_ids
            .split_once(',')
            .map_or(subject_ids, |(first, _)| first)
            .to_string();
        let row_key = RawTable::cell(record, columns.row_key).to_string();

        let mut row = Row::new(group_key.clone(), row_key.clone());
        row.add_field(options.group_by.clone(), FieldValue::Same(group_key));
        row.add_field(options.row_key.clone(), FieldValue::NoOp(row_key));

        if let Some((name, index)) = user_column {
            let user = index.map_or("", |index| RawTable::cell(record, index));
            row.add_field(name, FieldValue::NoOp(user.to_string()));
        }

        let annotations = parse_json(RawTable::cell(record, columns.annotations), "annotations")?;
        flatten_annotations(&annotations, &mut row, &workflow_strings, &mut warnings)?;

        extract_subject_data(RawTable::cell(record, columns.subject_data), &mut row)?;
        extract_metadata(RawTable::cell(record, columns.metadata), &mut row)?;

        for (name, index) in &misc_columns {
            row.add_field(*name, FieldValue::NoOp(RawTable::cell(record, *index).to_string()));
        }

        table.push(row);
    }

    debug!(rows = table.len(), warnings = warnings.len(), "read classifications");
    Ok(ClassificationExport {
        table,
        workflow_id,
        workflow_name,
        warnings,
    })
}

fn resolve_workflow_id(
    raw: &RawTable,
    column: usize,
    options: &ReconcileOptions,
) -> Result<String, ReconcileError> {
    if let Some(workflow_id) = options.workflow_id.as_deref() {
        return Ok(workflow_id.trim().to_string());
    }

    let mut distinct: Vec<String> = Vec::new();
    for record in raw.records() {
        let workflow_id = RawTable::cell(record, column).trim();
        if !distinct.iter().any(|seen| seen == workflow_id) {
            distinct.push(workflow_id.to_string());
        }
    }

    if distinct.len() > 1 {
        return Err(ReconcileError::MultipleWorkflows(distinct));
    }
    Ok(distinct.pop().unwrap_or_default())
}

/// Drops the project prefix, e.g. `NfN_Herbarium` becomes `Herbarium`.
fn workflow_name(raw: &str) -> String {
    WORKFLOW_PREFIX_RE.replace(raw, "").into_owned()
}

/// `{<subject_id>: {key: value}}`; keys become `subject_<key>` columns.
fn extract_subject_data(text: &str, row: &mut Row) -> Result<(), ReconcileError> {
    if text.trim().is_empty() {
        return Ok(());
    }
    let Value::Object(subjects) = parse_json(text, "subject_data")? else {
        return Ok(());
    };

    for data in subjects.values() {
        let Value::Object(data) = data else {
            continue;
        };
        for (key, value) in data {
            if key == "retired" {
                continue;
            }
            let value = match value {
                Value::Null => String::new(),
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            row.add_field(subject_column(key), FieldValue::Same(value));
        }
    }
    Ok(())
}

fn subject_column(key: &str) -> String {
    let key = NON_WORD_RE.replace_all(key, "_");
    let key = key.trim_start_matches('_');
    let key = key.strip_suffix('_').unwrap_or(key);
    format!("{SUBJECT_PREFIX}{key}")
}

fn extract_metadata(text: &str, row: &mut Row) -> Result<(), ReconcileError> {
    let metadata = if text.trim().is_empty() {
        Value::Null
    } else {
        parse_json(text, "metadata")?
    };

    for field in ["started_at", "finished_at"] {
        let value = match metadata.get(field) {
            Some(Value::String(raw)) if !raw.trim().is_empty() => format_date(field, raw)?,
            _ => String::new(),
        };
        row.add_field(field, FieldValue::NoOp(value));
    }
    Ok(())
}

fn format_date(field: &str, raw: &str) -> Result<String, ReconcileError> {
    let raw = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.naive_local().format(DATE_FORMAT).to_string());
    }
    for format in NAIVE_FORMATS {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(timestamp.format(DATE_FORMAT).to_string());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN).format(DATE_FORMAT).to_string());
    }
    Err(ReconcileError::Date {
        field: field.to_string(),
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{format_date, read_classifications, subject_column, workflow_name};
    use crate::error::ReconcileError;
    use crate::field::FieldValue;
    use crate::options::ReconcileOptions;

    const HEADER: &str = "classification_id,user_name,workflow_id,workflow_name,workflow_version,\
        annotations,subject_data,subject_ids,metadata";

    fn line(id: &str, workflow: &str, subject: &str, annotations: &str) -> String {
        format!(
            "{id},user{id},{workflow},NfN_Herbarium,3.1,\"{}\",\"{}\",\"{subject},999\",\"{}\"",
            annotations.replace('"', "\"\""),
            format!(r#"{{"{subject}": {{"Catalog #": "A1", "retired": true}}}}"#)
                .replace('"', "\"\""),
            r#"{"started_at": "2018-05-29T15:08:57.446Z", "finished_at": "2018-05-29 15:10:02"}"#
                .replace('"', "\"\""),
        )
    }

    fn export(lines: &[String]) -> String {
        let mut text = HEADER.to_string();
        for line in lines {
            text.push('\n');
            text.push_str(line);
        }
        text.push('\n');
        text
    }

    #[test]
    fn formats_dates_like_the_export() {
        assert_eq!(
            format_date("started_at", "2018-05-29T15:08:57.446Z").expect("date"),
            "29-May-2018 15:08:57"
        );
        assert_eq!(
            format_date("finished_at", "2018-05-29 15:10:02").expect("date"),
            "29-May-2018 15:10:02"
        );
        assert!(matches!(
            format_date("started_at", "yesterday"),
            Err(ReconcileError::Date { .. })
        ));
    }

    #[test]
    fn cleans_subject_and_workflow_names() {
        assert_eq!(subject_column("Catalog #"), "subject_Catalog");
        assert_eq!(subject_column("#image-url"), "subject_image_url");
        assert_eq!(workflow_name("NfN_Herbarium_Sheets"), "Herbarium_Sheets");
        assert_eq!(workflow_name("Plain"), "Plain");
    }

    #[test]
    fn builds_rows_for_the_selected_workflow() {
        let annotations = r#"[{"task": "T1", "task_label": "Country", "value": "Peru"}]"#;
        let text = export(&[
            line("1", "42", "100", annotations),
            line("2", "42", "100", annotations),
        ]);

        let export = read_classifications(&text, None, &ReconcileOptions::default())
            .expect("classifications");
        assert_eq!(export.workflow_id, "42");
        assert_eq!(export.workflow_name, "Herbarium");

        let row = &export.table.rows()[0];
        assert_eq!(row.group_key(), "100");
        assert_eq!(row.get("subject_id"), Some(&FieldValue::Same("100".into())));
        assert_eq!(row.get("user_name"), Some(&FieldValue::NoOp("user1".into())));
        assert_eq!(row.get("~T1~ Country"), Some(&FieldValue::Text("Peru".into())));
        assert_eq!(row.get("subject_Catalog"), Some(&FieldValue::Same("A1".into())));
        assert!(row.get("subject_retired").is_none());
        assert_eq!(
            row.get("started_at"),
            Some(&FieldValue::NoOp("29-May-2018 15:08:57".into()))
        );
        assert_eq!(row.get("workflow_version"), Some(&FieldValue::NoOp("3.1".into())));
    }

    #[test]
    fn several_workflows_need_an_explicit_id() {
        let text = export(&[line("1", "42", "100", "[]"), line("2", "43", "101", "[]")]);

        let err = read_classifications(&text, None, &ReconcileOptions::default())
            .expect_err("ambiguous workflow");
        assert!(matches!(err, ReconcileError::MultipleWorkflows(ref ids) if ids.len() == 2));

        let options = ReconcileOptions {
            workflow_id: Some("43".to_string()),
            ..ReconcileOptions::default()
        };
        let export = read_classifications(&text, None, &options).expect("filtered");
        assert_eq!(export.table.len(), 1);
        assert_eq!(export.table.rows()[0].group_key(), "101");
    }

    #[test]
    fn missing_columns_are_reported_together() {
        let err = read_classifications("classification_id,subject_ids\n1,2\n", None, &ReconcileOptions::default())
            .expect_err("missing columns");
        let messages = err.messages();
        assert_eq!(messages.len(), 5, "{messages:?}");
        assert!(messages.contains(&"Workflow name not found in classifications file.".to_string()));
    }
}
