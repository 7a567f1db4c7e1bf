//! Plain CSV and JSON inputs whose column types come from the caller.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ReconcileError, parse_json};
use crate::field::{BoxGeometry, ColumnType, FieldValue, LineGeometry, PointGeometry};
use crate::options::ReconcileOptions;
use crate::table::{ColumnTypes, Row, Table};
use crate::warning::{ReconcileWarning, WarningCode};

/// Untyped rows of strings, as read from the input file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    headers: Vec<String>,
    records: Vec<Vec<String>>,
}

impl RawTable {
    pub fn from_csv(text: &str) -> Result<Self, ReconcileError> {
        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let headers = reader
            .headers()?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result?;
            records.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self { headers, records })
    }

    /// Reads a JSON list of flat objects; nested values keep their JSON text.
    pub fn from_json(text: &str) -> Result<Self, ReconcileError> {
        let not_a_list =
            || ReconcileError::Validation(vec!["JSON input must be a list of objects".to_string()]);

        let Value::Array(items) = parse_json(text, "input file")? else {
            return Err(not_a_list());
        };

        let mut objects = Vec::with_capacity(items.len());
        let mut headers: Vec<String> = Vec::new();
        for item in items {
            let Value::Object(object) = item else {
                return Err(not_a_list());
            };
            for key in object.keys() {
                if !headers.contains(key) {
                    headers.push(key.clone());
                }
            }
            objects.push(object);
        }

        let records = objects
            .iter()
            .map(|object| {
                headers
                    .iter()
                    .map(|header| match object.get(header) {
                        None | Some(Value::Null) => String::new(),
                        Some(Value::String(text)) => text.clone(),
                        Some(other) => other.to_string(),
                    })
                    .collect()
            })
            .collect();

        Ok(Self { headers, records })
    }

    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    #[must_use]
    pub fn records(&self) -> &[Vec<String>] {
        &self.records
    }

    /// The cell at `column`, blank when the record is short.
    #[must_use]
    pub fn cell(record: &[String], column: usize) -> &str {
        record.get(column).map_or("", String::as_str)
    }
}

/// Checks the group-by column and every `name:type` entry, reporting all
/// problems at once.
pub fn validate_columns(
    raw: &RawTable,
    options: &ReconcileOptions,
    warnings: &mut Vec<ReconcileWarning>,
) -> Result<ColumnTypes, ReconcileError> {
    let mut errors = Vec::new();
    let mut types = ColumnTypes::new();

    if options.column_types.is_empty() {
        warn!("missing column types for a CSV or JSON file");
        warnings.push(ReconcileWarning::new(
            WarningCode::MissingColumnTypes,
            "missing column types for a CSV or JSON file; every column is copied unreconciled",
        ));
    }

    if raw.column(&options.group_by).is_none() {
        errors.push(format!(
            "Column '{}' not in the input columns",
            options.group_by
        ));
    }

    let entries = options
        .column_types
        .iter()
        .flat_map(|list| list.split(','))
        .map(str::trim)
        .filter(|entry| !entry.is_empty());

    for entry in entries {
        let Some((name, type_name)) = entry.rsplit_once(':') else {
            errors.push(format!("Column type '{entry}' is not in the form name:type"));
            continue;
        };
        let name = name.trim();

        if raw.column(name).is_none() {
            errors.push(format!("Column '{name}' not in the input columns"));
        }
        match type_name.parse::<ColumnType>() {
            Ok(column_type) => {
                types.insert(name.to_string(), column_type);
            }
            Err(error) => errors.push(error),
        }
    }

    if errors.is_empty() {
        Ok(types)
    } else {
        Err(ReconcileError::Validation(errors))
    }
}

/// Builds a table from a generic input; unspecified columns pass through.
pub fn read_table(
    raw: &RawTable,
    options: &ReconcileOptions,
    warnings: &mut Vec<ReconcileWarning>,
) -> Result<Table, ReconcileError> {
    let column_types = validate_columns(raw, options, warnings)?;
    let Some(group_column) = raw.column(&options.group_by) else {
        return Err(ReconcileError::Validation(vec![format!(
            "Column '{}' not in the input columns",
            options.group_by
        )]));
    };
    let row_key_column = raw.column(&options.row_key);

    let mut table = Table::new();
    for (index, record) in raw.records().iter().enumerate() {
        let group_key = RawTable::cell(record, group_column).to_string();
        let row_key = row_key_column.map_or_else(
            || (index + 1).to_string(),
            |column| RawTable::cell(record, column).to_string(),
        );

        let mut row = Row::new(group_key.clone(), row_key);
        row.add_field(options.group_by.clone(), FieldValue::Same(group_key));

        for (column, name) in raw.headers().iter().enumerate() {
            if column == group_column {
                continue;
            }
            let column_type = column_types
                .get(name)
                .copied()
                .unwrap_or(ColumnType::NoOp);
            let value = parse_cell(name, column_type, RawTable::cell(record, column))?;
            row.add_field(name.clone(), value);
        }

        table.push(row);
    }

    table.sort_by_group_key();
    debug!(rows = table.len(), "read generic table");
    Ok(table)
}

#[derive(Debug, Deserialize)]
struct RawBox {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

#[derive(Debug, Deserialize)]
struct RawLine {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
}

#[derive(Debug, Deserialize)]
struct RawPoint {
    x: f64,
    y: f64,
}

fn geometry<T: for<'de> Deserialize<'de>>(name: &str, value: &str) -> Result<T, ReconcileError> {
    serde_json::from_str(value).map_err(|source| ReconcileError::Json {
        context: format!("column '{name}'"),
        source,
    })
}

fn parse_cell(name: &str, column_type: ColumnType, value: &str) -> Result<FieldValue, ReconcileError> {
    let blank = value.trim().is_empty();
    Ok(match column_type {
        ColumnType::Box if blank => FieldValue::Box(BoxGeometry::default()),
        ColumnType::Box => {
            let raw: RawBox = geometry(name, value)?;
            FieldValue::Box(BoxGeometry::from_origin_and_size(
                raw.x, raw.y, raw.width, raw.height,
            ))
        }
        ColumnType::Length if blank => FieldValue::Length(LineGeometry::default()),
        ColumnType::Length => {
            let raw: RawLine = geometry(name, value)?;
            FieldValue::Length(LineGeometry::from_endpoints(raw.x1, raw.y1, raw.x2, raw.y2))
        }
        ColumnType::Point if blank => FieldValue::Point(PointGeometry::default()),
        ColumnType::Point => {
            let raw: RawPoint = geometry(name, value)?;
            FieldValue::Point(PointGeometry::from_coordinates(raw.x, raw.y))
        }
        ColumnType::Select => FieldValue::Select(value.to_string()),
        ColumnType::Text => FieldValue::Text(value.to_string()),
        ColumnType::NoOp => FieldValue::NoOp(value.to_string()),
        ColumnType::Same => FieldValue::Same(value.to_string()),
    })
}
