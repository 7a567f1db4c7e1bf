//! Flattening of one classification's nested annotation list into row fields.
//!
//! Annotations come in several shapes, and one classification can mix them.
//! Each item is classified into exactly one [`AnnotationShape`] and then
//! handled. Field keys are qualified with the owning task id as
//! `~<task>~ <label>` so identical labels under different tasks stay apart.

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::ReconcileError;
use crate::field::{BoxGeometry, FieldValue, LineGeometry, PointGeometry};
use crate::table::Row;
use crate::warning::{ReconcileWarning, WarningCode};
use crate::workflow::{WorkflowStrings, coded_text};

pub(crate) const MAX_DEPTH: usize = 32;
const UNKNOWN_LABEL: &str = "unknown";

/// Recognized annotation shapes, in matching precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationShape {
    ValueList,
    Subtasks,
    SelectLabel,
    TaskLabel,
    BoxTool,
    LengthTool,
    PointTool,
    WorkflowTool,
    Unrecognized,
}

/// The first shape `annotation` matches.
#[must_use]
pub fn classify(annotation: &Value) -> AnnotationShape {
    let Some(object) = annotation.as_object() else {
        return AnnotationShape::Unrecognized;
    };

    if let Some(Value::Array(items)) = object.get("value") {
        return if matches!(items.first(), Some(Value::String(_))) {
            AnnotationShape::ValueList
        } else {
            AnnotationShape::Subtasks
        };
    }

    if object.contains_key("select_label") {
        return AnnotationShape::SelectLabel;
    }
    if object.contains_key("task_label") {
        return AnnotationShape::TaskLabel;
    }

    if object.contains_key("tool_label") {
        if object.contains_key("width") {
            return AnnotationShape::BoxTool;
        }
        if object.contains_key("x1") {
            return AnnotationShape::LengthTool;
        }
        if object.contains_key("x") {
            return AnnotationShape::PointTool;
        }
        if object.contains_key("details") {
            return AnnotationShape::WorkflowTool;
        }
    }

    AnnotationShape::Unrecognized
}

#[must_use]
pub fn qualified_key(label: &str, task_id: &str) -> String {
    format!("~{task_id}~ {}", label.trim())
}

/// Flattens a classification's annotation list into `row`.
pub fn flatten_annotations(
    annotations: &Value,
    row: &mut Row,
    workflow_strings: &WorkflowStrings,
    warnings: &mut Vec<ReconcileWarning>,
) -> Result<(), ReconcileError> {
    let Value::Array(items) = annotations else {
        return Err(ReconcileError::Annotation {
            key: row.row_key().to_string(),
            message: "annotations must be a JSON list".to_string(),
        });
    };

    let mut flattener = Flattener {
        row,
        workflow_strings,
        warnings,
    };
    for item in items {
        flattener.flatten(item, "", 0)?;
    }
    Ok(())
}

struct Flattener<'a> {
    row: &'a mut Row,
    workflow_strings: &'a WorkflowStrings,
    warnings: &'a mut Vec<ReconcileWarning>,
}

impl Flattener<'_> {
    fn flatten(
        &mut self,
        annotation: &Value,
        inherited_id: &str,
        depth: usize,
    ) -> Result<(), ReconcileError> {
        let task_id = annotation
            .get("task")
            .filter(|task| !task.is_null())
            .map_or_else(|| inherited_id.to_string(), coded_text);

        if depth > MAX_DEPTH {
            self.report(
                WarningCode::AnnotationTooDeep,
                format!("annotation nesting exceeds {MAX_DEPTH} levels; subtree skipped"),
                &task_id,
            );
            return Ok(());
        }

        let shape = classify(annotation);
        let Some(object) = annotation.as_object() else {
            self.report(
                WarningCode::UnrecognizedAnnotation,
                format!("annotation type not found: {annotation}"),
                &task_id,
            );
            return Ok(());
        };

        match shape {
            AnnotationShape::ValueList => self.value_list(object, &task_id),
            AnnotationShape::Subtasks => {
                if let Some(Value::Array(subtasks)) = object.get("value") {
                    for subtask in subtasks {
                        self.flatten(subtask, &task_id, depth + 1)?;
                    }
                }
            }
            AnnotationShape::SelectLabel => {
                let key = qualified_key(&label_text(object, "select_label"), &task_id);
                let value = if object.get("option").is_some_and(is_truthy) {
                    value_text(object.get("label"))
                } else {
                    value_text(object.get("value"))
                };
                self.row.add_field(key, FieldValue::Select(value));
            }
            AnnotationShape::TaskLabel => {
                let key = qualified_key(&label_text(object, "task_label"), &task_id);
                self.row
                    .add_field(key, FieldValue::Text(value_text(object.get("value"))));
            }
            AnnotationShape::BoxTool => {
                let key = qualified_key(&label_text(object, "tool_label"), &task_id);
                let geometry = BoxGeometry::from_origin_and_size(
                    number(object, "x", &key)?,
                    number(object, "y", &key)?,
                    number(object, "width", &key)?,
                    number(object, "height", &key)?,
                );
                self.row.add_field(key, FieldValue::Box(geometry));
            }
            AnnotationShape::LengthTool => {
                let key = qualified_key(&label_text(object, "tool_label"), &task_id);
                let geometry = LineGeometry::from_endpoints(
                    number(object, "x1", &key)?,
                    number(object, "y1", &key)?,
                    number(object, "x2", &key)?,
                    number(object, "y2", &key)?,
                );
                self.row.add_field(key, FieldValue::Length(geometry));
            }
            AnnotationShape::PointTool => {
                let key = qualified_key(&label_text(object, "tool_label"), &task_id);
                let geometry = PointGeometry::from_coordinates(
                    number(object, "x", &key)?,
                    number(object, "y", &key)?,
                );
                self.row.add_field(key, FieldValue::Point(geometry));
            }
            AnnotationShape::WorkflowTool => self.workflow_tool(object, &task_id),
            AnnotationShape::Unrecognized => self.report(
                WarningCode::UnrecognizedAnnotation,
                format!("annotation type not found: {annotation}"),
                &task_id,
            ),
        }

        Ok(())
    }

    fn value_list(&mut self, object: &Map<String, Value>, task_id: &str) {
        let mut values = match object.get("value") {
            Some(Value::Array(items)) => items.iter().map(coded_text).collect::<Vec<_>>(),
            _ => Vec::new(),
        };
        values.sort();

        let key = qualified_key(&label_text(object, "task_label"), task_id);
        self.row.add_field(key, FieldValue::Text(values.join(" ")));
    }

    fn workflow_tool(&mut self, object: &Map<String, Value>, task_id: &str) {
        let tool_label = label_text(object, "tool_label");
        let Some(Value::Array(details)) = object.get("details") else {
            self.report(
                WarningCode::UnrecognizedAnnotation,
                format!("details of tool '{}' are not a list", tool_label.trim()),
                task_id,
            );
            return;
        };

        for (index, detail) in details.iter().enumerate() {
            let outer = detail.get("value");

            if let Some(Value::Array(selected)) = outer {
                let mut label = UNKNOWN_LABEL.to_string();
                let mut decoded = Vec::with_capacity(selected.len());

                for item in selected {
                    let coded = item.get("value").unwrap_or(item);
                    let coded = coded_text(coded);
                    if let Some(found) = self.workflow_strings.decode(&coded) {
                        decoded.push(found.text.clone());
                        label.clone_from(&found.label);
                    } else {
                        label = item
                            .get("label")
                            .and_then(Value::as_str)
                            .unwrap_or(UNKNOWN_LABEL)
                            .to_string();
                        decoded.push(coded);
                    }
                }

                let value = decoded
                    .into_iter()
                    .filter(|text| !text.is_empty())
                    .collect::<Vec<_>>()
                    .join(",");
                let key = qualified_key(&format!("{tool_label}.{label}"), task_id);
                self.row.add_field(key, FieldValue::Text(value));
            } else {
                let label = self
                    .workflow_strings
                    .labels_for(task_id)
                    .get(index)
                    .map_or(UNKNOWN_LABEL, String::as_str);
                let key = qualified_key(&format!("{tool_label}.{label}"), task_id);
                self.row.add_field(key, FieldValue::Text(value_text(outer)));
            }
        }
    }

    fn report(&mut self, code: WarningCode, message: String, task_id: &str) {
        warn!(
            row_key = self.row.row_key(),
            task_id, "{message}"
        );
        self.warnings.push(
            ReconcileWarning::new(code, message)
                .with_row_key(self.row.row_key())
                .with_task_id(task_id),
        );
    }
}

fn label_text(object: &Map<String, Value>, name: &str) -> String {
    value_text(object.get(name))
}

/// JSON strings verbatim, null as blank, other values as their JSON text.
fn value_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|number| number != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn number(object: &Map<String, Value>, name: &str, key: &str) -> Result<f64, ReconcileError> {
    object
        .get(name)
        .and_then(Value::as_f64)
        .ok_or_else(|| ReconcileError::Annotation {
            key: key.to_string(),
            message: format!("'{name}' is missing or not a number"),
        })
}
