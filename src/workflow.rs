//! Decoding of coded answer values through a workflow description.
//!
//! Some classification exports only carry UUID-like codes for the answers of
//! dropdown questions. The workflow export holds the human strings for those
//! codes, keyed by dotted task paths, and a task tree that ties every code to
//! its string key.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ReconcileError, parse_json};

const INSTRUCTION_SUFFIX: &str = "instruction";
const DETAILS_SUFFIX: &str = "details";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedValue {
    pub text: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowStrings {
    label_strings: Vec<(String, Vec<String>)>,
    value_strings: HashMap<String, DecodedValue>,
}

impl WorkflowStrings {
    /// Builds the lookups from the workflow's `strings` map and `tasks` tree.
    #[must_use]
    pub fn build(strings: &Map<String, Value>, tasks: &Value) -> Self {
        let mut workflow = Self::default();
        let mut instructions: Vec<(String, String)> = Vec::new();

        for (key, value) in strings {
            if !key.ends_with(INSTRUCTION_SUFFIX) {
                continue;
            }
            let Some(text) = value.as_str() else {
                continue;
            };
            let text = text.trim().to_string();
            let parts = key.split('.').collect::<Vec<_>>();

            let path = parts[..parts.len() - 1].join(".");
            if parts.len() > 2 {
                let parent = parts[..parts.len() - 2].join(".");
                workflow.push_label(parent, text.clone());
            }
            instructions.push((path, text));
        }

        workflow.dive(tasks, strings, &instructions);
        debug!(
            labels = workflow.label_strings.len(),
            values = workflow.value_strings.len(),
            "built workflow strings"
        );
        workflow
    }

    /// Builds the lookups from the JSON text of the `strings` and `tasks` columns.
    pub fn from_json(strings: &str, tasks: &str) -> Result<Self, ReconcileError> {
        let strings = match parse_json(strings, "workflow strings")? {
            Value::Object(map) => map,
            _ => {
                return Err(ReconcileError::Workflow(
                    "workflow strings must be a JSON object".to_string(),
                ));
            }
        };
        let tasks = parse_json(tasks, "workflow tasks")?;
        Ok(Self::build(&strings, &tasks))
    }

    /// Builds the lookups from the most recent version of `workflow_id` in a
    /// workflow export CSV.
    pub fn from_workflow_csv(csv_text: &str, workflow_id: &str) -> Result<Self, ReconcileError> {
        let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
        let headers = reader.headers()?.clone();
        let column = |name: &str| headers.iter().position(|header| header == name);

        let mut missing = Vec::new();
        let mut require = |name: &str| {
            let index = column(name);
            if index.is_none() {
                missing.push(format!("Column '{name}' not in the workflow file"));
            }
            index
        };
        let id_column = require("workflow_id");
        let strings_column = require("strings");
        let tasks_column = require("tasks");
        let (Some(id_column), Some(strings_column), Some(tasks_column)) =
            (id_column, strings_column, tasks_column)
        else {
            return Err(ReconcileError::Validation(missing));
        };
        let version_column = column("version");
        let minor_column = column("minor_version");

        let version_of = |record: &csv::StringRecord, index: Option<usize>| {
            index
                .and_then(|index| record.get(index))
                .and_then(|value| value.trim().parse::<u64>().ok())
                .unwrap_or(0)
        };

        let wanted = workflow_id.trim();
        let mut latest: Option<((u64, u64), csv::StringRecord)> = None;
        for result in reader.records() {
            let record = result?;
            if record.get(id_column).map(str::trim) != Some(wanted) {
                continue;
            }
            let version = (
                version_of(&record, version_column),
                version_of(&record, minor_column),
            );
            if latest
                .as_ref()
                .is_none_or(|(best, _)| version >= *best)
            {
                latest = Some((version, record));
            }
        }

        let Some(((major, minor), record)) = latest else {
            return Err(ReconcileError::Workflow(format!(
                "workflow {wanted} not found in the workflow file"
            )));
        };
        debug!(workflow_id = wanted, major, minor, "using workflow version");

        Self::from_json(
            record.get(strings_column).unwrap_or_default(),
            record.get(tasks_column).unwrap_or_default(),
        )
    }

    /// The decoded string and label for a coded value.
    #[must_use]
    pub fn decode(&self, coded: &str) -> Option<&DecodedValue> {
        self.value_strings.get(coded)
    }

    /// The positional labels used for the details of a workflow-coded tool.
    ///
    /// An exact task entry wins; otherwise the last `...details` entry under
    /// the task.
    #[must_use]
    pub fn labels_for(&self, task_id: &str) -> &[String] {
        if let Some((_, labels)) = self.label_strings.iter().find(|(key, _)| key == task_id) {
            return labels;
        }

        self.label_strings
            .iter()
            .rev()
            .find(|(key, _)| key.starts_with(task_id) && key.ends_with(DETAILS_SUFFIX))
            .map_or(&[], |(_, labels)| labels.as_slice())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.label_strings.is_empty() && self.value_strings.is_empty()
    }

    fn push_label(&mut self, key: String, label: String) {
        if let Some((_, labels)) = self.label_strings.iter_mut().find(|(known, _)| *known == key) {
            labels.push(label);
        } else {
            self.label_strings.push((key, vec![label]));
        }
    }

    fn dive(
        &mut self,
        node: &Value,
        strings: &Map<String, Value>,
        instructions: &[(String, String)],
    ) {
        match node {
            Value::Object(map) if map.contains_key("value") && map.contains_key("label") => {
                let label = coded_text(&map["label"]);
                let label = label.trim();
                let Some(text) = strings
                    .get(label)
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|text| !text.is_empty())
                else {
                    return;
                };

                // Last matching prefix in insertion order, not the longest one.
                let instruction = instructions
                    .iter()
                    .rev()
                    .find(|(path, _)| label.starts_with(path.as_str()))
                    .map(|(_, instruction)| instruction.clone())
                    .unwrap_or_default();

                self.value_strings.insert(
                    coded_text(&map["value"]),
                    DecodedValue {
                        text: text.to_string(),
                        label: instruction,
                    },
                );
            }
            Value::Object(map) => {
                for child in map.values() {
                    self.dive(child, strings, instructions);
                }
            }
            Value::Array(items) => {
                for child in items {
                    self.dive(child, strings, instructions);
                }
            }
            _ => {}
        }
    }
}

/// Codes are usually strings; anything else is keyed by its JSON text.
pub(crate) fn coded_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
