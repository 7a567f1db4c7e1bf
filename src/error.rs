use std::io;

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed JSON in {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{}", .0.join("\n"))]
    Validation(Vec<String>),

    #[error("malformed annotation '{key}': {message}")]
    Annotation { key: String, message: String },

    #[error("invalid date '{value}' in {field}")]
    Date { field: String, value: String },

    #[error("there are multiple workflows in this file ({}); provide a workflow ID", .0.join(", "))]
    MultipleWorkflows(Vec<String>),

    #[error("workflow error: {0}")]
    Workflow(String),

    #[error("invalid option: {0}")]
    InvalidOption(String),
}

impl ReconcileError {
    /// Every message carried by this error; validation errors report one line per problem.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Validation(messages) => messages.clone(),
            other => vec![other.to_string()],
        }
    }
}

pub(crate) fn parse_json(text: &str, context: &str) -> Result<Value, ReconcileError> {
    serde_json::from_str(text).map_err(|source| ReconcileError::Json {
        context: context.to_string(),
        source,
    })
}
