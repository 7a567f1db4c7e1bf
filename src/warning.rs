#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningCode {
    UnrecognizedAnnotation,
    AnnotationTooDeep,
    MissingColumnTypes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileWarning {
    pub code: WarningCode,
    pub message: String,
    pub row_key: Option<String>,
    pub task_id: Option<String>,
}

impl ReconcileWarning {
    #[must_use]
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            row_key: None,
            task_id: None,
        }
    }

    #[must_use]
    pub fn with_row_key(mut self, row_key: impl Into<String>) -> Self {
        self.row_key = Some(row_key.into());
        self
    }

    #[must_use]
    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        let task_id = task_id.into();
        if !task_id.is_empty() {
            self.task_id = Some(task_id);
        }
        self
    }
}
