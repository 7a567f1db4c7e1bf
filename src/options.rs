use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputFormat {
    /// A Notes from Nature / Zooniverse classification export.
    #[default]
    Nfn,
    Csv,
    Json,
}

impl FromStr for InputFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "nfn" => Ok(Self::Nfn),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "unknown input format '{other}', expected nfn, csv or json"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOptions {
    pub format: InputFormat,
    /// Column holding the subject key rows are grouped by.
    pub group_by: String,
    /// Column identifying each transcription.
    pub row_key: String,
    pub user_column: Option<String>,
    pub workflow_id: Option<String>,
    pub workflow_csv: Option<PathBuf>,
    /// `name:type` entries, comma separated within one string.
    pub column_types: Vec<String>,
    pub delimiter: u8,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            format: InputFormat::Nfn,
            group_by: "subject_id".to_string(),
            row_key: "classification_id".to_string(),
            user_column: Some("user_name".to_string()),
            workflow_id: None,
            workflow_csv: None,
            column_types: Vec::new(),
            delimiter: b',',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{InputFormat, ReconcileOptions};
    use std::str::FromStr;

    #[test]
    fn parses_input_formats() {
        assert_eq!(InputFormat::from_str("NFN"), Ok(InputFormat::Nfn));
        assert_eq!(InputFormat::from_str(" csv"), Ok(InputFormat::Csv));
        let err = InputFormat::from_str("xml").expect_err("unknown format");
        assert!(err.contains("unknown input format 'xml'"));
    }

    #[test]
    fn defaults_match_classification_exports() {
        let options = ReconcileOptions::default();
        assert_eq!(options.group_by, "subject_id");
        assert_eq!(options.row_key, "classification_id");
        assert_eq!(options.delimiter, b',');
    }
}
