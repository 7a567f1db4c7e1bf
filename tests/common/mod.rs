#![allow(dead_code)]

use std::path::Path;

use serde_json::{Value, json};

pub struct Classification {
    pub id: &'static str,
    pub user: &'static str,
    pub workflow_id: &'static str,
    pub subject: &'static str,
    pub annotations: Value,
}

impl Classification {
    pub fn new(id: &'static str, subject: &'static str, annotations: Value) -> Self {
        Self {
            id,
            user: "volunteer",
            workflow_id: "42",
            subject,
            annotations,
        }
    }
}

/// Classification export text in the column layout of a real export.
pub fn classification_csv(rows: &[Classification]) -> Result<String, Box<dyn std::error::Error>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "classification_id",
        "user_name",
        "workflow_id",
        "workflow_name",
        "workflow_version",
        "metadata",
        "annotations",
        "subject_data",
        "subject_ids",
    ])?;

    for row in rows {
        let metadata = json!({
            "started_at": "2018-05-29T15:08:57.446Z",
            "finished_at": "2018-05-29T15:10:02.000Z",
        });
        let subject_data = json!({
            (row.subject): {"retired": null, "Catalog #": format!("CAT-{}", row.subject)}
        });
        let (metadata, annotations, subject_data) = (
            metadata.to_string(),
            row.annotations.to_string(),
            subject_data.to_string(),
        );
        writer.write_record([
            row.id,
            row.user,
            row.workflow_id,
            "NfN_Herbarium Sheets",
            "12.4",
            metadata.as_str(),
            annotations.as_str(),
            subject_data.as_str(),
            row.subject,
        ])?;
    }

    Ok(String::from_utf8(writer.into_inner().map_err(|error| error.into_error())?)?)
}

pub fn write_classifications(path: &Path, rows: &[Classification]) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(path, classification_csv(rows)?)?;
    Ok(())
}

/// A workflow export with an old and a current version of workflow 42.
pub fn workflow_csv() -> Result<String, Box<dyn std::error::Error>> {
    let tasks = json!({
        "T1": {
            "tools": [{
                "details": [{
                    "selects": [{
                        "options": {"*": [
                            {"value": "u1", "label": "T1.tools.0.details.0.selects.0.options.*.0.label"},
                            {"value": "u2", "label": "T1.tools.0.details.0.selects.0.options.*.1.label"}
                        ]}
                    }]
                }]
            }]
        }
    });
    let strings = |first: &str| {
        json!({
            "T1.instruction": "Transcribe the label",
            "T1.tools.0.label": "Collector",
            "T1.tools.0.details.0.instruction": "Country",
            "T1.tools.0.details.0.selects.0.options.*.0.label": first,
            "T1.tools.0.details.0.selects.0.options.*.1.label": "Canada",
        })
    };

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["workflow_id", "display_name", "version", "minor_version", "strings", "tasks"])?;
    let tasks = tasks.to_string();
    for (workflow_id, name, version, minor, first) in [
        ("42", "Herbarium", "2", "1", "Mexico"),
        ("42", "Herbarium", "1", "9", "Mexique"),
        ("7", "Other", "9", "9", "Elsewhere"),
    ] {
        let strings = strings(first).to_string();
        writer.write_record([workflow_id, name, version, minor, strings.as_str(), tasks.as_str()])?;
    }
    Ok(String::from_utf8(writer.into_inner().map_err(|error| error.into_error())?)?)
}

pub fn country(id: &'static str, subject: &'static str, country: &str) -> Classification {
    Classification::new(
        id,
        subject,
        json!([{
            "task": "T0",
            "select_label": "Country",
            "option": true,
            "label": country,
            "value": country.to_lowercase(),
        }]),
    )
}
