//! Line lengths, plus conversion of pixel lengths into real units when a
//! scale bar annotation names its length (e.g. `Scale bar 2 mm`).

use std::sync::LazyLock;

use regex::Regex;

use crate::cell::{Cell, ReconciledRow, Value};
use crate::field::{FieldValue, LineGeometry};
use crate::inflect::plural;

use super::{ColumnReconciler, count_of, mean, no_records};

const LENGTH_PIXELS: &str = "length pixels";

static SCALE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ix) (?P<scale> [0-9.]+ ) \s* (?P<units> mm|cm|dm|m ) \b")
        .expect("hardcoded scale regex is valid")
});

#[derive(Debug, Clone, Copy, Default)]
pub struct LengthReconciler;

impl ColumnReconciler for LengthReconciler {
    fn reconcile(&self, group: &[&FieldValue]) -> Cell {
        if group.is_empty() {
            return no_records();
        }

        let lines = group
            .iter()
            .filter_map(|value| match value {
                FieldValue::Length(line) if !line.is_empty() => Some(*line),
                _ => None,
            })
            .collect::<Vec<LineGeometry>>();

        let total = group.len();
        let count = lines.len();
        if count == 0 {
            return Cell::empty(format!(
                "There are no lines in {}.",
                count_of(total, "record")
            ));
        }

        let note = format!(
            "There {} {} in {}.",
            plural("was", count),
            count_of(count, "line"),
            count_of(total, "record")
        );

        let x1 = mean(lines.iter().map(|line| line.x1));
        let y1 = mean(lines.iter().map(|line| line.y1));
        let x2 = mean(lines.iter().map(|line| line.x2));
        let y2 = mean(lines.iter().map(|line| line.y2));

        Cell::ok(note).with_value("length_pixels", Value::Number((x1 - x2).hypot(y1 - y2)))
    }

    /// Adds a unit twin of every pixel length once a scale column is found.
    fn reconcile_row(&self, row: &mut ReconciledRow) {
        let Some((units, pixels_per_unit)) = scale(row) else {
            return;
        };

        let converted = row
            .iter()
            .filter(|(name, _)| name.contains(LENGTH_PIXELS))
            .filter_map(|(name, value)| {
                value
                    .as_number()
                    .map(|pixels| (name.replace("pixels", &units), pixels / pixels_per_unit))
            })
            .collect::<Vec<_>>();

        for (name, length) in converted {
            row.insert(name, Value::Number(length));
        }
    }
}

/// Units and pixels-per-unit from the first pixel-length column naming a scale.
fn scale(row: &ReconciledRow) -> Option<(String, f64)> {
    row.iter().find_map(|(name, value)| {
        if !name.contains(LENGTH_PIXELS) {
            return None;
        }
        let captures = SCALE_RE.captures(name)?;
        let scale = captures["scale"].parse::<f64>().ok()?;
        let pixels = value.as_number()?;
        if scale == 0.0 || pixels == 0.0 {
            return None;
        }
        Some((captures["units"].to_string(), pixels / scale))
    })
}
