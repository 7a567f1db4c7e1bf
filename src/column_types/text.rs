use crate::cell::Cell;
use crate::field::FieldValue;

use super::votes::{Ballot, tally};
use super::{ColumnReconciler, no_records};

/// Majority pick over free text: exact agreement first, then agreement after
/// folding case, whitespace and punctuation, otherwise the longest answer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextReconciler;

fn normalize(text: &str) -> String {
    text.chars()
        .filter(|ch| ch.is_alphanumeric() || ch.is_whitespace())
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

impl ColumnReconciler for TextReconciler {
    fn reconcile(&self, group: &[&FieldValue]) -> Cell {
        if group.is_empty() {
            return no_records();
        }

        let ballot = Ballot::collect(group);
        match ballot.filled.as_slice() {
            [] => return Cell::empty(ballot.all_blank_note()),
            [only] => return Cell::ok(ballot.only_one_note()).with_text(*only),
            _ => {}
        }

        if let Some(winner) = tally(&ballot.filled) {
            let value = ballot.filled[winner.first_index];
            if winner.count == ballot.filled.len() {
                return Cell::ok(ballot.match_note("Unanimous match", winner.count))
                    .with_text(value);
            }
            if winner.is_clear() {
                return Cell::ok(ballot.match_note("Exact match", winner.count)).with_text(value);
            }
        }

        let normalized = ballot
            .filled
            .iter()
            .map(|text| normalize(text))
            .collect::<Vec<_>>();
        if let Some(winner) = tally(&normalized) {
            let value = ballot.filled[winner.first_index];
            if winner.count == ballot.filled.len() {
                return Cell::ok(ballot.match_note("Normalized unanimous match", winner.count))
                    .with_text(value);
            }
            if winner.is_clear() {
                return Cell::ok(ballot.match_note("Normalized match", winner.count))
                    .with_text(value);
            }
        }

        let longest = ballot
            .filled
            .iter()
            .copied()
            .fold("", |longest, text| {
                if text.chars().count() > longest.chars().count() {
                    text
                } else {
                    longest
                }
            });
        Cell::ok(ballot.no_match_note("text")).with_text(longest)
    }
}
