use crate::field::FieldValue;
use crate::inflect::plural;

use super::count_of;

/// The string values of a group split into filled and blank entries.
pub(crate) struct Ballot<'a> {
    pub total: usize,
    pub filled: Vec<&'a str>,
}

impl<'a> Ballot<'a> {
    pub fn collect(group: &[&'a FieldValue]) -> Self {
        Self {
            total: group.len(),
            filled: group
                .iter()
                .copied()
                .filter_map(FieldValue::as_text)
                .filter(|text| !text.trim().is_empty())
                .collect(),
        }
    }

    pub fn blanks(&self) -> usize {
        self.total - self.filled.len()
    }

    /// `"All 3 records are blank."` / `"The 1 record is blank."`
    pub fn all_blank_note(&self) -> String {
        format!(
            "{} {} {} blank.",
            plural("The", self.total),
            count_of(self.total, "record"),
            plural("is", self.total)
        )
    }

    pub fn only_one_note(&self) -> String {
        format!("Only 1 transcript in {}.", count_of(self.total, "record"))
    }

    /// `"<prefix>, 2 of 3 records with 1 blank."`
    pub fn match_note(&self, prefix: &str, count: usize) -> String {
        format!(
            "{prefix}, {count} of {} with {}.",
            count_of(self.total, "record"),
            count_of(self.blanks(), "blank")
        )
    }

    /// `"No <kind> match on 3 records with 0 blanks."`
    pub fn no_match_note(&self, kind: &str) -> String {
        format!(
            "No {kind} match on {} with {}.",
            count_of(self.total, "record"),
            count_of(self.blanks(), "blank")
        )
    }
}

/// The most frequent key, its first position, its count and the runner-up count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Winner {
    pub first_index: usize,
    pub count: usize,
    pub runner_up: usize,
}

impl Winner {
    /// A plurality of more than one vote that nothing ties.
    pub fn is_clear(&self) -> bool {
        self.count > 1 && self.count > self.runner_up
    }
}

/// Tallies `keys`; ties go to the key seen first.
pub(crate) fn tally<K: PartialEq>(keys: &[K]) -> Option<Winner> {
    let mut counts: Vec<(usize, usize)> = Vec::new();
    for (index, key) in keys.iter().enumerate() {
        if let Some(slot) = counts.iter_mut().find(|(first, _)| keys[*first] == *key) {
            slot.1 += 1;
        } else {
            counts.push((index, 1));
        }
    }

    let mut best = 0;
    for (slot, (_, count)) in counts.iter().enumerate() {
        if *count > counts[best].1 {
            best = slot;
        }
    }
    let (first_index, count) = *counts.get(best)?;

    let runner_up = counts
        .iter()
        .enumerate()
        .filter(|(slot, _)| *slot != best)
        .map(|(_, (_, count))| *count)
        .max()
        .unwrap_or(0);

    Some(Winner {
        first_index,
        count,
        runner_up,
    })
}

#[cfg(test)]
mod tests {
    use super::{Ballot, Winner, tally};
    use crate::field::FieldValue;

    #[test]
    fn ties_go_to_the_first_seen_key() {
        let winner = tally(&["b", "a", "a", "b"]).expect("non-empty");
        assert_eq!(
            winner,
            Winner {
                first_index: 0,
                count: 2,
                runner_up: 2
            }
        );
        assert!(!winner.is_clear());
    }

    #[test]
    fn clear_plurality() {
        let winner = tally(&["x", "y", "y"]).expect("non-empty");
        assert_eq!(winner.first_index, 1);
        assert!(winner.is_clear());
        assert!(tally::<&str>(&[]).is_none());
    }

    #[test]
    fn blank_notes_are_pluralized() {
        let blank = FieldValue::Select(" ".to_string());
        assert_eq!(
            Ballot::collect(&[&blank]).all_blank_note(),
            "The 1 record is blank."
        );
        assert_eq!(
            Ballot::collect(&[&blank, &blank]).all_blank_note(),
            "All 2 records are blank."
        );
    }
}
