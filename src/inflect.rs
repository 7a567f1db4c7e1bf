const IRREGULAR: &[(&str, &str)] = &[
    ("The", "All"),
    ("is", "are"),
    ("was", "were"),
    ("has", "have"),
    ("this", "these"),
];

/// The form of the singular `word` that agrees with `count`.
#[must_use]
pub fn plural(word: &str, count: usize) -> String {
    if count == 1 {
        return word.to_string();
    }

    if let Some((_, plural)) = IRREGULAR.iter().find(|(singular, _)| *singular == word) {
        return (*plural).to_string();
    }

    if ["s", "x", "ch", "sh"]
        .iter()
        .any(|suffix| word.ends_with(suffix))
    {
        return format!("{word}es");
    }

    format!("{word}s")
}

#[cfg(test)]
mod tests {
    use super::plural;

    #[test]
    fn singular_only_for_exactly_one() {
        assert_eq!(plural("record", 1), "record");
        assert_eq!(plural("record", 0), "records");
        assert_eq!(plural("record", 2), "records");
    }

    #[test]
    fn irregular_and_sibilant_words() {
        assert_eq!(plural("was", 3), "were");
        assert_eq!(plural("The", 3), "All");
        assert_eq!(plural("The", 1), "The");
        assert_eq!(plural("box", 2), "boxes");
        assert_eq!(plural("match", 2), "matches");
    }
}
