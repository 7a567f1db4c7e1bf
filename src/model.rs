/// A rectangular table of strings ready to be written as CSV.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub subject_count: usize,
    pub row_count: usize,
}

impl OutputTable {
    /// Lays out `records` under `headers`; missing cells are blank.
    #[must_use]
    pub fn from_records(
        headers: Vec<String>,
        records: &[Vec<(String, String)>],
        subject_count: usize,
    ) -> Self {
        let rows = records
            .iter()
            .map(|record| {
                headers
                    .iter()
                    .map(|header| {
                        record
                            .iter()
                            .find(|(name, _)| name == header)
                            .map(|(_, value)| value.clone())
                            .unwrap_or_default()
                    })
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();

        Self {
            headers,
            row_count: rows.len(),
            subject_count,
            rows,
        }
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }
}

#[cfg(test)]
mod tests {
    use super::OutputTable;

    #[test]
    fn pads_missing_cells() {
        let table = OutputTable::from_records(
            vec!["a".to_string(), "b".to_string()],
            &[vec![("b".to_string(), "2".to_string())]],
            1,
        );
        assert_eq!(table.rows, vec![vec![String::new(), "2".to_string()]]);
        assert_eq!(table.row_count, 1);
        assert_eq!(table.column("b"), Some(1));
    }
}
