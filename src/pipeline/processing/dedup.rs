use std::collections::HashSet;
use tracing::info;

use crate::observability::metrics;
use crate::types::{CellValue, TabularRecord};

/// Drop repeated records, keeping the first occurrence and the original order.
///
/// Columns that hold a list in any row are left out of the comparison key but kept
/// in the output, so two rows that differ only in a list column count as duplicates.
/// When every column is list-valued the whole row is compared.
pub fn remove_duplicates<R: TabularRecord>(records: Vec<R>, label: &str) -> Vec<R> {
    let initial = records.len();
    if initial == 0 {
        info!("{} - no rows to deduplicate", label);
        return records;
    }

    let cells: Vec<Vec<CellValue>> = records.iter().map(|r| r.cells()).collect();
    let key_columns = scalar_columns(&cells, R::COLUMNS.len());

    let mut seen = HashSet::with_capacity(initial);
    let kept: Vec<R> = records
        .into_iter()
        .zip(cells.iter())
        .filter(|(_, row)| seen.insert(row_key(row, &key_columns)))
        .map(|(record, _)| record)
        .collect();

    let removed = initial - kept.len();
    if removed > 0 {
        info!(
            "{} - duplicates removed: {} ({:.1}%)",
            label,
            removed,
            removed as f64 / initial as f64 * 100.0
        );
        metrics::cleaning::duplicates_removed(label, removed);
    } else {
        info!("{} - no duplicates detected", label);
    }
    kept
}

fn scalar_columns(rows: &[Vec<CellValue>], width: usize) -> Vec<usize> {
    let scalar: Vec<usize> = (0..width)
        .filter(|&i| !rows.iter().any(|row| row[i].is_list()))
        .collect();
    if scalar.is_empty() {
        (0..width).collect()
    } else {
        scalar
    }
}

fn row_key(row: &[CellValue], columns: &[usize]) -> String {
    let picked: Vec<&CellValue> = columns.iter().map(|&i| &row[i]).collect();
    serde_json::to_string(&picked).unwrap_or_else(|_| format!("{:?}", picked))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tabular_record;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        name: Option<String>,
        tags: Vec<String>,
    }

    tabular_record!(Row { name, tags });

    #[derive(Debug, Clone, PartialEq)]
    struct ListOnly {
        tags: Vec<String>,
    }

    tabular_record!(ListOnly { tags });

    fn row(name: &str, tags: &[&str]) -> Row {
        Row {
            name: Some(name.to_string()),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_keeps_first_occurrence_in_order() {
        let rows = vec![row("b", &[]), row("a", &[]), row("b", &[]), row("c", &[])];
        let kept = remove_duplicates(rows, "test");
        let names: Vec<_> = kept.iter().map(|r| r.name.clone().unwrap()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_rows_differing_only_in_list_column_are_duplicates() {
        let rows = vec![row("a", &["Python"]), row("a", &["Rust"])];
        let kept = remove_duplicates(rows, "test");
        assert_eq!(kept, vec![row("a", &["Python"])]);
    }

    #[test]
    fn test_list_only_records_compare_whole_row() {
        let rows = vec![
            ListOnly { tags: vec!["a".into()] },
            ListOnly { tags: vec!["b".into()] },
            ListOnly { tags: vec!["a".into()] },
        ];
        assert_eq!(remove_duplicates(rows, "test").len(), 2);
    }

    #[test]
    fn test_null_and_text_null_are_distinct() {
        let rows = vec![
            Row { name: None, tags: vec![] },
            Row { name: Some("null".into()), tags: vec![] },
        ];
        assert_eq!(remove_duplicates(rows, "test").len(), 2);
    }

    #[test]
    fn test_output_is_subset_of_input() {
        let rows = vec![row("x", &["1"]), row("y", &[]), row("x", &["2"])];
        let input = rows.clone();
        let kept = remove_duplicates(rows, "test");
        assert!(kept.iter().all(|r| input.contains(r)));
        // no two kept rows share the scalar key
        assert_ne!(kept[0].name, kept[1].name);
    }
}
