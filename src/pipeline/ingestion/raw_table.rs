use std::collections::{BTreeMap, HashMap};

use crate::types::{CellValue, Extras};

static NULL_CELL: CellValue = CellValue::Null;

/// Untyped rows read from one or more extracts of the same source.
///
/// Every row has exactly one cell per column; short rows are padded with nulls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>) -> Self {
        let index = build_index(&columns);
        Self {
            columns,
            index,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Null);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    /// Rename `from` to `to` unless `to` already exists. Returns whether a rename happened.
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        if self.has_column(to) {
            return false;
        }
        match self.index.get(from).copied() {
            Some(i) => {
                self.columns[i] = to.to_string();
                self.index = build_index(&self.columns);
                true
            }
            None => false,
        }
    }

    /// Copy `from` into a new column `to` when `to` is absent.
    pub fn copy_column_if_missing(&mut self, from: &str, to: &str) -> bool {
        if self.has_column(to) {
            return false;
        }
        let Some(i) = self.index.get(from).copied() else {
            return false;
        };
        self.columns.push(to.to_string());
        self.index.insert(to.to_string(), self.columns.len() - 1);
        for row in &mut self.rows {
            let value = row[i].clone();
            row.push(value);
        }
        true
    }

    /// Set `column` to `value` on every row, adding the column if needed.
    pub fn set_constant(&mut self, column: &str, value: CellValue) {
        match self.index.get(column).copied() {
            Some(i) => {
                for row in &mut self.rows {
                    row[i] = value.clone();
                }
            }
            None => {
                self.columns.push(column.to_string());
                self.index.insert(column.to_string(), self.columns.len() - 1);
                for row in &mut self.rows {
                    row.push(value.clone());
                }
            }
        }
    }

    pub fn records(&self) -> impl Iterator<Item = RawRecord<'_>> {
        self.rows.iter().map(move |cells| RawRecord {
            index: &self.index,
            columns: &self.columns,
            cells,
        })
    }

    /// Stack tables in order. Columns are the union in first-seen order.
    pub fn concat(tables: Vec<RawTable>) -> RawTable {
        let mut columns: Vec<String> = Vec::new();
        for table in &tables {
            for column in &table.columns {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }

        let mut merged = RawTable::new(columns);
        for table in tables {
            let mapping: Vec<Option<usize>> = merged
                .columns
                .iter()
                .map(|c| table.index.get(c).copied())
                .collect();
            for row in table.rows {
                let cells = mapping
                    .iter()
                    .map(|m| m.map(|i| row[i].clone()).unwrap_or(CellValue::Null))
                    .collect();
                merged.rows.push(cells);
            }
        }
        merged
    }
}

fn build_index(columns: &[String]) -> HashMap<String, usize> {
    let mut index = HashMap::new();
    for (i, c) in columns.iter().enumerate() {
        // duplicate headers resolve to the first occurrence
        index.entry(c.clone()).or_insert(i);
    }
    index
}

/// Borrowed view of one row with by-name accessors.
#[derive(Debug, Clone, Copy)]
pub struct RawRecord<'a> {
    index: &'a HashMap<String, usize>,
    columns: &'a [String],
    cells: &'a [CellValue],
}

impl<'a> RawRecord<'a> {
    /// Cell for `column`; absent columns read as null.
    pub fn get(&self, column: &str) -> &'a CellValue {
        self.index
            .get(column)
            .and_then(|i| self.cells.get(*i))
            .unwrap_or(&NULL_CELL)
    }

    pub fn text(&self, column: &str) -> Option<String> {
        self.get(column).as_text()
    }

    pub fn float(&self, column: &str) -> Option<f64> {
        self.get(column).as_f64()
    }

    pub fn int(&self, column: &str) -> Option<i64> {
        self.get(column).as_i64()
    }

    /// Non-null cells of every column not listed in `known`.
    pub fn extras(&self, known: &[&str]) -> Extras {
        let map: BTreeMap<String, CellValue> = self
            .columns
            .iter()
            .zip(self.cells.iter())
            .filter(|(column, cell)| !cell.is_null() && !known.contains(&column.as_str()))
            .map(|(column, cell)| (column.clone(), cell.clone()))
            .collect();
        Extras(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: Vec<Vec<CellValue>>) -> RawTable {
        let mut t = RawTable::new(columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            t.push_row(row);
        }
        t
    }

    #[test]
    fn test_short_rows_are_padded() {
        let t = table(&["a", "b"], vec![vec![CellValue::Int(1)]]);
        let rec = t.records().next().unwrap();
        assert_eq!(rec.get("b"), &CellValue::Null);
        assert_eq!(rec.get("missing"), &CellValue::Null);
    }

    #[test]
    fn test_rename_does_not_clobber_existing_column() {
        let mut t = table(&["job_title", "title"], vec![]);
        assert!(!t.rename_column("job_title", "title"));

        let mut t = table(&["job_title"], vec![vec![CellValue::Text("Dev".into())]]);
        assert!(t.rename_column("job_title", "title"));
        assert_eq!(t.records().next().unwrap().text("title"), Some("Dev".into()));
    }

    #[test]
    fn test_copy_column_if_missing() {
        let mut t = table(&["country_code"], vec![vec![CellValue::Text("FR".into())]]);
        assert!(t.copy_column_if_missing("country_code", "country"));
        let rec = t.records().next().unwrap();
        assert_eq!(rec.text("country"), Some("FR".into()));
        assert_eq!(rec.text("country_code"), Some("FR".into()));
    }

    #[test]
    fn test_concat_unions_columns() {
        let a = table(&["x"], vec![vec![CellValue::Int(1)]]);
        let b = table(&["y", "x"], vec![vec![CellValue::Int(2), CellValue::Int(3)]]);
        let merged = RawTable::concat(vec![a, b]);
        assert_eq!(merged.columns(), &["x".to_string(), "y".to_string()]);
        let rows: Vec<_> = merged.records().map(|r| (r.int("x"), r.int("y"))).collect();
        assert_eq!(rows, vec![(Some(1), None), (Some(3), Some(2))]);
    }

    #[test]
    fn test_extras_skip_known_and_null() {
        let t = table(
            &["title", "dataset_origin", "empty"],
            vec![vec![
                CellValue::Text("Dev".into()),
                CellValue::Text("kaggle".into()),
                CellValue::Null,
            ]],
        );
        let extras = t.records().next().unwrap().extras(&["title"]);
        assert_eq!(extras.0.len(), 1);
        assert_eq!(extras.get("dataset_origin"), Some(&CellValue::Text("kaggle".into())));
    }
}
