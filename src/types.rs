use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// A single typed cell, either read from a raw extract or produced by a cleaner.
///
/// `List` is the only non-scalar variant; deduplication and persistence treat it specially.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    List(Vec<String>),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, CellValue::List(_))
    }

    /// String form of a scalar cell. Null and lists have none.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Null | CellValue::List(_) => None,
            CellValue::Bool(b) => Some(if *b { "True".to_string() } else { "False".to_string() }),
            CellValue::Int(i) => Some(i.to_string()),
            CellValue::Float(f) => Some(f.to_string()),
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Timestamp(ts) => Some(ts.to_rfc3339()),
        }
    }

    /// Numeric view of a cell; text is parsed, NaN is treated as missing.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            CellValue::Int(i) => *i as f64,
            CellValue::Float(f) => *f,
            CellValue::Text(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        if value.is_nan() {
            None
        } else {
            Some(value)
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Int(i) => Some(*i),
            CellValue::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            CellValue::Text(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }
}

impl From<Option<String>> for CellValue {
    fn from(value: Option<String>) -> Self {
        value.map(CellValue::Text).unwrap_or(CellValue::Null)
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<Option<f64>> for CellValue {
    fn from(value: Option<f64>) -> Self {
        value.map(CellValue::Float).unwrap_or(CellValue::Null)
    }
}

impl From<Option<i64>> for CellValue {
    fn from(value: Option<i64>) -> Self {
        value.map(CellValue::Int).unwrap_or(CellValue::Null)
    }
}

impl From<Option<bool>> for CellValue {
    fn from(value: Option<bool>) -> Self {
        value.map(CellValue::Bool).unwrap_or(CellValue::Null)
    }
}

impl From<Vec<String>> for CellValue {
    fn from(value: Vec<String>) -> Self {
        CellValue::List(value)
    }
}

impl From<DateTime<Utc>> for CellValue {
    fn from(value: DateTime<Utc>) -> Self {
        CellValue::Timestamp(value)
    }
}

/// Columns a cleaner did not recognise, carried through as one JSON object column.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Extras(pub BTreeMap<String, CellValue>);

impl Extras {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.0.get(key)
    }
}

impl From<Extras> for CellValue {
    fn from(value: Extras) -> Self {
        if value.is_empty() {
            return CellValue::Null;
        }
        serde_json::to_string(&value.0)
            .map(CellValue::Text)
            .unwrap_or(CellValue::Null)
    }
}

/// A record type with a fixed, ordered column set.
pub trait TabularRecord {
    const COLUMNS: &'static [&'static str];

    /// Cells in `COLUMNS` order.
    fn cells(&self) -> Vec<CellValue>;
}

/// Implements [`TabularRecord`] for a struct by listing its persisted fields in column order.
#[macro_export]
macro_rules! tabular_record {
    ($ty:ty { $($field:ident),+ $(,)? }) => {
        impl $crate::types::TabularRecord for $ty {
            const COLUMNS: &'static [&'static str] = &[$(stringify!($field)),+];

            fn cells(&self) -> Vec<$crate::types::CellValue> {
                vec![$($crate::types::CellValue::from(self.$field.clone())),+]
            }
        }
    };
}

/// The persistence shape of a cleaned dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn from_records<R: TabularRecord>(name: impl Into<String>, records: &[R]) -> Self {
        Self {
            name: name.into(),
            columns: R::COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: records.iter().map(|r| r.cells()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn column(&self, column: &str) -> Option<Vec<&CellValue>> {
        let idx = self.column_index(column)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Keep only the requested columns, in the requested order. Unknown names are skipped.
    pub fn project(&self, columns: &[&str]) -> Table {
        let picked: Vec<(String, usize)> = columns
            .iter()
            .filter_map(|c| self.column_index(c).map(|i| (c.to_string(), i)))
            .collect();
        Table {
            name: self.name.clone(),
            columns: picked.iter().map(|(c, _)| c.clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| picked.iter().map(|(_, i)| row[*i].clone()).collect())
                .collect(),
        }
    }

    /// Stack tables vertically. Columns are the union in first-seen order; gaps are null.
    pub fn concat(name: impl Into<String>, tables: &[Table]) -> Table {
        let mut columns: Vec<String> = Vec::new();
        for table in tables {
            for column in &table.columns {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }

        let mut rows = Vec::new();
        for table in tables {
            let mapping: Vec<Option<usize>> =
                columns.iter().map(|c| table.column_index(c)).collect();
            for row in &table.rows {
                rows.push(
                    mapping
                        .iter()
                        .map(|m| m.map(|i| row[i].clone()).unwrap_or(CellValue::Null))
                        .collect(),
                );
            }
        }

        Table {
            name: name.into(),
            columns,
            rows,
        }
    }
}
