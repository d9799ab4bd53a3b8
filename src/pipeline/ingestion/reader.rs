use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use super::raw_table::RawTable;
use crate::error::{CleanerError, Result};
use crate::observability::metrics;
use crate::types::CellValue;

const NULL_MARKERS: &[&str] = &["nan", "NaN", "NA", "N/A", "None", "null", "NULL"];

/// CSV files directly under `dir`, sorted by name.
///
/// A missing directory is not an error: it is logged and yields nothing.
pub fn discover_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Raw data directory not found: {} ({})", dir.display(), e);
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .map(|ext| ext.eq_ignore_ascii_case("csv"))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    debug!("Discovered {} CSV files in {}", files.len(), dir.display());
    files
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Type a raw CSV field the way a dataframe reader would.
pub fn infer_cell(raw: &str) -> CellValue {
    if raw.is_empty() || NULL_MARKERS.contains(&raw) {
        return CellValue::Null;
    }
    // leading zeros are identifiers (postal codes, SIRET), not numbers
    let has_leading_zero = raw.len() > 1 && raw.starts_with('0') && !raw.starts_with("0.");
    if !has_leading_zero {
        if let Ok(i) = raw.parse::<i64>() {
            return CellValue::Int(i);
        }
        // integers past i64 would lose digits as floats
        if is_integer_literal(raw) {
            return CellValue::Text(raw.to_string());
        }
        if let Ok(f) = raw.parse::<f64>() {
            if f.is_finite() {
                return CellValue::Float(f);
            }
        }
    }
    if raw.eq_ignore_ascii_case("true") {
        return CellValue::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return CellValue::Bool(false);
    }
    CellValue::Text(raw.to_string())
}

fn is_integer_literal(raw: &str) -> bool {
    let digits = raw.strip_prefix(['-', '+']).unwrap_or(raw);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Read a whole CSV file. Rows the parser rejects are skipped with a warning.
pub fn read_csv(path: &Path) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)?;

    let headers: Vec<String> = reader
        .byte_headers()?
        .iter()
        .map(|h| String::from_utf8_lossy(h).trim().to_string())
        .collect();
    if headers.is_empty() {
        return Err(CleanerError::MissingInput(format!(
            "{} has no header row",
            path.display()
        )));
    }

    let mut table = RawTable::new(headers);
    for (line, record) in reader.byte_records().enumerate() {
        match record {
            Ok(record) => {
                let row = record
                    .iter()
                    .map(|field| infer_cell(&String::from_utf8_lossy(field)))
                    .collect();
                table.push_row(row);
            }
            Err(e) => warn!("Skipping malformed row {} in {}: {}", line + 1, path.display(), e),
        }
    }
    Ok(table)
}

/// One successfully read extract.
#[derive(Debug, Clone)]
pub struct TaggedTable {
    pub file_name: String,
    pub table: RawTable,
}

/// Read each file independently; unreadable files are logged and skipped.
pub fn read_tagged(source: &str, files: &[PathBuf]) -> Vec<TaggedTable> {
    let mut tables = Vec::new();
    for path in files {
        let name = file_name(path);
        match read_csv(path) {
            Ok(table) => {
                info!("{} {}: {} rows", source, name, table.len());
                metrics::ingestion::file_read(source, table.len());
                tables.push(TaggedTable {
                    file_name: name,
                    table,
                });
            }
            Err(e) => {
                error!("Failed to read {} file {}: {}", source, name, e);
                metrics::ingestion::file_error(source);
            }
        }
    }
    tables
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_infer_cell() {
        assert_eq!(infer_cell(""), CellValue::Null);
        assert_eq!(infer_cell("NaN"), CellValue::Null);
        assert_eq!(infer_cell("42"), CellValue::Int(42));
        assert_eq!(infer_cell("-1.5"), CellValue::Float(-1.5));
        assert_eq!(infer_cell("True"), CellValue::Bool(true));
        assert_eq!(infer_cell("01000"), CellValue::Text("01000".into()));
        assert_eq!(infer_cell("0.5"), CellValue::Float(0.5));
        assert_eq!(infer_cell("Paris"), CellValue::Text("Paris".into()));
        assert_eq!(infer_cell("inf"), CellValue::Text("inf".into()));
    }

    #[test]
    fn test_oversized_integers_stay_text() {
        assert_eq!(
            infer_cell("9223372036854775807"),
            CellValue::Int(i64::MAX)
        );
        assert_eq!(
            infer_cell("123456789012345678901234"),
            CellValue::Text("123456789012345678901234".into())
        );
        assert_eq!(
            infer_cell("-99999999999999999999"),
            CellValue::Text("-99999999999999999999".into())
        );
        assert_eq!(infer_cell("1e25"), CellValue::Float(1e25));
    }

    #[test]
    fn test_discover_sorts_and_filters() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.csv"), "a\n1\n").unwrap();
        fs::write(dir.path().join("a.CSV"), "a\n1\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let files = discover_files(dir.path());
        let names: Vec<String> = files.iter().map(|p| file_name(p)).collect();
        assert_eq!(names, vec!["a.CSV", "b.csv"]);
    }

    #[test]
    fn test_discover_missing_directory_is_empty() {
        let dir = tempdir().unwrap();
        assert!(discover_files(&dir.path().join("absent")).is_empty());
    }

    #[test]
    fn test_read_csv_handles_ragged_rows_and_quotes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("jobs.csv");
        fs::write(
            &path,
            "title,company,salary_min\n\"Dev, Senior\",Acme,50000\nOps,Globex\n",
        )
        .unwrap();

        let table = read_csv(&path).unwrap();
        assert_eq!(table.len(), 2);
        let rows: Vec<_> = table
            .records()
            .map(|r| (r.text("title"), r.int("salary_min")))
            .collect();
        assert_eq!(rows[0], (Some("Dev, Senior".into()), Some(50000)));
        assert_eq!(rows[1], (Some("Ops".into()), None));
    }

    #[test]
    fn test_read_tagged_skips_unreadable_files() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.csv");
        fs::write(&good, "a\n1\n").unwrap();
        let missing = dir.path().join("missing.csv");

        let tables = read_tagged("test", &[missing, good]);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].file_name, "good.csv");
    }
}
