use parquet::basic::{Compression, ConvertedType, Repetition, Type as PhysicalType};
use parquet::data_type::{BoolType, ByteArray, ByteArrayType, DoubleType, Int64Type};
use parquet::file::properties::WriterProperties;
use parquet::file::writer::SerializedFileWriter;
use parquet::schema::types::{Type, TypePtr};
use serde::Deserialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use super::ArtifactStore;
use crate::error::Result;
use crate::types::{CellValue, Table};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputCompression {
    #[default]
    Snappy,
    Uncompressed,
}

impl OutputCompression {
    fn codec(self) -> Compression {
        match self {
            OutputCompression::Snappy => Compression::SNAPPY,
            OutputCompression::Uncompressed => Compression::UNCOMPRESSED,
        }
    }
}

/// Physical layout chosen for one column from the cells it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Boolean,
    Int64,
    Double,
    Timestamp,
    Utf8,
}

/// Uniform columns keep their native type, ints mixed with floats widen to
/// double, and everything else (lists, mixes, all-null) is stored as UTF8.
pub fn infer_column_kind<'a>(cells: impl Iterator<Item = &'a CellValue>) -> ColumnKind {
    let mut kind: Option<ColumnKind> = None;
    for cell in cells {
        let cell_kind = match cell {
            CellValue::Null => continue,
            CellValue::Bool(_) => ColumnKind::Boolean,
            CellValue::Int(_) => ColumnKind::Int64,
            CellValue::Float(_) => ColumnKind::Double,
            CellValue::Timestamp(_) => ColumnKind::Timestamp,
            CellValue::Text(_) | CellValue::List(_) => return ColumnKind::Utf8,
        };
        kind = Some(match (kind, cell_kind) {
            (None, k) => k,
            (Some(a), b) if a == b => a,
            (Some(ColumnKind::Int64), ColumnKind::Double)
            | (Some(ColumnKind::Double), ColumnKind::Int64) => ColumnKind::Double,
            _ => return ColumnKind::Utf8,
        });
    }
    kind.unwrap_or(ColumnKind::Utf8)
}

fn utf8_value(cell: &CellValue) -> Option<String> {
    match cell {
        CellValue::List(items) => Some(serde_json::to_string(items).unwrap_or_else(|_| "[]".into())),
        other => other.as_text(),
    }
}

fn build_field(name: &str, kind: ColumnKind) -> Result<TypePtr> {
    let builder = match kind {
        ColumnKind::Boolean => Type::primitive_type_builder(name, PhysicalType::BOOLEAN),
        ColumnKind::Int64 => Type::primitive_type_builder(name, PhysicalType::INT64),
        ColumnKind::Double => Type::primitive_type_builder(name, PhysicalType::DOUBLE),
        ColumnKind::Timestamp => Type::primitive_type_builder(name, PhysicalType::INT64)
            .with_converted_type(ConvertedType::TIMESTAMP_MICROS),
        ColumnKind::Utf8 => Type::primitive_type_builder(name, PhysicalType::BYTE_ARRAY)
            .with_converted_type(ConvertedType::UTF8),
    };
    Ok(Arc::new(builder.with_repetition(Repetition::OPTIONAL).build()?))
}

/// Collect the non-null values of a column together with their definition levels.
fn levels<T>(cells: &[&CellValue], value: impl Fn(&CellValue) -> Option<T>) -> (Vec<T>, Vec<i16>) {
    let mut values = Vec::with_capacity(cells.len());
    let mut defs = Vec::with_capacity(cells.len());
    for &cell in cells {
        match value(cell) {
            Some(v) => {
                values.push(v);
                defs.push(1);
            }
            None => defs.push(0),
        }
    }
    (values, defs)
}

/// Write `table` as a single-row-group Parquet file at `path`.
pub fn write_table_parquet(table: &Table, path: &Path, compression: OutputCompression) -> Result<()> {
    let columns: Vec<Vec<&CellValue>> = (0..table.columns.len())
        .map(|i| table.rows.iter().map(|row| &row[i]).collect())
        .collect();
    let kinds: Vec<ColumnKind> = columns
        .iter()
        .map(|cells| infer_column_kind(cells.iter().copied()))
        .collect();

    let fields = table
        .columns
        .iter()
        .zip(&kinds)
        .map(|(name, kind)| build_field(name, *kind))
        .collect::<Result<Vec<_>>>()?;
    let schema = Type::group_type_builder("schema").with_fields(fields).build()?;

    let props = WriterProperties::builder()
        .set_compression(compression.codec())
        .build();
    let file = File::create(path)?;
    let mut writer = SerializedFileWriter::new(file, Arc::new(schema), Arc::new(props))?;

    if !table.is_empty() {
        let mut rg = writer.next_row_group()?;
        let mut col_index = 0;
        while let Some(mut col_writer) = rg.next_column()? {
            let cells = &columns[col_index];
            match kinds[col_index] {
                ColumnKind::Boolean => {
                    let (values, defs) = levels(cells, |c| match c {
                        CellValue::Bool(b) => Some(*b),
                        _ => None,
                    });
                    col_writer.typed::<BoolType>().write_batch(&values, Some(&defs[..]), None)?;
                }
                ColumnKind::Int64 => {
                    let (values, defs) = levels(cells, CellValue::as_i64);
                    col_writer.typed::<Int64Type>().write_batch(&values, Some(&defs[..]), None)?;
                }
                ColumnKind::Double => {
                    let (values, defs) = levels(cells, |c| match c {
                        CellValue::Int(i) => Some(*i as f64),
                        CellValue::Float(f) => Some(*f),
                        _ => None,
                    });
                    col_writer.typed::<DoubleType>().write_batch(&values, Some(&defs[..]), None)?;
                }
                ColumnKind::Timestamp => {
                    let (values, defs) = levels(cells, |c| match c {
                        CellValue::Timestamp(ts) => Some(ts.timestamp_micros()),
                        _ => None,
                    });
                    col_writer.typed::<Int64Type>().write_batch(&values, Some(&defs[..]), None)?;
                }
                ColumnKind::Utf8 => {
                    let (values, defs) = levels(cells, |c| utf8_value(c).map(|s| ByteArray::from(s.into_bytes())));
                    col_writer.typed::<ByteArrayType>().write_batch(&values, Some(&defs[..]), None)?;
                }
            }
            col_writer.close()?;
            col_index += 1;
        }
        rg.close()?;
    }
    writer.close()?;
    Ok(())
}

/// One `<artifact>.parquet` file per table under `out_dir`.
pub struct ParquetArtifactStore {
    out_dir: PathBuf,
    compression: OutputCompression,
}

impl ParquetArtifactStore {
    pub fn new(out_dir: impl Into<PathBuf>, compression: OutputCompression) -> Self {
        Self {
            out_dir: out_dir.into(),
            compression,
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn path_for(&self, artifact: &str) -> PathBuf {
        self.out_dir.join(format!("{}.parquet", artifact))
    }
}

impl ArtifactStore for ParquetArtifactStore {
    fn write_table(&self, table: &Table) -> Result<String> {
        fs::create_dir_all(&self.out_dir)?;
        let path = self.path_for(&table.name);
        write_table_parquet(table, &path, self.compression)?;
        debug!("Wrote {} rows to {}", table.len(), path.display());
        Ok(path.display().to_string())
    }

    fn name(&self) -> &str {
        "parquet"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use parquet::file::reader::{FileReader, SerializedFileReader};
    use parquet::record::RowAccessor;
    use tempfile::tempdir;

    fn sample_table() -> Table {
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let mut table = Table::new(
            "adzuna_jobs_clean",
            ["title", "skills_normalized", "salary_eur_avg", "is_verified_company", "processed_at", "empty"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        );
        table.rows.push(vec![
            CellValue::Text("Data Engineer".into()),
            CellValue::List(vec!["Python".into(), "SQL".into()]),
            CellValue::Int(50000),
            CellValue::Bool(true),
            CellValue::Timestamp(ts),
            CellValue::Null,
        ]);
        table.rows.push(vec![
            CellValue::Null,
            CellValue::List(vec![]),
            CellValue::Float(41250.5),
            CellValue::Null,
            CellValue::Timestamp(ts),
            CellValue::Null,
        ]);
        table
    }

    #[test]
    fn test_column_kind_inference() {
        use CellValue::*;
        assert_eq!(infer_column_kind([Int(1), Null, Int(2)].iter()), ColumnKind::Int64);
        assert_eq!(infer_column_kind([Int(1), Float(2.5)].iter()), ColumnKind::Double);
        assert_eq!(infer_column_kind([Bool(true), Null].iter()), ColumnKind::Boolean);
        assert_eq!(infer_column_kind([Bool(true), Int(1)].iter()), ColumnKind::Utf8);
        assert_eq!(infer_column_kind([Null, Null].iter()), ColumnKind::Utf8);
        assert_eq!(infer_column_kind([List(vec![])].iter()), ColumnKind::Utf8);
        assert_eq!(infer_column_kind([Int(1), Text("x".into())].iter()), ColumnKind::Utf8);
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempdir().unwrap();
        let store = ParquetArtifactStore::new(dir.path().join("clean"), OutputCompression::Snappy);
        let table = sample_table();

        let location = store.write_table(&table).unwrap();
        assert!(location.ends_with("adzuna_jobs_clean.parquet"));

        let reader = SerializedFileReader::new(File::open(&location).unwrap()).unwrap();
        let meta = reader.metadata().file_metadata();
        assert_eq!(meta.num_rows(), 2);

        let schema = meta.schema_descr();
        let physical: Vec<PhysicalType> = (0..schema.num_columns())
            .map(|i| schema.column(i).physical_type())
            .collect();
        assert_eq!(
            physical,
            vec![
                PhysicalType::BYTE_ARRAY,
                PhysicalType::BYTE_ARRAY,
                PhysicalType::DOUBLE,
                PhysicalType::BOOLEAN,
                PhysicalType::INT64,
                PhysicalType::BYTE_ARRAY,
            ]
        );

        let rows: Vec<_> = reader
            .get_row_iter(None)
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(rows[0].get_string(0).unwrap(), "Data Engineer");
        assert_eq!(rows[0].get_string(1).unwrap(), "[\"Python\",\"SQL\"]");
        assert_eq!(rows[1].get_double(2).unwrap(), 41250.5);
    }

    #[test]
    fn test_rewrite_overwrites() {
        let dir = tempdir().unwrap();
        let store = ParquetArtifactStore::new(dir.path(), OutputCompression::Uncompressed);
        let mut table = sample_table();
        store.write_table(&table).unwrap();
        table.rows.truncate(1);
        let location = store.write_table(&table).unwrap();

        let reader = SerializedFileReader::new(File::open(location).unwrap()).unwrap();
        assert_eq!(reader.metadata().file_metadata().num_rows(), 1);
    }

    #[test]
    fn test_empty_table_writes_schema_only() {
        let dir = tempdir().unwrap();
        let store = ParquetArtifactStore::new(dir.path(), OutputCompression::Snappy);
        let table = Table::new("kaggle_raw_clean", vec!["id".to_string()]);
        let location = store.write_table(&table).unwrap();

        let reader = SerializedFileReader::new(File::open(location).unwrap()).unwrap();
        assert_eq!(reader.metadata().file_metadata().num_rows(), 0);
        assert_eq!(reader.num_row_groups(), 0);
    }
}
