// Per-source cleaners: one per family of raw extracts

pub mod github;
pub mod jobs;
pub mod registry;
pub mod surveys;
pub mod trends;

pub use github::GithubCleaner;
pub use jobs::JobsCleaner;
pub use registry::CleanerRegistry;
pub use surveys::SurveysCleaner;
pub use trends::TrendsCleaner;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::domain::CleanedDataset;
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::ingestion::{read_tagged, RawTable};
use crate::pipeline::processing::dictionaries::Dictionaries;
use crate::types::CellValue;

/// Base trait for source-specific cleaners
pub trait SourceCleaner: Send + Sync {
    /// Read, harmonize, normalize and deduplicate every extract of this source.
    ///
    /// Missing raw data is not an error; it yields no datasets.
    fn clean(&self) -> Result<Vec<CleanedDataset>>;

    /// Source name used for selection on the command line
    fn source_id(&self) -> &str;

    /// Human-readable name for logs
    fn name(&self) -> &str;
}

/// Everything a cleaner needs from the outside world.
#[derive(Debug, Clone)]
pub struct CleanerContext {
    pub raw_root: PathBuf,
    pub dictionaries: Arc<Dictionaries>,
}

impl CleanerContext {
    pub fn new(raw_root: impl Into<PathBuf>, dictionaries: Arc<Dictionaries>) -> Self {
        Self {
            raw_root: raw_root.into(),
            dictionaries,
        }
    }

    pub fn source_dir(&self, dir: &str) -> PathBuf {
        self.raw_root.join(dir)
    }
}

/// A wrapper that records row counts for any cleaner
pub struct MetricsCleaner<C: SourceCleaner> {
    inner: C,
}

impl<C: SourceCleaner> MetricsCleaner<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

impl<C: SourceCleaner> SourceCleaner for MetricsCleaner<C> {
    fn clean(&self) -> Result<Vec<CleanedDataset>> {
        match self.inner.clean() {
            Ok(datasets) => {
                for dataset in &datasets {
                    metrics::cleaning::rows_cleaned(&dataset.name, dataset.len());
                }
                Ok(datasets)
            }
            Err(e) => {
                metrics::cleaning::source_failed(self.inner.source_id());
                Err(e)
            }
        }
    }

    fn source_id(&self) -> &str {
        self.inner.source_id()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Read `files` and stack them, optionally tagging each row with its `source_file`.
///
/// Returns `None` when nothing could be read.
pub(crate) fn load_extracts(label: &str, files: &[PathBuf], tag_source_file: bool) -> Option<RawTable> {
    if files.is_empty() {
        return None;
    }
    let tagged = read_tagged(label, files);
    if tagged.is_empty() {
        return None;
    }
    let tables: Vec<RawTable> = tagged
        .into_iter()
        .map(|mut t| {
            if tag_source_file {
                t.table
                    .set_constant("source_file", CellValue::Text(t.file_name.clone()));
            }
            t.table
        })
        .collect();
    let merged = RawTable::concat(tables);
    info!("Total {}: {} rows", label, merged.len());
    Some(merged)
}

pub(crate) fn name_of(path: &Path) -> String {
    crate::pipeline::ingestion::reader::file_name(path)
}
