//! Metrics for the cleaning pipeline.
//!
//! Recording functions are grouped by pipeline phase. Nothing is exported over the
//! network; the CLI installs a Prometheus recorder and writes a text snapshot at
//! the end of a run. Without an installed recorder every call is a no-op.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::fmt;
use std::sync::OnceLock;
use tracing::info;

/// All metric names used by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Ingestion
    IngestionFilesRead,
    IngestionFileErrors,
    IngestionRowsRead,

    // Cleaning
    CleaningRowsCleaned,
    CleaningDuplicatesRemoved,
    CleaningSourceFailures,

    // Validation
    ValidationOutcomes,
    ValidationChunksProcessed,
    ValidationCacheSize,
    ValidationRegistryLoadErrors,

    // Storage
    StorageArtifactsWritten,
    StorageArtifactErrors,
    StorageRowsWritten,

    // Run
    RunDuration,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::IngestionFilesRead => "jobtech_ingestion_files_read_total",
            MetricName::IngestionFileErrors => "jobtech_ingestion_file_errors_total",
            MetricName::IngestionRowsRead => "jobtech_ingestion_rows_read_total",
            MetricName::CleaningRowsCleaned => "jobtech_cleaning_rows_cleaned_total",
            MetricName::CleaningDuplicatesRemoved => "jobtech_cleaning_duplicates_removed_total",
            MetricName::CleaningSourceFailures => "jobtech_cleaning_source_failures_total",
            MetricName::ValidationOutcomes => "jobtech_validation_outcomes_total",
            MetricName::ValidationChunksProcessed => "jobtech_validation_chunks_processed_total",
            MetricName::ValidationCacheSize => "jobtech_validation_cache_size",
            MetricName::ValidationRegistryLoadErrors => {
                "jobtech_validation_registry_load_errors_total"
            }
            MetricName::StorageArtifactsWritten => "jobtech_storage_artifacts_written_total",
            MetricName::StorageArtifactErrors => "jobtech_storage_artifact_errors_total",
            MetricName::StorageRowsWritten => "jobtech_storage_rows_written_total",
            MetricName::RunDuration => "jobtech_run_duration_seconds",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Calling it twice is an error from the exporter.
pub fn init() -> Result<(), String> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))?;
    let _ = METRICS_HANDLE.set(handle);
    info!("Metrics recorder installed");
    Ok(())
}

/// Prometheus text exposition of everything recorded so far.
pub fn render() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}

pub mod ingestion {
    use super::MetricName;

    pub fn file_read(source: &str, rows: usize) {
        ::metrics::counter!(MetricName::IngestionFilesRead.as_str(), "source" => source.to_string())
            .increment(1);
        ::metrics::counter!(MetricName::IngestionRowsRead.as_str(), "source" => source.to_string())
            .increment(rows as u64);
    }

    pub fn file_error(source: &str) {
        ::metrics::counter!(MetricName::IngestionFileErrors.as_str(), "source" => source.to_string())
            .increment(1);
    }
}

pub mod cleaning {
    use super::MetricName;

    pub fn rows_cleaned(dataset: &str, rows: usize) {
        ::metrics::counter!(MetricName::CleaningRowsCleaned.as_str(), "dataset" => dataset.to_string())
            .increment(rows as u64);
    }

    pub fn duplicates_removed(dataset: &str, removed: usize) {
        ::metrics::counter!(
            MetricName::CleaningDuplicatesRemoved.as_str(),
            "dataset" => dataset.to_string()
        )
        .increment(removed as u64);
    }

    pub fn source_failed(source: &str) {
        ::metrics::counter!(MetricName::CleaningSourceFailures.as_str(), "source" => source.to_string())
            .increment(1);
    }
}

pub mod validation {
    use super::MetricName;
    use crate::domain::MatchMethod;

    pub fn outcome(method: MatchMethod) {
        ::metrics::counter!(MetricName::ValidationOutcomes.as_str(), "method" => method.as_str())
            .increment(1);
    }

    pub fn chunk_processed() {
        ::metrics::counter!(MetricName::ValidationChunksProcessed.as_str()).increment(1);
    }

    pub fn cache_size(entries: usize) {
        ::metrics::gauge!(MetricName::ValidationCacheSize.as_str()).set(entries as f64);
    }

    pub fn registry_load_error() {
        ::metrics::counter!(MetricName::ValidationRegistryLoadErrors.as_str()).increment(1);
    }
}

pub mod storage {
    use super::MetricName;

    pub fn artifact_written(artifact: &str, rows: usize) {
        ::metrics::counter!(
            MetricName::StorageArtifactsWritten.as_str(),
            "artifact" => artifact.to_string()
        )
        .increment(1);
        ::metrics::counter!(MetricName::StorageRowsWritten.as_str(), "artifact" => artifact.to_string())
            .increment(rows as u64);
    }

    pub fn artifact_error(artifact: &str) {
        ::metrics::counter!(
            MetricName::StorageArtifactErrors.as_str(),
            "artifact" => artifact.to_string()
        )
        .increment(1);
    }
}

pub mod run {
    use super::MetricName;

    pub fn duration(secs: f64) {
        ::metrics::histogram!(MetricName::RunDuration.as_str()).record(secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_are_prefixed() {
        for name in [
            MetricName::IngestionRowsRead,
            MetricName::ValidationOutcomes,
            MetricName::StorageArtifactsWritten,
            MetricName::RunDuration,
        ] {
            assert!(name.as_str().starts_with("jobtech_"));
            assert_eq!(name.to_string(), name.as_str());
        }
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        ingestion::file_read("adzuna", 10);
        validation::outcome(crate::domain::MatchMethod::ExactMatch);
        storage::artifact_error("adzuna_jobs_clean");
    }
}
