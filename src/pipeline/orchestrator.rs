use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::constants::{
    ADZUNA_DATASET, CONSOLIDATED_JOB_COLUMNS, GLASSDOOR_DATASET, JOBS_CONSOLIDATED_ARTIFACT,
};
use crate::domain::{CleanedDataset, CleanedRecords, JobPosting, ValidationResult};
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::processing::cleaners::{CleanerContext, CleanerRegistry};
use crate::pipeline::processing::dictionaries::Dictionaries;
use crate::pipeline::processing::validation::{is_verified, CompanyValidator};
use crate::pipeline::storage::{ArtifactStore, ParquetArtifactStore};
use crate::types::Table;

/// Row count and outcome for one persisted artifact.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetReport {
    pub dataset: String,
    pub artifact: String,
    pub rows: usize,
    pub location: Option<String>,
    pub error: Option<String>,
}

/// Rows produced by one cleaner that ran to completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceReport {
    pub source: String,
    pub datasets: usize,
    pub rows: usize,
}

/// Reference-country validation totals for a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GateStats {
    pub evaluated: usize,
    pub verified: usize,
    pub skipped: usize,
}

impl GateStats {
    fn merge(&mut self, other: &GateStats) {
        self.evaluated += other.evaluated;
        self.verified += other.verified;
        self.skipped += other.skipped;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub sources: Vec<SourceReport>,
    pub datasets: Vec<DatasetReport>,
    pub failed_sources: Vec<String>,
    pub validation: GateStats,
}

impl RunReport {
    pub fn source(&self, source: &str) -> Option<&SourceReport> {
        self.sources.iter().find(|s| s.source == source)
    }

    pub fn dataset(&self, artifact: &str) -> Option<&DatasetReport> {
        self.datasets.iter().find(|d| d.artifact == artifact)
    }

    pub fn total_rows(&self) -> usize {
        self.datasets.iter().map(|d| d.rows).sum()
    }

    pub fn has_errors(&self) -> bool {
        !self.failed_sources.is_empty() || self.datasets.iter().any(|d| d.error.is_some())
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Validate reference-country postings in place; every other row is marked not evaluated.
///
/// Row order is untouched and the validator never sees out-of-scope rows.
pub fn apply_validation_gate(
    validator: &CompanyValidator,
    reference_country: &str,
    jobs: &mut [JobPosting],
) -> GateStats {
    let domestic: Vec<usize> = jobs
        .iter()
        .enumerate()
        .filter(|(_, job)| job.country_normalized.as_deref() == Some(reference_country))
        .map(|(i, _)| i)
        .collect();

    let keys: Vec<(Option<String>, Option<String>)> = domestic
        .iter()
        .map(|&i| (jobs[i].company.clone(), jobs[i].siret.clone()))
        .collect();
    let results = validator.validate_many(&keys, |key| key.clone());

    let stats = GateStats {
        evaluated: domestic.len(),
        skipped: jobs.len() - domestic.len(),
        verified: results.iter().filter(|r| is_verified(r)).count(),
    };

    for job in jobs.iter_mut() {
        job.apply_validation(ValidationResult::not_evaluated());
    }
    for (i, result) in domestic.into_iter().zip(results) {
        jobs[i].apply_validation(result);
    }
    stats
}

/// Runs the cleaners, gates company validation, and persists every dataset.
pub struct Pipeline {
    cleaners: CleanerRegistry,
    validator: Arc<CompanyValidator>,
    store: Arc<dyn ArtifactStore>,
    reference_country: String,
}

impl Pipeline {
    /// Build the production pipeline. Dictionaries are loaded here; a missing one aborts.
    pub fn from_config(config: &Config) -> Result<Self> {
        let dictionaries = Arc::new(Dictionaries::load(&config.paths.dictionaries_dir)?);
        let ctx = CleanerContext::new(config.paths.raw_root(), dictionaries);
        let validator = Arc::new(CompanyValidator::new(
            &config.paths.registry_file,
            &config.validation,
        ));
        let store = Arc::new(ParquetArtifactStore::new(
            config.paths.clean_root(),
            config.output.compression,
        ));
        Ok(Self::with_components(
            CleanerRegistry::with_defaults(&ctx),
            validator,
            store,
            config.validation.reference_country.clone(),
        ))
    }

    pub fn with_components(
        cleaners: CleanerRegistry,
        validator: Arc<CompanyValidator>,
        store: Arc<dyn ArtifactStore>,
        reference_country: impl Into<String>,
    ) -> Self {
        Self {
            cleaners,
            validator,
            store,
            reference_country: reference_country.into(),
        }
    }

    pub fn validator(&self) -> &CompanyValidator {
        &self.validator
    }

    /// Run the selected sources (all when `None`). Never fails as a whole; problems
    /// are logged and listed in the report.
    pub fn run(&self, sources: Option<&[String]>) -> RunReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let timer = Instant::now();
        info!("🚀 Starting cleaning run {}", run_id);

        let selected = self.cleaners.select(sources);
        let mut sources = Vec::new();
        let mut datasets = Vec::new();
        let mut failed_sources = Vec::new();
        let mut gate = GateStats::default();
        let mut job_tables: HashMap<String, Table> = HashMap::new();

        for (idx, cleaner) in selected.iter().enumerate() {
            info!("🔄 Source {}/{}: {}", idx + 1, selected.len(), cleaner.name());
            let cleaned = match cleaner.clean() {
                Ok(cleaned) => cleaned,
                Err(e) => {
                    error!("❌ Cleaning {} failed: {}", cleaner.name(), e);
                    failed_sources.push(cleaner.source_id().to_string());
                    continue;
                }
            };

            let mut source = SourceReport {
                source: cleaner.source_id().to_string(),
                datasets: cleaned.len(),
                rows: 0,
            };
            for dataset in cleaned {
                let (table, stats) = self.finish_dataset(dataset);
                source.rows += table.len();
                if let Some(stats) = stats {
                    gate.merge(&stats);
                }
                datasets.push(self.persist(&table));
                if table.name == artifact_name(ADZUNA_DATASET)
                    || table.name == artifact_name(GLASSDOOR_DATASET)
                {
                    job_tables.insert(table.name.clone(), table);
                }
            }
            if source.rows == 0 {
                warn!("⚠️ Source {} produced 0 rows", source.source);
            }
            sources.push(source);
        }

        if let Some(report) = self.consolidate_jobs(&job_tables) {
            datasets.push(report);
        }

        if gate.evaluated > 0 {
            info!(
                "🏢 {}/{} {} companies verified ({:.1}%)",
                gate.verified,
                gate.evaluated,
                self.reference_country,
                gate.verified as f64 / gate.evaluated as f64 * 100.0
            );
        }

        for report in &datasets {
            if report.rows == 0 && report.error.is_none() {
                warn!("⚠️ {} produced 0 rows", report.dataset);
            }
        }

        let elapsed = timer.elapsed().as_secs_f64();
        metrics::run::duration(elapsed);
        info!(
            "✅ Run {} finished in {:.2}s: {} artifacts, {} failed sources",
            run_id,
            elapsed,
            datasets.len(),
            failed_sources.len()
        );

        RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            sources,
            datasets,
            failed_sources,
            validation: gate,
        }
    }

    fn finish_dataset(&self, dataset: CleanedDataset) -> (Table, Option<GateStats>) {
        let artifact = dataset.artifact_name();
        match dataset.records {
            CleanedRecords::Jobs(mut jobs) => {
                let stats = apply_validation_gate(&self.validator, &self.reference_country, &mut jobs);
                info!(
                    "{}: {} rows validated, {} outside {}",
                    dataset.name, stats.evaluated, stats.skipped, self.reference_country
                );
                (Table::from_records(artifact, &jobs), Some(stats))
            }
            records => (records.to_table(&artifact), None),
        }
    }

    fn persist(&self, table: &Table) -> DatasetReport {
        let dataset = table
            .name
            .strip_suffix("_clean")
            .unwrap_or(&table.name)
            .to_string();
        match self.store.write_table(table) {
            Ok(location) => {
                metrics::storage::artifact_written(&table.name, table.len());
                info!("💾 {} rows -> {}", table.len(), location);
                DatasetReport {
                    dataset,
                    artifact: table.name.clone(),
                    rows: table.len(),
                    location: Some(location),
                    error: None,
                }
            }
            Err(e) => {
                metrics::storage::artifact_error(&table.name);
                error!("❌ Failed to write {} via {}: {}", table.name, self.store.name(), e);
                DatasetReport {
                    dataset,
                    artifact: table.name.clone(),
                    rows: table.len(),
                    location: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Both job boards projected onto their shared columns and stacked.
    fn consolidate_jobs(&self, job_tables: &HashMap<String, Table>) -> Option<DatasetReport> {
        let adzuna = job_tables.get(&artifact_name(ADZUNA_DATASET));
        let glassdoor = job_tables.get(&artifact_name(GLASSDOOR_DATASET));
        match (adzuna, glassdoor) {
            (Some(a), Some(g)) if !a.is_empty() && !g.is_empty() => {
                let consolidated = Table::concat(
                    JOBS_CONSOLIDATED_ARTIFACT,
                    &[a.project(CONSOLIDATED_JOB_COLUMNS), g.project(CONSOLIDATED_JOB_COLUMNS)],
                );
                info!(
                    "Consolidated jobs: {} rows ({} + {})",
                    consolidated.len(),
                    a.len(),
                    g.len()
                );
                Some(self.persist(&consolidated))
            }
            _ => {
                if !job_tables.is_empty() {
                    warn!("Job consolidation skipped: both job boards are needed");
                }
                None
            }
        }
    }
}

fn artifact_name(dataset: &str) -> String {
    format!("{}_clean", dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationConfig;
    use crate::domain::MatchMethod;
    use crate::pipeline::processing::validation::{seed_entries, Registry};

    fn job(company: &str, country: Option<&str>) -> JobPosting {
        JobPosting {
            company: Some(company.to_string()),
            country_normalized: country.map(str::to_string),
            ..JobPosting::default()
        }
    }

    fn validator() -> CompanyValidator {
        CompanyValidator::from_registry(
            Registry::from_entries(seed_entries()),
            &ValidationConfig::default(),
        )
    }

    #[test]
    fn test_gate_only_validates_reference_country() {
        let mut jobs = vec![
            job("GOOGLE FRANCE", Some("DE")),
            job("GOOGLE FRANCE", Some("FR")),
            job("Demo Ltd", None),
            job("Googel France", Some("FR")),
        ];
        let validator = validator();
        let stats = apply_validation_gate(&validator, "FR", &mut jobs);

        assert_eq!(
            stats,
            GateStats {
                evaluated: 2,
                verified: 2,
                skipped: 2
            }
        );
        assert_eq!(jobs[0].match_method, Some(MatchMethod::NotEvaluated));
        assert_eq!(jobs[0].match_score, None);
        assert_eq!(jobs[0].is_verified_company, None);
        assert_eq!(jobs[1].match_method, Some(MatchMethod::ExactMatch));
        // never reaches the suspicious check
        assert_eq!(jobs[2].match_method, Some(MatchMethod::NotEvaluated));
        assert_eq!(jobs[3].match_method, Some(MatchMethod::FuzzyMatch));
        assert_eq!(jobs[3].company.as_deref(), Some("Googel France"));
        // only the domestic names went through fuzzy matching
        assert_eq!(validator.cache_len(), 1);
    }

    #[test]
    fn test_gate_with_no_domestic_rows() {
        let mut jobs = vec![job("SAP", Some("DE"))];
        let stats = apply_validation_gate(&validator(), "FR", &mut jobs);
        assert_eq!(stats.evaluated, 0);
        assert_eq!(stats.skipped, 1);
        assert_eq!(jobs[0].match_method, Some(MatchMethod::NotEvaluated));
    }
}
