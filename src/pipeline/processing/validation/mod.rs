//! Company validation against the national business registry.
//!
//! A lookup walks exact match, fuzzy match, suspicious-name check and finally
//! not-found. Fuzzy scores are memoized per validator by normalized name.

pub mod registry;
pub mod similarity;

pub use registry::{normalize_name, seed_entries, write_seed, Registry, RegistryEntry};

use once_cell::sync::OnceCell;
use rayon::prelude::*;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info};

use crate::config::ValidationConfig;
use crate::domain::{MatchMethod, ValidationResult};
use crate::observability::metrics;

/// Fuzzy search flavour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    /// Skips candidates by length and first char before scoring.
    #[default]
    Pruned,
    /// Scores every registry name.
    Exhaustive,
}

impl MatchStrategy {
    /// Minimum ratio (0..=100) for a fuzzy match.
    pub fn threshold(self) -> u8 {
        match self {
            MatchStrategy::Pruned => 75,
            MatchStrategy::Exhaustive => 80,
        }
    }
}

const SUSPICIOUS_PATTERNS: &[&str] = &[
    "fake",
    "test",
    "example",
    "demo",
    "xxxxx",
    "entreprise fictive",
    "société test",
    "company test",
];

const PROGRESS_EVERY: usize = 5;

pub struct CompanyValidator {
    registry_path: PathBuf,
    registry: OnceCell<Result<Arc<Registry>, String>>,
    cache: Mutex<HashMap<String, u8>>,
    strategy: MatchStrategy,
    chunk_size: usize,
    parallel: bool,
}

impl CompanyValidator {
    /// The registry is read on the first lookup, not here.
    pub fn new(registry_path: impl Into<PathBuf>, config: &ValidationConfig) -> Self {
        Self::with_cell(registry_path.into(), OnceCell::new(), config)
    }

    /// A validator over an already built registry.
    pub fn from_registry(registry: Registry, config: &ValidationConfig) -> Self {
        Self::with_cell(
            PathBuf::new(),
            OnceCell::with_value(Ok(Arc::new(registry))),
            config,
        )
    }

    fn with_cell(
        registry_path: PathBuf,
        registry: OnceCell<Result<Arc<Registry>, String>>,
        config: &ValidationConfig,
    ) -> Self {
        Self {
            registry_path,
            registry,
            cache: Mutex::new(HashMap::new()),
            strategy: config.strategy,
            chunk_size: config.chunk_size.max(1),
            parallel: config.parallel,
        }
    }

    pub fn registry_path(&self) -> &Path {
        &self.registry_path
    }

    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }

    /// Loaded registry, or the load error message. Loaded at most once.
    pub fn registry(&self) -> Result<Arc<Registry>, String> {
        self.registry
            .get_or_init(|| match Registry::load_or_seed(&self.registry_path) {
                Ok(registry) => Ok(Arc::new(registry)),
                Err(e) => {
                    error!("Cannot load company registry {}: {}", self.registry_path.display(), e);
                    metrics::validation::registry_load_error();
                    Err(e.to_string())
                }
            })
            .clone()
    }

    /// Validate a single company. An unavailable registry yields the all-null result.
    pub fn validate(&self, name: Option<&str>, identifier: Option<&str>) -> ValidationResult {
        match self.registry() {
            Ok(registry) => self.validate_with(&registry, name, identifier),
            Err(_) => ValidationResult::default(),
        }
    }

    fn validate_with(
        &self,
        registry: &Registry,
        name: Option<&str>,
        identifier: Option<&str>,
    ) -> ValidationResult {
        let result = resolve(self, registry, name, identifier);
        if let Some(method) = result.match_method {
            metrics::validation::outcome(method);
        }
        result
    }

    /// Validate a batch in fixed-size chunks; results line up with `records`.
    pub fn validate_many<T, F>(&self, records: &[T], extract: F) -> Vec<ValidationResult>
    where
        T: Sync,
        F: Fn(&T) -> (Option<String>, Option<String>) + Sync,
    {
        if records.is_empty() {
            return Vec::new();
        }
        let registry = match self.registry() {
            Ok(registry) => registry,
            Err(e) => {
                error!("Company validation skipped, registry unavailable: {}", e);
                return vec![ValidationResult::default(); records.len()];
            }
        };

        let total_chunks = records.len().div_ceil(self.chunk_size);
        info!(
            "Validating {} companies in {} chunks of {} ({:?} strategy{})",
            records.len(),
            total_chunks,
            self.chunk_size,
            self.strategy,
            if self.parallel { ", parallel" } else { "" }
        );

        let run_chunk = |(chunk_idx, chunk): (usize, &[T])| -> Vec<ValidationResult> {
            if chunk_idx % PROGRESS_EVERY == 0 {
                let start = chunk_idx * self.chunk_size;
                info!(
                    "   Chunk {}/{}: rows {}-{}",
                    chunk_idx + 1,
                    total_chunks,
                    start,
                    start + chunk.len()
                );
            }
            let results = chunk
                .iter()
                .map(|record| {
                    let (name, identifier) = extract(record);
                    self.validate_with(&registry, name.as_deref(), identifier.as_deref())
                })
                .collect();
            metrics::validation::chunk_processed();
            results
        };

        // par_chunks + collect keeps chunk order, so rows stay aligned
        let results: Vec<ValidationResult> = if self.parallel {
            records
                .par_chunks(self.chunk_size)
                .enumerate()
                .map(run_chunk)
                .collect::<Vec<_>>()
                .into_iter()
                .flatten()
                .collect()
        } else {
            records
                .chunks(self.chunk_size)
                .enumerate()
                .flat_map(run_chunk)
                .collect()
        };

        self.log_stats(&results);
        results
    }

    fn log_stats(&self, results: &[ValidationResult]) {
        let total = results.len();
        let verified = results
            .iter()
            .filter(|r| r.is_verified_company == Some(true))
            .count();
        let scores: Vec<f64> = results.iter().filter_map(|r| r.match_score).collect();
        let mean = if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        };
        let cache_entries = self.cache_len();
        metrics::validation::cache_size(cache_entries);

        info!("Company validation finished:");
        info!(
            "   - Verified companies: {}/{} ({:.1}%)",
            verified,
            total,
            verified as f64 / total as f64 * 100.0
        );
        info!("   - Mean score: {:.3}", mean);
        info!("   - Cache: {} unique names", cache_entries);
    }

    pub fn cache_len(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Best similarity of `name` (already normalized) over the registry, memoized.
    fn best_score(&self, registry: &Registry, name: &str) -> u8 {
        if let Some(score) = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return *score;
        }

        let query_len = name.chars().count();
        let best = registry
            .candidates()
            .iter()
            .filter(|c| {
                self.strategy == MatchStrategy::Exhaustive
                    || !similarity::is_pruned(name, query_len, &c.name, c.char_len)
            })
            .map(|c| similarity::ratio(name, &c.name))
            .max()
            .unwrap_or(0);

        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), best);
        best
    }
}

fn resolve(
    validator: &CompanyValidator,
    registry: &Registry,
    name: Option<&str>,
    identifier: Option<&str>,
) -> ValidationResult {
    if identifier.is_some_and(|id| registry.has_identifier(id)) {
        return ValidationResult::exact();
    }

    let Some(raw_name) = name.filter(|n| !n.trim().is_empty()) else {
        return ValidationResult::not_found();
    };
    let normalized = normalize_name(raw_name);
    if registry.has_name(&normalized) {
        return ValidationResult::exact();
    }

    let best = validator.best_score(registry, &normalized);
    if best >= validator.strategy.threshold() {
        debug!("Fuzzy match for '{}' at {}", raw_name, best);
        return ValidationResult::fuzzy(f64::from(best) / 100.0);
    }

    if is_suspicious(raw_name) {
        return ValidationResult::suspicious();
    }
    ValidationResult::not_found()
}

/// Names containing a placeholder token such as "test" or "demo".
pub fn is_suspicious(name: &str) -> bool {
    let lowered = name.to_lowercase();
    SUSPICIOUS_PATTERNS.iter().any(|p| lowered.contains(p))
}

/// True when the outcome counts as a verified company.
pub fn is_verified(result: &ValidationResult) -> bool {
    result.match_method.is_some_and(|m| {
        matches!(m, MatchMethod::ExactMatch | MatchMethod::FuzzyMatch)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn config(strategy: MatchStrategy, chunk_size: usize, parallel: bool) -> ValidationConfig {
        ValidationConfig {
            strategy,
            chunk_size,
            parallel,
            ..ValidationConfig::default()
        }
    }

    fn seeded(strategy: MatchStrategy) -> CompanyValidator {
        CompanyValidator::from_registry(
            Registry::from_entries(seed_entries()),
            &config(strategy, 50, false),
        )
    }

    #[test]
    fn test_exact_match_by_name_and_identifier() {
        let validator = seeded(MatchStrategy::Pruned);
        assert_eq!(validator.validate(Some("GOOGLE FRANCE"), None), ValidationResult::exact());
        assert_eq!(validator.validate(Some("  google france "), None), ValidationResult::exact());
        assert_eq!(
            validator.validate(Some("Unknown Name"), Some("55208011100074")),
            ValidationResult::exact()
        );
        // exact never populates the fuzzy cache
        assert_eq!(validator.cache_len(), 0);
    }

    #[test]
    fn test_fuzzy_match_typo() {
        let validator = seeded(MatchStrategy::Pruned);
        let result = validator.validate(Some("Googel France"), None);
        assert_eq!(result, ValidationResult::fuzzy(0.92));
        assert_eq!(validator.cache_len(), 1);

        // second lookup served from the cache
        assert_eq!(validator.validate(Some("GOOGEL FRANCE"), None), result);
        assert_eq!(validator.cache_len(), 1);
    }

    #[test]
    fn test_suspicious_and_not_found() {
        let validator = seeded(MatchStrategy::Pruned);
        assert_eq!(
            validator.validate(Some("Fake Test Company"), None),
            ValidationResult::suspicious()
        );
        assert_eq!(
            validator.validate(Some("Boulangerie Dupont"), None),
            ValidationResult::not_found()
        );
        assert_eq!(validator.validate(None, None), ValidationResult::not_found());
        assert_eq!(validator.validate(Some("   "), None), ValidationResult::not_found());
    }

    #[test]
    fn test_pruning_hides_matches_the_exhaustive_path_finds() {
        let entries = vec![RegistryEntry {
            siret: "1".into(),
            siren: "1".into(),
            company_name: "ABBBBBBBBB".into(),
            activity: String::new(),
            postal_code: String::new(),
            city: String::new(),
            status: "Actif".into(),
        }];
        // "BBBBBBBBB" vs "ABBBBBBBBB": ratio 95, first char differs
        let pruned = CompanyValidator::from_registry(
            Registry::from_entries(entries.clone()),
            &config(MatchStrategy::Pruned, 50, false),
        );
        let exhaustive = CompanyValidator::from_registry(
            Registry::from_entries(entries),
            &config(MatchStrategy::Exhaustive, 50, false),
        );
        assert_eq!(pruned.validate(Some("BBBBBBBBB"), None), ValidationResult::not_found());
        assert_eq!(
            exhaustive.validate(Some("BBBBBBBBB"), None),
            ValidationResult::fuzzy(0.95)
        );
    }

    #[test]
    fn test_thresholds() {
        assert_eq!(MatchStrategy::Pruned.threshold(), 75);
        assert_eq!(MatchStrategy::Exhaustive.threshold(), 80);
    }

    #[test]
    fn test_validate_many_preserves_order_in_parallel() {
        let names: Vec<Option<String>> = (0..237)
            .map(|i| match i % 4 {
                0 => Some("GOOGLE FRANCE".to_string()),
                1 => Some("Demo Corp".to_string()),
                2 => None,
                _ => Some(format!("Unknown {i}")),
            })
            .collect();
        let sequential = CompanyValidator::from_registry(
            Registry::from_entries(seed_entries()),
            &config(MatchStrategy::Pruned, 10, false),
        );
        let parallel = CompanyValidator::from_registry(
            Registry::from_entries(seed_entries()),
            &config(MatchStrategy::Pruned, 10, true),
        );

        let extract = |n: &Option<String>| (n.clone(), None);
        let a = sequential.validate_many(&names, extract);
        let b = parallel.validate_many(&names, extract);
        assert_eq!(a.len(), names.len());
        assert_eq!(a, b);
        for (i, result) in b.iter().enumerate() {
            let expected = match i % 4 {
                0 => MatchMethod::ExactMatch,
                1 => MatchMethod::SuspiciousPattern,
                _ => MatchMethod::NotFound,
            };
            assert_eq!(result.match_method, Some(expected), "row {i}");
        }
    }

    #[test]
    fn test_registry_is_seeded_on_first_use() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dict").join("sirene.csv");
        let validator = CompanyValidator::new(&path, &ValidationConfig::default());
        assert!(!path.exists());

        assert_eq!(validator.validate(Some("Mirakl"), None), ValidationResult::exact());
        assert!(path.exists());
    }

    #[test]
    fn test_unreadable_registry_yields_null_results() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sirene.csv");
        fs::write(&path, "not,a,registry\n1,2,3\n").unwrap();
        let validator = CompanyValidator::new(&path, &ValidationConfig::default());

        let names = vec![Some("GOOGLE FRANCE".to_string()), None];
        let results = validator.validate_many(&names, |n| (n.clone(), None));
        assert_eq!(results, vec![ValidationResult::default(); 2]);
        assert_eq!(validator.validate(Some("GOOGLE FRANCE"), None), ValidationResult::default());
    }

    #[test]
    fn test_prebuilt_registry_never_touches_disk() {
        let validator = seeded(MatchStrategy::Pruned);
        assert_eq!(validator.registry_path(), Path::new(""));
        let registry = validator.registry().unwrap();
        assert_eq!(registry.len(), seed_entries().len());
        assert_eq!(validator.validate(Some("Doctolib"), None), ValidationResult::exact());
    }

    #[test]
    fn test_is_verified() {
        assert!(is_verified(&ValidationResult::exact()));
        assert!(is_verified(&ValidationResult::fuzzy(0.8)));
        assert!(!is_verified(&ValidationResult::suspicious()));
        assert!(!is_verified(&ValidationResult::not_evaluated()));
        assert!(!is_verified(&ValidationResult::default()));
    }
}
