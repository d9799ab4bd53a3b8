use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::{info, warn};

use super::{load_extracts, name_of, CleanerContext, SourceCleaner};
use crate::constants::{GITHUB_DIR, GITHUB_SOURCE, LANGUAGE_STATS_DATASET, TRENDING_REPOS_DATASET};
use crate::domain::{CleanedDataset, CleanedRecords, LanguageStat, TrendingRepo};
use crate::error::Result;
use crate::pipeline::ingestion::{discover_files, RawRecord};
use crate::pipeline::processing::dedup::remove_duplicates;
use crate::pipeline::processing::normalize::{normalize_country, normalize_technology};

const LANGUAGE_STATS: &str = "language_stats";
const TRENDING_REPOS: &str = "trending_repos";

const LANGUAGE_STAT_COLUMNS: &[&str] = &[
    "language",
    "trending_repos_count",
    "total_stars",
    "total_forks",
    "avg_stars_per_repo",
    "european_repos",
    "european_countries",
    "analysis_date",
    "source_file",
];

const TRENDING_REPO_COLUMNS: &[&str] = &[
    "id",
    "name",
    "full_name",
    "description",
    "language",
    "stars_count",
    "forks_count",
    "watchers_count",
    "issues_count",
    "created_at",
    "updated_at",
    "owner_login",
    "owner_type",
    "owner_location",
    "owner_country",
    "topics",
    "license",
    "url",
    "source_file",
];

/// Code-hosting exports: per-language statistics and trending repositories.
pub struct GithubCleaner {
    ctx: CleanerContext,
}

impl GithubCleaner {
    pub fn new(ctx: CleanerContext) -> Self {
        Self { ctx }
    }

    fn files_of_type(files: &[PathBuf], kind: &str) -> Vec<PathBuf> {
        files
            .iter()
            .filter(|p| name_of(p).contains(kind))
            .cloned()
            .collect()
    }

    fn language_stats(&self, files: &[PathBuf], processed_at: DateTime<Utc>) -> Option<CleanedDataset> {
        let table = load_extracts(LANGUAGE_STATS_DATASET, files, true)?;
        let dicts = &self.ctx.dictionaries;
        let rows: Vec<LanguageStat> = table
            .records()
            .map(|r| {
                let language = r.text("language");
                LanguageStat {
                    language_normalized: normalize_technology(dicts, language.as_deref()),
                    language,
                    trending_repos_count: r.int("trending_repos_count"),
                    total_stars: r.int("total_stars"),
                    total_forks: r.int("total_forks"),
                    avg_stars_per_repo: r.float("avg_stars_per_repo"),
                    european_repos: r.int("european_repos"),
                    european_countries: r.text("european_countries"),
                    analysis_date: r.text("analysis_date"),
                    source_file: r.text("source_file").unwrap_or_default(),
                    github_data_type: LANGUAGE_STATS.to_string(),
                    extra_json: r.extras(LANGUAGE_STAT_COLUMNS),
                    source_type: format!("github_{}", LANGUAGE_STATS),
                    processed_at,
                }
            })
            .collect();
        let rows = remove_duplicates(rows, LANGUAGE_STATS_DATASET);
        Some(CleanedDataset::new(
            LANGUAGE_STATS_DATASET,
            CleanedRecords::LanguageStats(rows),
        ))
    }

    fn trending_repos(&self, files: &[PathBuf], processed_at: DateTime<Utc>) -> Option<CleanedDataset> {
        let table = load_extracts(TRENDING_REPOS_DATASET, files, true)?;
        let rows: Vec<TrendingRepo> = table
            .records()
            .map(|r| self.to_repo(&r, processed_at))
            .collect();
        let rows = remove_duplicates(rows, TRENDING_REPOS_DATASET);
        Some(CleanedDataset::new(
            TRENDING_REPOS_DATASET,
            CleanedRecords::TrendingRepos(rows),
        ))
    }

    fn to_repo(&self, r: &RawRecord<'_>, processed_at: DateTime<Utc>) -> TrendingRepo {
        let dicts = &self.ctx.dictionaries;
        let language = r.text("language");
        let owner_country = r.text("owner_country");
        TrendingRepo {
            id: r.text("id"),
            name: r.text("name"),
            full_name: r.text("full_name"),
            description: r.text("description"),
            language_normalized: normalize_technology(dicts, language.as_deref()),
            language,
            stars_count: r.int("stars_count"),
            forks_count: r.int("forks_count"),
            watchers_count: r.int("watchers_count"),
            issues_count: r.int("issues_count"),
            created_at: r.text("created_at"),
            updated_at: r.text("updated_at"),
            owner_login: r.text("owner_login"),
            owner_type: r.text("owner_type"),
            owner_location: r.text("owner_location"),
            owner_country_normalized: normalize_country(dicts, owner_country.as_deref()),
            owner_country,
            topics: r.text("topics"),
            license: r.text("license"),
            url: r.text("url"),
            source_file: r.text("source_file").unwrap_or_default(),
            github_data_type: TRENDING_REPOS.to_string(),
            extra_json: r.extras(TRENDING_REPO_COLUMNS),
            source_type: format!("github_{}", TRENDING_REPOS),
            processed_at,
        }
    }
}

impl SourceCleaner for GithubCleaner {
    fn clean(&self) -> Result<Vec<CleanedDataset>> {
        info!("Cleaning GitHub data");
        let files = discover_files(&self.ctx.source_dir(GITHUB_DIR));
        let processed_at = Utc::now();

        let language_files = Self::files_of_type(&files, LANGUAGE_STATS);
        let trending_files = Self::files_of_type(&files, TRENDING_REPOS);
        info!(
            "GitHub files: {} language_stats, {} trending_repos",
            language_files.len(),
            trending_files.len()
        );

        let datasets: Vec<CleanedDataset> = [
            self.language_stats(&language_files, processed_at),
            self.trending_repos(&trending_files, processed_at),
        ]
        .into_iter()
        .flatten()
        .collect();

        if datasets.is_empty() {
            warn!("No GitHub data found");
        }
        Ok(datasets)
    }

    fn source_id(&self) -> &str {
        GITHUB_SOURCE
    }

    fn name(&self) -> &str {
        "GitHub"
    }
}
