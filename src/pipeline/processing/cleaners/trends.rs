use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::{info, warn};

use super::{load_extracts, name_of, CleanerContext, SourceCleaner};
use crate::constants::{
    COUNTRY_TRENDS_DATASET, GOOGLE_TRENDS_DIR, TECH_COMPARISONS_DATASET, TRENDS_SOURCE,
};
use crate::domain::{CleanedDataset, CleanedRecords, CountryTrend, TechComparison};
use crate::error::Result;
use crate::pipeline::ingestion::{discover_files, RawRecord};
use crate::pipeline::processing::dedup::remove_duplicates;
use crate::pipeline::processing::normalize::{
    normalize_country, normalize_technology, technology_from_keyword,
};

const COMPARISON_MARKER: &str = "tech_comparisons";
const CONSOLIDATED_MARKER: &str = "all";
const INDIVIDUAL_MARKER: &str = "trends_";

const CONSOLIDATED_TYPE: &str = "country_trends_consolidated";
const INDIVIDUAL_TYPE: &str = "country_trends_individual";

const COMPARISON_COLUMNS: &[&str] = &[
    "comparison_group",
    "technology",
    "country",
    "avg_interest",
    "analysis_date",
    "source_file",
];

const COUNTRY_TREND_COLUMNS: &[&str] = &[
    "keyword",
    "country",
    "timeframe",
    "avg_interest",
    "max_interest",
    "min_interest",
    "trend_direction",
    "trend_strength",
    "data_points",
    "category",
    "analysis_date",
    "source_file",
];

/// Which country-trend exports to read and how they are labelled.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryTrendFiles {
    pub files: Vec<PathBuf>,
    pub data_type: &'static str,
}

/// Prefer the pre-consolidated all-countries export over individual country files.
pub fn select_country_trend_files(files: &[PathBuf]) -> Option<CountryTrendFiles> {
    let candidates: Vec<&PathBuf> = files
        .iter()
        .filter(|p| !name_of(p).contains(COMPARISON_MARKER))
        .collect();

    let consolidated: Vec<PathBuf> = candidates
        .iter()
        .filter(|p| name_of(p).contains(CONSOLIDATED_MARKER))
        .map(|p| (*p).clone())
        .collect();
    if !consolidated.is_empty() {
        info!("Consolidated country trend files: {}", consolidated.len());
        return Some(CountryTrendFiles {
            files: consolidated,
            data_type: CONSOLIDATED_TYPE,
        });
    }

    let individual: Vec<PathBuf> = candidates
        .iter()
        .filter(|p| name_of(p).contains(INDIVIDUAL_MARKER))
        .map(|p| (*p).clone())
        .collect();
    if individual.is_empty() {
        return None;
    }
    info!(
        "Individual country trend files: {} (no all-countries export, concatenating)",
        individual.len()
    );
    Some(CountryTrendFiles {
        files: individual,
        data_type: INDIVIDUAL_TYPE,
    })
}

/// Search-interest exports: technology comparisons and per-country keyword trends.
pub struct TrendsCleaner {
    ctx: CleanerContext,
}

impl TrendsCleaner {
    pub fn new(ctx: CleanerContext) -> Self {
        Self { ctx }
    }

    fn comparisons(&self, files: &[PathBuf], processed_at: DateTime<Utc>) -> Option<CleanedDataset> {
        info!("tech_comparisons files: {}", files.len());
        let table = load_extracts(TECH_COMPARISONS_DATASET, files, true)?;
        let dicts = &self.ctx.dictionaries;
        let rows: Vec<TechComparison> = table
            .records()
            .map(|r| {
                let technology = r.text("technology");
                let country = r.text("country");
                TechComparison {
                    comparison_group: r.text("comparison_group"),
                    technology_normalized: normalize_technology(dicts, technology.as_deref()),
                    technology,
                    country_normalized: normalize_country(dicts, country.as_deref()),
                    country,
                    avg_interest: r.float("avg_interest"),
                    analysis_date: r.text("analysis_date"),
                    source_file: r.text("source_file").unwrap_or_default(),
                    trends_data_type: TECH_COMPARISONS_DATASET.to_string(),
                    extra_json: r.extras(COMPARISON_COLUMNS),
                    source_type: TECH_COMPARISONS_DATASET.to_string(),
                    processed_at,
                }
            })
            .collect();
        let rows = remove_duplicates(rows, "Tech Comparisons");
        Some(CleanedDataset::new(
            TECH_COMPARISONS_DATASET,
            CleanedRecords::TechComparisons(rows),
        ))
    }

    fn country_trends(&self, selection: CountryTrendFiles, processed_at: DateTime<Utc>) -> Option<CleanedDataset> {
        let table = load_extracts(COUNTRY_TRENDS_DATASET, &selection.files, true)?;
        let rows: Vec<CountryTrend> = table
            .records()
            .map(|r| self.to_country_trend(&r, selection.data_type, processed_at))
            .collect();
        let rows = remove_duplicates(rows, "Country Trends");
        Some(CleanedDataset::new(
            COUNTRY_TRENDS_DATASET,
            CleanedRecords::CountryTrends(rows),
        ))
    }

    fn to_country_trend(&self, r: &RawRecord<'_>, data_type: &str, processed_at: DateTime<Utc>) -> CountryTrend {
        let dicts = &self.ctx.dictionaries;
        let keyword = r.text("keyword");
        let country = r.text("country");
        CountryTrend {
            keyword_normalized: normalize_technology(dicts, keyword.as_deref()),
            keyword_technology: technology_from_keyword(keyword.as_deref()),
            keyword,
            country_normalized: normalize_country(dicts, country.as_deref()),
            country,
            timeframe: r.text("timeframe"),
            avg_interest: r.float("avg_interest"),
            max_interest: r.float("max_interest"),
            min_interest: r.float("min_interest"),
            trend_direction: r.text("trend_direction"),
            trend_strength: r.float("trend_strength"),
            data_points: r.int("data_points"),
            category: r.text("category"),
            analysis_date: r.text("analysis_date"),
            source_file: r.text("source_file").unwrap_or_default(),
            trends_data_type: data_type.to_string(),
            extra_json: r.extras(COUNTRY_TREND_COLUMNS),
            source_type: COUNTRY_TRENDS_DATASET.to_string(),
            processed_at,
        }
    }
}

impl SourceCleaner for TrendsCleaner {
    fn clean(&self) -> Result<Vec<CleanedDataset>> {
        info!("Cleaning search trend data");
        let files = discover_files(&self.ctx.source_dir(GOOGLE_TRENDS_DIR));
        let processed_at = Utc::now();

        let comparison_files: Vec<PathBuf> = files
            .iter()
            .filter(|p| name_of(p).contains(COMPARISON_MARKER))
            .cloned()
            .collect();

        let mut datasets = Vec::new();
        if !comparison_files.is_empty() {
            datasets.extend(self.comparisons(&comparison_files, processed_at));
        }
        if let Some(selection) = select_country_trend_files(&files) {
            datasets.extend(self.country_trends(selection, processed_at));
        }

        if datasets.is_empty() {
            warn!("No search trend data found");
        }
        Ok(datasets)
    }

    fn source_id(&self) -> &str {
        TRENDS_SOURCE
    }

    fn name(&self) -> &str {
        "Search trends"
    }
}
