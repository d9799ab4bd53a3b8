//! Cleaned record shapes, one per source family.
//!
//! Every shape has a fixed column set; anything a raw extract carries beyond it
//! lands in `extra_json` so schema drift is preserved without changing the output schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::tabular_record;
use crate::types::{CellValue, Extras, Table};

/// How a company name was resolved against the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    ExactMatch,
    FuzzyMatch,
    SuspiciousPattern,
    NotFound,
    NotEvaluated,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethod::ExactMatch => "exact_match",
            MatchMethod::FuzzyMatch => "fuzzy_match",
            MatchMethod::SuspiciousPattern => "suspicious_pattern",
            MatchMethod::NotFound => "not_found",
            MatchMethod::NotEvaluated => "not_evaluated",
        }
    }
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<Option<MatchMethod>> for CellValue {
    fn from(value: Option<MatchMethod>) -> Self {
        value
            .map(|m| CellValue::Text(m.as_str().to_string()))
            .unwrap_or(CellValue::Null)
    }
}

/// Outcome of validating one company name.
///
/// The all-`None` default is what rows get when the registry could not be loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationResult {
    pub is_verified_company: Option<bool>,
    pub match_score: Option<f64>,
    pub match_method: Option<MatchMethod>,
}

impl ValidationResult {
    pub fn exact() -> Self {
        Self::resolved(true, 1.0, MatchMethod::ExactMatch)
    }

    pub fn fuzzy(score: f64) -> Self {
        Self::resolved(true, score, MatchMethod::FuzzyMatch)
    }

    pub fn suspicious() -> Self {
        Self::resolved(false, 0.0, MatchMethod::SuspiciousPattern)
    }

    pub fn not_found() -> Self {
        Self::resolved(false, 0.0, MatchMethod::NotFound)
    }

    /// Rows outside the registry's jurisdiction.
    pub fn not_evaluated() -> Self {
        Self {
            is_verified_company: None,
            match_score: None,
            match_method: Some(MatchMethod::NotEvaluated),
        }
    }

    fn resolved(verified: bool, score: f64, method: MatchMethod) -> Self {
        Self {
            is_verified_company: Some(verified),
            match_score: Some(score),
            match_method: Some(method),
        }
    }
}

/// A job-board posting (Adzuna, Glassdoor).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPosting {
    pub id: Option<String>,
    pub source: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub country: Option<String>,
    pub country_name: Option<String>,
    pub country_normalized: Option<String>,
    pub region: Option<String>,
    pub skills: Option<String>,
    pub skills_normalized: Vec<String>,
    pub skills_count: Option<i64>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub currency: Option<String>,
    pub salary_eur_min: Option<f64>,
    pub salary_eur_max: Option<f64>,
    pub salary_eur_avg: Option<f64>,
    pub contract_type: Option<String>,
    pub posted_date: Option<String>,
    pub url: Option<String>,
    pub siret: Option<String>,
    pub collected_at: Option<String>,
    pub extra_json: Extras,
    pub source_type: String,
    pub processed_at: DateTime<Utc>,
    pub is_verified_company: Option<bool>,
    pub match_score: Option<f64>,
    pub match_method: Option<MatchMethod>,
}

impl JobPosting {
    pub fn apply_validation(&mut self, result: ValidationResult) {
        self.is_verified_company = result.is_verified_company;
        self.match_score = result.match_score;
        self.match_method = result.match_method;
    }
}

tabular_record!(JobPosting {
    id,
    source,
    title,
    company,
    location,
    country,
    country_name,
    country_normalized,
    region,
    skills,
    skills_normalized,
    skills_count,
    salary_min,
    salary_max,
    currency,
    salary_eur_min,
    salary_eur_max,
    salary_eur_avg,
    contract_type,
    posted_date,
    url,
    siret,
    collected_at,
    extra_json,
    source_type,
    processed_at,
    is_verified_company,
    match_score,
    match_method,
});

/// Per-language aggregate from the code-hosting trending export.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LanguageStat {
    pub language: Option<String>,
    pub language_normalized: Option<String>,
    pub trending_repos_count: Option<i64>,
    pub total_stars: Option<i64>,
    pub total_forks: Option<i64>,
    pub avg_stars_per_repo: Option<f64>,
    pub european_repos: Option<i64>,
    pub european_countries: Option<String>,
    pub analysis_date: Option<String>,
    pub source_file: String,
    pub github_data_type: String,
    pub extra_json: Extras,
    pub source_type: String,
    pub processed_at: DateTime<Utc>,
}

tabular_record!(LanguageStat {
    language,
    language_normalized,
    trending_repos_count,
    total_stars,
    total_forks,
    avg_stars_per_repo,
    european_repos,
    european_countries,
    analysis_date,
    source_file,
    github_data_type,
    extra_json,
    source_type,
    processed_at,
});

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrendingRepo {
    pub id: Option<String>,
    pub name: Option<String>,
    pub full_name: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub language_normalized: Option<String>,
    pub stars_count: Option<i64>,
    pub forks_count: Option<i64>,
    pub watchers_count: Option<i64>,
    pub issues_count: Option<i64>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub owner_login: Option<String>,
    pub owner_type: Option<String>,
    pub owner_location: Option<String>,
    pub owner_country: Option<String>,
    pub owner_country_normalized: Option<String>,
    pub topics: Option<String>,
    pub license: Option<String>,
    pub url: Option<String>,
    pub source_file: String,
    pub github_data_type: String,
    pub extra_json: Extras,
    pub source_type: String,
    pub processed_at: DateTime<Utc>,
}

tabular_record!(TrendingRepo {
    id,
    name,
    full_name,
    description,
    language,
    language_normalized,
    stars_count,
    forks_count,
    watchers_count,
    issues_count,
    created_at,
    updated_at,
    owner_login,
    owner_type,
    owner_location,
    owner_country,
    owner_country_normalized,
    topics,
    license,
    url,
    source_file,
    github_data_type,
    extra_json,
    source_type,
    processed_at,
});

/// Head-to-head search interest for a group of technologies in one country.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TechComparison {
    pub comparison_group: Option<String>,
    pub technology: Option<String>,
    pub technology_normalized: Option<String>,
    pub country: Option<String>,
    pub country_normalized: Option<String>,
    pub avg_interest: Option<f64>,
    pub analysis_date: Option<String>,
    pub source_file: String,
    pub trends_data_type: String,
    pub extra_json: Extras,
    pub source_type: String,
    pub processed_at: DateTime<Utc>,
}

tabular_record!(TechComparison {
    comparison_group,
    technology,
    technology_normalized,
    country,
    country_normalized,
    avg_interest,
    analysis_date,
    source_file,
    trends_data_type,
    extra_json,
    source_type,
    processed_at,
});

/// Search interest over time for one keyword in one country.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountryTrend {
    pub keyword: Option<String>,
    pub keyword_normalized: Option<String>,
    pub keyword_technology: Option<String>,
    pub country: Option<String>,
    pub country_normalized: Option<String>,
    pub timeframe: Option<String>,
    pub avg_interest: Option<f64>,
    pub max_interest: Option<f64>,
    pub min_interest: Option<f64>,
    pub trend_direction: Option<String>,
    pub trend_strength: Option<f64>,
    pub data_points: Option<i64>,
    pub category: Option<String>,
    pub analysis_date: Option<String>,
    pub source_file: String,
    pub trends_data_type: String,
    pub extra_json: Extras,
    pub source_type: String,
    pub processed_at: DateTime<Utc>,
}

tabular_record!(CountryTrend {
    keyword,
    keyword_normalized,
    keyword_technology,
    country,
    country_normalized,
    timeframe,
    avg_interest,
    max_interest,
    min_interest,
    trend_direction,
    trend_strength,
    data_points,
    category,
    analysis_date,
    source_file,
    trends_data_type,
    extra_json,
    source_type,
    processed_at,
});

/// One developer-survey answer (Kaggle, StackOverflow).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurveyResponse {
    pub id: Option<String>,
    pub source: Option<String>,
    pub survey_source: String,
    pub source_file: String,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub country: Option<String>,
    pub country_name: Option<String>,
    pub country_normalized: Option<String>,
    pub skills: Option<String>,
    pub skills_normalized: Vec<String>,
    pub languages_worked: Option<String>,
    pub languages_worked_normalized: Vec<String>,
    pub language: Option<String>,
    pub language_normalized: Vec<String>,
    pub salary_eur: Option<f64>,
    pub salary_eur_eur_normalized: Option<f64>,
    pub salary_yearly: Option<f64>,
    pub salary_yearly_eur_normalized: Option<f64>,
    pub salary: Option<f64>,
    pub salary_eur_normalized: Option<f64>,
    pub currency: Option<String>,
    pub experience_level: Option<String>,
    pub years_experience: Option<String>,
    pub developer_type: Option<String>,
    pub education_level: Option<String>,
    pub company_size: Option<String>,
    pub collected_at: Option<String>,
    pub extra_json: Extras,
    pub source_type: String,
    pub processed_at: DateTime<Utc>,
}

tabular_record!(SurveyResponse {
    id,
    source,
    survey_source,
    source_file,
    job_title,
    company,
    country,
    country_name,
    country_normalized,
    skills,
    skills_normalized,
    languages_worked,
    languages_worked_normalized,
    language,
    language_normalized,
    salary_eur,
    salary_eur_eur_normalized,
    salary_yearly,
    salary_yearly_eur_normalized,
    salary,
    salary_eur_normalized,
    currency,
    experience_level,
    years_experience,
    developer_type,
    education_level,
    company_size,
    collected_at,
    extra_json,
    source_type,
    processed_at,
});

/// The typed rows a cleaner produced for one dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum CleanedRecords {
    Jobs(Vec<JobPosting>),
    LanguageStats(Vec<LanguageStat>),
    TrendingRepos(Vec<TrendingRepo>),
    TechComparisons(Vec<TechComparison>),
    CountryTrends(Vec<CountryTrend>),
    Surveys(Vec<SurveyResponse>),
}

impl CleanedRecords {
    pub fn len(&self) -> usize {
        match self {
            CleanedRecords::Jobs(r) => r.len(),
            CleanedRecords::LanguageStats(r) => r.len(),
            CleanedRecords::TrendingRepos(r) => r.len(),
            CleanedRecords::TechComparisons(r) => r.len(),
            CleanedRecords::CountryTrends(r) => r.len(),
            CleanedRecords::Surveys(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_table(&self, name: &str) -> Table {
        match self {
            CleanedRecords::Jobs(r) => Table::from_records(name, r),
            CleanedRecords::LanguageStats(r) => Table::from_records(name, r),
            CleanedRecords::TrendingRepos(r) => Table::from_records(name, r),
            CleanedRecords::TechComparisons(r) => Table::from_records(name, r),
            CleanedRecords::CountryTrends(r) => Table::from_records(name, r),
            CleanedRecords::Surveys(r) => Table::from_records(name, r),
        }
    }
}

/// A named output of one cleaner run, e.g. `adzuna_jobs` or `github_language_stats`.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedDataset {
    pub name: String,
    pub records: CleanedRecords,
}

impl CleanedDataset {
    pub fn new(name: impl Into<String>, records: CleanedRecords) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }

    /// File stem the dataset is persisted under.
    pub fn artifact_name(&self) -> String {
        format!("{}_clean", self.name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
