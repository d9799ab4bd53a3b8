use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::{info, warn};

use super::{load_extracts, name_of, CleanerContext, SourceCleaner};
use crate::constants::{
    KAGGLE_DIR, KAGGLE_EUROPE_DATASET, KAGGLE_RAW_DATASET, STACKOVERFLOW_DATASET,
    STACKOVERFLOW_DIR, SURVEYS_SOURCE, SURVEY_SOURCE_TYPE,
};
use crate::domain::{CleanedDataset, CleanedRecords, SurveyResponse};
use crate::error::Result;
use crate::pipeline::ingestion::{discover_files, RawRecord, RawTable};
use crate::pipeline::processing::dedup::remove_duplicates;
use crate::pipeline::processing::normalize::{
    normalize_country, normalize_salary, normalize_skills_list,
};
use crate::types::CellValue;

const KNOWN_COLUMNS: &[&str] = &[
    "id",
    "source",
    "survey_source",
    "source_file",
    "job_title",
    "company",
    "country",
    "country_code",
    "country_name",
    "skills",
    "languages_worked",
    "language",
    "salary_eur",
    "salary_yearly",
    "salary",
    "currency",
    "experience_level",
    "years_experience",
    "developer_type",
    "education_level",
    "company_size",
    "collected_at",
];

/// Kaggle exports split into the Europe-filtered and raw sub-types.
pub fn split_kaggle_files(files: &[PathBuf]) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let europe = files
        .iter()
        .filter(|p| name_of(p).contains("europe"))
        .cloned()
        .collect();
    let raw = files
        .iter()
        .filter(|p| {
            let name = name_of(p);
            name.contains("raw") && !name.contains("europe")
        })
        .cloned()
        .collect();
    (europe, raw)
}

/// StackOverflow exports; a consolidated `all` file wins over per-country files.
pub fn select_stackoverflow_files(files: &[PathBuf]) -> Vec<PathBuf> {
    let consolidated: Vec<PathBuf> = files
        .iter()
        .filter(|p| name_of(p).contains("all"))
        .cloned()
        .collect();
    if !consolidated.is_empty() {
        info!("Consolidated StackOverflow files: {}", consolidated.len());
        return consolidated;
    }
    let individual: Vec<PathBuf> = files
        .iter()
        .filter(|p| name_of(p).contains("stackoverflow_"))
        .cloned()
        .collect();
    if !individual.is_empty() {
        info!(
            "Individual StackOverflow files: {} (no consolidated export, concatenating)",
            individual.len()
        );
    }
    individual
}

/// Developer surveys: Kaggle (Europe and raw) and StackOverflow.
pub struct SurveysCleaner {
    ctx: CleanerContext,
}

impl SurveysCleaner {
    pub fn new(ctx: CleanerContext) -> Self {
        Self { ctx }
    }

    fn clean_survey(
        &self,
        files: &[PathBuf],
        survey_source: &str,
        dataset: &str,
        processed_at: DateTime<Utc>,
    ) -> Option<CleanedDataset> {
        if files.is_empty() {
            return None;
        }
        info!("{} files: {}", survey_source, files.len());
        let mut table = load_extracts(survey_source, files, true)?;
        if table.is_empty() {
            warn!("{} extracts contain no rows", survey_source);
            return None;
        }
        table.set_constant("survey_source", CellValue::Text(survey_source.to_string()));
        harmonize_columns(&mut table);

        let rows: Vec<SurveyResponse> = table
            .records()
            .map(|r| self.to_response(&r, processed_at))
            .collect();
        let rows = remove_duplicates(rows, dataset);
        Some(CleanedDataset::new(dataset, CleanedRecords::Surveys(rows)))
    }

    fn to_response(&self, r: &RawRecord<'_>, processed_at: DateTime<Utc>) -> SurveyResponse {
        let dicts = &self.ctx.dictionaries;
        let country = r.text("country");
        let currency = r.text("currency");
        let eur = |column: &str| normalize_salary(r.get(column), currency.as_deref());

        SurveyResponse {
            id: r.text("id"),
            source: r.text("source"),
            survey_source: r.text("survey_source").unwrap_or_default(),
            source_file: r.text("source_file").unwrap_or_default(),
            job_title: r.text("job_title"),
            company: r.text("company"),
            country_normalized: normalize_country(dicts, country.as_deref()),
            country,
            country_name: r.text("country_name"),
            skills: r.text("skills"),
            skills_normalized: normalize_skills_list(dicts, r.get("skills")),
            languages_worked: r.text("languages_worked"),
            languages_worked_normalized: normalize_skills_list(dicts, r.get("languages_worked")),
            language: r.text("language"),
            language_normalized: normalize_skills_list(dicts, r.get("language")),
            salary_eur: r.float("salary_eur"),
            salary_eur_eur_normalized: eur("salary_eur"),
            salary_yearly: r.float("salary_yearly"),
            salary_yearly_eur_normalized: eur("salary_yearly"),
            salary: r.float("salary"),
            salary_eur_normalized: eur("salary"),
            experience_level: r.text("experience_level"),
            years_experience: r.text("years_experience"),
            developer_type: r.text("developer_type"),
            education_level: r.text("education_level"),
            company_size: r.text("company_size"),
            collected_at: r.text("collected_at"),
            extra_json: r.extras(KNOWN_COLUMNS),
            currency,
            source_type: SURVEY_SOURCE_TYPE.to_string(),
            processed_at,
        }
    }
}

/// Kaggle exports carry `country_code` only; expose it as `country` too.
fn harmonize_columns(table: &mut RawTable) {
    table.copy_column_if_missing("country_code", "country");
}

impl SourceCleaner for SurveysCleaner {
    fn clean(&self) -> Result<Vec<CleanedDataset>> {
        info!("Cleaning survey data");
        let processed_at = Utc::now();
        let mut datasets = Vec::new();

        let kaggle_files = discover_files(&self.ctx.source_dir(KAGGLE_DIR));
        let (europe, raw) = split_kaggle_files(&kaggle_files);
        datasets.extend(self.clean_survey(&europe, KAGGLE_EUROPE_DATASET, KAGGLE_EUROPE_DATASET, processed_at));
        datasets.extend(self.clean_survey(&raw, KAGGLE_RAW_DATASET, KAGGLE_RAW_DATASET, processed_at));

        let so_files = discover_files(&self.ctx.source_dir(STACKOVERFLOW_DIR));
        let selected = select_stackoverflow_files(&so_files);
        datasets.extend(self.clean_survey(&selected, "stackoverflow", STACKOVERFLOW_DATASET, processed_at));

        if datasets.is_empty() {
            warn!("No survey data found");
        }
        Ok(datasets)
    }

    fn source_id(&self) -> &str {
        SURVEYS_SOURCE
    }

    fn name(&self) -> &str {
        "Developer surveys"
    }
}
