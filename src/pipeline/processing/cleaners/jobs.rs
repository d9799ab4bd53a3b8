use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::{load_extracts, CleanerContext, SourceCleaner};
use crate::constants::{
    ADZUNA_DATASET, ADZUNA_DIR, GLASSDOOR_DATASET, GLASSDOOR_DIR, JOBS_SOURCE,
    JOB_BOARD_SOURCE_TYPE,
};
use crate::domain::{CleanedDataset, CleanedRecords, JobPosting};
use crate::error::Result;
use crate::pipeline::ingestion::{discover_files, RawRecord, RawTable};
use crate::pipeline::processing::dedup::remove_duplicates;
use crate::pipeline::processing::normalize::{
    normalize_country, normalize_salary, normalize_skills_list, region_for_location,
};

const KNOWN_COLUMNS: &[&str] = &[
    "id",
    "source",
    "title",
    "company",
    "location",
    "country",
    "country_name",
    "skills",
    "skills_count",
    "salary_min",
    "salary_max",
    "currency",
    "contract_type",
    "posted_date",
    "url",
    "siret",
    "collected_at",
];

/// Job-board postings from Adzuna and Glassdoor.
///
/// Validation columns are left empty here; the pipeline fills them after gating.
pub struct JobsCleaner {
    ctx: CleanerContext,
}

impl JobsCleaner {
    pub fn new(ctx: CleanerContext) -> Self {
        Self { ctx }
    }

    fn clean_board(
        &self,
        board: &str,
        dir: &str,
        dataset: &str,
        processed_at: DateTime<Utc>,
    ) -> Option<CleanedDataset> {
        info!("Cleaning {} job postings", board);
        let files = discover_files(&self.ctx.source_dir(dir));
        let Some(mut table) = load_extracts(board, &files, false) else {
            warn!("No {} data found", board);
            return None;
        };
        harmonize_columns(&mut table);

        let postings: Vec<JobPosting> = table
            .records()
            .map(|record| self.to_posting(&record, board, processed_at))
            .collect();
        let postings = remove_duplicates(postings, dataset);
        Some(CleanedDataset::new(dataset, CleanedRecords::Jobs(postings)))
    }

    fn to_posting(&self, record: &RawRecord<'_>, board: &str, processed_at: DateTime<Utc>) -> JobPosting {
        let dicts = &self.ctx.dictionaries;
        let currency = record.text("currency");
        let location = record.text("location");
        let country = record.text("country");

        let salary_eur_min = normalize_salary(record.get("salary_min"), currency.as_deref());
        let salary_eur_max = normalize_salary(record.get("salary_max"), currency.as_deref());
        let salary_eur_avg = match (salary_eur_min, salary_eur_max) {
            (Some(min), Some(max)) => Some((min + max) / 2.0),
            _ => None,
        };

        JobPosting {
            id: record.text("id"),
            source: record.text("source").or_else(|| Some(board.to_string())),
            title: record.text("title"),
            company: record.text("company"),
            country_normalized: normalize_country(dicts, country.as_deref()),
            region: region_for_location(dicts, location.as_deref()),
            location,
            country,
            country_name: record.text("country_name"),
            skills: record.text("skills"),
            skills_normalized: normalize_skills_list(dicts, record.get("skills")),
            skills_count: record.int("skills_count"),
            salary_min: record.float("salary_min"),
            salary_max: record.float("salary_max"),
            currency,
            salary_eur_min,
            salary_eur_max,
            salary_eur_avg,
            contract_type: record.text("contract_type"),
            posted_date: record.text("posted_date"),
            url: record.text("url"),
            siret: record.text("siret"),
            collected_at: record.text("collected_at"),
            extra_json: record.extras(KNOWN_COLUMNS),
            source_type: JOB_BOARD_SOURCE_TYPE.to_string(),
            processed_at,
            is_verified_company: None,
            match_score: None,
            match_method: None,
        }
    }
}

/// Glassdoor exports use `job_title` and `country_code`; other boards already match.
fn harmonize_columns(table: &mut RawTable) {
    table.rename_column("job_title", "title");
    table.rename_column("country_code", "country");
}

impl SourceCleaner for JobsCleaner {
    fn clean(&self) -> Result<Vec<CleanedDataset>> {
        let processed_at = Utc::now();
        let boards = [
            ("adzuna", ADZUNA_DIR, ADZUNA_DATASET),
            ("glassdoor", GLASSDOOR_DIR, GLASSDOOR_DATASET),
        ];
        Ok(boards
            .iter()
            .filter_map(|(board, dir, dataset)| self.clean_board(board, dir, dataset, processed_at))
            .collect())
    }

    fn source_id(&self) -> &str {
        JOBS_SOURCE
    }

    fn name(&self) -> &str {
        "Job boards"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::dictionaries::fixtures;
    use std::fs;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn jobs(datasets: &[CleanedDataset], name: &str) -> Vec<JobPosting> {
        match &datasets.iter().find(|d| d.name == name).unwrap().records {
            CleanedRecords::Jobs(jobs) => jobs.clone(),
            other => panic!("unexpected records: {other:?}"),
        }
    }

    #[test]
    fn test_adzuna_normalization() {
        let dir = tempdir().unwrap();
        let adzuna = dir.path().join("adzuna");
        fs::create_dir_all(&adzuna).unwrap();
        fs::write(
            adzuna.join("adzuna_fr.csv"),
            "id,title,company,location,country,salary_min,salary_max,currency,skills,description_excerpt\n\
             1,Dev,Google France,\"Paris, Île-de-France\",FR,40000,60000,EUR,\"python, js\",Great job\n\
             2,Dev,Acme,London,GB,50000,,USD,,\n",
        )
        .unwrap();

        let ctx = CleanerContext::new(dir.path(), Arc::new(fixtures::sample()));
        let datasets = JobsCleaner::new(ctx).clean().unwrap();
        assert_eq!(datasets.len(), 1);

        let rows = jobs(&datasets, ADZUNA_DATASET);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].source.as_deref(), Some("adzuna"));
        assert_eq!(rows[0].country_normalized.as_deref(), Some("FR"));
        assert_eq!(rows[0].region.as_deref(), Some("Île-de-France"));
        assert_eq!(rows[0].skills_normalized, vec!["Python", "JavaScript"]);
        assert_eq!(rows[0].salary_eur_avg, Some(50000.0));
        assert_eq!(rows[0].source_type, "job_board");
        assert!(rows[0].extra_json.get("description_excerpt").is_some());

        assert_eq!(rows[1].salary_eur_min, Some(46000.0));
        assert_eq!(rows[1].salary_eur_max, None);
        assert_eq!(rows[1].salary_eur_avg, None);
        assert!(rows[1].skills_normalized.is_empty());
        assert_eq!(rows[1].match_method, None);
    }

    #[test]
    fn test_glassdoor_columns_are_harmonized() {
        let dir = tempdir().unwrap();
        let glassdoor = dir.path().join("glassdoor");
        fs::create_dir_all(&glassdoor).unwrap();
        fs::write(
            glassdoor.join("glassdoor_tech_jobs_europe.csv"),
            "id,source,job_title,company,location,country_code,skills\n\
             g1,glassdoor_europe,Data Engineer,Criteo,Lyon,France,sql;python\n",
        )
        .unwrap();

        let ctx = CleanerContext::new(dir.path(), Arc::new(fixtures::sample()));
        let datasets = JobsCleaner::new(ctx).clean().unwrap();
        let rows = jobs(&datasets, GLASSDOOR_DATASET);
        assert_eq!(rows[0].title.as_deref(), Some("Data Engineer"));
        assert_eq!(rows[0].country.as_deref(), Some("France"));
        assert_eq!(rows[0].country_normalized.as_deref(), Some("FR"));
        assert_eq!(rows[0].region.as_deref(), Some("Auvergne-Rhône-Alpes"));
        assert_eq!(rows[0].skills_normalized, vec!["SQL", "Python"]);
        assert_eq!(rows[0].source.as_deref(), Some("glassdoor_europe"));
    }

    #[test]
    fn test_missing_directories_yield_nothing() {
        let dir = tempdir().unwrap();
        let ctx = CleanerContext::new(dir.path(), Arc::new(fixtures::sample()));
        assert!(JobsCleaner::new(ctx).clean().unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_postings_across_files_are_removed() {
        let dir = tempdir().unwrap();
        let adzuna = dir.path().join("adzuna");
        fs::create_dir_all(&adzuna).unwrap();
        let body = "id,title,company,country\n7,Dev,Acme,FR\n";
        fs::write(adzuna.join("a.csv"), body).unwrap();
        fs::write(adzuna.join("b.csv"), body).unwrap();

        let ctx = CleanerContext::new(dir.path(), Arc::new(fixtures::sample()));
        let rows = jobs(&JobsCleaner::new(ctx).clean().unwrap(), ADZUNA_DATASET);
        assert_eq!(rows.len(), 1);
    }
}
