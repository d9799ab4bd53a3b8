/// Source names used on the command line and in run reports.
pub const JOBS_SOURCE: &str = "jobs";
pub const GITHUB_SOURCE: &str = "github";
pub const TRENDS_SOURCE: &str = "trends";
pub const SURVEYS_SOURCE: &str = "surveys";

// Raw extract directories under `<data_root>/raw`
pub const ADZUNA_DIR: &str = "adzuna";
pub const GLASSDOOR_DIR: &str = "glassdoor";
pub const GITHUB_DIR: &str = "github";
pub const GOOGLE_TRENDS_DIR: &str = "google_trends";
pub const KAGGLE_DIR: &str = "kaggle";
pub const STACKOVERFLOW_DIR: &str = "stackoverflow";

// Dataset names; artifacts are written as `<name>_clean`
pub const ADZUNA_DATASET: &str = "adzuna_jobs";
pub const GLASSDOOR_DATASET: &str = "glassdoor_jobs";
pub const LANGUAGE_STATS_DATASET: &str = "github_language_stats";
pub const TRENDING_REPOS_DATASET: &str = "github_trending_repos";
pub const TECH_COMPARISONS_DATASET: &str = "tech_comparisons";
pub const COUNTRY_TRENDS_DATASET: &str = "country_trends";
pub const KAGGLE_EUROPE_DATASET: &str = "kaggle_europe";
pub const KAGGLE_RAW_DATASET: &str = "kaggle_raw";
pub const STACKOVERFLOW_DATASET: &str = "stackoverflow";
pub const JOBS_CONSOLIDATED_ARTIFACT: &str = "jobs_consolidated_clean";

// source_type values
pub const JOB_BOARD_SOURCE_TYPE: &str = "job_board";
pub const SURVEY_SOURCE_TYPE: &str = "survey_data";

/// Columns shared by every job board that make up the consolidated jobs artifact.
pub const CONSOLIDATED_JOB_COLUMNS: &[&str] = &[
    "title",
    "company",
    "location",
    "country_normalized",
    "region",
    "skills_normalized",
    "salary_eur_avg",
    "source",
    "source_type",
    "processed_at",
    "is_verified_company",
    "match_score",
    "match_method",
];

/// Get all supported source names, in the order the pipeline runs them
pub fn get_supported_sources() -> Vec<&'static str> {
    vec![JOBS_SOURCE, GITHUB_SOURCE, TRENDS_SOURCE, SURVEYS_SOURCE]
}

/// Parse a comma-separated source list from the command line.
pub fn parse_source_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source_list() {
        assert_eq!(
            parse_source_list(" Jobs, github,,trends "),
            vec!["jobs", "github", "trends"]
        );
        assert!(parse_source_list("").is_empty());
    }
}
