//! Single-value normalizers shared by every cleaner.
//!
//! All of them are total: any input, including null and garbage, yields a value
//! (possibly null or empty) and never an error.

pub mod location;
pub mod salary;
pub mod skills;

pub use location::{extract_region_from_location, region_for_location, region_from_postal_code};
pub use salary::{exchange_rate, normalize_salary};
pub use skills::{normalize_skills_list, parse_list_literal};

use crate::pipeline::processing::dictionaries::Dictionaries;

/// Canonical technology name, or the input unchanged when the dictionary has no entry.
pub fn normalize_technology(dicts: &Dictionaries, value: Option<&str>) -> Option<String> {
    let value = value?;
    Some(
        dicts
            .technology(value)
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()),
    )
}

/// ISO-2 country code, or the input unchanged when the dictionary has no entry.
pub fn normalize_country(dicts: &Dictionaries, value: Option<&str>) -> Option<String> {
    let value = value?;
    Some(
        dicts
            .country(value)
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()),
    )
}

// "java " keeps a trailing space so it does not match "javascript"
const KEYWORD_PATTERNS: &[(&str, &str)] = &[
    ("python", "Python"),
    ("javascript", "JavaScript"),
    ("java ", "Java"),
    ("typescript", "TypeScript"),
    ("react", "React"),
    ("angular", "Angular"),
    ("vue", "Vue.js"),
    ("docker", "Docker"),
    ("kubernetes", "Kubernetes"),
    ("aws", "AWS"),
    ("azure", "Azure"),
];

/// Technology named by a search keyword such as "Python programming".
///
/// First matching pattern wins; keywords naming no known technology come back unchanged.
pub fn technology_from_keyword(value: Option<&str>) -> Option<String> {
    let value = value?;
    let lowered = value.to_lowercase();
    let tech = KEYWORD_PATTERNS
        .iter()
        .find(|(pattern, _)| lowered.contains(pattern))
        .map(|(_, tech)| tech.to_string());
    Some(tech.unwrap_or_else(|| value.to_string()))
}
