use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{CleanerError, Result};

pub const TECH_MAPPING_FILE: &str = "tech_mapping.json";
pub const COUNTRIES_FILE: &str = "countries.json";
pub const REGIONS_FILE: &str = "regions.json";

/// Lookup tables shared read-only by every cleaner.
///
/// Keys are stored lower-cased and trimmed so lookups only need to normalize the probe.
#[derive(Debug, Clone, Default)]
pub struct Dictionaries {
    technologies: HashMap<String, String>,
    countries: HashMap<String, String>,
    regions: HashMap<String, String>,
}

impl Dictionaries {
    /// Load the three dictionaries from `dir`. Any missing or malformed file is fatal.
    pub fn load(dir: &Path) -> Result<Self> {
        let dictionaries = Self::from_maps(
            load_map(dir, TECH_MAPPING_FILE)?,
            load_map(dir, COUNTRIES_FILE)?,
            load_map(dir, REGIONS_FILE)?,
        );
        info!(
            technologies = dictionaries.technologies.len(),
            countries = dictionaries.countries.len(),
            regions = dictionaries.regions.len(),
            "Dictionaries loaded from {}",
            dir.display()
        );
        Ok(dictionaries)
    }

    pub fn from_maps(
        technologies: HashMap<String, String>,
        countries: HashMap<String, String>,
        regions: HashMap<String, String>,
    ) -> Self {
        Self {
            technologies: normalize_keys(technologies),
            countries: normalize_keys(countries),
            regions: normalize_keys(regions),
        }
    }

    pub fn technology(&self, key: &str) -> Option<&str> {
        self.technologies.get(&lookup_key(key)).map(String::as_str)
    }

    pub fn country(&self, key: &str) -> Option<&str> {
        self.countries.get(&lookup_key(key)).map(String::as_str)
    }

    pub fn region(&self, key: &str) -> Option<&str> {
        self.regions.get(&lookup_key(key)).map(String::as_str)
    }
}

fn lookup_key(key: &str) -> String {
    key.trim().to_lowercase()
}

fn normalize_keys(map: HashMap<String, String>) -> HashMap<String, String> {
    map.into_iter().map(|(k, v)| (lookup_key(&k), v)).collect()
}

fn load_map(dir: &Path, file: &str) -> Result<HashMap<String, String>> {
    let path = dir.join(file);
    let content = fs::read_to_string(&path).map_err(|e| CleanerError::DictionaryLoad {
        name: file.to_string(),
        message: format!("{}: {}", path.display(), e),
    })?;
    serde_json::from_str(&content).map_err(|e| CleanerError::DictionaryLoad {
        name: file.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Small dictionaries used across unit tests.
    pub fn sample() -> Dictionaries {
        Dictionaries::from_maps(
            map(&[
                ("python", "Python"),
                ("py", "Python"),
                ("js", "JavaScript"),
                ("javascript", "JavaScript"),
                ("sql", "SQL"),
                ("golang", "Go"),
                ("k8s", "Kubernetes"),
            ]),
            map(&[
                ("france", "FR"),
                ("fr", "FR"),
                ("germany", "DE"),
                ("de", "DE"),
                ("gb", "GB"),
                ("united kingdom", "GB"),
            ]),
            map(&[("75", "Île-de-France"), ("69001", "Auvergne-Rhône-Alpes")]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_lookup_is_case_and_space_insensitive() {
        let dicts = fixtures::sample();
        assert_eq!(dicts.technology("  PY "), Some("Python"));
        assert_eq!(dicts.country("France"), Some("FR"));
        assert_eq!(dicts.technology("cobol"), None);
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(TECH_MAPPING_FILE), r#"{"Py": "Python"}"#).unwrap();
        fs::write(dir.path().join(COUNTRIES_FILE), r#"{"france": "FR"}"#).unwrap();
        fs::write(dir.path().join(REGIONS_FILE), r#"{"75": "Île-de-France"}"#).unwrap();

        let dicts = Dictionaries::load(dir.path()).unwrap();
        assert_eq!(dicts.technology("py"), Some("Python"));
        assert_eq!(dicts.region("75"), Some("Île-de-France"));
    }

    #[test]
    fn test_missing_dictionary_is_fatal() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(TECH_MAPPING_FILE), "{}").unwrap();

        let err = Dictionaries::load(dir.path()).unwrap_err();
        match err {
            CleanerError::DictionaryLoad { name, .. } => assert_eq!(name, COUNTRIES_FILE),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_dictionary_is_fatal() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(TECH_MAPPING_FILE), "[1, 2").unwrap();
        assert!(matches!(
            Dictionaries::load(dir.path()),
            Err(CleanerError::DictionaryLoad { .. })
        ));
    }
}
