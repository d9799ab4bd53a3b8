use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{CleanerError, Result};

/// One company from the national business registry.
///
/// Only `company_name` is required; exports often carry a subset of the other columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    #[serde(default)]
    pub siret: String,
    #[serde(default)]
    pub siren: String,
    pub company_name: String,
    #[serde(default)]
    pub activity: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub status: String,
}

/// Upper-cased registry name with the data the pruned strategy filters on.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub name: String,
    pub char_len: usize,
}

/// The registry with its lookup indexes built once at load time.
#[derive(Debug, Clone)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
    identifiers: HashSet<String>,
    names: HashSet<String>,
    candidates: Vec<Candidate>,
}

impl Registry {
    pub fn from_entries(entries: Vec<RegistryEntry>) -> Self {
        let identifiers = entries
            .iter()
            .map(|e| e.siret.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let candidates: Vec<Candidate> = entries
            .iter()
            .map(|e| normalize_name(&e.company_name))
            .filter(|n| !n.is_empty())
            .map(|name| Candidate {
                char_len: name.chars().count(),
                name,
            })
            .collect();
        let names = candidates.iter().map(|c| c.name.clone()).collect();
        Self {
            entries,
            identifiers,
            names,
            candidates,
        }
    }

    /// Read the registry CSV, seeding it with the bundled sample first when the file is absent.
    pub fn load_or_seed(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Registry file not found, writing bundled sample to {}", path.display());
            write_seed(path)?;
        }
        let registry = Self::read(path)?;
        info!("Company registry loaded: {} companies", registry.len());
        Ok(registry)
    }

    /// Rows the parser rejects are skipped with a warning. A file without a
    /// `company_name` column is a load error.
    pub fn read(path: &Path) -> Result<Self> {
        let load_error = |e: &dyn std::fmt::Display| {
            CleanerError::RegistryLoad(format!("{}: {}", path.display(), e))
        };
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_path(path)
            .map_err(|e| load_error(&e))?;

        let has_name_column = reader
            .headers()
            .map_err(|e| load_error(&e))?
            .iter()
            .any(|h| h == "company_name");
        if !has_name_column {
            return Err(load_error(&"missing company_name column"));
        }

        let mut entries = Vec::new();
        for (line, record) in reader.deserialize::<RegistryEntry>().enumerate() {
            match record {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!("Skipping registry row {} in {}: {}", line + 1, path.display(), e),
            }
        }
        Ok(Self::from_entries(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn has_identifier(&self, siret: &str) -> bool {
        self.identifiers.contains(siret.trim())
    }

    /// `name` must already be normalized with [`normalize_name`].
    pub fn has_name(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }
}

/// Names are compared upper-cased and trimmed.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Write the bundled sample registry to `path`, creating parent directories.
pub fn write_seed(path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut writer = csv::Writer::from_path(path)?;
    let entries = seed_entries();
    for entry in &entries {
        writer.serialize(entry)?;
    }
    writer.flush()?;
    info!("Seed registry written: {} companies -> {}", entries.len(), path.display());
    Ok(entries.len())
}

// siret, siren, company_name, activity, postal_code, city
const SEED: &[(&str, &str, &str, &str, &str, &str)] = &[
    ("55208011100074", "552080111", "GOOGLE FRANCE", "Programmation informatique", "75009", "PARIS"),
    ("40940375800014", "409403758", "MICROSOFT FRANCE SAS", "Édition de logiciels systèmes et de réseaux", "92130", "ISSY-LES-MOULINEAUX"),
    ("38980804500139", "389808045", "AMAZON FRANCE LOGISTIQUE", "Entreposage et stockage non frigorifique", "13127", "VITROLLES"),
    ("44906648600025", "449066486", "NETFLIX SERVICES FRANCE", "Télécommunications sans fil", "75009", "PARIS"),
    ("41397989900024", "413979899", "FACEBOOK FRANCE", "Programmation informatique", "75008", "PARIS"),
    ("50323801600015", "503238016", "APPLE RETAIL FRANCE", "Commerce de détail d'ordinateurs", "75001", "PARIS"),
    ("31702404700056", "317024047", "CAPGEMINI FRANCE", "Conseil en systèmes et logiciels informatiques", "92130", "ISSY-LES-MOULINEAUX"),
    ("30227244400095", "302272444", "ATOS", "Conseil en systèmes et logiciels informatiques", "78340", "LES CLAYES-SOUS-BOIS"),
    ("34253609500016", "342536095", "THALES", "Fabrication d'équipements de communication", "92700", "COLOMBES"),
    ("55208465700034", "552084657", "DASSAULT SYSTEMES", "Édition de logiciels applicatifs", "78140", "VELIZY-VILLACOUBLAY"),
    ("31308027700041", "313080277", "SOPRA STERIA GROUP", "Conseil en systèmes et logiciels informatiques", "94250", "GENTILLY"),
    ("32229776300058", "322297763", "WORLDLINE", "Traitement de données, hébergement et activités connexes", "92600", "ASNIERES-SUR-SEINE"),
    ("50482725900035", "504827259", "AIRBUS FRANCE", "Construction aéronautique et spatiale", "31700", "BLAGNAC"),
    ("77561009900058", "775610099", "AIRBUS HELICOPTERS", "Construction aéronautique et spatiale", "13725", "MARIGNANE"),
    ("31702549800061", "317025498", "SAFRAN", "Fabrication d'équipements aéronautiques", "75009", "PARIS"),
    ("50220705600103", "502207056", "UBISOFT ENTERTAINMENT", "Édition de jeux électroniques", "93200", "SAINT-DENIS"),
    ("40936316900028", "409363169", "GAMELOFT", "Édition de jeux électroniques", "75012", "PARIS"),
    ("43830762800057", "438307628", "CRITEO", "Programmation informatique", "75002", "PARIS"),
    ("48218993900025", "482189939", "MUREX", "Programmation informatique", "75015", "PARIS"),
    ("80055408700028", "800554087", "BLABLACAR", "Programmation informatique", "75020", "PARIS"),
    ("81493898700010", "814938987", "DOCTOLIB", "Programmation informatique", "75010", "PARIS"),
    ("38012986800010", "380129868", "ORANGE", "Télécommunications filaires", "92320", "CHATILLON"),
    ("44332822500013", "443328225", "SFR", "Télécommunications sans fil", "92100", "BOULOGNE-BILLANCOURT"),
    ("42193886200034", "421938862", "BOUYGUES TELECOM", "Télécommunications sans fil", "92100", "BOULOGNE-BILLANCOURT"),
    ("32026101300090", "320261013", "ACCENTURE", "Conseil en systèmes et logiciels informatiques", "92930", "PARIS LA DEFENSE"),
    ("30112308000168", "301123080", "IBM FRANCE", "Conseil en systèmes et logiciels informatiques", "92000", "NANTERRE"),
    ("31257080400018", "312570804", "CGI FRANCE", "Conseil en systèmes et logiciels informatiques", "78140", "VELIZY-VILLACOUBLAY"),
    ("57650216600012", "576502166", "ALTEN", "Ingénierie, études techniques", "92100", "BOULOGNE-BILLANCOURT"),
    ("53432067100039", "534320671", "DATAIKU", "Programmation informatique", "75013", "PARIS"),
    ("81302636700024", "813026367", "CONTENTSQUARE", "Programmation informatique", "75002", "PARIS"),
    ("75294552800018", "752945528", "MIRAKL", "Programmation informatique", "75009", "PARIS"),
];

/// The bundled sample of French tech employers.
pub fn seed_entries() -> Vec<RegistryEntry> {
    SEED.iter()
        .map(|(siret, siren, name, activity, postal_code, city)| RegistryEntry {
            siret: siret.to_string(),
            siren: siren.to_string(),
            company_name: name.to_string(),
            activity: activity.to_string(),
            postal_code: postal_code.to_string(),
            city: city.to_string(),
            status: "Actif".to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_seed_round_trips_through_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dictionaries").join("sirene_sample.csv");

        let registry = Registry::load_or_seed(&path).unwrap();
        assert!(path.exists());
        assert_eq!(registry.len(), seed_entries().len());
        assert!(registry.has_name("GOOGLE FRANCE"));
        assert!(registry.has_identifier("55208011100074"));
        // leading zeros and long identifiers survive as text
        assert_eq!(registry.entries()[0].postal_code, "75009");
    }

    #[test]
    fn test_existing_file_is_not_overwritten() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("registry.csv");
        fs::write(
            &path,
            "siret,siren,company_name,activity,postal_code,city,status\n\
             1,2,  Acme Corp ,Software,01000,BOURG,Actif\n",
        )
        .unwrap();

        let registry = Registry::load_or_seed(&path).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.has_name("ACME CORP"));
        assert_eq!(registry.candidates()[0].char_len, 9);
    }

    #[test]
    fn test_malformed_registry_is_a_load_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("registry.csv");
        fs::write(&path, "name\nAcme\n").unwrap();
        assert!(matches!(Registry::read(&path), Err(CleanerError::RegistryLoad(_))));
    }

    #[test]
    fn test_minimal_export_loads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("registry.csv");
        fs::write(&path, "siret,company_name\n55208011100074,GOOGLE FRANCE\n").unwrap();

        let registry = Registry::read(&path).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.has_name("GOOGLE FRANCE"));
        assert!(registry.has_identifier("55208011100074"));
        assert_eq!(registry.entries()[0].status, "");
    }

    #[test]
    fn test_ragged_rows_do_not_drop_the_registry() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("registry.csv");
        fs::write(
            &path,
            "siret,siren,company_name,activity,postal_code,city,status\n\
             55208011100074,552080111,GOOGLE FRANCE,Programmation informatique,75009,PARIS,Actif\n\
             81493898700010,814938987,DOCTOLIB\n\
             1,2\n",
        )
        .unwrap();

        let registry = Registry::read(&path).unwrap();
        // the short row keeps its name, the row without one is skipped
        assert_eq!(registry.len(), 2);
        assert!(registry.has_name("GOOGLE FRANCE"));
        assert!(registry.has_name("DOCTOLIB"));
        assert!(registry.has_identifier("81493898700010"));
        assert_eq!(registry.entries()[1].city, "");
    }
}
