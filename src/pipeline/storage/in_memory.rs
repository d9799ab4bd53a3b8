use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

use super::ArtifactStore;
use crate::error::Result;
use crate::types::Table;

/// In-memory artifact store for tests and dry runs
#[derive(Clone, Default)]
pub struct InMemoryArtifactStore {
    tables: Arc<Mutex<HashMap<String, Table>>>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Table> {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Artifact names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn write_table(&self, table: &Table) -> Result<String> {
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        tables.insert(table.name.clone(), table.clone());
        debug!("Stored table {} ({} rows) in memory", table.name, table.len());
        Ok(format!("memory://{}", table.name))
    }

    fn name(&self) -> &str {
        "in_memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellValue;

    #[test]
    fn test_write_replaces_previous_version() {
        let store = InMemoryArtifactStore::new();
        let mut table = Table::new("jobs_clean", vec!["title".to_string()]);
        table.rows.push(vec![CellValue::Text("Dev".into())]);
        assert_eq!(store.write_table(&table).unwrap(), "memory://jobs_clean");

        table.rows.push(vec![CellValue::Null]);
        store.write_table(&table).unwrap();

        assert_eq!(store.names(), vec!["jobs_clean"]);
        assert_eq!(store.get("jobs_clean").unwrap().len(), 2);
        assert!(store.get("missing").is_none());
    }
}
