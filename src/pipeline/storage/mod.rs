//! Where cleaned tables end up.

pub mod in_memory;
pub mod parquet_out;

pub use in_memory::InMemoryArtifactStore;
pub use parquet_out::{OutputCompression, ParquetArtifactStore};

use crate::error::Result;
use crate::types::Table;

/// Persists one table per artifact name, replacing any previous version.
pub trait ArtifactStore: Send + Sync {
    /// Write `table` under `table.name` and return where it went.
    fn write_table(&self, table: &Table) -> Result<String>;

    fn name(&self) -> &str;
}
