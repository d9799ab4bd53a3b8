use thiserror::Error;

#[derive(Error, Debug)]
pub enum CleanerError {
    #[error("CSV read failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Parquet write failed: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load dictionary '{name}': {message}")]
    DictionaryLoad { name: String, message: String },

    #[error("Failed to load company registry: {0}")]
    RegistryLoad(String),

    #[error("Missing input: {0}")]
    MissingInput(String),
}

pub type Result<T> = std::result::Result<T, CleanerError>;
