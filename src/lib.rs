pub mod config;
pub mod constants;
pub mod error;
pub mod observability;
pub mod pipeline;
pub mod types;

// Cleaned record shapes shared across layers
pub mod domain;
