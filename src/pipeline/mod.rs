// Cleaning pipeline: ingestion, processing, storage, and the orchestrator tying them together

pub mod ingestion;
pub mod orchestrator;
pub mod processing;
pub mod storage;

pub use orchestrator::{
    apply_validation_gate, DatasetReport, GateStats, Pipeline, RunReport, SourceReport,
};
