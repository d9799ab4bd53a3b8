// Pipeline processing: per-source cleaning, normalization, deduplication and company validation

pub mod cleaners;
pub mod dedup;
pub mod dictionaries;
pub mod normalize;
pub mod validation;
