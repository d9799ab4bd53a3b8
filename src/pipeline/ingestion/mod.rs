// Raw extract ingestion: file discovery, CSV reading, and the untyped working table

pub mod raw_table;
pub mod reader;

pub use raw_table::{RawRecord, RawTable};
pub use reader::{discover_files, infer_cell, read_csv, read_tagged, TaggedTable};
