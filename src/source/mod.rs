//! Source readers
//!
//! Normalizes JSON arrays, JSON lines and YAML sequences into one lazy stream
//! of untyped [`Record`]s. Records never leave the loader untyped.

pub mod format;
pub mod reader;

pub use format::SourceFormat;
pub use reader::{read_records, RecordReader};

/// Raw field map of one scraped item
pub type Record = serde_json::Map<String, serde_json::Value>;
