use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// One JSON array holding every record
    Json,
    /// Newline-delimited JSON objects
    JsonLines,
    /// A YAML sequence of mappings
    Yaml,
}

impl SourceFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::Json => "json",
            SourceFormat::JsonLines => "jsonl",
            SourceFormat::Yaml => "yaml",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Some(SourceFormat::Json),
            "jl" | "jsonl" => Some(SourceFormat::JsonLines),
            "yaml" | "yml" => Some(SourceFormat::Yaml),
            _ => None,
        }
    }

    /// Detect the format from the file extension; anything unknown is a JSON array
    pub fn from_path(path: &Path) -> Self {
        extension(path)
            .and_then(|ext| Self::from_str(&ext))
            .unwrap_or(SourceFormat::Json)
    }
}

/// Lower-cased file extension without the dot
pub fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}
