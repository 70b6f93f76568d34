//! Fileproof - Input format selection
//!
//! Decides whether a file is validated as delimited text or as a JSON document.

use serde::Serialize;
use std::path::Path;

/// Supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// Delimited text (CSV, TSV, pipe, semicolon, ...), first line is the header
    Delimited,
    /// A single JSON document
    Json,
}

impl InputFormat {
    /// Detect format from file extension
    pub fn detect<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => InputFormat::Json,
            _ => InputFormat::Delimited, // csv, tsv, txt, dat, ...
        }
    }

    /// Parse format from string (for CLI)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "delimited" | "csv" | "tsv" | "txt" | "dat" => Some(InputFormat::Delimited),
            "json" => Some(InputFormat::Json),
            "auto" => None, // Caller should use detect()
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InputFormat::Delimited => "Delimited",
            InputFormat::Json => "JSON",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_format() {
        assert_eq!(InputFormat::detect("data.csv"), InputFormat::Delimited);
        assert_eq!(InputFormat::detect("data.tsv"), InputFormat::Delimited);
        assert_eq!(InputFormat::detect("data.dat"), InputFormat::Delimited);
        assert_eq!(InputFormat::detect("data.json"), InputFormat::Json);
        assert_eq!(InputFormat::detect("DATA.JSON"), InputFormat::Json);
        assert_eq!(InputFormat::detect("data"), InputFormat::Delimited); // No extension
    }

    #[test]
    fn test_parse() {
        assert_eq!(InputFormat::parse("csv"), Some(InputFormat::Delimited));
        assert_eq!(InputFormat::parse("JSON"), Some(InputFormat::Json));
        assert_eq!(InputFormat::parse("auto"), None);
        assert_eq!(InputFormat::parse("parquet"), None);
    }
}
