// ============================================================
// PARSER CONFIGURATION
// ============================================================
// Trial lists and offsets used by the robust report parser

use serde::{Deserialize, Serialize};

/// Configuration for report parsing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Encoding labels tried in order after BOM sniffing
    /// (WHATWG labels: "latin1", "cp1252" and "iso-8859-1" all mean windows-1252)
    pub encodings: Vec<String>,

    /// Delimiters tried in order for each decoded candidate
    pub delimiters: Vec<char>,

    /// Number of leading rows scanned for a header signature (default: 10)
    pub header_scan_rows: usize,

    /// Header row assumed when no signature matches (default: 2). Blank rows
    /// are already dropped, so this is the row after the Created/Site preamble
    pub fallback_header_row: usize,

    /// Number of leading rows scanned for Created:/Site: lines (default: 5)
    pub metadata_scan_rows: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            encodings: vec![
                "utf-8".to_string(),
                "utf-16le".to_string(),
                "utf-16be".to_string(),
                "windows-1252".to_string(),
            ],
            delimiters: vec!['\t', ',', ';', '|'],
            header_scan_rows: 10,
            fallback_header_row: 2,
            metadata_scan_rows: 5,
        }
    }
}

impl ParserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.encodings.is_empty() {
            return Err("encodings must not be empty".to_string());
        }
        if let Some(label) = self
            .encodings
            .iter()
            .find(|label| encoding_rs::Encoding::for_label(label.trim().as_bytes()).is_none())
        {
            return Err(format!("unknown encoding label: {}", label));
        }
        if self.delimiters.is_empty() {
            return Err("delimiters must not be empty".to_string());
        }
        if let Some(d) = self.delimiters.iter().find(|d| !d.is_ascii()) {
            return Err(format!("delimiter {:?} is not a single-byte character", d));
        }
        if self.header_scan_rows == 0 {
            return Err("header_scan_rows must be > 0".to_string());
        }
        Ok(())
    }
}
