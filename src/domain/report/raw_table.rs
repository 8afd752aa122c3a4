use serde::{Deserialize, Serialize};

/// A grid of string cells read from an uploaded file, before any header is known
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTable {
    /// Non-blank rows in file order
    pub rows: Vec<Vec<String>>,

    /// Encoding name that produced the rows ("xlsx" etc. for workbooks)
    pub encoding: String,

    /// Delimiter for delimited text, none for workbooks
    pub delimiter: Option<char>,
}

impl RawTable {
    pub fn new(rows: Vec<Vec<String>>, encoding: impl Into<String>, delimiter: Option<char>) -> Self {
        Self {
            rows,
            encoding: encoding.into(),
            delimiter,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Width of the widest row
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|r| r.len()).max().unwrap_or(0)
    }

    /// First cell of a row, empty when the row has none
    pub fn first_cell(&self, index: usize) -> &str {
        self.rows
            .get(index)
            .and_then(|row| row.first())
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    /// A table is usable when it has more than one column and at least one row
    pub fn is_usable(&self) -> bool {
        self.column_count() > 1 && !self.rows.is_empty()
    }
}
