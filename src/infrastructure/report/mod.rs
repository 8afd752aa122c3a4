// ============================================================
// REPORT INFRASTRUCTURE LAYER
// ============================================================
// Encoding detection, table reading and cell coercion

mod decoder;
mod table_reader;
pub mod values;

pub use decoder::{decode_candidates, DecodedText};
pub use table_reader::{FileKind, TableReader};
