// ============================================================
// ENCODING DETECTION
// ============================================================
// Turn raw upload bytes into candidate texts, most likely first

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE};

/// Bytes inspected when sniffing for UTF-16 without a BOM
const UTF16_SNIFF_BYTES: usize = 4096;

/// Share of code units that must have a zero high byte to look like UTF-16
const UTF16_ZERO_RATIO: f32 = 0.3;

/// Text decoded with a specific encoding
#[derive(Debug, Clone)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static Encoding,
}

/// Decode `bytes` with every plausible encoding in `labels`.
///
/// A byte-order mark decides the encoding outright. Without one, each label is
/// tried strictly (malformed input rejects the candidate) and duplicates are
/// skipped, so `latin1` and `cp1252` only produce one candidate.
pub fn decode_candidates(bytes: &[u8], labels: &[String]) -> Vec<DecodedText> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        match encoding.decode_without_bom_handling_and_without_replacement(&bytes[bom_len..]) {
            Some(text) => {
                tracing::debug!(encoding = encoding.name(), "Decoded using byte-order mark");
                return vec![DecodedText {
                    text: text.into_owned(),
                    encoding,
                }];
            }
            None => {
                tracing::warn!(
                    encoding = encoding.name(),
                    "Byte-order mark present but content is malformed, trying other encodings"
                );
            }
        }
    }

    let mut tried: Vec<&'static Encoding> = Vec::new();
    let mut candidates = Vec::new();

    for label in labels {
        let Some(encoding) = Encoding::for_label(label.trim().as_bytes()) else {
            tracing::warn!(label = %label, "Skipping unknown encoding label");
            continue;
        };
        if tried.contains(&encoding) {
            continue;
        }
        tried.push(encoding);

        if (encoding == UTF_16LE || encoding == UTF_16BE)
            && !looks_like_utf16(bytes, encoding == UTF_16LE)
        {
            continue;
        }

        match encoding.decode_without_bom_handling_and_without_replacement(bytes) {
            // NUL never appears in report text; it means UTF-16 read as a byte encoding
            Some(text) if text.contains('\0') => {
                tracing::debug!(encoding = encoding.name(), "Decoded text contains NUL, rejecting");
            }
            Some(text) => candidates.push(DecodedText {
                text: text.into_owned(),
                encoding,
            }),
            None => {
                tracing::debug!(encoding = encoding.name(), "Content is not valid in this encoding");
            }
        }
    }

    candidates
}

/// Heuristic: mostly-ASCII UTF-16 has a zero byte in every other position
fn looks_like_utf16(bytes: &[u8], little_endian: bool) -> bool {
    if bytes.len() < 2 || bytes.len() % 2 != 0 {
        return false;
    }

    let sample = &bytes[..bytes.len().min(UTF16_SNIFF_BYTES)];
    let units = sample.chunks_exact(2);
    let total = units.len();
    let zero_high = units
        .filter(|unit| {
            let (low, high) = if little_endian {
                (unit[0], unit[1])
            } else {
                (unit[1], unit[0])
            };
            high == 0 && low != 0
        })
        .count();

    zero_high as f32 / total as f32 > UTF16_ZERO_RATIO
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<String> {
        ["utf-8", "utf-16le", "utf-16be", "windows-1252"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn utf16le(text: &str, bom: bool) -> Vec<u8> {
        let mut bytes = if bom { vec![0xFF, 0xFE] } else { Vec::new() };
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn test_plain_ascii_prefers_utf8() {
        let candidates = decode_candidates(b"Word,Pages\nteh,3", &labels());
        assert_eq!(candidates[0].encoding, encoding_rs::UTF_8);
        // windows-1252 is always a fallback candidate
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn test_utf8_bom_wins() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("Wörd,Pages".as_bytes());
        let candidates = decode_candidates(&bytes, &labels());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].text, "Wörd,Pages");
    }

    #[test]
    fn test_utf16_with_bom() {
        let candidates = decode_candidates(&utf16le("Word\tPages", true), &labels());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].encoding, UTF_16LE);
        assert_eq!(candidates[0].text, "Word\tPages");
    }

    #[test]
    fn test_utf16_without_bom_is_sniffed() {
        let candidates = decode_candidates(&utf16le("Word\tPages\nteh\t3", false), &labels());
        assert_eq!(candidates[0].encoding, UTF_16LE);
        assert_eq!(candidates[0].text, "Word\tPages\nteh\t3");
    }

    #[test]
    fn test_latin1_fallback() {
        // "café" in windows-1252 is not valid UTF-8
        let bytes = b"Word,Pages\ncaf\xe9,2";
        let candidates = decode_candidates(bytes, &labels());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].encoding, encoding_rs::WINDOWS_1252);
        assert!(candidates[0].text.contains("café"));
    }

    #[test]
    fn test_duplicate_labels_collapse() {
        let labels: Vec<String> = ["latin1", "cp1252", "iso-8859-1"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(decode_candidates(b"a,b", &labels).len(), 1);
    }
}
