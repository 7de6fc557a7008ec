// Header and cell text normalization shared by the layout detectors.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Remove diacritics: decompose (NFD) and drop combining marks.
/// `"DESCRIÇÃO"` → `"DESCRICAO"`.
pub fn strip_diacritics(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Header key for alias matching: no diacritics, lowercase, trimmed,
/// whitespace runs collapsed to a single space.
pub fn header_key(s: &str) -> String {
    collapse_spaces(&strip_diacritics(s).to_lowercase())
}

/// Header key for the official report: no diacritics, uppercase, trimmed.
pub fn header_key_upper(s: &str) -> String {
    strip_diacritics(s.trim()).to_uppercase()
}

fn collapse_spaces(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Reduce an occupation string to its bin identifier: the text after the
/// last `-`, or the whole trimmed value when there is no `-`.
///
/// `"2ZG-G61b"` → `"G61b"`.
pub fn extract_bin(occupation: &str) -> String {
    let trimmed = occupation.trim();
    match trimmed.rsplit_once('-') {
        Some((_, bin)) => bin.trim().to_string(),
        None => trimmed.to_string(),
    }
}
