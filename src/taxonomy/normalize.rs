use std::cmp::Ordering;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Canonical form of a column label: accents removed, whitespace collapsed,
/// trimmed and lowercased.
pub fn normalize_header(label: &str) -> String {
    strip_diacritics(&label.to_lowercase())
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Accent- and case-insensitive form used for keyword matching.
pub fn fold_text(input: &str) -> String {
    strip_diacritics(&input.to_lowercase()).trim().to_string()
}

/// Lowercased and NFC-composed, so `ñ` stays a single distinct character.
pub fn lower_composed(input: &str) -> String {
    input.nfc().collect::<String>().to_lowercase().trim().to_string()
}

fn strip_diacritics(input: &str) -> String {
    input.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Locale-style ordering for display names.
///
/// Letters compare first without accents or case, then accents break ties,
/// then case with lowercase sorting ahead of uppercase.
pub fn collate(left: &str, right: &str) -> Ordering {
    fold_text(left)
        .cmp(&fold_text(right))
        .then_with(|| left.to_lowercase().cmp(&right.to_lowercase()))
        .then_with(|| case_key(left).cmp(&case_key(right)))
}

fn case_key(input: &str) -> Vec<bool> {
    input.chars().map(char::is_uppercase).collect()
}
