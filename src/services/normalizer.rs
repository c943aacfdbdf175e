//! Device name normalization
//!
//! FHEM names are identifiers (`WZ_DeckenLicht`, `bath.HeaterValve`), speech
//! is lower-case words. Normalizing splits identifiers at case and
//! punctuation boundaries so both sides compare as token sequences.

use once_cell::sync::Lazy;
use regex::Regex;

/// Uppercase-led word following any character: `fooBar` -> `foo_Bar`,
/// `HTTPServer` -> `HTTP_Server`
static WORD_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(.)([A-Z][a-z]+)").expect("static regex"));

/// Uppercase following lowercase or digit: `lamp2Left` -> `lamp2_Left`
static CASE_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("static regex"));

/// Canonicalize a raw identifier or alias into space-separated lower-case tokens
pub fn normalize(raw: &str) -> String {
    let split = WORD_BOUNDARY.replace_all(raw, "${1}_${2}");
    let split = CASE_BOUNDARY.replace_all(&split, "${1}_${2}");

    split
        .to_lowercase()
        .replace(['_', '-', '.'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalized tokens of a raw name
pub fn tokens(raw: &str) -> Vec<String> {
    normalize(raw).split(' ').filter(|t| !t.is_empty()).map(str::to_string).collect()
}
