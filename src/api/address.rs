use regex::Regex;
use std::sync::LazyLock;

/// Tokens that mean something in incident records but throw geocoders off:
/// travel-direction suffixes and the service-road abbreviation.
static NOISE_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:NB|SB|EB|WB|Svrd|SVRD)\b").expect("valid regex"));

/// Cleans a raw record address for geocoding.
///
/// Only whole tokens are removed; `EBBandFlow` keeps its `EB`. Whitespace
/// is collapsed. If nothing but noise remains, the trimmed input is
/// returned so the result is empty only for empty input.
pub fn filter_address(raw: &str) -> String {
    let stripped = NOISE_TOKEN_RE.replace_all(raw, " ");
    let cleaned = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    if cleaned.is_empty() {
        raw.trim().to_string()
    } else {
        cleaned
    }
}
