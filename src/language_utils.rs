//! Language utilities for locale tags
//!
//! Locale tags coming from the content store look like `fr`, `fr-FR` or `pt_BR`. The
//! primary subtag is an ISO 639-1 or ISO 639-2 code; these helpers normalize it and
//! resolve human readable names for translation prompts.

use anyhow::{Result, anyhow};
use isolang::Language;

/// ISO 639-2/B codes that differ from their 639-2/T counterpart
const BIBLIOGRAPHIC_CODES: [(&str, &str); 18] = [
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Split a locale tag into its language code and optional region
pub fn split_tag(tag: &str) -> (&str, Option<&str>) {
    let tag = tag.trim();
    match tag.split_once(['-', '_']) {
        Some((language, region)) if !region.is_empty() => (language, Some(region)),
        Some((language, _)) => (language, None),
        None => (tag, None),
    }
}

/// Normalize the language of a code or locale tag to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let (language, _) = split_tag(code);
    let normalized_code = language.to_lowercase();

    match normalized_code.len() {
        2 => {
            if let Some(lang) = Language::from_639_1(&normalized_code) {
                return Ok(lang.to_639_3().to_string());
            }
        }
        3 => {
            if Language::from_639_3(&normalized_code).is_some() {
                return Ok(normalized_code);
            }
            if let Some((_, terminology)) = BIBLIOGRAPHIC_CODES.iter().find(|(b, _)| *b == normalized_code) {
                return Ok(terminology.to_string());
            }
        }
        _ => {}
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Check if two codes or tags name the same language, ignoring regions
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part2t(code1), normalize_to_part2t(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Whether a user supplied locale filter selects `tag`.
///
/// A filter with a region (`fr-CA`) must match the tag exactly; a bare language (`fr`)
/// selects every region of that language.
pub fn locale_matches(filter: &str, tag: &str) -> bool {
    if filter.trim().eq_ignore_ascii_case(tag.trim()) {
        return true;
    }
    match split_tag(filter) {
        (_, Some(_)) => false,
        (language, None) => language_codes_match(language, tag),
    }
}

/// Get the language name from a code or locale tag
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}

/// Name to use in prompts: `French (CA)` for `fr-CA`, the input unchanged when unknown
pub fn display_language(tag: &str) -> String {
    match (get_language_name(tag), split_tag(tag)) {
        (Ok(name), (_, Some(region))) => format!("{} ({})", name, region.to_uppercase()),
        (Ok(name), (_, None)) => name,
        (Err(_), _) => tag.to_string(),
    }
}
