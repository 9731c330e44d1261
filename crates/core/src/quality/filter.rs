//! Admissibility and completeness checks for search candidates.

use crate::provider::BookCandidate;

/// Cheap pre-enrichment gate: title, author and cover must all be present.
///
/// Candidates failing this are not worth a detail call.
pub fn has_basic_fields(candidate: &BookCandidate) -> bool {
    if candidate.title.trim().is_empty() {
        return false;
    }
    if candidate.real_author().is_none() {
        return false;
    }
    match &candidate.cover_url {
        Some(url) => !url.trim().is_empty(),
        None => false,
    }
}

/// Strict completeness gate: basic fields plus a non-empty description.
///
/// Only complete candidates are delivered to callers or persisted.
pub fn is_complete(candidate: &BookCandidate) -> bool {
    if !has_basic_fields(candidate) {
        return false;
    }
    match &candidate.description {
        Some(description) => !description.trim().is_empty(),
        None => false,
    }
}

/// Heuristic non-English filter: rejects text containing code points in the
/// CJK Unified Ideographs, Hiragana, Katakana or Hangul Syllables ranges.
/// Accented Latin text passes; this is not script detection.
pub fn is_probably_english(text: &str) -> bool {
    if text.trim().is_empty() {
        return false;
    }

    !text.chars().any(|c| {
        matches!(c,
            '\u{4E00}'..='\u{9FFF}'   // CJK Unified Ideographs
            | '\u{3040}'..='\u{309F}' // Hiragana
            | '\u{30A0}'..='\u{30FF}' // Katakana
            | '\u{AC00}'..='\u{D7AF}' // Hangul Syllables
        )
    })
}

/// Language gate used on the category refresh path: the title must look
/// English, and so must the author when one is present.
pub fn language_admissible(candidate: &BookCandidate) -> bool {
    if !is_probably_english(&candidate.title) {
        return false;
    }
    match candidate.real_author() {
        Some(author) => is_probably_english(author),
        None => true,
    }
}
