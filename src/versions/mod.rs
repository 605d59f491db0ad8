#[cfg(test)]
mod tests;

use std::sync::LazyLock;

use fancy_regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Category of a revision-list entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionKind {
    Version,
    Revision,
    Edition,
    Unknown,
}

/// One parsed entry from a document's revision/version list
#[derive(Debug, Clone, PartialEq)]
pub struct VersionCandidate {
    /// The raw version string as it appeared in the document
    pub raw: String,
    pub kind: VersionKind,
    /// Parse-quality score, recorded for diagnostics only
    pub confidence: f32,
    /// Leading numeric token of the version string, 0.0 when unparseable
    pub numeric: f64,
}

static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid regex"));

/// Matches one revision-list line, e.g. "Version 3.01  2024-05" or "Rev. C 2019-08"
static REVISION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*(version|ver\.?|revision|rev\.?|edition|ed\.)\s*:?\s+([0-9][0-9.]*|[A-Z])\b")
        .expect("valid regex")
});

impl VersionCandidate {
    /// Build a candidate, parsing the leading numeric token of the raw string
    #[inline]
    pub fn new(raw: impl Into<String>, kind: VersionKind, confidence: f32) -> Self {
        let raw = raw.into();
        let numeric = parse_leading_number(&raw);
        Self {
            raw,
            kind,
            confidence,
            numeric,
        }
    }
}

/// Select the canonical version from a set of candidates.
///
/// Only entries of kind `version` are considered; the one with the highest
/// numeric value wins, ties going to the first occurrence in input order.
/// Confidence scores are deliberately ignored. `None` means no canonical
/// version was found, which callers must treat as a valid outcome.
#[inline]
pub fn select_canonical(candidates: &[VersionCandidate]) -> Option<&VersionCandidate> {
    let selected = candidates
        .iter()
        .filter(|c| c.kind == VersionKind::Version)
        .fold(None::<&VersionCandidate>, |best, candidate| match best {
            Some(current) if candidate.numeric > current.numeric => Some(candidate),
            None => Some(candidate),
            _ => best,
        });

    match selected {
        Some(candidate) => {
            debug!(
                "Selected canonical version {} (numeric {})",
                candidate.raw, candidate.numeric
            );
        }
        None => debug!("No canonical version found among {} candidates", candidates.len()),
    }
    selected
}

/// Scan document text for revision-history entries.
///
/// Lines labeled "Version"/"Ver." yield `version` candidates; "Revision"/"Rev."
/// and "Edition"/"Ed." yield their own kinds. Numeric tokens score higher
/// confidence than letter revisions ("Rev. C").
pub fn scan_revision_lines(text: &str) -> Vec<VersionCandidate> {
    let mut candidates = Vec::new();

    for captures in REVISION_LINE.captures_iter(text).flatten() {
        let (Some(label), Some(value)) = (captures.get(1), captures.get(2)) else {
            continue;
        };
        let kind = kind_for_label(label.as_str());
        let value = value.as_str();
        let confidence = if value.starts_with(|c: char| c.is_ascii_digit()) {
            0.9
        } else {
            0.5
        };
        candidates.push(VersionCandidate::new(value, kind, confidence));
    }

    debug!("Parsed {} version candidate(s)", candidates.len());
    candidates
}

fn kind_for_label(label: &str) -> VersionKind {
    let label = label.trim_end_matches('.').to_ascii_lowercase();
    match label.as_str() {
        "version" | "ver" => VersionKind::Version,
        "revision" | "rev" => VersionKind::Revision,
        "edition" | "ed" => VersionKind::Edition,
        _ => VersionKind::Unknown,
    }
}

fn parse_leading_number(raw: &str) -> f64 {
    LEADING_NUMBER
        .find(raw)
        .ok()
        .flatten()
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}
