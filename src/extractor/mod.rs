
use std::sync::LazyLock;

use fancy_regex::Regex;
use itertools::Itertools;
use tracing::debug;

/// Maximum number of leading lines inspected for header boilerplate
const MAX_HEADER_LINES: usize = 3;

/// A page after header detection: boilerplate separated from body text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageExtract {
    /// Ordinal index of the page within the document
    pub index: usize,
    /// Body text with any detected header lines removed
    pub body: String,
    /// Detected header lines, verbatim, joined with newlines
    pub header: Option<String>,
    /// Model identifiers extracted from the header lines
    pub model_identifiers: Vec<String>,
}

/// Matches a brand name followed by one or more alphanumeric model tokens,
/// e.g. "Samsung WF45T6000AW / WF45T6000AP" or "Frigidaire FFRE0533S1, FFRE0833S1"
static BRAND_MODEL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Z][A-Za-z&.-]{1,24}(?:\s+[A-Z][A-Za-z&.-]{1,24}){0,3}\s+[A-Z]{1,6}[0-9][A-Z0-9/-]*(?:\s*[,/]\s*[A-Z0-9][A-Z0-9/-]*)*\s*$",
    )
    .expect("valid regex")
});

/// Matches a roman-numeral section marker such as "Part II" or "Section IV".
/// The lookahead rejects an empty numeral after the keyword.
static ROMAN_SECTION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:Part|Section|Chapter|Appendix)\s+(?=[MDCLXVI])M{0,3}(?:CM|CD|D?C{0,3})(?:XC|XL|L?X{0,3})(?:IX|IV|V?I{0,3})\b",
    )
    .expect("valid regex")
});

/// Matches a single model identifier token, e.g. "WF45T6000AW"
static MODEL_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{1,6}[0-9][A-Z0-9/-]{2,}\b").expect("valid regex"));

/// Separate repeating page-header boilerplate from body text.
///
/// Examines the first 1-3 lines of the raw page text. Consecutive leading
/// lines matching known product-name or roman-numeral patterns are removed
/// from the body and recorded verbatim as the page header; model identifiers
/// found in those lines are collected. A page with no recognizable header
/// passes through unchanged. Body content is never altered beyond removing
/// the identified leading lines.
pub fn extract_page_header(index: usize, raw_text: &str) -> PageExtract {
    let mut header_lines = Vec::new();
    let mut consumed = 0;

    for line in raw_text.split_inclusive('\n').take(MAX_HEADER_LINES) {
        let trimmed = line.trim_end_matches(['\n', '\r']);
        if !is_header_line(trimmed) {
            break;
        }
        header_lines.push(trimmed.to_string());
        consumed += line.len();
    }

    if header_lines.is_empty() {
        return PageExtract {
            index,
            body: raw_text.to_string(),
            header: None,
            model_identifiers: Vec::new(),
        };
    }

    let header = header_lines.join("\n");
    let model_identifiers = extract_model_identifiers(&header);

    debug!(
        "Page {}: detected {} header line(s), {} model identifier(s)",
        index,
        header_lines.len(),
        model_identifiers.len()
    );

    PageExtract {
        index,
        body: raw_text.get(consumed..).unwrap_or_default().to_string(),
        header: Some(header),
        model_identifiers,
    }
}

fn is_header_line(line: &str) -> bool {
    if line.trim().is_empty() {
        return false;
    }
    matches!(BRAND_MODEL_LINE.is_match(line), Ok(true))
        || matches!(ROMAN_SECTION_MARKER.is_match(line), Ok(true))
}

/// Collect model identifier tokens from header text, preserving first-seen order
fn extract_model_identifiers(header: &str) -> Vec<String> {
    MODEL_TOKEN
        .find_iter(header)
        .flatten()
        .map(|token| token.as_str().to_string())
        .unique()
        .collect()
}
