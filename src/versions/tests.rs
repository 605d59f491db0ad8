use super::*;

#[test]
fn highest_numeric_value_wins_regardless_of_confidence() {
    // Confidence inverted: the highest version has the lowest score
    let candidates: Vec<VersionCandidate> = (1..=7)
        .map(|i| {
            VersionCandidate::new(
                format!("{i}.00"),
                VersionKind::Version,
                1.0 - (i as f32) * 0.1,
            )
        })
        .collect();

    let selected = select_canonical(&candidates).expect("should select a version");
    assert_eq!(selected.raw, "7.00");
    assert_eq!(selected.numeric, 7.0);
}

#[test]
fn no_version_entries_is_a_valid_empty_outcome() {
    let candidates = vec![
        VersionCandidate::new("C", VersionKind::Revision, 0.9),
        VersionCandidate::new("2", VersionKind::Edition, 0.9),
    ];

    assert!(select_canonical(&candidates).is_none());
    assert!(select_canonical(&[]).is_none());
}

#[test]
fn non_version_kinds_are_filtered_out() {
    let candidates = vec![
        VersionCandidate::new("9.99", VersionKind::Revision, 0.9),
        VersionCandidate::new("1.02", VersionKind::Version, 0.2),
    ];

    let selected = select_canonical(&candidates).expect("should select a version");
    assert_eq!(selected.raw, "1.02");
}

#[test]
fn ties_break_to_first_occurrence() {
    let candidates = vec![
        VersionCandidate::new("2.0", VersionKind::Version, 0.1),
        VersionCandidate::new("2.00", VersionKind::Version, 0.9),
    ];

    let selected = select_canonical(&candidates).expect("should select a version");
    assert_eq!(selected.raw, "2.0");
}

#[test]
fn unparseable_numbers_default_to_zero() {
    let candidate = VersionCandidate::new("draft", VersionKind::Version, 0.8);
    assert_eq!(candidate.numeric, 0.0);

    // A zero-valued candidate still wins if it is the only version entry
    let selected = select_canonical(std::slice::from_ref(&candidate))
        .expect("should select the only version");
    assert_eq!(selected.raw, "draft");
}

#[test]
fn decimal_and_integer_tokens_parse() {
    assert_eq!(VersionCandidate::new("3.01", VersionKind::Version, 0.9).numeric, 3.01);
    assert_eq!(VersionCandidate::new("16", VersionKind::Version, 0.9).numeric, 16.0);
    assert_eq!(VersionCandidate::new("2.5 (2021)", VersionKind::Version, 0.9).numeric, 2.5);
}

#[test]
fn revision_lines_are_scanned_with_kinds() {
    let text = "Revision history\nVersion 3.01  May 2024\nRev. C  2019-08\nEdition 2  2015\n";
    let candidates = scan_revision_lines(text);

    assert_eq!(candidates.len(), 3);
    assert_eq!(candidates[0].kind, VersionKind::Version);
    assert_eq!(candidates[0].raw, "3.01");
    assert_eq!(candidates[1].kind, VersionKind::Revision);
    assert_eq!(candidates[1].raw, "C");
    assert_eq!(candidates[1].numeric, 0.0);
    assert_eq!(candidates[2].kind, VersionKind::Edition);
    assert_eq!(candidates[2].numeric, 2.0);
}

#[test]
fn scanning_plain_text_finds_nothing() {
    assert!(scan_revision_lines("No revision markers in this text.").is_empty());
    assert!(scan_revision_lines("").is_empty());
}

#[test]
fn scan_then_select_end_to_end() {
    let text = "Version 1.00  2018\nVersion 2.00  2020\nVersion 7.00  2025\nRev. D  2026\n";
    let candidates = scan_revision_lines(text);
    let selected = select_canonical(&candidates).expect("should select a version");
    assert_eq!(selected.raw, "7.00");
}
