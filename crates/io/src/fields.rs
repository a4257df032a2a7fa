// Header resolution: map raw column headers to canonical fields

use casematrix_compare::model::{CanonicalField, FieldMap};

/// Accepted spellings per field, after normalization.
fn aliases(field: CanonicalField) -> &'static [&'static str] {
    match field {
        CanonicalField::CaseId => &["caseid", "case", "testcaseid"],
        CanonicalField::Title => &["title", "name", "testcase"],
        CanonicalField::Status => &["status", "result", "outcome"],
        CanonicalField::Comment => &["comment", "comments", "notes"],
        CanonicalField::Plan => &["plan", "testplan"],
        CanonicalField::TestedBy => &["testedby", "tester", "assignedto"],
        CanonicalField::TestId => &["id", "testid", "runid"],
    }
}

/// Lowercase, keep ASCII alphanumerics only: "Case ID" -> "caseid".
pub fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Resolve headers to column positions. For each field the leftmost
/// matching header wins; unmatched headers are ignored.
pub fn resolve_headers<S: AsRef<str>>(headers: &[S]) -> FieldMap {
    let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h.as_ref())).collect();
    let mut map = FieldMap::new();
    for field in CanonicalField::ALL {
        let names = aliases(field);
        if let Some(col) = normalized.iter().position(|h| names.contains(&h.as_str())) {
            map.insert(field, col);
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_spacing_and_case() {
        assert_eq!(normalize_header("Case ID"), "caseid");
        assert_eq!(normalize_header(" Tested_By "), "testedby");
        assert_eq!(normalize_header("ID"), "id");
    }

    #[test]
    fn resolves_standard_export_headers() {
        let headers = ["ID", "Title", "Case ID", "Comment", "Plan", "Status", "Tested By"];
        let map = resolve_headers(&headers);
        assert_eq!(map.get(CanonicalField::TestId), Some(0));
        assert_eq!(map.get(CanonicalField::Title), Some(1));
        assert_eq!(map.get(CanonicalField::CaseId), Some(2));
        assert_eq!(map.get(CanonicalField::Comment), Some(3));
        assert_eq!(map.get(CanonicalField::Plan), Some(4));
        assert_eq!(map.get(CanonicalField::Status), Some(5));
        assert_eq!(map.get(CanonicalField::TestedBy), Some(6));
    }

    #[test]
    fn aliases_and_first_match_wins() {
        let headers = ["Result", "case", "Notes", "Outcome", "extra"];
        let map = resolve_headers(&headers);
        assert_eq!(map.get(CanonicalField::Status), Some(0));
        assert_eq!(map.get(CanonicalField::CaseId), Some(1));
        assert_eq!(map.get(CanonicalField::Comment), Some(2));
        assert!(!map.contains(CanonicalField::Title));
        assert!(!map.contains(CanonicalField::Plan));
    }
}
