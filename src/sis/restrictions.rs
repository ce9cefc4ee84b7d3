//! Parser for the restrictions tab of a class-detail page.
//!
//! The endpoint serves a flat fragment of `<div>`, `<span>`, and `<br>` tags
//! where only the `<span>` children of the restrictions section carry
//! payload: a header span announces a restriction category, and the spans
//! after it hold the restricted values. The SIS splits a value across several
//! spans when it contains commas, while the closing parenthesis of its code
//! only appears in the final piece, so an item is complete once its
//! parentheses close.

use html_scraper::{ElementRef, Html, Selector};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::warn;

/// Plural category labels as they appear in headers, with the key each maps
/// to. `Fields of Study` and `Programs` are alternate spellings the SIS uses
/// for majors and degrees.
const RESTRICTION_LABELS: &[(&str, &str)] = &[
    ("Majors", "major"),
    ("Fields of Study (Major, Minor or Concentration)", "major"),
    ("Minors", "minor"),
    ("Levels", "level"),
    ("Classes", "classification"),
    ("Degrees", "degree"),
    ("Programs", "degree"),
    ("Departments", "department"),
    ("Campuses", "campus"),
    ("Colleges", "college"),
];

/// Restriction keys present in every parsed map, each with a `not_` variant.
const RESTRICTION_KEYS: &[&str] = &[
    "major",
    "minor",
    "level",
    "classification",
    "degree",
    "department",
    "campus",
    "college",
];

/// Key for special-approval items; these have no polarity and no code.
pub const SPECIAL_APPROVAL_KEY: &str = "special_approval";

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    let labels = RESTRICTION_LABELS
        .iter()
        .map(|(label, _)| regex::escape(label))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(
        "^(Must|Cannot) be enrolled in one of the following ({labels}):"
    ))
    .unwrap()
});

static SPECIAL_APPROVALS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^Special Approvals:").unwrap());

/// Any closing parenthesis after any opening one marks a complete item.
static COMPLETE_ITEM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(.*\)").unwrap());

/// Returns the restriction map pre-populated with every known key.
pub fn empty_restrictions() -> BTreeMap<String, Vec<String>> {
    let mut map = BTreeMap::new();
    for key in RESTRICTION_KEYS {
        map.insert(key.to_string(), Vec::new());
        map.insert(format!("not_{key}"), Vec::new());
    }
    map.insert(SPECIAL_APPROVAL_KEY.to_string(), Vec::new());
    map
}

/// Maps a header span to its restriction key, `not_`-prefixed when the
/// polarity is negative. Polarity is compared case-insensitively.
fn match_header(text: &str) -> Option<String> {
    if SPECIAL_APPROVALS_RE.is_match(text) {
        return Some(SPECIAL_APPROVAL_KEY.to_string());
    }
    let caps = HEADER_RE.captures(text)?;
    let key = RESTRICTION_LABELS
        .iter()
        .find(|(label, _)| *label == &caps[2])
        .map(|(_, key)| *key)?;
    if caps[1].eq_ignore_ascii_case("cannot") {
        Some(format!("not_{key}"))
    } else {
        Some(key.to_string())
    }
}

/// Parses the restrictions fragment into category key → items.
///
/// Items under ordinary keys are rejoined across spans with `,` until their
/// parentheses close; a header arriving before closure abandons the buffer.
/// Special-approval items are complete per span and carry no parentheses.
pub fn parse_restrictions(body: &str, term: &str, crn: &str) -> BTreeMap<String, Vec<String>> {
    let mut data = empty_restrictions();

    let document = Html::parse_fragment(body);
    let section_sel = Selector::parse(r#"section[aria-labelledby="restrictions"]"#).unwrap();
    let Some(section) = document.select(&section_sel).next() else {
        return data;
    };

    let mut spans: Vec<String> = Vec::new();
    for child in section.children().filter_map(ElementRef::wrap) {
        if child.value().name() != "span" {
            continue;
        }
        let text: String = child.text().collect();
        if text.trim().is_empty() {
            warn!(term, crn, "skipping restriction content with no text");
            continue;
        }
        spans.push(text);
    }

    let mut i = 0;
    while i < spans.len() {
        let text = spans[i].trim();
        let Some(key) = match_header(text) else {
            if text.starts_with("Must be enrolled") || text.starts_with("Cannot be enrolled") {
                warn!(term, crn, header = text, "unrecognized restriction header");
            }
            i += 1;
            continue;
        };
        i += 1;

        if key == SPECIAL_APPROVAL_KEY {
            while i < spans.len() {
                let piece = spans[i].trim();
                if match_header(piece).is_some() {
                    break;
                }
                data.get_mut(SPECIAL_APPROVAL_KEY)
                    .expect("pre-populated key")
                    .push(piece.to_string());
                i += 1;
            }
            continue;
        }

        let items = data.get_mut(&key).expect("pre-populated key");
        let mut buffer = String::new();
        while i < spans.len() {
            // A header arriving before the item closes abandons the buffer;
            // the outer loop re-reads this span as a header.
            if match_header(spans[i].trim()).is_some() {
                break;
            }
            if buffer.is_empty() {
                buffer.push_str(spans[i].trim_start());
            } else {
                buffer.push(',');
                buffer.push_str(&spans[i]);
            }
            if COMPLETE_ITEM_RE.is_match(&buffer) {
                items.push(buffer.trim().to_string());
                buffer.clear();
            }
            i += 1;
        }
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(spans: &[&str]) -> String {
        let inner: String = spans.iter().map(|s| format!("<span>{s}</span>")).collect();
        format!(r#"<section aria-labelledby="restrictions"><div></div>{inner}<br></section>"#)
    }

    #[test]
    fn test_empty_restrictions_keys() {
        let map = empty_restrictions();
        assert_eq!(map.len(), RESTRICTION_KEYS.len() * 2 + 1);
        assert!(map.contains_key("major"));
        assert!(map.contains_key("not_major"));
        assert!(map.contains_key("special_approval"));
        assert!(map.values().all(Vec::is_empty));
    }

    #[test]
    fn test_single_item_positive_polarity() {
        let body = fragment(&[
            "Must be enrolled in one of the following Levels:",
            "Graduate (GR)",
        ]);
        let data = parse_restrictions(&body, "202309", "42706");
        assert_eq!(data["level"], vec!["Graduate (GR)"]);
        assert!(data["not_level"].is_empty());
    }

    #[test]
    fn test_negative_polarity() {
        let body = fragment(&[
            "Cannot be enrolled in one of the following Classes:",
            "Freshman (FR)",
            "Sophomore (SO)",
        ]);
        let data = parse_restrictions(&body, "202309", "42706");
        assert_eq!(data["not_classification"], vec!["Freshman (FR)", "Sophomore (SO)"]);
        assert!(data["classification"].is_empty());
    }

    #[test]
    fn test_comma_split_item_rejoined() {
        let body = fragment(&[
            "Must be enrolled in one of the following Majors:",
            "Communication",
            "Media",
            " &amp; Design (COMD)",
        ]);
        // The body reaches the parser already entity-unescaped.
        let body = body.replace("&amp;", "&");
        let data = parse_restrictions(&body, "202309", "42706");
        assert_eq!(data["major"], vec!["Communication,Media, & Design (COMD)"]);
    }

    #[test]
    fn test_header_abandons_open_buffer() {
        let body = fragment(&[
            "Must be enrolled in one of the following Majors:",
            "Dangling item with no closing paren",
            "Must be enrolled in one of the following Levels:",
            "Graduate (GR)",
        ]);
        let data = parse_restrictions(&body, "202309", "42706");
        assert!(data["major"].is_empty());
        assert_eq!(data["level"], vec!["Graduate (GR)"]);
    }

    #[test]
    fn test_special_approvals_per_span() {
        let body = fragment(&[
            "Special Approvals:",
            "Special permission of instructor",
            "Departmental approval",
        ]);
        let data = parse_restrictions(&body, "202309", "42706");
        assert_eq!(
            data["special_approval"],
            vec!["Special permission of instructor", "Departmental approval"]
        );
    }

    #[test]
    fn test_special_approvals_followed_by_header() {
        let body = fragment(&[
            "Special Approvals:",
            "Special permission of instructor",
            "Must be enrolled in one of the following Degrees:",
            "Bachelor of Science (BS)",
        ]);
        let data = parse_restrictions(&body, "202309", "42706");
        assert_eq!(data["special_approval"], vec!["Special permission of instructor"]);
        assert_eq!(data["degree"], vec!["Bachelor of Science (BS)"]);
    }

    #[test]
    fn test_alternate_labels_map_to_same_key() {
        let body = fragment(&[
            "Must be enrolled in one of the following Fields of Study (Major, Minor or Concentration):",
            "Computer Science (CSCI)",
            "Must be enrolled in one of the following Programs:",
            "Bachelor of Science (BS)",
        ]);
        let data = parse_restrictions(&body, "202309", "42706");
        assert_eq!(data["major"], vec!["Computer Science (CSCI)"]);
        assert_eq!(data["degree"], vec!["Bachelor of Science (BS)"]);
    }

    #[test]
    fn test_unrecognized_header_skipped() {
        let body = fragment(&[
            "Must be enrolled in one of the following Weird Things:",
            "Something (X)",
            "Must be enrolled in one of the following Campuses:",
            "Troy (T)",
        ]);
        let data = parse_restrictions(&body, "202309", "42706");
        assert_eq!(data["campus"], vec!["Troy (T)"]);
        // The unknown header is not a collection trigger, and its item has no
        // home; nothing else should have collected it.
        assert!(data.values().flatten().all(|item| item != "Something (X)"));
    }

    #[test]
    fn test_no_restrictions_section() {
        let data = parse_restrictions("<div>nothing</div>", "202309", "42706");
        assert!(data.values().all(Vec::is_empty));
    }

    #[test]
    fn test_known_keys_only() {
        let body = fragment(&[
            "Must be enrolled in one of the following Majors:",
            "Computer Science (CSCI)",
        ]);
        let data = parse_restrictions(&body, "202309", "42706");
        let expected = empty_restrictions();
        for key in data.keys() {
            assert!(expected.contains_key(key), "unexpected key {key}");
        }
    }
}
