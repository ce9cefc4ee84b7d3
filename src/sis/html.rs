//! Parsers for the HTML fragments served by the class-detail endpoints.
//!
//! Bodies are entity-unescaped before they reach these functions. Every
//! parser degrades to an empty result on unexpected markup, logging enough
//! context (term and CRN) to find the offending section later.

use html_scraper::{ElementRef, Html, Selector};
use tracing::warn;

use crate::sis::models::{Corequisite, Crosslist};

/// Extracts the course description: the first non-empty text line of the
/// description section, without trailing fields such as "When Offered" or
/// "Credit Hours".
pub fn parse_description(body: &str, term: &str, crn: &str) -> String {
    let document = Html::parse_fragment(body);
    let section_sel = Selector::parse(r#"section[aria-labelledby="courseDescription"]"#).unwrap();

    let Some(section) = document.select(&section_sel).next() else {
        warn!(term, crn, "no description found");
        return String::new();
    };

    for chunk in section.text() {
        for line in chunk.split('\n') {
            let line = line.trim();
            if !line.is_empty() {
                return line.to_string();
            }
        }
    }
    String::new()
}

/// Extracts attribute strings in their wire form (`"<name>  <code>"`).
pub fn parse_attributes(body: &str) -> Vec<String> {
    let document = Html::parse_fragment(body);
    let attribute_sel = Selector::parse("span.attribute-text").unwrap();

    document
        .select(&attribute_sel)
        .map(|span| span.text().collect::<String>().trim().to_string())
        .collect()
}

/// Extracts corequisite rows. The table is known to have exactly three
/// columns: Subject, Course, and Title.
pub fn parse_corequisites(body: &str, term: &str, crn: &str) -> Vec<Corequisite> {
    let document = Html::parse_fragment(body);
    let section_sel = Selector::parse(r#"section[aria-labelledby="coReqs"]"#).unwrap();
    let table_sel = Selector::parse("table.basePreqTable").unwrap();

    let Some(section) = document.select(&section_sel).next() else {
        return Vec::new();
    };
    let Some(table) = section.select(&table_sel).next() else {
        return Vec::new();
    };

    table_rows(table, 3, term, crn, "corequisite")
        .into_iter()
        .map(|mut cols| Corequisite {
            title: cols.pop().unwrap_or_default(),
            course_number: cols.pop().unwrap_or_default(),
            subject_name: cols.pop().unwrap_or_default(),
        })
        .collect()
}

/// Extracts cross-listed section rows. The table is known to have exactly
/// five columns: CRN, Subject, Course Number, Title, and Section.
pub fn parse_crosslists(body: &str, term: &str, crn: &str) -> Vec<Crosslist> {
    let document = Html::parse_fragment(body);
    let section_sel = Selector::parse(r#"section[aria-labelledby="xlstSections"]"#).unwrap();
    let table_sel = Selector::parse("table").unwrap();

    let Some(section) = document.select(&section_sel).next() else {
        return Vec::new();
    };
    let Some(table) = section.select(&table_sel).next() else {
        return Vec::new();
    };

    table_rows(table, 5, term, crn, "crosslist")
        .into_iter()
        .map(|mut cols| Crosslist {
            section_number: cols.pop().unwrap_or_default(),
            title: cols.pop().unwrap_or_default(),
            course_number: cols.pop().unwrap_or_default(),
            subject_name: cols.pop().unwrap_or_default(),
            crn: cols.pop().unwrap_or_default(),
        })
        .collect()
}

/// Collects `<tbody>` rows of `table` after validating the header width.
/// A header with the wrong column count empties the whole table; individual
/// rows with a mismatched cell count are skipped.
fn table_rows(
    table: ElementRef<'_>,
    expected_columns: usize,
    term: &str,
    crn: &str,
    what: &str,
) -> Vec<Vec<String>> {
    let th_sel = Selector::parse("thead th").unwrap();
    let tr_sel = Selector::parse("tbody tr").unwrap();
    let td_sel = Selector::parse("td").unwrap();

    let header_count = table.select(&th_sel).count();
    if header_count == 0 {
        return Vec::new();
    }
    if header_count != expected_columns {
        warn!(term, crn, columns = header_count, "unexpected number of {what} columns");
        return Vec::new();
    }

    let mut rows = Vec::new();
    for tr in table.select(&tr_sel) {
        let cols: Vec<String> = tr
            .select(&td_sel)
            .map(|td| td.text().collect::<String>().trim().to_string())
            .collect();
        if cols.len() != expected_columns {
            warn!(term, crn, "skipping {what} row with mismatched columns");
            continue;
        }
        rows.push(cols);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_first_nonempty_line() {
        let body = r#"
            <section aria-labelledby="courseDescription">
                <br>
                Introduction to computer programming and algorithmic problem solving.
                <br>
                When Offered: Fall and spring terms annually.
            </section>"#;
        assert_eq!(
            parse_description(body, "202309", "42706"),
            "Introduction to computer programming and algorithmic problem solving."
        );
    }

    #[test]
    fn test_description_missing_section() {
        assert_eq!(parse_description("<div>nothing here</div>", "202309", "42706"), "");
    }

    #[test]
    fn test_attributes_spans() {
        let body = r#"
            <span class="attribute-text"> Communication Intensive  COMM </span>
            <span class="attribute-text">Introductory Level Course  INTR</span>"#;
        assert_eq!(
            parse_attributes(body),
            vec![
                "Communication Intensive  COMM".to_string(),
                "Introductory Level Course  INTR".to_string(),
            ]
        );
    }

    #[test]
    fn test_attributes_empty_body() {
        assert!(parse_attributes("<div></div>").is_empty());
    }

    #[test]
    fn test_corequisites_three_columns() {
        let body = r#"
            <section aria-labelledby="coReqs">
                <table class="basePreqTable">
                    <thead><tr><th>Subject</th><th>Course</th><th>Title</th></tr></thead>
                    <tbody>
                        <tr><td>Computer Science</td><td>1100</td><td>Computer Science I</td></tr>
                        <tr><td>Mathematics</td><td>1010</td><td>Calculus I</td></tr>
                    </tbody>
                </table>
            </section>"#;
        let coreqs = parse_corequisites(body, "202309", "42706");
        assert_eq!(
            coreqs,
            vec![
                Corequisite {
                    subject_name: "Computer Science".to_string(),
                    course_number: "1100".to_string(),
                    title: "Computer Science I".to_string(),
                },
                Corequisite {
                    subject_name: "Mathematics".to_string(),
                    course_number: "1010".to_string(),
                    title: "Calculus I".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_corequisites_wrong_column_count() {
        let body = r#"
            <section aria-labelledby="coReqs">
                <table class="basePreqTable">
                    <thead><tr><th>Subject</th><th>Course</th></tr></thead>
                    <tbody><tr><td>Computer Science</td><td>1100</td></tr></tbody>
                </table>
            </section>"#;
        assert!(parse_corequisites(body, "202309", "42706").is_empty());
    }

    #[test]
    fn test_corequisites_no_table() {
        let body = r#"<section aria-labelledby="coReqs"><p>None</p></section>"#;
        assert!(parse_corequisites(body, "202309", "42706").is_empty());
    }

    #[test]
    fn test_crosslists_five_columns() {
        let body = r#"
            <section aria-labelledby="xlstSections">
                <table>
                    <thead><tr>
                        <th>CRN</th><th>Subject</th><th>Course Number</th><th>Title</th><th>Section</th>
                    </tr></thead>
                    <tbody>
                        <tr><td>42710</td><td>Information Technology</td><td>1100</td><td>Computer Science I</td><td>01</td></tr>
                    </tbody>
                </table>
            </section>"#;
        let crosslists = parse_crosslists(body, "202309", "42706");
        assert_eq!(
            crosslists,
            vec![Crosslist {
                crn: "42710".to_string(),
                subject_name: "Information Technology".to_string(),
                course_number: "1100".to_string(),
                title: "Computer Science I".to_string(),
                section_number: "01".to_string(),
            }]
        );
    }

    #[test]
    fn test_crosslists_skips_short_rows() {
        let body = r#"
            <section aria-labelledby="xlstSections">
                <table>
                    <thead><tr>
                        <th>CRN</th><th>Subject</th><th>Course Number</th><th>Title</th><th>Section</th>
                    </tr></thead>
                    <tbody>
                        <tr><td>only one cell</td></tr>
                        <tr><td>42710</td><td>Information Technology</td><td>1100</td><td>Computer Science I</td><td>01</td></tr>
                    </tbody>
                </table>
            </section>"#;
        assert_eq!(parse_crosslists(body, "202309", "42706").len(), 1);
    }
}
