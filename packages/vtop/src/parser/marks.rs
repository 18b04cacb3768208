use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::{
    error::Result,
    html::{ElementRefExt as _, TABLE_SELECTOR},
    model::{MarksRecord, MarksRecordEach},
};

use super::require_table;

const VIEW: &str = "marks";
const MIN_CELLS: usize = 8;

static COURSE_ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr.tableContent").unwrap());

static MARK_ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr.tableContent-level1").unwrap());

/// Parses the mark view, where each course header row is followed by a row
/// holding a nested table of assessments.
#[tracing::instrument(level = tracing::Level::DEBUG, name = "parse_marks", skip(document))]
pub fn parse(document: &Html) -> Result<Vec<MarksRecord>> {
    require_table(document, VIEW)?;
    let rows = document.select(&COURSE_ROW_SELECTOR).collect::<Vec<_>>();
    let records = rows
        .chunks(2)
        .filter_map(|pair| {
            let mut record = course_header(pair[0])?;
            if let Some(marks_row) = pair.get(1) {
                record.marks = assessments(*marks_row);
            } else {
                tracing::debug!("course {} has no marks row", record.course_code);
            }
            Some(record)
        })
        .collect();
    Ok(records)
}

fn course_header(row: ElementRef) -> Option<MarksRecord> {
    let cells = row.cells();
    if cells.len() < MIN_CELLS {
        tracing::warn!(
            "skipping course row with {} cells: {}",
            cells.len(),
            row.to_string(" ")
        );
        return None;
    }
    let text = |i: usize| cells[i].to_string("");
    Some(MarksRecord {
        serial: text(0),
        course_code: text(2),
        course_title: text(3),
        course_type: text(4),
        faculty: text(6),
        slot: text(7),
        marks: Vec::new(),
    })
}

fn assessments(row: ElementRef) -> Vec<MarksRecordEach> {
    let Some(table) = row.select(&TABLE_SELECTOR).next() else {
        return Vec::new();
    };
    table
        .select(&MARK_ROW_SELECTOR)
        .filter_map(|mark_row| {
            let cells = mark_row.cells();
            if cells.len() < MIN_CELLS {
                tracing::warn!("skipping assessment row with {} cells", cells.len());
                return None;
            }
            let text = |i: usize| cells[i].to_string("");
            Some(MarksRecordEach {
                serial: text(0),
                marks_title: text(1),
                max_marks: text(2),
                weightage: text(3),
                status: text(4),
                scored_mark: text(5),
                weightage_mark: text(6),
                remark: text(7),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course_row(serial: u32, code: &str) -> String {
        format!(
            r#"<tr class="tableContent">
                <td>{serial}</td><td>AP2024254000{serial}</td><td>{code}</td><td>Operating Systems</td>
                <td>Embedded Theory</td><td>ETH</td><td>DR. A - SCOPE</td><td>B1+TB1</td>
               </tr>"#
        )
    }

    fn marks_row(assessments: &str) -> String {
        format!(
            r#"<tr class="tableContent"><td colspan="8">
                <table class="customTable-level1">
                  <tr class="tableHeader-level1"><td>Sl.No.</td><td>Mark Title</td></tr>
                  {assessments}
                </table>
               </td></tr>"#
        )
    }

    const CAT1: &str = r#"<tr class="tableContent-level1">
        <td>1</td><td>CAT-1</td><td>50</td><td>15</td><td>Present</td>
        <td>42.5</td><td>12.75</td><td></td></tr>"#;
    const QUIZ: &str = r#"<tr class="tableContent-level1">
        <td>2</td><td>Quiz</td><td>10</td><td>10</td><td>Present</td>
        <td>-</td><td>-</td><td>Not evaluated</td></tr>"#;

    fn page(rows: &[String]) -> String {
        format!(
            r#"<table class="customTable">
                <tr class="tableHeader"><td>Sl.No.</td><td>Class Nbr</td></tr>
                {}
               </table>"#,
            rows.join("\n")
        )
    }

    #[test]
    fn pairs_course_rows_with_nested_assessments() {
        let html = page(&[
            course_row(1, "CSE3001"),
            marks_row(&format!("{CAT1}{QUIZ}")),
            course_row(2, "CSE3002"),
            marks_row(CAT1),
        ]);
        let records = parse(&Html::parse_document(&html)).unwrap();
        assert_eq!(records.len(), 2);

        let os = &records[0];
        assert_eq!(os.serial, "1");
        assert_eq!(os.course_code, "CSE3001");
        assert_eq!(os.course_title, "Operating Systems");
        assert_eq!(os.course_type, "Embedded Theory");
        assert_eq!(os.faculty, "DR. A - SCOPE");
        assert_eq!(os.slot, "B1+TB1");
        assert_eq!(os.marks.len(), 2);
        assert_eq!(
            os.marks[0],
            MarksRecordEach {
                serial: "1".to_string(),
                marks_title: "CAT-1".to_string(),
                max_marks: "50".to_string(),
                weightage: "15".to_string(),
                status: "Present".to_string(),
                scored_mark: "42.5".to_string(),
                weightage_mark: "12.75".to_string(),
                remark: "".to_string(),
            }
        );
        assert_eq!(os.marks[1].scored_mark, "-");
        assert_eq!(records[1].course_code, "CSE3002");
        assert_eq!(records[1].marks.len(), 1);
    }

    #[test]
    fn empty_sub_table_keeps_course_without_marks() {
        let html = page(&[course_row(1, "CSE3001"), marks_row("")]);
        let records = parse(&Html::parse_document(&html)).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].marks.is_empty());
    }

    #[test]
    fn trailing_course_without_marks_row_is_kept() {
        let html = page(&[
            course_row(1, "CSE3001"),
            marks_row(CAT1),
            course_row(2, "CSE3002"),
        ]);
        let records = parse(&Html::parse_document(&html)).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[1].marks.is_empty());
    }

    #[test]
    fn page_without_table_is_parse_error() {
        assert!(parse(&Html::parse_document("<p>No marks</p>")).is_err());
    }
}
