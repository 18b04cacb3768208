use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::{
    error::{Error, Result},
    html::ElementRefExt as _,
    model::AttendanceRecord,
};

use super::require_table;

const VIEW: &str = "attendance";

static ROW_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());

/// Parses the attendance summary table.
///
/// Course id and type are only present as arguments of the detail link's
/// `onclick` handler, so a row whose handler is missing or malformed fails the
/// whole call.
#[tracing::instrument(level = tracing::Level::DEBUG, name = "parse_attendance", skip(document))]
pub fn parse(document: &Html) -> Result<Vec<AttendanceRecord>> {
    require_table(document, VIEW)?;
    document
        .select(&ROW_SELECTOR)
        .skip(1)
        .filter_map(|row| {
            let cells = row.cells();
            (cells.len() > 10).then_some(cells)
        })
        .map(|cells| from_cells(&cells))
        .collect()
}

fn from_cells(cells: &[ElementRef]) -> Result<AttendanceRecord> {
    let text = |i: usize| cells[i].to_string("");
    let (course_id, course_type) = course_handle(cells[10])?;
    Ok(AttendanceRecord {
        serial: text(0),
        category: text(1),
        course_name: text(2),
        course_code: text(3),
        faculty_detail: text(4),
        classes_attended: text(5),
        total_classes: text(6),
        attendance_percentage: text(7),
        attendance_fat_cat: text(8),
        debar_status: text(9),
        course_id,
        course_type,
    })
}

/// Reads `(course id, course type)` from a handler like
/// `processViewAttendanceDetail('AP2024254000123','AP2024254000123','AP2024254000456','ETH');`.
fn course_handle(cell: ElementRef) -> Result<(String, String)> {
    let handler = cell
        .select(&LINK_SELECTOR)
        .find_map(|a| a.attr("onclick"))
        .ok_or_else(|| Error::parse(VIEW, "detail link handler not found"))?;
    let cleaned = handler.replace(['\'', '"'], "");
    let parts = cleaned.split(',').collect::<Vec<_>>();
    if parts.len() < 4 {
        return Err(Error::parse(
            VIEW,
            format!("malformed detail link handler: {handler}"),
        ));
    }
    let course_id = parts[2].trim();
    let course_type = parts[3].split(')').next().unwrap_or_default().trim();
    if course_id.is_empty() || course_type.is_empty() {
        return Err(Error::parse(
            VIEW,
            format!("empty course id or type in handler: {handler}"),
        ));
    }
    Ok((course_id.to_string(), course_type.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(serial: u32, code: &str, percentage: &str, handler: &str) -> String {
        format!(
            r#"<tr>
                <td>{serial}</td><td>Program Core</td><td> Data Structures </td><td>{code}</td>
                <td>PROF X - SCOPE</td><td>30</td><td>36</td><td>{percentage}</td>
                <td>0</td><td>-</td>
                <td><a href="javascript:void(0)" onclick="{handler}">View</a></td>
               </tr>"#
        )
    }

    fn page(rows: &[String]) -> String {
        format!(
            r#"<table class="table">
                <tr><th>Sl.No.</th><th>Category</th><th>Course Name</th><th>Code</th></tr>
                {}
               </table>"#,
            rows.join("\n")
        )
    }

    #[test]
    fn parses_every_well_formed_row_verbatim() {
        let rows = (1..=3)
            .map(|i| {
                row(
                    i,
                    &format!("CSE10{i}"),
                    "83%",
                    &format!(
                        "processViewAttendanceDetail('AP2024254','AP2024254000{i}','AP2024254000{i}','ETH');"
                    ),
                )
            })
            .collect::<Vec<_>>();
        let records = parse(&Html::parse_document(&page(&rows))).unwrap();
        assert_eq!(records.len(), 3);
        let first = &records[0];
        assert_eq!(first.serial, "1");
        assert_eq!(first.category, "Program Core");
        assert_eq!(first.course_name, "Data Structures");
        assert_eq!(first.course_code, "CSE101");
        assert_eq!(first.faculty_detail, "PROF X - SCOPE");
        assert_eq!(first.classes_attended, "30");
        assert_eq!(first.total_classes, "36");
        assert_eq!(first.attendance_percentage, "83%");
        assert_eq!(first.attendance_fat_cat, "0");
        assert_eq!(first.debar_status, "-");
        assert_eq!(first.course_id, "AP20242540001");
        assert_eq!(first.course_type, "ETH");
        assert_eq!(records[2].course_code, "CSE103");
    }

    #[test]
    fn short_rows_are_not_records() {
        let rows = vec![
            "<tr><td colspan=\"11\">Total</td></tr>".to_string(),
            row(1, "MAT101", "75%", "f('a','b','AP1','TH');"),
        ];
        let records = parse(&Html::parse_document(&page(&rows))).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].course_type, "TH");
    }

    #[test]
    fn malformed_handler_fails_the_call() {
        let rows = vec![row(1, "MAT101", "75%", "openDetail()")];
        let err = parse(&Html::parse_document(&page(&rows))).unwrap_err();
        assert!(matches!(err, Error::Parse { view: "attendance", .. }));
    }

    #[test]
    fn page_without_table_is_parse_error() {
        let err = parse(&Html::parse_document("<div>No data</div>")).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Parse);
    }

    #[test]
    fn empty_table_is_no_records() {
        let records = parse(&Html::parse_document(&page(&[]))).unwrap();
        assert!(records.is_empty());
    }
}
