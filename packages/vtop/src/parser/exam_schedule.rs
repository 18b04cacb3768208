use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::{
    error::Result,
    html::{ElementRefExt as _, TABLE_SELECTOR, text_of},
    model::{ExamScheduleRecord, PerExamScheduleRecord},
};

const HEADER_ROWS: usize = 2;
const MIN_RECORD_CELLS: usize = 13;

static BOLD_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("b").unwrap());

/// Parses the exam schedule, grouped by exam type.
///
/// Returns `None` when the page carries no table, which is how the portal
/// renders a semester without a published schedule.
#[tracing::instrument(level = tracing::Level::DEBUG, name = "parse_exam_schedule", skip(document))]
pub fn parse(document: &Html) -> Result<Option<Vec<PerExamScheduleRecord>>> {
    let Some(table) = document.select(&TABLE_SELECTOR).next() else {
        tracing::info!("no exam schedule table");
        return Ok(None);
    };

    let mut exams = Vec::new();
    let mut current: Option<PerExamScheduleRecord> = None;
    for row in table.table_rows().into_iter().skip(HEADER_ROWS) {
        let cells = row.cells();
        match cells.len() {
            1 => {
                exams.extend(current.take());
                current = Some(PerExamScheduleRecord {
                    exam_type: text_of(cells[0].select(&BOLD_SELECTOR).next()),
                    records: Vec::new(),
                });
            }
            n if n >= MIN_RECORD_CELLS => {
                let record = from_cells(&cells);
                match current.as_mut() {
                    Some(group) => group.records.push(record),
                    None => tracing::warn!(
                        "dropping exam record {} before any exam type header",
                        record.course_code
                    ),
                }
            }
            _ => {}
        }
    }
    exams.extend(current);
    Ok(Some(exams))
}

fn from_cells(cells: &[ElementRef]) -> ExamScheduleRecord {
    let text = |i: usize| cells[i].to_string("");
    ExamScheduleRecord {
        serial: text(0),
        course_code: text(1),
        course_name: text(2),
        course_type: text(3),
        course_id: text(4),
        slot: text(5),
        exam_date: text(6),
        exam_session: text(7),
        reporting_time: text(8),
        exam_time: text(9),
        venue: text(10),
        seat_location: text(11),
        seat_no: text(12),
    }
}
