use std::collections::HashMap;

use scraper::{ElementRef, Html};

use crate::{
    error::{Error, Result},
    html::{ElementRefExt as _, TABLE_SELECTOR},
    model::{Day, TimetableSlot},
};

const VIEW: &str = "timetable";

/// Shortest cell text that can hold `SLOT-CODE-TYPE-ROOM`.
const MIN_SLOT_TEXT_LEN: usize = 6;

/// Parses the registered-course legend (first table) and the weekly grid
/// (second table) into slots.
#[tracing::instrument(level = tracing::Level::DEBUG, name = "parse_timetable", skip(document))]
pub fn parse(document: &Html) -> Result<Vec<TimetableSlot>> {
    let mut tables = document.select(&TABLE_SELECTOR);
    let legend = tables
        .next()
        .ok_or_else(|| Error::parse(VIEW, "no table in page"))?;
    let names = course_names(legend);
    tracing::debug!("{} courses in legend", names.len());
    Ok(tables
        .next()
        .map(|grid| grid_slots(grid, &names))
        .unwrap_or_default())
}

/// Maps course codes to names from cells like `CSE1001 - Problem Solving (Embedded Theory)`.
fn course_names(legend: ElementRef) -> HashMap<String, String> {
    legend
        .table_rows()
        .into_iter()
        .filter_map(|row| {
            let cells = row.cells();
            let text = cells.get(2)?.to_string("");
            let (code, rest) = text.split_once('-')?;
            let name = rest.split('(').next().unwrap_or_default().trim();
            Some((code.trim().to_string(), name.to_string()))
        })
        .collect()
}

fn grid_slots(grid: ElementRef, names: &HashMap<String, String>) -> Vec<TimetableSlot> {
    let rows = grid.table_rows();
    let timings: Vec<(String, String)> = match rows.as_slice() {
        [starts, ends, ..] => starts
            .cells()
            .iter()
            .zip(ends.cells().iter())
            .map(|(s, e)| (s.to_string(""), e.to_string("")))
            .collect(),
        _ => Vec::new(),
    };

    let mut slots = Vec::new();
    let mut day_label = String::new();
    for row in rows.iter().skip(2) {
        let mut cells = row.cells();
        if cells.first().is_some_and(|c| c.attr("rowspan").is_some()) {
            day_label = cells.remove(0).to_string("");
        }
        let day = match day_label.parse::<Day>() {
            Ok(day) => day,
            Err(e) => {
                tracing::warn!("skipping timetable row without day: {e}");
                continue;
            }
        };
        for (i, cell) in cells.iter().enumerate() {
            let text = cell.to_string("");
            if text.len() < MIN_SLOT_TEXT_LEN {
                continue;
            }
            let parts = text.split('-').map(str::trim).collect::<Vec<_>>();
            let [slot, code, course_type, room, rest @ ..] = parts.as_slice() else {
                continue;
            };
            let (start_time, end_time) = timings.get(i).cloned().unwrap_or_default();
            slots.push(TimetableSlot {
                serial: i,
                day,
                slot: slot.to_string(),
                course_code: code.to_string(),
                course_type: course_type.to_string(),
                room_no: room.to_string(),
                block: rest.first().map(|b| b.to_string()).unwrap_or_default(),
                start_time,
                end_time,
                name: names.get(*code).cloned().unwrap_or_default(),
            });
        }
    }
    slots
}
