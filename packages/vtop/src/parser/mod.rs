//! Scrapers turning portal pages into records.
//!
//! Every parser takes a parsed [`scraper::Html`] document. They fail with
//! [`Error::Parse`](crate::Error::Parse) only when the page lacks the table
//! skeleton of the view; single degraded rows are skipped and logged.

pub mod attendance;
pub mod exam_schedule;
pub mod marks;
pub mod semester;
pub mod timetable;

use scraper::{ElementRef, Html};

use crate::{error::Result, html::TABLE_SELECTOR};

pub(crate) fn require_table<'a>(document: &'a Html, view: &'static str) -> Result<ElementRef<'a>> {
    document
        .select(&TABLE_SELECTOR)
        .next()
        .ok_or_else(|| crate::Error::parse(view, "no table in page"))
}
