use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemesterInfo {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub serial: String,
    pub category: String,
    pub course_name: String,
    pub course_code: String,
    pub course_type: String,
    pub faculty_detail: String,
    pub classes_attended: String,
    pub total_classes: String,
    /// Literal portal text, e.g. `"82%"`.
    pub attendance_percentage: String,
    pub attendance_fat_cat: String,
    pub debar_status: String,
    pub course_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Day {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Day {
    pub fn code(self) -> &'static str {
        match self {
            Day::Mon => "MON",
            Day::Tue => "TUE",
            Day::Wed => "WED",
            Day::Thu => "THU",
            Day::Fri => "FRI",
            Day::Sat => "SAT",
            Day::Sun => "SUN",
        }
    }
}

impl FromStr for Day {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MON" => Ok(Day::Mon),
            "TUE" => Ok(Day::Tue),
            "WED" => Ok(Day::Wed),
            "THU" => Ok(Day::Thu),
            "FRI" => Ok(Day::Fri),
            "SAT" => Ok(Day::Sat),
            "SUN" => Ok(Day::Sun),
            other => Err(format!("unknown day code {other:?}")),
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableSlot {
    /// Column index of the slot in its grid row.
    pub serial: usize,
    pub day: Day,
    pub slot: String,
    pub course_code: String,
    pub course_type: String,
    pub room_no: String,
    pub block: String,
    pub start_time: String,
    pub end_time: String,
    /// Course name from the legend table, empty when the code is not listed.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarksRecordEach {
    pub serial: String,
    pub marks_title: String,
    pub max_marks: String,
    pub weightage: String,
    pub status: String,
    pub scored_mark: String,
    pub weightage_mark: String,
    pub remark: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarksRecord {
    pub serial: String,
    pub course_code: String,
    pub course_title: String,
    pub course_type: String,
    pub faculty: String,
    pub slot: String,
    pub marks: Vec<MarksRecordEach>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamScheduleRecord {
    pub serial: String,
    pub slot: String,
    pub course_name: String,
    pub course_code: String,
    pub course_type: String,
    pub course_id: String,
    /// As printed by the portal, e.g. `18-Nov-2024`.
    pub exam_date: String,
    pub exam_session: String,
    pub reporting_time: String,
    pub exam_time: String,
    pub venue: String,
    pub seat_location: String,
    pub seat_no: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerExamScheduleRecord {
    pub exam_type: String,
    pub records: Vec<ExamScheduleRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemesterData {
    pub semesters: Vec<SemesterInfo>,
    #[serde(with = "time::serde::timestamp")]
    pub update_time: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceData {
    pub records: Vec<AttendanceRecord>,
    pub semester_id: String,
    #[serde(with = "time::serde::timestamp")]
    pub update_time: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimetableData {
    pub slots: Vec<TimetableSlot>,
    pub semester_id: String,
    #[serde(with = "time::serde::timestamp")]
    pub update_time: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarksData {
    pub records: Vec<MarksRecord>,
    pub semester_id: String,
    #[serde(with = "time::serde::timestamp")]
    pub update_time: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamScheduleData {
    pub exams: Vec<PerExamScheduleRecord>,
    pub semester_id: String,
    #[serde(with = "time::serde::timestamp")]
    pub update_time: OffsetDateTime,
}
