/// Portal pages the client talks to, relative to [`ClientConfig::base_url`](crate::ClientConfig).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    OpenPage,
    PreloginSetup,
    Login,
    Semesters,
    Attendance,
    Timetable,
    Marks,
    ExamSchedule,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::OpenPage => "open/page",
            Endpoint::PreloginSetup => "prelogin/setup",
            Endpoint::Login => "login",
            Endpoint::Semesters => "academics/common/StudentTimeTable",
            Endpoint::Attendance => "processViewStudentAttendance",
            Endpoint::Timetable => "processViewTimeTable",
            Endpoint::Marks => "examinations/doStudentMarkView",
            Endpoint::ExamSchedule => "examinations/doSearchExamScheduleForStudent",
        }
    }
}
