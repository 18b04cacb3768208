use scraper::Html;
use time::OffsetDateTime;

use crate::{
    auth::Authenticator,
    captcha::{CaptchaSolver, RemoteCaptchaSolver},
    config::{ClientConfig, Credentials},
    endpoint::Endpoint,
    error::Result,
    gateway::Gateway,
    model::{AttendanceData, ExamScheduleData, MarksData, SemesterData, TimetableData},
    parser,
    session::SessionContext,
    transport::{FormFields, HttpTransport, Transport},
};

/// Client for one student session on the portal.
///
/// Operations take `&mut self`: a client serves one request at a time. Use one
/// client per concurrent session.
pub struct VtopClient<T = HttpTransport, C = RemoteCaptchaSolver> {
    config: ClientConfig,
    credentials: Credentials,
    transport: T,
    solver: C,
    context: SessionContext,
}

impl VtopClient {
    pub fn new(config: ClientConfig, credentials: Credentials) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        let solver = RemoteCaptchaSolver::new(&config)?;
        Ok(Self::with_parts(config, credentials, transport, solver))
    }
}

impl<T, C> VtopClient<T, C>
where
    T: Transport + Sync,
    C: CaptchaSolver + Sync,
{
    pub fn with_parts(config: ClientConfig, credentials: Credentials, transport: T, solver: C) -> Self {
        Self {
            config,
            credentials,
            transport,
            solver,
            context: SessionContext::default(),
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn is_authenticated(&self) -> bool {
        self.context.is_authenticated()
    }

    /// Logs in with the stored credentials, replacing any previous session.
    pub async fn login(&mut self) -> Result<&SessionContext> {
        let Credentials { username, password } = self.credentials.clone();
        self.authenticate(&username, &password).await
    }

    /// Logs in with the given credentials, replacing any previous session.
    pub async fn authenticate(&mut self, username: &str, password: &str) -> Result<&SessionContext> {
        self.context.invalidate();
        let context = Authenticator::new(&self.config, &self.transport, &self.solver)
            .authenticate(username, password)
            .await?;
        self.credentials = Credentials::new(username, password);
        self.context = context;
        Ok(&self.context)
    }

    /// Forgets the session locally. Data calls fail until the next login.
    pub fn logout(&mut self) {
        tracing::info!("logging out {}", self.context.registration_number());
        self.context.invalidate();
    }

    async fn fetch(&mut self, endpoint: Endpoint, form: FormFields) -> Result<String> {
        Gateway::new(&self.config, &self.transport, &mut self.context)
            .call(endpoint, form)
            .await
    }

    async fn fetch_semester_view(&mut self, endpoint: Endpoint, semester_id: &str) -> Result<String> {
        let mut form = FormFields::new();
        form.insert("semesterSubId".to_string(), semester_id.to_string());
        self.fetch(endpoint, form).await
    }

    pub async fn semesters(&mut self) -> Result<SemesterData> {
        let mut form = FormFields::new();
        form.insert("verifyMenu".to_string(), "true".to_string());
        let body = self.fetch(Endpoint::Semesters, form).await?;
        let semesters = parser::semester::parse(&Html::parse_document(&body))?;
        tracing::info!("found {} semesters", semesters.len());
        Ok(SemesterData {
            semesters,
            update_time: OffsetDateTime::now_utc(),
        })
    }

    pub async fn attendance(&mut self, semester_id: &str) -> Result<AttendanceData> {
        let body = self
            .fetch_semester_view(Endpoint::Attendance, semester_id)
            .await?;
        let records = parser::attendance::parse(&Html::parse_document(&body))?;
        Ok(AttendanceData {
            records,
            semester_id: semester_id.to_string(),
            update_time: OffsetDateTime::now_utc(),
        })
    }

    pub async fn timetable(&mut self, semester_id: &str) -> Result<TimetableData> {
        let body = self
            .fetch_semester_view(Endpoint::Timetable, semester_id)
            .await?;
        let slots = parser::timetable::parse(&Html::parse_document(&body))?;
        Ok(TimetableData {
            slots,
            semester_id: semester_id.to_string(),
            update_time: OffsetDateTime::now_utc(),
        })
    }

    pub async fn marks(&mut self, semester_id: &str) -> Result<MarksData> {
        let body = self.fetch_semester_view(Endpoint::Marks, semester_id).await?;
        let records = parser::marks::parse(&Html::parse_document(&body))?;
        Ok(MarksData {
            records,
            semester_id: semester_id.to_string(),
            update_time: OffsetDateTime::now_utc(),
        })
    }

    /// Returns `None` when the portal shows no schedule table for the semester.
    pub async fn exam_schedule(&mut self, semester_id: &str) -> Result<Option<ExamScheduleData>> {
        let body = self
            .fetch_semester_view(Endpoint::ExamSchedule, semester_id)
            .await?;
        let exams = parser::exam_schedule::parse(&Html::parse_document(&body))?;
        Ok(exams.map(|exams| ExamScheduleData {
            exams,
            semester_id: semester_id.to_string(),
            update_time: OffsetDateTime::now_utc(),
        }))
    }
}
