//! Login handshake: security token, captcha challenge, credential submission.

use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::{
    captcha::{CaptchaImage, CaptchaSolver},
    config::ClientConfig,
    endpoint::Endpoint,
    error::{Error, Result},
    html::{csrf_token, input_value},
    session::SessionContext,
    transport::{FormFields, PortalResponse, Transport},
};

static CAPTCHA_IMAGE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img.img-fluid").unwrap());

static IDENTITY_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"input[name="authorizedIDX"]"#).unwrap());

const CAPTCHA_REJECTED_MARKERS: &[&str] = &["Invalid Captcha"];
const INVALID_CREDENTIAL_MARKERS: &[&str] =
    &["Invalid LoginId", "Invalid Username", "Invalid Password"];

/// Where the next attempt resumes.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LoginState {
    Start,
    TokenAcquired { token: String },
}

/// Why an attempt did not authenticate.
#[derive(Debug)]
enum AttemptFailure {
    Retry { resume: LoginState, cause: Error },
    Fatal(Error),
}

fn retry_from(resume: LoginState) -> impl FnOnce(Error) -> AttemptFailure {
    move |cause| AttemptFailure::Retry { resume, cause }
}

/// Classified response of the credential submission.
#[derive(Debug, PartialEq, Eq)]
enum LoginResponse {
    Authenticated {
        token: String,
        registration_number: String,
    },
    CaptchaRejected {
        token: Option<String>,
    },
    InvalidCredentials,
    Unexpected(String),
}

impl LoginResponse {
    fn classify(response: &PortalResponse) -> Self {
        let body = &response.body;
        if CAPTCHA_REJECTED_MARKERS.iter().any(|m| body.contains(m)) {
            let token = csrf_token(&Html::parse_document(body));
            return LoginResponse::CaptchaRejected { token };
        }
        if INVALID_CREDENTIAL_MARKERS.iter().any(|m| body.contains(m))
            || response.url.path().to_ascii_lowercase().contains("error")
        {
            return LoginResponse::InvalidCredentials;
        }
        let document = Html::parse_document(body);
        match (
            csrf_token(&document),
            input_value(&document, &IDENTITY_SELECTOR),
        ) {
            (Some(token), Some(registration_number)) => LoginResponse::Authenticated {
                token,
                registration_number,
            },
            (token, identity) => LoginResponse::Unexpected(format!(
                "login response at {} carries token: {}, identity: {}",
                response.url,
                token.is_some(),
                identity.is_some()
            )),
        }
    }
}

/// Drives the login handshake with a bounded number of attempts.
pub struct Authenticator<'a, T, C> {
    config: &'a ClientConfig,
    transport: &'a T,
    solver: &'a C,
}

impl<'a, T, C> Authenticator<'a, T, C>
where
    T: Transport + Sync,
    C: CaptchaSolver + Sync,
{
    pub fn new(config: &'a ClientConfig, transport: &'a T, solver: &'a C) -> Self {
        Self {
            config,
            transport,
            solver,
        }
    }

    /// Logs in and returns an authenticated context.
    ///
    /// A rejected captcha is retried with a fresh challenge and transient
    /// failures restart the handshake, both within `login_attempts`. Invalid
    /// credentials and unexpected responses fail at once.
    #[tracing::instrument(level = tracing::Level::INFO, skip(self, password))]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<SessionContext> {
        let attempts = self.config.login_attempts.max(1);
        let mut state = LoginState::Start;
        let mut last_cause = None;
        for attempt in 1..=attempts {
            tracing::debug!("login attempt {attempt}/{attempts} from {state:?}");
            match self.attempt(state.clone(), username, password).await {
                Ok(context) => {
                    tracing::info!("logged in as {}", context.registration_number());
                    return Ok(context);
                }
                Err(AttemptFailure::Fatal(e)) => {
                    tracing::warn!("login failed: {e}");
                    return Err(e);
                }
                Err(AttemptFailure::Retry { resume, cause }) => {
                    tracing::warn!("login attempt {attempt}/{attempts} failed: {cause}");
                    state = resume;
                    last_cause = Some(cause);
                }
            }
        }
        Err(Error::LoginExhausted {
            attempts,
            source: Box::new(last_cause.unwrap_or(Error::UnexpectedResponse(
                "no login attempt was made".to_string(),
            ))),
        })
    }

    async fn attempt(
        &self,
        state: LoginState,
        username: &str,
        password: &str,
    ) -> std::result::Result<SessionContext, AttemptFailure> {
        let token = match state {
            LoginState::Start => self
                .acquire_token()
                .await
                .map_err(retry_from(LoginState::Start))?,
            LoginState::TokenAcquired { token } => token,
        };

        let (token, image) = self
            .fetch_captcha(token)
            .await
            .map_err(retry_from(LoginState::Start))?;

        let solution = self
            .solver
            .solve(&image)
            .await
            .map_err(retry_from(LoginState::Start))?;

        let mut form = FormFields::new();
        form.insert("_csrf".to_string(), token.clone());
        form.insert("username".to_string(), username.to_string());
        form.insert("password".to_string(), password.to_string());
        form.insert("captchaStr".to_string(), solution);
        let response = self
            .transport
            .post_form(&self.config.endpoint_url(Endpoint::Login.path()), &form)
            .await
            .map_err(retry_from(LoginState::Start))?;

        match LoginResponse::classify(&response) {
            LoginResponse::Authenticated {
                token,
                registration_number,
            } => Ok(SessionContext::authenticated(token, registration_number)),
            LoginResponse::CaptchaRejected { token: fresh } => Err(AttemptFailure::Retry {
                resume: LoginState::TokenAcquired {
                    token: fresh.unwrap_or(token),
                },
                cause: Error::CaptchaRejected,
            }),
            LoginResponse::InvalidCredentials => {
                Err(AttemptFailure::Fatal(Error::InvalidCredentials))
            }
            LoginResponse::Unexpected(message) => {
                Err(AttemptFailure::Fatal(Error::UnexpectedResponse(message)))
            }
        }
    }

    async fn acquire_token(&self) -> Result<String> {
        let response = self
            .transport
            .get(&self.config.endpoint_url(Endpoint::OpenPage.path()))
            .await?;
        csrf_token(&Html::parse_document(&response.body))
            .ok_or(Error::MissingMarkup("security token"))
    }

    /// Requests a new challenge. The returned token replaces `token` when the page carries one.
    async fn fetch_captcha(&self, token: String) -> Result<(String, CaptchaImage)> {
        let mut form = FormFields::new();
        form.insert("_csrf".to_string(), token.clone());
        form.insert("flag".to_string(), "VTOP".to_string());
        let response = self
            .transport
            .post_form(&self.config.endpoint_url(Endpoint::PreloginSetup.path()), &form)
            .await?;
        let document = Html::parse_document(&response.body);
        let token = csrf_token(&document).unwrap_or(token);
        let image = document
            .select(&CAPTCHA_IMAGE_SELECTOR)
            .filter_map(|img| img.attr("src"))
            .find_map(CaptchaImage::from_src)
            .ok_or(Error::MissingMarkup("captcha image"))?;
        Ok((token, image))
    }
}
