use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Connection, timeout or HTTP status failure
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid portal URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The captcha oracle failed or answered with nothing
    #[error("Captcha oracle returned no solution: {0}")]
    CaptchaUnsolved(String),

    #[error("Portal rejected the captcha solution")]
    CaptchaRejected,

    #[error("Invalid credentials")]
    InvalidCredentials,

    /// A login step response lacks the form field or image it should carry
    #[error("Can't find {0} in portal response, is page changed?")]
    MissingMarkup(&'static str),

    #[error("Unexpected portal response: {0}")]
    UnexpectedResponse(String),

    #[error("Cannot parse {view}: {message}")]
    Parse { view: &'static str, message: String },

    #[error("Not authenticated, login first")]
    NotAuthenticated,

    #[error("Session expired, please login again")]
    SessionExpired,

    #[error("Login failed after {attempts} attempts")]
    LoginExhausted {
        attempts: u32,
        #[source]
        source: Box<Error>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Captcha,
    Credentials,
    Protocol,
    Parse,
    Session,
    LoginExhausted,
    Configuration,
}

impl Error {
    pub fn parse(view: &'static str, message: impl Into<String>) -> Self {
        Self::Parse {
            view,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Request(_) => ErrorKind::Network,
            Error::InvalidUrl(_) => ErrorKind::Configuration,
            Error::CaptchaUnsolved(_) | Error::CaptchaRejected => ErrorKind::Captcha,
            Error::InvalidCredentials => ErrorKind::Credentials,
            Error::MissingMarkup(_) | Error::UnexpectedResponse(_) => ErrorKind::Protocol,
            Error::Parse { .. } => ErrorKind::Parse,
            Error::NotAuthenticated | Error::SessionExpired => ErrorKind::Session,
            Error::LoginExhausted { .. } => ErrorKind::LoginExhausted,
        }
    }

    /// Whether the caller has to authenticate again before retrying.
    pub fn requires_login(&self) -> bool {
        self.kind() == ErrorKind::Session
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_login_keeps_last_cause() {
        let err = Error::LoginExhausted {
            attempts: 3,
            source: Box::new(Error::CaptchaRejected),
        };
        assert_eq!(err.kind(), ErrorKind::LoginExhausted);
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "Portal rejected the captcha solution");
    }

    #[test]
    fn session_errors_require_login() {
        assert!(Error::SessionExpired.requires_login());
        assert!(Error::NotAuthenticated.requires_login());
        assert!(!Error::InvalidCredentials.requires_login());
        assert!(!Error::parse("marks", "no table").requires_login());
    }
}
