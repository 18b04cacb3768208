use std::{fmt, time::Duration};

use url::Url;

use crate::error::Result;

pub const DEFAULT_BASE_URL: &str = "https://vtop.vitap.ac.in/vtop";
pub const DEFAULT_CAPTCHA_URL: &str = "https://cap.va.synaptic.gg/captcha";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Linux; U; Linux x86_64; en-US) Gecko/20100101 Firefox/130.5";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Portal root, every endpoint path is appended to it.
    pub base_url: Url,
    pub captcha_url: Url,
    /// Upper bound of full login handshakes before giving up.
    pub login_attempts: u32,
    pub user_agent: String,
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub const LOGIN_ATTEMPTS: u32 = 3;

    pub fn new(base_url: &str, captcha_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: base_url.parse()?,
            captcha_url: captcha_url.parse()?,
            ..Self::default()
        })
    }

    pub fn with_login_attempts(mut self, attempts: u32) -> Self {
        self.login_attempts = attempts.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub(crate) fn endpoint_url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.as_str().trim_end_matches('/'))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
            captcha_url: Url::parse(DEFAULT_CAPTCHA_URL).expect("default captcha url is valid"),
            login_attempts: Self::LOGIN_ATTEMPTS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: None,
        }
    }
}

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_url_joins_without_double_slash() {
        let config = ClientConfig::new("https://portal.test/vtop/", DEFAULT_CAPTCHA_URL).unwrap();
        assert_eq!(
            config.endpoint_url("open/page"),
            "https://portal.test/vtop/open/page"
        );
    }

    #[test]
    fn login_attempts_never_zero() {
        let config = ClientConfig::default().with_login_attempts(0);
        assert_eq!(config.login_attempts, 1);
    }

    #[test]
    fn credentials_debug_hides_password() {
        let debug = format!("{:?}", Credentials::new("22BCE0001", "hunter2"));
        assert!(debug.contains("22BCE0001"));
        assert!(!debug.contains("hunter2"));
    }
}
