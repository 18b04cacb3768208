use serde::Serialize;

/// Per-login portal state: the anti-forgery token and the registration number.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionContext {
    #[serde(skip)]
    csrf_token: String,
    registration_number: String,
    authenticated: bool,
}

impl SessionContext {
    pub(crate) fn authenticated(csrf_token: String, registration_number: String) -> Self {
        Self {
            csrf_token,
            registration_number,
            authenticated: true,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn csrf_token(&self) -> &str {
        &self.csrf_token
    }

    pub fn registration_number(&self) -> &str {
        &self.registration_number
    }

    pub(crate) fn refresh_token(&mut self, token: String) {
        if token != self.csrf_token {
            tracing::trace!("security token refreshed");
            self.csrf_token = token;
        }
    }

    pub(crate) fn invalidate(&mut self) {
        self.authenticated = false;
    }
}
