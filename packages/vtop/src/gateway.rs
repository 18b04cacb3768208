use scraper::Html;

use crate::{
    config::ClientConfig,
    endpoint::Endpoint,
    error::{Error, Result},
    html::csrf_token,
    session::SessionContext,
    transport::{FormFields, PortalResponse, Transport},
};

const CSRF_FIELD: &str = "_csrf";
const IDENTITY_FIELD: &str = "authorizedID";

/// Issues authenticated data requests on behalf of a [`SessionContext`].
///
/// The gateway never logs in by itself: an expired session invalidates the
/// context and surfaces [`Error::SessionExpired`].
pub struct Gateway<'a, T> {
    config: &'a ClientConfig,
    transport: &'a T,
    context: &'a mut SessionContext,
}

impl<'a, T> Gateway<'a, T>
where
    T: Transport + Sync,
{
    pub fn new(config: &'a ClientConfig, transport: &'a T, context: &'a mut SessionContext) -> Self {
        Self {
            config,
            transport,
            context,
        }
    }

    #[tracing::instrument(level = tracing::Level::DEBUG, skip(self, form))]
    pub async fn call(&mut self, endpoint: Endpoint, mut form: FormFields) -> Result<String> {
        if !self.context.is_authenticated() {
            return Err(Error::NotAuthenticated);
        }
        form.insert(CSRF_FIELD.to_string(), self.context.csrf_token().to_string());
        form.insert(
            IDENTITY_FIELD.to_string(),
            self.context.registration_number().to_string(),
        );

        let response = self
            .transport
            .post_form(&self.config.endpoint_url(endpoint.path()), &form)
            .await?;

        if is_login_redirect(&response) {
            tracing::warn!("session expired, redirected to {}", response.url);
            self.context.invalidate();
            return Err(Error::SessionExpired);
        }
        if let Some(token) = csrf_token(&Html::parse_document(&response.body)) {
            self.context.refresh_token(token);
        }
        Ok(response.body)
    }
}

fn is_login_redirect(response: &PortalResponse) -> bool {
    response.url.path().to_ascii_lowercase().contains("login")
}
