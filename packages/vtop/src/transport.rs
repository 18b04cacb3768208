use std::{future::Future, sync::Arc};

use indexmap::IndexMap;
use reqwest::{
    Client,
    cookie::Jar,
    header::{ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CACHE_CONTROL, CONNECTION, HeaderMap, HeaderValue},
};
use url::Url;

use crate::{config::ClientConfig, error::Result};

/// Ordered form body. Inserting an existing key replaces its value in place.
pub type FormFields = IndexMap<String, String>;

/// Final response of a request after redirects were followed.
#[derive(Debug, Clone)]
pub struct PortalResponse {
    pub url: Url,
    pub body: String,
}

/// Cookie-carrying session against the portal.
pub trait Transport {
    fn get(&self, url: &str) -> impl Future<Output = Result<PortalResponse>> + Send;

    fn post_form(
        &self,
        url: &str,
        form: &FormFields,
    ) -> impl Future<Output = Result<PortalResponse>> + Send;
}

fn default_header() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate, br"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .cookie_provider(Arc::new(Jar::default()))
            .user_agent(&config.user_agent)
            .default_headers(default_header());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<PortalResponse> {
        tracing::debug!("GET {url}");
        let res = self.client.get(url).send().await?.error_for_status()?;
        let url = res.url().clone();
        let body = res.text().await?;
        Ok(PortalResponse { url, body })
    }

    async fn post_form(&self, url: &str, form: &FormFields) -> Result<PortalResponse> {
        tracing::debug!("POST {url}");
        let res = self
            .client
            .post(url)
            .form(form)
            .send()
            .await?
            .error_for_status()?;
        let url = res.url().clone();
        let body = res.text().await?;
        Ok(PortalResponse { url, body })
    }
}
