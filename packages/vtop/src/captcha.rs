use std::future::Future;

use base64::{Engine as _, engine::general_purpose::URL_SAFE};
use reqwest::Client;
use serde::Serialize;
use url::Url;

use crate::{
    config::ClientConfig,
    error::{Error, Result},
};

/// Captcha challenge image as embedded by the portal, a `data:image/...;base64,...` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptchaImage {
    data_url: String,
}

impl CaptchaImage {
    /// Accepts an `img` `src` value when it carries an inline base64 payload.
    pub fn from_src(src: &str) -> Option<Self> {
        let src = src.trim();
        let (_, payload) = src.split_once("base64,")?;
        (!payload.is_empty()).then(|| Self {
            data_url: src.to_string(),
        })
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }
}

/// Oracle reading a captcha image. Its answer may be wrong.
pub trait CaptchaSolver {
    fn solve(&self, image: &CaptchaImage) -> impl Future<Output = Result<String>> + Send;
}

#[derive(Serialize)]
struct SolveRequest {
    imgstring: String,
}

/// Solver backed by the remote captcha HTTP endpoint.
pub struct RemoteCaptchaSolver {
    client: Client,
    endpoint: Url,
}

impl RemoteCaptchaSolver {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(&config.user_agent);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            endpoint: config.captcha_url.clone(),
        })
    }
}

impl CaptchaSolver for RemoteCaptchaSolver {
    #[tracing::instrument(level = tracing::Level::DEBUG, name = "solve_captcha", skip_all)]
    async fn solve(&self, image: &CaptchaImage) -> Result<String> {
        let request = SolveRequest {
            imgstring: URL_SAFE.encode(image.data_url()),
        };
        let res = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(Error::CaptchaUnsolved(format!(
                "oracle responded with {}",
                res.status()
            )));
        }
        let answer = res.text().await?.trim().to_string();
        if answer.is_empty() {
            return Err(Error::CaptchaUnsolved("empty answer".to_string()));
        }
        tracing::debug!("captcha oracle answered {answer}");
        Ok(answer)
    }
}
