use std::sync::Mutex;

use crate::{
    captcha::{CaptchaImage, CaptchaSolver},
    config::ClientConfig,
    error::{Error, Result},
    transport::{FormFields, PortalResponse, Transport},
};

pub(crate) const BASE_URL: &str = "https://portal.test/vtop";

pub(crate) fn config() -> ClientConfig {
    ClientConfig::new(BASE_URL, "https://oracle.test/captcha").unwrap()
}

#[derive(Debug, Clone)]
pub(crate) struct Request {
    pub method: &'static str,
    pub url: String,
    pub form: FormFields,
}

impl Request {
    pub fn is(&self, path: &str) -> bool {
        self.url == format!("{BASE_URL}/{path}")
    }
}

type Handler = Box<dyn Fn(&Request) -> Result<PortalResponse> + Send + Sync>;

/// In-memory portal answering every request through `handler` and recording calls.
pub(crate) struct ScriptedTransport {
    handler: Handler,
    calls: Mutex<Vec<Request>>,
}

impl ScriptedTransport {
    pub fn new(handler: impl Fn(&Request) -> PortalResponse + Send + Sync + 'static) -> Self {
        Self::fallible(move |req| Ok(handler(req)))
    }

    /// Like [`ScriptedTransport::new`], but the handler may fail the request.
    pub fn fallible(
        handler: impl Fn(&Request) -> Result<PortalResponse> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Request> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, path: &str) -> usize {
        self.calls().iter().filter(|r| r.is(path)).count()
    }

    fn handle(&self, request: Request) -> Result<PortalResponse> {
        let response = (self.handler)(&request);
        self.calls.lock().unwrap().push(request);
        response
    }
}

impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<PortalResponse> {
        self.handle(Request {
            method: "GET",
            url: url.to_string(),
            form: FormFields::new(),
        })
    }

    async fn post_form(&self, url: &str, form: &FormFields) -> Result<PortalResponse> {
        self.handle(Request {
            method: "POST",
            url: url.to_string(),
            form: form.clone(),
        })
    }
}

/// A `reqwest` failure standing in for a dropped connection.
pub(crate) fn network_error() -> Error {
    reqwest::Client::new()
        .get("http://[::1")
        .build()
        .unwrap_err()
        .into()
}

/// Response at the request URL.
pub(crate) fn page(request: &Request, body: impl Into<String>) -> PortalResponse {
    PortalResponse {
        url: request.url.parse().unwrap(),
        body: body.into(),
    }
}

pub(crate) fn redirect(path: &str, body: impl Into<String>) -> PortalResponse {
    PortalResponse {
        url: format!("{BASE_URL}/{path}").parse().unwrap(),
        body: body.into(),
    }
}

pub(crate) fn csrf_input(token: &str) -> String {
    format!(r#"<input type="hidden" name="_csrf" value="{token}">"#)
}

pub(crate) fn captcha_page(token: &str, n: usize) -> String {
    format!(
        r#"<form>{}<img class="form-control img-fluid bg-light border-0" src="data:image/jpeg;base64,Y2FwdGNoYS0{n}"></form>"#,
        csrf_input(token)
    )
}

pub(crate) fn dashboard(token: &str, registration_number: &str) -> String {
    format!(
        r#"<html><body>{}<input type="hidden" name="authorizedIDX" value="{registration_number}"></body></html>"#,
        csrf_input(token)
    )
}

/// Captcha solver answering from a closure and remembering every image it saw.
pub(crate) struct StubSolver {
    answer: Box<dyn Fn(&CaptchaImage) -> Option<String> + Send + Sync>,
    seen: Mutex<Vec<CaptchaImage>>,
}

impl StubSolver {
    pub fn new(answer: impl Fn(&CaptchaImage) -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            answer: Box::new(answer),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn always(answer: &'static str) -> Self {
        Self::new(move |_| Some(answer.to_string()))
    }

    pub fn seen(&self) -> Vec<CaptchaImage> {
        self.seen.lock().unwrap().clone()
    }
}

impl CaptchaSolver for StubSolver {
    async fn solve(&self, image: &CaptchaImage) -> Result<String> {
        self.seen.lock().unwrap().push(image.clone());
        (self.answer)(image).ok_or_else(|| Error::CaptchaUnsolved("stub gave up".to_string()))
    }
}
