#![forbid(unsafe_code)]

//! Blocking HTTP implementation of [`QuizBackend`].
//!
//! Endpoint paths come from [`Endpoints`] and are resolved against the
//! quiz origin, so the relative URLs a page carries in its data attributes
//! work unchanged. Mutating calls carry the `csrftoken` cookie value in an
//! `X-CSRFToken` header.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Result |
//! |---------|-------|--------|
//! | Connection refused, DNS, TLS, timeout | Network | [`BackendError::Transport`] |
//! | Non-2xx response | Backend rejected the call | [`BackendError::Status`] |
//! | Body is not the expected JSON | Backend contract drift | [`BackendError::Decode`] |
//! | Endpoint cannot be resolved | Bad configuration | [`BackendError::Transport`] |

use std::time::Duration;

use proctor_core::config::Endpoints;
use proctor_runtime::backend::{
    AnswerSubmission, BackendError, FinalizeReceipt, QuestionId, QuestionList, QuestionPayload,
    QuizBackend, StatusSnapshot,
};
use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

/// Cookie holding the CSRF token.
pub const CSRF_COOKIE: &str = "csrftoken";

/// Header carrying the CSRF token on POST requests.
pub const CSRF_HEADER: &str = "X-CSRFToken";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Extract the CSRF token from a `Cookie` header value
/// (`"a=1; csrftoken=abc"` → `Some("abc")`).
#[must_use]
pub fn csrf_from_cookie_header(cookies: &str) -> Option<&str> {
    cookies
        .split(';')
        .map(str::trim)
        .find_map(|cookie| cookie.strip_prefix(CSRF_COOKIE)?.strip_prefix('='))
}

/// [`QuizBackend`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    origin: Url,
    endpoints: Endpoints,
    csrf_token: String,
}

impl HttpBackend {
    /// Create a backend for the quiz served at `origin`.
    pub fn new(origin: &str, endpoints: Endpoints) -> Result<Self, BackendError> {
        let origin = Url::parse(origin)
            .map_err(|err| BackendError::Transport(format!("invalid origin {origin}: {err}")))?;
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| BackendError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            origin,
            endpoints,
            csrf_token: String::new(),
        })
    }

    /// Use `token` for `X-CSRFToken`.
    #[must_use]
    pub fn with_csrf_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = token.into();
        self
    }

    /// Take the CSRF token from the page's cookies. A missing cookie sends an
    /// empty token.
    #[must_use]
    pub fn with_cookies(self, cookies: &str) -> Self {
        let token = csrf_from_cookie_header(cookies).unwrap_or_default().to_owned();
        self.with_csrf_token(token)
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Resolve an endpoint path against the origin.
    pub fn url(&self, path: &str) -> Result<Url, BackendError> {
        self.origin
            .join(path)
            .map_err(|err| BackendError::Transport(format!("invalid endpoint {path}: {err}")))
    }

    fn get(&self, path: &str) -> Result<RequestBuilder, BackendError> {
        Ok(self.client.get(self.url(path)?))
    }

    fn post(&self, path: &str) -> Result<RequestBuilder, BackendError> {
        Ok(self
            .client
            .post(self.url(path)?)
            .header(CSRF_HEADER, self.csrf_token.as_str()))
    }
}

/// Send a request and return the body of a 2xx response.
fn send(request: RequestBuilder) -> Result<String, BackendError> {
    let response = request
        .send()
        .map_err(|err| BackendError::Transport(err.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        tracing::debug!(status = status.as_u16(), url = %response.url(), "backend rejected request");
        return Err(BackendError::Status(status.as_u16()));
    }
    response
        .text()
        .map_err(|err| BackendError::Transport(err.to_string()))
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, BackendError> {
    serde_json::from_str(body).map_err(|err| BackendError::Decode(err.to_string()))
}

impl QuizBackend for HttpBackend {
    fn questions(&mut self) -> Result<QuestionList, BackendError> {
        decode(&send(self.get(&self.endpoints.questions)?)?)
    }

    fn question(&mut self, id: QuestionId) -> Result<QuestionPayload, BackendError> {
        decode(&send(self.get(&self.endpoints.question_url(id))?)?)
    }

    fn save_answer(
        &mut self,
        id: QuestionId,
        submission: &AnswerSubmission,
    ) -> Result<(), BackendError> {
        let request = self
            .post(&self.endpoints.answer_url(id))?
            .form(&submission.form_fields());
        send(request).map(drop)
    }

    fn status(&mut self) -> Result<StatusSnapshot, BackendError> {
        decode(&send(self.get(&self.endpoints.status)?)?)
    }

    fn finalize(&mut self) -> Result<FinalizeReceipt, BackendError> {
        decode(&send(self.post(&self.endpoints.finalize)?)?)
    }
}
