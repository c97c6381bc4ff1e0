use std::fmt;
use std::time::Duration;

use issuesync_domain::SyncError;
use reqwest::header::HeaderMap;
use reqwest::{Client as ReqwestClient, IntoUrl, Method, Request, RequestBuilder, Response};
use tracing::{debug, warn};

use crate::errors::InfraError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_ATTEMPTS: usize = 1;
const DEFAULT_BACKOFF: Duration = Duration::from_millis(200);

/// Credentials sent as HTTP basic auth on every request
#[derive(Clone)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth").field("username", &self.username).finish_non_exhaustive()
    }
}

/// Exponential delay between attempts, doubling from `base`
#[derive(Debug, Clone, Copy)]
struct Backoff {
    attempts: usize,
    base: Duration,
}

impl Backoff {
    /// Delay before retry number `retry` (1-based). The exponent is capped.
    fn delay(&self, retry: usize) -> Duration {
        let exponent = u32::try_from(retry.saturating_sub(1).min(8)).unwrap_or(8);
        self.base.saturating_mul(1u32 << exponent)
    }

    async fn wait(&self, retry: usize) {
        let delay = self.delay(retry);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Shared REST transport for both tracker clients.
///
/// One attempt per request by default. With `max_attempts` above one, GET and
/// HEAD are replayed on transport failures and 5xx responses; writes are
/// always sent exactly once.
#[derive(Clone)]
pub struct HttpClient {
    inner: ReqwestClient,
    auth: Option<BasicAuth>,
    backoff: Backoff,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    pub fn new() -> Result<Self, SyncError> {
        Self::builder().build()
    }

    /// Request builder with credentials attached when configured
    pub fn request<U: IntoUrl>(&self, method: Method, url: U) -> RequestBuilder {
        let builder = self.inner.request(method, url);
        match &self.auth {
            Some(BasicAuth { username, password }) => builder.basic_auth(username, Some(password)),
            None => builder,
        }
    }

    /// Send and return the final response whatever its status.
    ///
    /// Only GET and HEAD are replayed after a 5xx or transport failure. A
    /// mutating call may already have been applied, so it gets one attempt.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, SyncError> {
        let mut attempt = 1;
        loop {
            let request = prepare(&builder)?;
            let last_attempt =
                !is_replayable(request.method()) || attempt >= self.backoff.attempts;
            match self.exchange(request, attempt).await {
                Ok(response) if response.status().is_server_error() && !last_attempt => {}
                Ok(response) => return Ok(response),
                Err(err) if is_transient(&err) && !last_attempt => {}
                Err(err) => return Err(InfraError::from(err).into()),
            }
            self.backoff.wait(attempt).await;
            attempt += 1;
        }
    }

    /// Send and convert any non-success status with [`status_error`].
    pub async fn send_checked(&self, builder: RequestBuilder) -> Result<Response, SyncError> {
        let response = self.send(builder).await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(status_error(response).await)
        }
    }

    async fn exchange(&self, request: Request, attempt: usize) -> reqwest::Result<Response> {
        let (method, url) = (request.method().clone(), request.url().clone());
        let outcome = self.inner.execute(request).await;
        match &outcome {
            Ok(response) => {
                debug!(attempt, %method, %url, status = %response.status(), "http response")
            }
            Err(err) => warn!(attempt, %method, %url, error = %err, "http request failed"),
        }
        outcome
    }
}

/// Build a fresh request from `builder`, leaving it usable for the next attempt
fn prepare(builder: &RequestBuilder) -> Result<Request, SyncError> {
    let request = builder
        .try_clone()
        .ok_or_else(|| SyncError::Internal("streaming request body cannot be replayed".into()))?
        .build()
        .map_err(InfraError::from)?;
    Ok(request)
}

fn is_replayable(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD)
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

/// Map a non-success response to the domain error for its status.
///
/// The body is kept verbatim: trackers put field-level validation messages
/// there and callers match on them.
pub async fn status_error(response: Response) -> SyncError {
    let status = response.status();
    let url = response.url().clone();
    let body = response.text().await.unwrap_or_default();
    let message =
        if body.is_empty() { format!("HTTP {} from {url}", status.as_u16()) } else { body };

    match status.as_u16() {
        400 => SyncError::Validation(message),
        401 | 403 => SyncError::Auth(message),
        404 => SyncError::NotFound(message),
        code => SyncError::Api { status: code, message },
    }
}

/// Builder for [`HttpClient`]
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    backoff: Backoff,
    user_agent: String,
    headers: HeaderMap,
    auth: Option<BasicAuth>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            backoff: Backoff { attempts: DEFAULT_ATTEMPTS, base: DEFAULT_BACKOFF },
            user_agent: concat!("issuesync/", env!("CARGO_PKG_VERSION")).to_string(),
            headers: HeaderMap::new(),
            auth: None,
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total attempts for GET and HEAD, first try included
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.backoff.attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.backoff.base = backoff;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Send basic auth when both values are non-empty
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        let (username, password) = (username.into(), password.into());
        self.auth =
            (!username.is_empty() && !password.is_empty()).then_some(BasicAuth { username, password });
        self
    }

    pub fn build(self) -> Result<HttpClient, SyncError> {
        let inner = ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .default_headers(self.headers)
            .no_proxy()
            .build()
            .map_err(InfraError::from)?;
        Ok(HttpClient { inner, auth: self.auth, backoff: self.backoff })
    }
}
