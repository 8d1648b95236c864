//! Outbound HTTP seam shared by the gateway clients.
//!
//! - `HttpDoer` executes a single request and returns the status and the full body
//! - `RequestContext` carries the caller's cancellation and deadline
//! - `build_http_client` builds the shared `reqwest` client with a bounded timeout

use async_trait::async_trait;
use reqwest::{Client, Request, StatusCode};
use std::{fmt::Debug, future::Future, time::Duration};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::DEFAULT_HTTP_TIMEOUT;

pub mod endpoint;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Context(#[from] ContextError),

    /// Failures that only stub transports produce.
    #[cfg(test)]
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("context canceled")]
    Cancelled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Failure while reading a response body after the status line arrived.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct BodyError(pub String);

/// Status plus the fully read body.
#[derive(Debug)]
pub struct HttpResponse {
    status: StatusCode,
    body: Result<Vec<u8>, BodyError>,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self { status, body: Ok(body.into()) }
    }

    pub fn with_body_error(status: StatusCode, error: impl Into<String>) -> Self {
        Self { status, body: Err(BodyError(error.into())) }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> Result<&[u8], &BodyError> {
        self.body.as_deref()
    }
}

/// Executes a single HTTP request.
#[async_trait]
pub trait HttpDoer: Send + Sync + Debug {
    async fn execute(&self, request: Request) -> Result<HttpResponse, TransportError>;
}

/// `HttpDoer` backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestDoer {
    client: Client,
}

impl ReqwestDoer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self, TransportError> {
        Ok(Self::new(build_http_client(timeout)?))
    }
}

#[async_trait]
impl HttpDoer for ReqwestDoer {
    async fn execute(&self, request: Request) -> Result<HttpResponse, TransportError> {
        let res = self.client.execute(request).await?;
        let status = res.status();

        let body = match res.bytes().await {
            Ok(bytes) => HttpResponse::new(status, bytes.to_vec()),
            Err(err) => HttpResponse::with_body_error(status, err.to_string()),
        };

        Ok(body)
    }
}

/// Build the outbound client. `None` or a zero timeout means 3 seconds.
pub fn build_http_client(timeout: Option<Duration>) -> Result<Client, reqwest::Error> {
    let timeout = timeout.filter(|t| !t.is_zero()).unwrap_or(DEFAULT_HTTP_TIMEOUT);
    Client::builder().timeout(timeout).build()
}

/// Cancellation and deadline of the request being served.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Drive `fut` until it completes, the token is cancelled or the deadline passes.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, ContextError> {
        let deadline = async {
            match self.deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ContextError::Cancelled),
            _ = deadline => Err(ContextError::DeadlineExceeded),
            out = fut => Ok(out),
        }
    }

    /// Execute `request` through `http`, honouring this context.
    pub async fn execute(
        &self,
        http: &dyn HttpDoer,
        request: Request,
    ) -> Result<HttpResponse, TransportError> {
        self.run(http.execute(request)).await?
    }
}
