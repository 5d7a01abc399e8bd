//! The transport seam and the default ureq-backed implementation.
//!
//! # Design
//! A `Transport` executes one `WireRequest` and returns the raw response
//! with an unread body. It owns every network concern: connection reuse,
//! redirects, retries, and enforcing the request's `Context`. Any
//! `Fn(WireRequest) -> Result<RawResponse, BoxError>` is a transport, which
//! keeps tests free of sockets.

use std::time::Duration;

use serde::Deserialize;

use crate::body::{self, BoxBody};
use crate::context::Context;
use crate::error::BoxError;
use crate::request::WireRequest;

/// A response as produced by a transport, before wrapping.
pub type RawResponse = http::Response<BoxBody>;

pub const DEFAULT_USER_AGENT: &str = concat!("courier/", env!("CARGO_PKG_VERSION"));

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Executes one prepared request and returns the response with its body
/// still unread. Implementations enforce the request's `Context`.
pub trait Transport: Send + Sync {
    fn execute(&self, request: WireRequest) -> Result<RawResponse, BoxError>;
}

impl<F> Transport for F
where
    F: Fn(WireRequest) -> Result<RawResponse, BoxError> + Send + Sync,
{
    fn execute(&self, request: WireRequest) -> Result<RawResponse, BoxError> {
        self(request)
    }
}

/// Settings for `UreqTransport`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransportSettings {
    /// Upper bound for a whole call when the context has no deadline.
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

/// Blocking transport on a shared `ureq::Agent`.
///
/// Non-2xx statuses come back as responses, not errors; status
/// interpretation is left to `Response::is_successful`.
///
/// The call blocks, so cancelling the context does not interrupt a request
/// in flight: the cancellation is only reported once the call returns. Use a
/// deadline (`Context::with_timeout`) to bound how long a call can take.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    timeout: Duration,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(&TransportSettings::default())
    }
}

impl UreqTransport {
    pub fn new(settings: &TransportSettings) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .user_agent(settings.user_agent.as_str())
            .build()
            .new_agent();
        Self {
            agent,
            timeout: settings.timeout,
        }
    }

    /// The whole-call timeout: the context's remaining time, capped by the
    /// configured timeout.
    fn timeout_for(&self, context: &Context) -> Duration {
        context
            .remaining()
            .map_or(self.timeout, |left| left.min(self.timeout))
    }

    fn run<S: ureq::AsSendBody>(
        &self,
        request: http::Request<S>,
        timeout: Duration,
    ) -> Result<RawResponse, BoxError> {
        let request = self
            .agent
            .configure_request(request)
            .timeout_global(Some(timeout))
            .build();
        let response = self.agent.run(request)?;
        let (parts, stream) = response.into_parts();
        Ok(http::Response::from_parts(
            parts,
            body::from_reader(stream.into_reader()),
        ))
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: WireRequest) -> Result<RawResponse, BoxError> {
        let (request, context) = request.into_parts();
        context.check()?;

        let timeout = self.timeout_for(&context);
        tracing::debug!(
            method = %request.method(),
            uri = %request.uri(),
            timeout_ms = timeout.as_millis() as u64,
            "dispatching request"
        );

        let (parts, payload) = request.into_parts();
        let result = match payload {
            Some(bytes) => self.run(http::Request::from_parts(parts, bytes.to_vec()), timeout),
            None => self.run(http::Request::from_parts(parts, ()), timeout),
        };

        // The agent cannot observe cancellation mid-flight; report it if it
        // happened while the call was running.
        if context.is_cancelled() {
            return Err(crate::context::ContextError::Cancelled.into());
        }
        result
    }
}
