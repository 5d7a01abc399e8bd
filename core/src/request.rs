//! Request intents and their preparation into wire requests.
//!
//! # Design
//! `Request` is what callers describe: a method string, a path relative to
//! the client's URL prefix, headers, and an optional serializable body.
//! `WireRequest` is what transports see: a fully resolved `http::Request`
//! with an absolute URI, final headers, the encoded body, and the caller's
//! `Context`.
//!
//! `prepare` is the only way to get from one to the other. It never touches
//! the network; every failure it reports happens before a transport is
//! involved.

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use http::{Method, Uri};
use serde::Serialize;

use crate::codec::{Marshalled, Marshaller};
use crate::context::Context;
use crate::error::{Error, SerializationError};

/// An HTTP request intent.
///
/// Body-less requests use the default `B = ()`; the body stays `None`.
#[derive(Debug, Clone)]
pub struct Request<B = ()> {
    /// An empty method is sent as GET.
    pub method: String,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<B>,
}

impl Request<()> {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET.as_str(), path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE.as_str(), path)
    }
}

impl<B> Request<B> {
    pub fn post(path: impl Into<String>, body: B) -> Self {
        Request::new(Method::POST.as_str(), path).body(body)
    }

    pub fn put(path: impl Into<String>, body: B) -> Self {
        Request::new(Method::PUT.as_str(), path).body(body)
    }

    /// Replace the body, changing the body type if needed.
    pub fn body<T>(self, body: T) -> Request<T> {
        Request {
            method: self.method,
            path: self.path,
            headers: self.headers,
            body: Some(body),
        }
    }

    /// Append one header value; existing values for the name are kept.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Replace the whole header set.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}

/// A transport-ready request: absolute URI, final headers, encoded body.
#[derive(Debug)]
pub struct WireRequest {
    inner: http::Request<Option<Bytes>>,
    context: Context,
}

impl WireRequest {
    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.inner.body().as_ref()
    }

    /// The caller's cancellation and deadline; transports must honor it.
    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn into_parts(self) -> (http::Request<Option<Bytes>>, Context) {
        (self.inner, self.context)
    }
}

// ---------------------------------------------------------------------------
// Preparation
// ---------------------------------------------------------------------------

/// Build the wire request for `request`.
///
/// Mandatory headers are appended next to caller-supplied values of the same
/// name. A non-empty content type from the marshaller replaces any
/// `Content-Type` the caller set.
pub(crate) fn prepare<B, M>(
    request: Request<B>,
    marshaller: Option<&M>,
    mandatory_headers: &HeaderMap,
    prefix: &str,
    context: Context,
) -> Result<WireRequest, Error>
where
    B: Serialize,
    M: Marshaller,
{
    let Request {
        method,
        path,
        headers,
        body,
    } = request;

    let marshalled = prepare_body(body.as_ref(), marshaller)?;
    let (content_type, payload) = match marshalled {
        Some(Marshalled {
            content_type,
            bytes,
        }) => (content_type, Some(bytes)),
        None => (String::new(), None),
    };

    let method = if method.is_empty() {
        Method::GET.as_str().to_string()
    } else {
        method
    };
    let url = format!("{prefix}{path}");

    let mut inner = http::Request::builder()
        .method(method.as_str())
        .uri(url)
        .body(payload)
        .map_err(Error::RequestConstruction)?;

    let merged = inner.headers_mut();
    *merged = headers;
    merge_headers(merged, mandatory_headers);

    if !content_type.is_empty() {
        let value = HeaderValue::from_str(&content_type)
            .map_err(|e| Error::RequestConstruction(e.into()))?;
        merged.insert(CONTENT_TYPE, value);
    }

    tracing::debug!(
        method = %inner.method(),
        uri = %inner.uri(),
        body_len = inner.body().as_ref().map_or(0, Bytes::len),
        "prepared wire request"
    );

    Ok(WireRequest { inner, context })
}

fn prepare_body<B, M>(body: Option<&B>, marshaller: Option<&M>) -> Result<Option<Marshalled>, Error>
where
    B: Serialize,
    M: Marshaller,
{
    let Some(body) = body else {
        return Ok(None);
    };
    let marshaller = marshaller.ok_or(SerializationError::MarshallerNotSet)?;
    let marshalled = marshaller
        .marshal(body)
        .map_err(SerializationError::Marshal)?;
    Ok(Some(marshalled))
}

/// Append every value of `source` to `destination`.
fn merge_headers(destination: &mut HeaderMap, source: &HeaderMap) {
    for (name, value) in source {
        tracing::trace!(header = %name, "merging mandatory header");
        destination.append(name.clone(), value.clone());
    }
}
