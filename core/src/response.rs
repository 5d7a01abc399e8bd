//! Response wrapper with a lazy, memoized body read.
//!
//! # Design
//! The body stream sits behind a mutex and is taken out exactly once, inside
//! a `OnceLock` initializer. The first caller to need the bytes drains and
//! closes the stream; every other caller, concurrent or later, blocks on the
//! same cell and then sees the same bytes or the same `ReadError`.
//!
//! Only the raw bytes are cached. Each `unmarshal` call decodes on its own,
//! so callers may decode the same body into different types.

use std::io::Read;
use std::sync::{Arc, OnceLock};

use bytes::Bytes;
use http::header::{HeaderMap, CONTENT_TYPE};
use http::StatusCode;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;

use crate::body::BoxBody;
use crate::codec::{JsonCodec, Unmarshaller, XmlCodec, JSON_CONTENT_TYPE, XML_CONTENT_TYPE};
use crate::error::{Error, ReadError};
use crate::transport::RawResponse;

/// Status, headers, and a body that is read at most once, on first use.
pub struct Response<U = JsonCodec> {
    status: StatusCode,
    headers: HeaderMap,
    body: Mutex<Option<BoxBody>>,
    bytes: OnceLock<Result<Bytes, ReadError>>,
    default_unmarshaller: Option<Arc<U>>,
}

/// The decoder picked for a content type.
enum Decoder<'a, U> {
    Json,
    Xml,
    Default(&'a U),
}

impl<U: Unmarshaller> Response<U> {
    /// Wrap a raw transport response. `default_unmarshaller` handles every
    /// content type that is neither JSON nor XML.
    pub fn new(raw: RawResponse, default_unmarshaller: Option<Arc<U>>) -> Self {
        let (parts, body) = raw.into_parts();
        Self {
            status: parts.status,
            headers: parts.headers,
            body: Mutex::new(Some(body)),
            bytes: OnceLock::new(),
            default_unmarshaller,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The `Content-Type` header, if present and valid UTF-8.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    /// True iff the status code lies in [200, 300).
    pub fn is_successful(&self) -> bool {
        (200..300).contains(&self.status.as_u16())
    }

    /// The body bytes, reading the stream on first use.
    pub fn bytes(&self) -> Result<Bytes, Error> {
        Ok(self.read_body_once()?.clone())
    }

    /// The body as text; invalid UTF-8 is replaced.
    pub fn text(&self) -> Result<String, Error> {
        let bytes = self.read_body_once()?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Decode the body into `T`, picking the decoder by `Content-Type`.
    pub fn unmarshal<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let bytes = self.read_body_once()?;
        let content_type = self.content_type().unwrap_or_default();

        let decoded = match self.pick_decoder(content_type)? {
            Decoder::Json => JsonCodec.unmarshal(bytes),
            Decoder::Xml => XmlCodec.unmarshal(bytes),
            Decoder::Default(unmarshaller) => unmarshaller.unmarshal(bytes),
        };
        decoded.map_err(|source| Error::Decode {
            content_type: content_type.to_string(),
            source,
        })
    }

    fn pick_decoder(&self, content_type: &str) -> Result<Decoder<'_, U>, Error> {
        let decoder = if content_type.starts_with(JSON_CONTENT_TYPE) {
            Decoder::Json
        } else if content_type.starts_with(XML_CONTENT_TYPE) {
            Decoder::Xml
        } else {
            let unmarshaller = self
                .default_unmarshaller
                .as_deref()
                .ok_or_else(|| Error::NoDecoder {
                    content_type: content_type.to_string(),
                })?;
            Decoder::Default(unmarshaller)
        };
        tracing::trace!(
            content_type,
            decoder = match decoder {
                Decoder::Json => "json",
                Decoder::Xml => "xml",
                Decoder::Default(_) => "default",
            },
            "picked decoder"
        );
        Ok(decoder)
    }

    fn read_body_once(&self) -> Result<&Bytes, ReadError> {
        self.bytes
            .get_or_init(|| {
                let stream = self.body.lock().take();
                read_body(stream)
            })
            .as_ref()
            .map_err(Clone::clone)
    }
}

impl<U> Drop for Response<U> {
    fn drop(&mut self) {
        // Unread bodies still get closed once.
        if let Some(mut stream) = self.body.get_mut().take() {
            if let Err(err) = stream.close() {
                tracing::warn!(error = %err, "failed to close unread response body");
            }
        }
    }
}

impl<U> std::fmt::Debug for Response<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body_read", &self.bytes.get().is_some())
            .finish_non_exhaustive()
    }
}

/// Drain and close the stream. The stream is closed even when reading
/// fails; a read error wins over a close error.
fn read_body(stream: Option<BoxBody>) -> Result<Bytes, ReadError> {
    let Some(mut stream) = stream else {
        return Ok(Bytes::new());
    };

    let mut buf = Vec::new();
    let read = stream.read_to_end(&mut buf);
    let closed = stream.close();

    read.map_err(|err| ReadError::Read(Arc::new(err)))?;
    if let Err(err) = closed {
        tracing::warn!(error = %err, "failed to close response body");
        return Err(ReadError::Close(Arc::new(err)));
    }

    tracing::debug!(len = buf.len(), "read response body");
    Ok(Bytes::from(buf))
}
