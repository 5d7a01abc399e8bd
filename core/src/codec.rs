//! Marshal/unmarshal strategies.
//!
//! # Design
//! Each strategy is a single-method trait injected through `ClientConfig`.
//! The methods are generic over the value type, so strategies are held by
//! value (or `Arc`) inside the client rather than as trait objects.
//!
//! `JsonCodec` and `XmlCodec` are also used directly by the response
//! decoder dispatch for `application/json` and `application/xml` bodies.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::BoxError;

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const XML_CONTENT_TYPE: &str = "application/xml";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Output of a `Marshaller`: the payload and the media type it declares.
///
/// An empty `content_type` means the request goes out without a
/// `Content-Type` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marshalled {
    pub content_type: String,
    pub bytes: Bytes,
}

impl Marshalled {
    pub fn new(content_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// A payload with no declared media type.
    pub fn untyped(bytes: impl Into<Bytes>) -> Self {
        Self::new(String::new(), bytes)
    }
}

/// Turns a request body value into bytes.
pub trait Marshaller: Send + Sync {
    fn marshal<T: Serialize + ?Sized>(&self, value: &T) -> Result<Marshalled, BoxError>;
}

/// Turns response bytes back into a value.
pub trait Unmarshaller: Send + Sync {
    fn unmarshal<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, BoxError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Marshaller for JsonCodec {
    fn marshal<T: Serialize + ?Sized>(&self, value: &T) -> Result<Marshalled, BoxError> {
        let bytes = serde_json::to_vec(value)?;
        Ok(Marshalled::new(JSON_CONTENT_TYPE, bytes))
    }
}

impl Unmarshaller for JsonCodec {
    fn unmarshal<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, BoxError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// XML via quick-xml. Structs serialize with their type name as root element.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlCodec;

impl Marshaller for XmlCodec {
    fn marshal<T: Serialize + ?Sized>(&self, value: &T) -> Result<Marshalled, BoxError> {
        let text = quick_xml::se::to_string(value)?;
        Ok(Marshalled::new(XML_CONTENT_TYPE, text))
    }
}

impl Unmarshaller for XmlCodec {
    fn unmarshal<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, BoxError> {
        let text = std::str::from_utf8(bytes)?;
        Ok(quick_xml::de::from_str(text)?)
    }
}

/// `application/x-www-form-urlencoded` bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormCodec;

impl Marshaller for FormCodec {
    fn marshal<T: Serialize + ?Sized>(&self, value: &T) -> Result<Marshalled, BoxError> {
        let text = serde_urlencoded::to_string(value)?;
        Ok(Marshalled::new(FORM_CONTENT_TYPE, text))
    }
}

impl Unmarshaller for FormCodec {
    fn unmarshal<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, BoxError> {
        Ok(serde_urlencoded::from_bytes(bytes)?)
    }
}
