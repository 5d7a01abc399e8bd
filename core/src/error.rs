//! Error types for the courier client.
//!
//! # Design
//! A single `Error` enum covers every stage of a call. Each variant belongs
//! to exactly one `Stage`, so callers can tell a preparation failure from a
//! transport failure or a decode failure without string matching.
//!
//! `ReadError` is `Clone` because a failed body read is memoized on the
//! `Response` and handed out again on every later `unmarshal` call.

use std::io;
use std::sync::Arc;

use thiserror::Error;

/// Boxed error used at the strategy seams (transport, marshaller, unmarshaller).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The pipeline stage a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Config,
    Prepare,
    Transport,
    Read,
    Decode,
}

/// Errors returned by `Client` and `Response`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The client configuration was rejected by `Client::new`.
    #[error("invalid client configuration: {0}")]
    Config(String),

    /// The request body could not be turned into bytes.
    #[error("prepare request: {0}")]
    Serialization(#[from] SerializationError),

    /// The method or the resolved URL is malformed.
    #[error("prepare request: build wire request: {0}")]
    RequestConstruction(#[source] http::Error),

    /// The transport failed: network error, cancellation, or deadline.
    #[error("transport: {0}")]
    Transport(#[source] BoxError),

    /// Reading or closing the response body failed.
    #[error("read body once: {0}")]
    Read(#[from] ReadError),

    /// The selected decoder rejected the body.
    #[error("unmarshal content-type {content_type:?}: {source}")]
    Decode {
        content_type: String,
        #[source]
        source: BoxError,
    },

    /// No built-in decoder matched and no default unmarshaller is configured.
    #[error("pick unmarshaller for {content_type:?}: default unmarshaller not set")]
    NoDecoder { content_type: String },
}

impl Error {
    /// Which stage of the pipeline produced this error.
    pub fn stage(&self) -> Stage {
        match self {
            Error::Config(_) => Stage::Config,
            Error::Serialization(_) | Error::RequestConstruction(_) => Stage::Prepare,
            Error::Transport(_) => Stage::Transport,
            Error::Read(_) => Stage::Read,
            Error::Decode { .. } | Error::NoDecoder { .. } => Stage::Decode,
        }
    }
}

/// Failures while serializing a request body.
#[derive(Debug, Error)]
pub enum SerializationError {
    /// The request carries a body but the client has no marshaller.
    #[error("marshaller not set")]
    MarshallerNotSet,

    #[error("marshaller: {0}")]
    Marshal(#[source] BoxError),
}

/// Failures while consuming a response body stream.
#[derive(Debug, Clone, Error)]
pub enum ReadError {
    #[error("read all body: {0}")]
    Read(#[source] Arc<io::Error>),

    #[error("close body: {0}")]
    Close(#[source] Arc<io::Error>),
}
