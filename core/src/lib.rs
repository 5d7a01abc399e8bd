//! A small HTTP client layer over an injected transport.
//!
//! # Overview
//! Turns request intents (method, path, headers, a serializable body) into
//! wire requests, runs them through a `Transport`, and wraps the result in a
//! `Response` whose body is read lazily, exactly once, and decoded by
//! content type.
//!
//! # Design
//! - `Client` holds configuration only: transport, marshaller, default
//!   unmarshaller, URL prefix, mandatory headers.
//! - Preparation never touches the network, so every preparation error is
//!   reported before the transport runs.
//! - Cancellation and deadlines travel in a `Context` attached to the wire
//!   request; the transport enforces them.
//! - Retries, pooling, and redirects are the transport's business.
//!
//! ```no_run
//! use courier::{Client, ClientConfig, Context};
//! use http::HeaderMap;
//!
//! # fn main() -> Result<(), courier::Error> {
//! let client: Client = Client::new(ClientConfig::new().url_prefix("http://api.local"))?;
//! let response = client.get(&Context::background(), "/health", HeaderMap::new())?;
//! if response.is_successful() {
//!     let health: serde_json::Value = response.unmarshal()?;
//!     println!("{health}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod body;
pub mod client;
pub mod codec;
pub mod config;
pub mod context;
pub mod error;
pub mod request;
pub mod response;
pub mod transport;

pub use client::Client;
pub use codec::{FormCodec, JsonCodec, Marshalled, Marshaller, Unmarshaller, XmlCodec};
pub use config::ClientConfig;
pub use context::{Context, ContextError};
pub use error::{BoxError, Error, ReadError, SerializationError, Stage};
pub use request::{Request, WireRequest};
pub use response::Response;
pub use transport::{RawResponse, Transport, TransportSettings, UreqTransport};
