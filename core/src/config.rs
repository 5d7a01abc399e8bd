//! Client configuration.
//!
//! Every field is optional. The default unmarshaller starts out as
//! `JsonCodec` and is swapped by `default_unmarshaller(..)`; `Client::new`
//! fills in the ureq transport when none is set. The marshaller stays unset
//! unless provided, and body-bearing requests then fail.

use std::sync::Arc;

use http::HeaderMap;

use crate::codec::JsonCodec;
use crate::transport::Transport;

/// Builder for `Client`: transport, codecs, URL prefix, mandatory headers.
pub struct ClientConfig<M = JsonCodec, U = JsonCodec> {
    pub transport: Option<Arc<dyn Transport>>,
    pub marshaller: Option<M>,
    /// Decodes bodies that are neither JSON nor XML.
    pub default_unmarshaller: U,
    /// Prepended verbatim to every request path.
    pub url_prefix: String,
    pub mandatory_headers: HeaderMap,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<M> Default for ClientConfig<M, JsonCodec> {
    fn default() -> Self {
        Self {
            transport: None,
            marshaller: None,
            default_unmarshaller: JsonCodec,
            url_prefix: String::new(),
            mandatory_headers: HeaderMap::new(),
        }
    }
}

impl<M, U> ClientConfig<M, U> {
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn marshaller<M2>(self, marshaller: M2) -> ClientConfig<M2, U> {
        ClientConfig {
            transport: self.transport,
            marshaller: Some(marshaller),
            default_unmarshaller: self.default_unmarshaller,
            url_prefix: self.url_prefix,
            mandatory_headers: self.mandatory_headers,
        }
    }

    pub fn default_unmarshaller<U2>(self, unmarshaller: U2) -> ClientConfig<M, U2> {
        ClientConfig {
            transport: self.transport,
            marshaller: self.marshaller,
            default_unmarshaller: unmarshaller,
            url_prefix: self.url_prefix,
            mandatory_headers: self.mandatory_headers,
        }
    }

    pub fn url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefix = prefix.into();
        self
    }

    pub fn mandatory_headers(mut self, headers: HeaderMap) -> Self {
        self.mandatory_headers = headers;
        self
    }
}

impl<M, U> std::fmt::Debug for ClientConfig<M, U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("transport", &self.transport.as_ref().map(|_| "custom"))
            .field("marshaller", &self.marshaller.is_some())
            .field("default_unmarshaller", &std::any::type_name::<U>())
            .field("url_prefix", &self.url_prefix)
            .field("mandatory_headers", &self.mandatory_headers)
            .finish()
    }
}
