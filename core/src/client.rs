//! The client: request preparation, transport dispatch, response wrapping.
//!
//! # Design
//! `Client` holds only configuration and is `Send + Sync`; calls share no
//! mutable state. Each call prepares its own `WireRequest`, hands it to the
//! transport together with the caller's `Context`, and wraps whatever comes
//! back in a `Response` that reads its body lazily.
//!
//! Strategies are type parameters: `M` serializes request bodies, `U` decodes
//! response bodies whose content type is neither JSON nor XML.

use std::sync::Arc;

use http::{HeaderMap, Method, Uri};
use serde::Serialize;

use crate::codec::{JsonCodec, Marshaller, Unmarshaller};
use crate::config::ClientConfig;
use crate::context::Context;
use crate::error::Error;
use crate::request::{self, Request};
use crate::response::Response;
use crate::transport::{Transport, UreqTransport};

/// Prepares requests, runs them through the configured transport, and wraps
/// the results. Cheap to share across threads behind an `Arc`.
pub struct Client<M = JsonCodec, U = JsonCodec> {
    transport: Arc<dyn Transport>,
    marshaller: Option<M>,
    default_unmarshaller: Arc<U>,
    mandatory_headers: HeaderMap,
    url_prefix: String,
}

impl<M, U> Client<M, U>
where
    M: Marshaller,
    U: Unmarshaller,
{
    /// Validate `config` and fill in the default transport.
    ///
    /// The only rejected configuration is a non-empty URL prefix that is not
    /// an absolute URI. A relative prefix such as `/api` is refused even for
    /// a custom transport that could resolve it; leave the prefix empty and
    /// pass full paths in that case.
    pub fn new(config: ClientConfig<M, U>) -> Result<Self, Error> {
        validate_prefix(&config.url_prefix)?;

        let transport = match config.transport {
            Some(transport) => transport,
            None => Arc::new(UreqTransport::default()) as Arc<dyn Transport>,
        };
        let default_unmarshaller = Arc::new(config.default_unmarshaller);

        Ok(Self {
            transport,
            marshaller: config.marshaller,
            default_unmarshaller,
            mandatory_headers: config.mandatory_headers,
            url_prefix: config.url_prefix,
        })
    }

    /// Replace the headers merged into every later request with a copy of
    /// `headers`.
    pub fn set_mandatory_headers(&mut self, headers: &HeaderMap) -> &mut Self {
        self.mandatory_headers = headers.clone();
        self
    }

    pub fn mandatory_headers(&self) -> &HeaderMap {
        &self.mandatory_headers
    }

    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    /// Prepare `request`, run it through the transport, and wrap the result.
    pub fn execute<B: Serialize>(
        &self,
        ctx: &Context,
        request: Request<B>,
    ) -> Result<Response<U>, Error> {
        let wire = request::prepare(
            request,
            self.marshaller.as_ref(),
            &self.mandatory_headers,
            &self.url_prefix,
            ctx.clone(),
        )?;

        let method = wire.method().clone();
        let uri = wire.uri().clone();
        let raw = self.transport.execute(wire).map_err(|err| {
            tracing::debug!(%method, %uri, error = %err, "transport failed");
            Error::Transport(err)
        })?;

        tracing::debug!(%method, %uri, status = raw.status().as_u16(), "received response");
        Ok(Response::new(raw, Some(Arc::clone(&self.default_unmarshaller))))
    }

    pub fn get(&self, ctx: &Context, path: &str, headers: HeaderMap) -> Result<Response<U>, Error> {
        self.execute(ctx, Request::get(path).headers(headers))
    }

    pub fn delete(
        &self,
        ctx: &Context,
        path: &str,
        headers: HeaderMap,
    ) -> Result<Response<U>, Error> {
        self.execute(ctx, Request::delete(path).headers(headers))
    }

    pub fn post<B: Serialize>(
        &self,
        ctx: &Context,
        path: &str,
        headers: HeaderMap,
        body: B,
    ) -> Result<Response<U>, Error> {
        self.execute(ctx, Request::new(Method::POST.as_str(), path).headers(headers).body(body))
    }

    pub fn put<B: Serialize>(
        &self,
        ctx: &Context,
        path: &str,
        headers: HeaderMap,
        body: B,
    ) -> Result<Response<U>, Error> {
        self.execute(ctx, Request::new(Method::PUT.as_str(), path).headers(headers).body(body))
    }
}

fn validate_prefix(prefix: &str) -> Result<(), Error> {
    if prefix.is_empty() {
        return Ok(());
    }
    let uri: Uri = prefix
        .parse()
        .map_err(|err| Error::Config(format!("url prefix {prefix:?}: {err}")))?;
    if uri.scheme().is_none() || uri.authority().is_none() {
        return Err(Error::Config(format!(
            "url prefix {prefix:?} must be an absolute URL"
        )));
    }
    Ok(())
}
