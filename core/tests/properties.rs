//! Client behavior checked through a scripted in-process transport.
//!
//! # Design
//! `Script` answers every request with a canned status, content type, and
//! body, records the wire requests it saw, and counts how often each body
//! stream is read after close and closed. No sockets are involved, so these
//! tests pin down preparation and body-lifecycle guarantees exactly.

use std::io::{self, Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use courier::body::BodyStream;
use courier::{
    BoxError, Client, ClientConfig, Context, Error, JsonCodec, RawResponse, Request, Response,
    SerializationError, Stage, Transport, Unmarshaller, WireRequest,
};
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use http::Method;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq)]
struct Health {
    status: String,
}

#[derive(Default)]
struct Stats {
    closes: AtomicUsize,
    reads_after_close: AtomicUsize,
}

struct TrackedBody {
    data: Cursor<Vec<u8>>,
    closed: bool,
    stats: Arc<Stats>,
}

impl Read for TrackedBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.closed {
            self.stats.reads_after_close.fetch_add(1, Ordering::SeqCst);
        }
        self.data.read(buf)
    }
}

impl BodyStream for TrackedBody {
    fn close(&mut self) -> io::Result<()> {
        self.closed = true;
        self.stats.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Clone)]
struct Script {
    status: u16,
    content_type: Option<&'static str>,
    body: &'static str,
    seen: Arc<Mutex<Vec<WireRequest>>>,
    stats: Arc<Stats>,
}

impl Script {
    fn new(status: u16, content_type: Option<&'static str>, body: &'static str) -> Self {
        Self {
            status,
            content_type,
            body,
            seen: Arc::default(),
            stats: Arc::default(),
        }
    }

    fn json(body: &'static str) -> Self {
        Self::new(200, Some("application/json"), body)
    }

    fn calls(&self) -> usize {
        self.seen.lock().len()
    }
}

impl Transport for Script {
    fn execute(&self, request: WireRequest) -> Result<RawResponse, BoxError> {
        self.seen.lock().push(request);
        let body = TrackedBody {
            data: Cursor::new(self.body.as_bytes().to_vec()),
            closed: false,
            stats: Arc::clone(&self.stats),
        };
        let mut builder = http::Response::builder().status(self.status);
        if let Some(ct) = self.content_type {
            builder = builder.header(CONTENT_TYPE, ct);
        }
        Ok(builder.body(Box::new(body) as Box<dyn BodyStream>)?)
    }
}

/// Decodes anything by wrapping the raw text as `{"status": <text>}`.
struct TextStatus;

impl Unmarshaller for TextStatus {
    fn unmarshal<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, BoxError> {
        let text = std::str::from_utf8(bytes)?;
        Ok(serde_json::from_value(serde_json::json!({ "status": text }))?)
    }
}

fn client(script: &Script) -> Client {
    Client::new(
        ClientConfig::new()
            .transport(script.clone())
            .url_prefix("http://api.local"),
    )
    .unwrap()
}

fn text_client(script: &Script) -> Client<JsonCodec, TextStatus> {
    Client::new(
        ClientConfig::new()
            .transport(script.clone())
            .default_unmarshaller(TextStatus)
            .url_prefix("http://api.local"),
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// Preparation
// ---------------------------------------------------------------------------

#[test]
fn health_check_scenario() {
    let script = Script::json(r#"{"status":"ok"}"#);
    client(&script)
        .get(&Context::background(), "/health", HeaderMap::new())
        .unwrap();

    let seen = script.seen.lock();
    let wire = &seen[0];
    assert_eq!(wire.method(), Method::GET);
    assert_eq!(wire.uri(), "http://api.local/health");
    assert!(wire.body().is_none());
    assert!(wire.headers().get(CONTENT_TYPE).is_none());
}

#[test]
fn bodiless_requests_never_carry_content_type() {
    let script = Script::json("{}");
    let client = Client::new(
        ClientConfig::new()
            .transport(script.clone())
            .marshaller(JsonCodec),
    )
    .unwrap();
    let ctx = Context::background();

    for method in ["GET", "DELETE", "HEAD", "OPTIONS", "POST"] {
        client
            .execute(&ctx, Request::new(method, "http://api.local/x"))
            .unwrap();
    }

    for wire in script.seen.lock().iter() {
        assert!(wire.headers().get(CONTENT_TYPE).is_none(), "{}", wire.method());
        assert!(wire.body().is_none());
    }
}

#[test]
fn body_without_marshaller_fails_before_transport() {
    let script = Script::json("{}");
    let client = client(&script);

    let err = client
        .execute(
            &Context::background(),
            Request::post("/todos", serde_json::json!({"title": "x"})),
        )
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Serialization(SerializationError::MarshallerNotSet)
    ));
    assert_eq!(err.stage(), Stage::Prepare);
    assert_eq!(script.calls(), 0);
}

#[test]
fn mandatory_headers_on_every_request() {
    let script = Script::json("{}");
    let mut client = client(&script);
    let mut mandatory = HeaderMap::new();
    mandatory.insert("x-trace", HeaderValue::from_static("abc"));
    client.set_mandatory_headers(&mandatory);

    let ctx = Context::background();
    let x_trace = HeaderName::from_static("x-trace");
    client.get(&ctx, "/a", HeaderMap::new()).unwrap();
    client
        .execute(
            &ctx,
            Request::get("/b").header(x_trace.clone(), HeaderValue::from_static("caller")),
        )
        .unwrap();
    client
        .execute(
            &ctx,
            Request::get("/c").header(HeaderName::from_static("x-other"), HeaderValue::from_static("1")),
        )
        .unwrap();

    let seen = script.seen.lock();
    assert_eq!(seen.len(), 3);
    for wire in seen.iter() {
        assert!(wire.headers().get_all(&x_trace).iter().any(|v| v == "abc"));
    }

    let mut second: Vec<_> = seen[1]
        .headers()
        .get_all(&x_trace)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    second.sort();
    assert_eq!(second, ["abc", "caller"]);
}

// ---------------------------------------------------------------------------
// Response lifecycle
// ---------------------------------------------------------------------------

#[test]
fn status_boundaries() {
    for (status, expected) in [(199, false), (200, true), (299, true), (300, false)] {
        let script = Script::new(status, None, "");
        let response = client(&script)
            .get(&Context::background(), "/", HeaderMap::new())
            .unwrap();
        assert_eq!(response.is_successful(), expected, "status {status}");
    }
}

#[test]
fn repeated_unmarshal_reads_once() {
    let script = Script::json(r#"{"status":"ok"}"#);
    let response = client(&script)
        .get(&Context::background(), "/health", HeaderMap::new())
        .unwrap();

    for _ in 0..10 {
        let health: Health = response.unmarshal().unwrap();
        assert_eq!(health.status, "ok");
    }
    assert_eq!(script.stats.closes.load(Ordering::SeqCst), 1);
    assert_eq!(script.stats.reads_after_close.load(Ordering::SeqCst), 0);
}

#[test]
fn concurrent_unmarshal_reads_once() {
    let script = Script::json(r#"{"status":"ok"}"#);
    let response: Arc<Response> = Arc::new(
        client(&script)
            .get(&Context::background(), "/health", HeaderMap::new())
            .unwrap(),
    );

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let response = Arc::clone(&response);
            std::thread::spawn(move || response.unmarshal::<Health>())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap().status, "ok");
    }

    assert_eq!(script.stats.closes.load(Ordering::SeqCst), 1);
    assert_eq!(script.stats.reads_after_close.load(Ordering::SeqCst), 0);
}

// ---------------------------------------------------------------------------
// Decoder dispatch
// ---------------------------------------------------------------------------

#[test]
fn json_with_charset_selects_json() {
    let script = Script::new(200, Some("application/json; charset=utf-8"), r#"{"status":"ok"}"#);
    let health: Health = text_client(&script)
        .get(&Context::background(), "/", HeaderMap::new())
        .unwrap()
        .unmarshal()
        .unwrap();
    assert_eq!(health.status, "ok");
}

#[test]
fn xml_selects_xml() {
    let script = Script::new(200, Some("application/xml"), "<Health><status>ok</status></Health>");
    let health: Health = text_client(&script)
        .get(&Context::background(), "/", HeaderMap::new())
        .unwrap()
        .unmarshal()
        .unwrap();
    assert_eq!(health.status, "ok");
}

#[test]
fn text_and_missing_types_fall_back_to_default() {
    for content_type in [Some("text/plain"), None] {
        let script = Script::new(200, content_type, "pong");
        let health: Health = text_client(&script)
            .get(&Context::background(), "/", HeaderMap::new())
            .unwrap()
            .unmarshal()
            .unwrap();
        assert_eq!(health.status, "pong", "{content_type:?}");
    }
}

#[test]
fn default_json_unmarshaller_handles_untyped_bodies() {
    let script = Script::new(200, None, r#"{"status":"ok"}"#);
    let health: Health = client(&script)
        .get(&Context::background(), "/", HeaderMap::new())
        .unwrap()
        .unmarshal()
        .unwrap();
    assert_eq!(health.status, "ok");
}

#[test]
fn no_default_and_unmatched_type_is_no_decoder() {
    let raw = http::Response::builder()
        .header(CONTENT_TYPE, "text/plain")
        .body(courier::body::from_bytes("pong"))
        .unwrap();
    let response = Response::<JsonCodec>::new(raw, None);

    let err = response.unmarshal::<Health>().unwrap_err();
    assert!(matches!(err, Error::NoDecoder { .. }));
    assert_eq!(err.stage(), Stage::Decode);
    // The bytes were still read and stay available.
    assert_eq!(response.text().unwrap(), "pong");
}
