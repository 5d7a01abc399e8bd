//! Response body streams handed back by a transport.
//!
//! # Design
//! A `BodyStream` is a blocking byte source with an explicit `close`. The
//! `Response` wrapper calls `close` exactly once after draining the stream,
//! so transports that hold sockets or files can release them and report a
//! failure instead of losing it in `Drop`.

use std::io::{self, Cursor, Read};

use bytes::Bytes;

pub trait BodyStream: Read + Send {
    fn close(&mut self) -> io::Result<()>;
}

pub type BoxBody = Box<dyn BodyStream>;

/// Adapts any reader; `close` drops the reader and later reads yield EOF.
pub struct ReaderBody<R> {
    reader: Option<R>,
}

impl<R: Read + Send> ReaderBody<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
        }
    }
}

impl<R: Read + Send> Read for ReaderBody<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.reader.as_mut() {
            Some(reader) => reader.read(buf),
            None => Ok(0),
        }
    }
}

impl<R: Read + Send> BodyStream for ReaderBody<R> {
    fn close(&mut self) -> io::Result<()> {
        self.reader.take();
        Ok(())
    }
}

pub fn from_reader<R: Read + Send + 'static>(reader: R) -> BoxBody {
    Box::new(ReaderBody::new(reader))
}

pub fn from_bytes(bytes: impl Into<Bytes>) -> BoxBody {
    from_reader(Cursor::new(bytes.into()))
}

pub fn empty() -> BoxBody {
    from_reader(io::empty())
}
