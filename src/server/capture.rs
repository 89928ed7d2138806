// Response capture for server-side dumping
// Author: kelexine (https://github.com/kelexine)

use axum::body::Body;
use bytes::{Bytes, BytesMut};
use http::{HeaderMap, Response, StatusCode, Version};

/// Sits between a handler's output and the connection.
///
/// Every write is forwarded in full, but only the most recent write is kept
/// as the body snapshot used for the dump.
#[derive(Debug, Default)]
pub struct ResponseCapture {
    status: Option<StatusCode>,
    headers: HeaderMap,
    forwarded: BytesMut,
    last: Bytes,
}

impl ResponseCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from the status and headers a handler already produced.
    pub fn from_head(status: StatusCode, headers: HeaderMap) -> Self {
        Self {
            status: Some(status),
            headers,
            ..Self::default()
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn write_header(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    /// Forwards `chunk` and makes it the body snapshot. Returns the number of
    /// bytes written.
    pub fn write(&mut self, chunk: Bytes) -> usize {
        self.forwarded.extend_from_slice(&chunk);
        let written = chunk.len();
        self.last = chunk;
        written
    }

    /// Status recorded so far, `200 OK` when none was set.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    /// Synthesized response for dumping: recorded status, headers and the last
    /// write. The capture has no notion of protocol version, so the caller
    /// supplies it.
    pub fn result(&self, version: Version) -> Response<Bytes> {
        let mut res = Response::new(self.last.clone());
        *res.status_mut() = self.status();
        *res.version_mut() = version;
        *res.headers_mut() = self.headers.clone();
        res
    }

    /// The response actually sent to the client, carrying every forwarded
    /// byte.
    pub fn into_response(self) -> Response<Body> {
        let status = self.status();
        let mut res = Response::new(Body::from(self.forwarded.freeze()));
        *res.status_mut() = status;
        *res.headers_mut() = self.headers;
        res
    }
}
