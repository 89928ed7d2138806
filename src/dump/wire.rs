// Wire-level text rendering of HTTP messages
// Author: kelexine (https://github.com/kelexine)

use crate::error::{ExchangeError, Result};
use crate::utils::headers::normalize;
use http::header::{CONTENT_LENGTH, HOST};
use http::{HeaderMap, Request, Response, Uri, Version};
use std::fmt::Write;

/// Produces the textual form of requests and responses.
pub trait DumpFormat: Send + Sync {
    /// A request about to leave a client. Requires an absolute `http(s)` URI.
    fn outbound_request(&self, head: &Request<()>, body: &[u8], with_body: bool) -> Result<String>;

    /// A request received by a server.
    fn inbound_request(&self, head: &Request<()>, body: &[u8], with_body: bool) -> Result<String>;

    fn response(&self, head: &Response<()>, body: &[u8], with_body: bool) -> Result<String>;
}

/// HTTP/1.x style rendering: start line, canonical headers, blank line, body.
#[derive(Debug, Clone, Copy, Default)]
pub struct WireFormat;

impl DumpFormat for WireFormat {
    fn outbound_request(&self, head: &Request<()>, body: &[u8], with_body: bool) -> Result<String> {
        let scheme = head.uri().scheme_str().unwrap_or_default();
        if scheme != "http" && scheme != "https" {
            return Err(ExchangeError::UnsupportedScheme(scheme.to_string()));
        }

        let mut out = String::new();
        write_request_line(&mut out, head);
        write_host(&mut out, head);
        write_headers(&mut out, head.headers());
        if !head.headers().contains_key(CONTENT_LENGTH) && !body.is_empty() {
            let _ = write!(out, "Content-Length: {}\r\n", body.len());
        }
        finish(&mut out, body, with_body);
        Ok(out)
    }

    fn inbound_request(&self, head: &Request<()>, body: &[u8], with_body: bool) -> Result<String> {
        let mut out = String::new();
        write_request_line(&mut out, head);
        write_host(&mut out, head);
        write_headers(&mut out, head.headers());
        finish(&mut out, body, with_body);
        Ok(out)
    }

    fn response(&self, head: &Response<()>, body: &[u8], with_body: bool) -> Result<String> {
        let status = head.status();
        let mut out = String::new();
        let _ = write!(
            out,
            "{} {} {}\r\n",
            version_str(head.version()),
            status.as_u16(),
            status.canonical_reason().unwrap_or_default()
        );
        write_headers(&mut out, head.headers());
        if !head.headers().contains_key(CONTENT_LENGTH) {
            let _ = write!(out, "Content-Length: {}\r\n", body.len());
        }
        finish(&mut out, body, with_body);
        Ok(out)
    }
}

fn version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_2 => "HTTP/2.0",
        Version::HTTP_3 => "HTTP/3.0",
        _ => "HTTP/1.1",
    }
}

fn request_target(uri: &Uri) -> String {
    match uri.path_and_query().map(|pq| pq.as_str()) {
        Some(pq) if pq.starts_with('/') => pq.to_string(),
        Some(pq) if !pq.is_empty() => format!("/{}", pq),
        _ => "/".to_string(),
    }
}

fn write_request_line(out: &mut String, head: &Request<()>) {
    let _ = write!(
        out,
        "{} {} {}\r\n",
        head.method(),
        request_target(head.uri()),
        version_str(head.version())
    );
}

fn write_host(out: &mut String, head: &Request<()>) {
    let host = head
        .headers()
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .or_else(|| head.uri().authority().map(|a| a.to_string()));

    if let Some(host) = host {
        let _ = write!(out, "Host: {}\r\n", host);
    }
}

fn write_headers(out: &mut String, headers: &HeaderMap) {
    for (name, value) in headers.iter().filter(|(name, _)| **name != HOST) {
        let _ = write!(
            out,
            "{}: {}\r\n",
            normalize(name.as_str()),
            String::from_utf8_lossy(value.as_bytes())
        );
    }
}

fn finish(out: &mut String, body: &[u8], with_body: bool) {
    out.push_str("\r\n");
    if with_body {
        out.push_str(&String::from_utf8_lossy(body));
    }
}
