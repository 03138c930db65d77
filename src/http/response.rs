//! Response record (§3) and its serializer (C1).
//!
//! The fluent status()->header()->body() builder and its debug-assert call
//! order enforcement are kept from the teacher's `http/response.rs`; the
//! backing storage is an owned, growable `Vec<u8>` header list rather than
//! the teacher's fixed-capacity buffer, since response bodies here (whole
//! files, JSON listings) are not bounded at connection-setup time.

use crate::http::types::{StatusCode, Version};

#[derive(Debug, Clone, Copy, PartialEq)]
enum ResponseState {
    Clean,
    Headers,
    Complete,
}

/// Mutable response under construction (§3's "Response record").
#[derive(Debug)]
pub struct Response {
    status: Option<StatusCode>,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    content_type: Option<String>,
    keep_alive: bool,
    state: ResponseState,
}

/// Marker returned by body-writing methods, proving a handler reached a
/// terminal call. Mirrors the teacher's `Handled` token.
#[must_use]
pub struct Handled(());

impl Response {
    pub fn new() -> Self {
        Self {
            status: None,
            headers: Vec::new(),
            body: None,
            content_type: None,
            keep_alive: true,
            state: ResponseState::Clean,
        }
    }

    /// Sets the status line. Must be called exactly once, before any other builder method.
    #[track_caller]
    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        debug_assert!(self.state == ResponseState::Clean, "status() must be called first and only once");
        self.status = Some(status);
        self.state = ResponseState::Headers;
        self
    }

    /// Appends a header. May be called any number of times after `status()` and before a body method.
    #[track_caller]
    pub fn header(&mut self, name: &str, value: &str) -> &mut Self {
        debug_assert!(self.state == ResponseState::Headers, "header() must follow status() and precede the body");
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Forces `Connection: close` regardless of the request's intent.
    #[track_caller]
    pub fn close(&mut self) -> &mut Self {
        debug_assert!(self.state != ResponseState::Complete, "close() must be called before the body");
        self.keep_alive = false;
        self
    }

    /// Finalizes the response with a body and explicit content type.
    #[track_caller]
    pub fn body_with(&mut self, content_type: &str, bytes: Vec<u8>) -> Handled {
        debug_assert!(self.state == ResponseState::Headers, "a body method may only be called once, after status()");
        self.content_type = Some(content_type.to_string());
        self.body = Some(bytes);
        self.state = ResponseState::Complete;
        Handled(())
    }

    /// Finalizes the response with a JSON body, serialized via `serde_json`.
    #[track_caller]
    pub fn body_json<T: serde::Serialize>(&mut self, value: &T) -> Handled {
        let bytes = serde_json::to_vec(value).expect("handler response types are always representable as JSON");
        self.body_with("application/json", bytes)
    }

    /// Finalizes the response with no body (`Content-Type` absent per §3's invariant).
    #[track_caller]
    pub fn no_body(&mut self) -> Handled {
        debug_assert!(self.state == ResponseState::Headers, "no_body() must follow status()");
        self.body = None;
        self.content_type = None;
        self.state = ResponseState::Complete;
        Handled(())
    }

    /// Serializes the status line, headers, and body per C1's framing rules.
    pub(crate) fn serialize(&self, version: Version) -> Vec<u8> {
        let status = self.status.expect("status() must be set before serializing");
        let mut out = status.first_line(version);

        out.extend_from_slice(b"Server: fileden\r\n");
        out.extend_from_slice(if self.keep_alive {
            b"Connection: keep-alive\r\n"
        } else {
            b"Connection: close\r\n"
        });

        for (name, value) in &self.headers {
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(b": ");
            out.extend_from_slice(value.as_bytes());
            out.extend_from_slice(b"\r\n");
        }

        if let Some(body) = &self.body {
            if let Some(ct) = &self.content_type {
                out.extend_from_slice(format!("Content-Type: {}\r\n", ct).as_bytes());
            }
            out.extend_from_slice(format!("Content-Length: {}\r\n", body.len()).as_bytes());
        }

        out.extend_from_slice(b"\r\n");
        if let Some(body) = &self.body {
            out.extend_from_slice(body);
        }

        out
    }

    pub(crate) fn keep_alive(&self) -> bool {
        self.keep_alive
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the standard `{status, error, reason}` JSON error envelope (§7),
/// always serialized as JSON regardless of what the failing handler offered.
pub(crate) fn error_response(version: Version, err: &crate::errors::AppError) -> Vec<u8> {
    let mut resp = Response::new();
    resp.status(err.status()).close();
    resp.body_with("application/json", err.envelope());
    resp.serialize(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_status_and_headers() {
        let mut resp = Response::new();
        resp.status(StatusCode::Ok).header("X-Test", "1");
        let bytes = resp.body_with("text/plain", b"hi".to_vec());
        let _ = bytes;
        let serialized = resp.serialize(Version::Http11);
        let text = String::from_utf8(serialized).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("X-Test: 1\r\n"));
        assert!(text.contains("Content-Type: text/plain\r\n"));
        assert!(text.contains("Content-Length: 2\r\n"));
        assert!(text.ends_with("\r\n\r\nhi"));
    }

    #[test]
    fn no_body_omits_content_type_and_length() {
        let mut resp = Response::new();
        resp.status(StatusCode::Ok);
        resp.no_body();
        let serialized = resp.serialize(Version::Http11);
        let text = String::from_utf8(serialized).unwrap();
        assert!(!text.contains("Content-Type"));
        assert!(!text.contains("Content-Length"));
    }

    #[test]
    #[should_panic]
    fn header_before_status_panics() {
        let mut resp = Response::new();
        resp.header("X", "1");
    }
}
