//! Request record (§3) and the wire parser that builds one (C1).
//!
//! Grounded in the teacher's `http/request.rs` parsing algorithm (CR-then-LF
//! line scanning via `memchr`, colon-space header splitting) but reworked to
//! own its bytes rather than borrow `'static`-transmuted slices of a reused
//! fixed buffer — see `DESIGN.md`.

use crate::errors::ParseError;
use crate::http::types::{Method, Url, Version};
use crate::limits::ReqLimits;
use memchr::memchr;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::tcp::OwnedReadHalf;
use tokio::time::timeout;

/// An immutable, fully-parsed HTTP request (§3's "Request record").
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method: Method,
    version: Version,
    url: Url,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl Request {
    /// Test-only constructor: production requests only ever come from [`Parser::parse`].
    #[cfg(test)]
    pub(crate) fn for_test(
        method: Method,
        target: &[u8],
        headers: Vec<(&str, &str)>,
        body: Option<Vec<u8>>,
    ) -> Self {
        Self {
            method,
            version: Version::Http11,
            url: Url::parse(target),
            headers: headers.into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            body,
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Case-sensitive header lookup; if the name was sent more than once,
    /// the last occurrence wins (§4.1).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn content_length(&self) -> Option<usize> {
        self.header("Content-Length").and_then(|v| v.parse().ok())
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// The first path segment, e.g. `/files` for `/files/id/1`.
    pub fn endpoint_root(&self) -> String {
        match self.url.path_segments().first() {
            Some(seg) => format!("/{}", String::from_utf8_lossy(seg)),
            None => String::new(),
        }
    }

    /// Everything after the endpoint root, leading `/` kept.
    pub fn path_remainder(&self) -> String {
        let segments = self.url.path_segments();
        if segments.len() <= 1 {
            return String::new();
        }
        let mut out = String::new();
        for seg in &segments[1..] {
            out.push('/');
            out.push_str(&String::from_utf8_lossy(seg));
        }
        out
    }
}

/// Reads one request at a time off the read half of a split [`TcpStream`],
/// per C1. Owning the read half (rather than borrowing the stream, as the
/// teacher's `Parser` does) lets the connection loop hold the write half
/// open for responses at the same time without a borrow conflict.
pub(crate) struct Parser {
    stream: OwnedReadHalf,
    buf: Vec<u8>,
    pos: usize,
    limits: ReqLimits,
    read_timeout: Duration,
}

impl Parser {
    pub(crate) fn new(stream: OwnedReadHalf, limits: ReqLimits, read_timeout: Duration) -> Self {
        Self {
            stream,
            buf: Vec::with_capacity(1024),
            pos: 0,
            limits,
            read_timeout,
        }
    }

    /// Parses exactly one request. Returns `Ok(None)` if the peer closed the
    /// connection cleanly before sending any bytes of a new request.
    pub(crate) async fn parse(&mut self) -> std::io::Result<Option<Result<Request, ParseError>>> {
        if !self.has_unconsumed() && !self.fill_at_least(1).await? {
            return Ok(None);
        }

        Ok(Some(self.parse_request().await))
    }

    async fn parse_request(&mut self) -> Result<Request, ParseError> {
        let line = self.read_line().await?;
        let tokens: Vec<&[u8]> = line.split(|&b| b == b' ').collect();
        if tokens.len() != 3 {
            return Err(ParseError::MalformedRequestLine);
        }

        let method = Method::from_bytes(tokens[0])?;
        let url = Url::parse(tokens[1]);
        let version = Version::from_bytes(tokens[2])?;
        if version != self.limits.required_version {
            return Err(ParseError::UnsupportedVersion);
        }

        let headers = self.read_headers().await?;
        if headers.is_empty() {
            return Err(ParseError::NoHeaders);
        }

        let content_length = headers
            .iter()
            .rev()
            .find(|(k, _)| k == "Content-Length")
            .map(|(_, v)| v.parse::<usize>())
            .transpose()
            .map_err(|_| ParseError::InvalidContentLength)?;

        let body = match content_length {
            Some(len) => Some(self.read_exact_owned(len).await?),
            None => None,
        };

        Ok(Request {
            method,
            version,
            url,
            headers,
            body,
        })
    }

    /// Reads a CRLF-terminated line, excluding the terminator. A bare CR not
    /// followed by LF is a protocol error (§4.1).
    async fn read_line(&mut self) -> Result<Vec<u8>, ParseError> {
        loop {
            if let Some(idx) = memchr(b'\r', &self.buf[self.pos..]) {
                let cr = self.pos + idx;
                if cr + 1 >= self.buf.len() {
                    self.fill_at_least(1).await.map_err(|_| ParseError::MalformedRequestLine)?;
                    continue;
                }
                if self.buf[cr + 1] != b'\n' {
                    return Err(ParseError::MalformedRequestLine);
                }
                let line = self.buf[self.pos..cr].to_vec();
                self.pos = cr + 2;
                return Ok(line);
            }
            if self.buf.len() - self.pos > self.limits.header_line_size {
                return Err(ParseError::MalformedRequestLine);
            }
            if !self.fill_at_least(1).await.map_err(|_| ParseError::MalformedRequestLine)? {
                return Err(ParseError::MalformedRequestLine);
            }
        }
    }

    async fn read_headers(&mut self) -> Result<Vec<(String, String)>, ParseError> {
        let mut headers = Vec::new();
        loop {
            let line = self.read_line().await?;
            if line.is_empty() {
                return Ok(headers);
            }
            if headers.len() >= self.limits.header_count {
                return Err(ParseError::TooManyHeaders);
            }

            let sep = find_subslice(&line, b": ").ok_or(ParseError::MalformedHeader)?;
            let name = String::from_utf8(line[..sep].to_vec()).map_err(|_| ParseError::MalformedHeader)?;
            let value =
                String::from_utf8(line[sep + 2..].to_vec()).map_err(|_| ParseError::MalformedHeader)?;
            headers.push((name, value));
        }
    }

    async fn read_exact_owned(&mut self, len: usize) -> Result<Vec<u8>, ParseError> {
        while self.buf.len() - self.pos < len {
            if !self.fill_at_least(len - (self.buf.len() - self.pos)).await.map_err(|_| {
                ParseError::InvalidContentLength
            })? {
                return Err(ParseError::InvalidContentLength);
            }
        }
        let body = self.buf[self.pos..self.pos + len].to_vec();
        self.pos += len;
        Ok(body)
    }

    fn has_unconsumed(&self) -> bool {
        self.pos < self.buf.len()
    }

    /// Reads from the socket until at least `need` new bytes are buffered, or
    /// the peer closes the connection (returns `Ok(false)`).
    async fn fill_at_least(&mut self, need: usize) -> std::io::Result<bool> {
        if self.pos > 0 && self.pos == self.buf.len() {
            self.buf.clear();
            self.pos = 0;
        }

        let mut read_total = 0;
        while read_total < need {
            let mut chunk = [0u8; 4096];
            let n = timeout(self.read_timeout, self.stream.read(&mut chunk))
                .await
                .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "socket read timed out"))??;
            if n == 0 {
                return Ok(read_total > 0);
            }
            self.buf.extend_from_slice(&chunk[..n]);
            read_total += n;
        }
        Ok(true)
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_lookup(headers: &[(String, String)], name: &str) -> Option<String> {
        headers.iter().rev().find(|(k, _)| k == name).map(|(_, v)| v.clone())
    }

    #[test]
    fn header_case_sensitive_last_wins() {
        let headers = vec![
            ("Content-Type".to_string(), "text/plain".to_string()),
            ("content-type".to_string(), "application/json".to_string()),
            ("Content-Type".to_string(), "image/png".to_string()),
        ];
        assert_eq!(header_lookup(&headers, "Content-Type").as_deref(), Some("image/png"));
        assert_eq!(header_lookup(&headers, "content-type").as_deref(), Some("application/json"));
    }

    #[test]
    fn find_subslice_basic() {
        assert_eq!(find_subslice(b"Content-Type: text/plain", b": "), Some(12));
        assert_eq!(find_subslice(b"no-colon-space", b": "), None);
    }

    async fn parse_one(limits: ReqLimits, wire: &[u8]) -> Result<Request, ParseError> {
        use tokio::io::AsyncWriteExt;
        use tokio::net::{TcpListener, TcpStream};

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let mut client = TcpStream::connect(addr).await.unwrap();
        client.write_all(wire).await.unwrap();

        let (server_stream, _) = listener.accept().await.unwrap();
        let (read_half, _write_half) = server_stream.into_split();
        let mut parser = Parser::new(read_half, limits, Duration::from_secs(5));
        parser.parse().await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn rejects_a_version_other_than_the_configured_one() {
        let limits = ReqLimits {
            required_version: Version::Http10,
            ..ReqLimits::default()
        };
        let wire = b"GET /files/upload HTTP/1.1\r\nHost: x\r\n\r\n";
        let err = parse_one(limits, wire).await.unwrap_err();
        assert_eq!(err, ParseError::UnsupportedVersion);
    }

    #[tokio::test]
    async fn accepts_the_configured_version() {
        let limits = ReqLimits {
            required_version: Version::Http10,
            ..ReqLimits::default()
        };
        let wire = b"GET /files/upload HTTP/1.0\r\nHost: x\r\n\r\n";
        let request = parse_one(limits, wire).await.unwrap();
        assert_eq!(request.version(), Version::Http10);
    }
}
