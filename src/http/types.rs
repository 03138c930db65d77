//! Core HTTP protocol types shared by the wire codec, router, and handlers.

use crate::errors::ParseError;
use crate::http::query::Query;

#[rustfmt::skip]
const ASCII_TABLE: [u8; 256] = [
    //   x0    x1    x2    x3    x4    x5    x6    x7    x8    x9    xA    xB    xC    xD    xE    xF
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F, // 0x
    0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1A, 0x1B, 0x1C, 0x1D, 0x1E, 0x1F, // 1x
    0x20, 0x21, 0x22, 0x23, 0x24, 0x25, 0x26, 0x27, 0x28, 0x29, 0x2A, 0x2B, 0x2C, 0x2D, 0x2E, 0x2F, // 2x
    0x30, 0x31, 0x32, 0x33, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3A, 0x3B, 0x3C, 0x3D, 0x3E, 0x3F, // 3x
    0x40, b'a', b'b', b'c', b'd', b'e', b'f', b'g', b'h', b'i', b'j', b'k', b'l', b'm', b'n', b'o', // 4x
    b'p', b'q', b'r', b's', b't', b'u', b'v', b'w', b'x', b'y', b'z', 0x5B, 0x5C, 0x5D, 0x5E, 0x5F, // 5x
    0x60, b'a', b'b', b'c', b'd', b'e', b'f', b'g', b'h', b'i', b'j', b'k', b'l', b'm', b'n', b'o', // 6x
    b'p', b'q', b'r', b's', b't', b'u', b'v', b'w', b'x', b'y', b'z', 0x7B, 0x7C, 0x7D, 0x7E, 0x7F, // 7x
    0x80, 0x81, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89, 0x8A, 0x8B, 0x8C, 0x8D, 0x8E, 0x8F, // 8x
    0x90, 0x91, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9A, 0x9B, 0x9C, 0x9D, 0x9E, 0x9F, // 9x
    0xA0, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5, 0xA6, 0xA7, 0xA8, 0xA9, 0xAA, 0xAB, 0xAC, 0xAD, 0xAE, 0xAF, // Ax
    0xB0, 0xB1, 0xB2, 0xB3, 0xB4, 0xB5, 0xB6, 0xB7, 0xB8, 0xB9, 0xBA, 0xBB, 0xBC, 0xBD, 0xBE, 0xBF, // Bx
    0xC0, 0xC1, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6, 0xC7, 0xC8, 0xC9, 0xCA, 0xCB, 0xCC, 0xCD, 0xCE, 0xCF, // Cx
    0xD0, 0xD1, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6, 0xD7, 0xD8, 0xD9, 0xDA, 0xDB, 0xDC, 0xDD, 0xDE, 0xDF, // Dx
    0xE0, 0xE1, 0xE2, 0xE3, 0xE4, 0xE5, 0xE6, 0xE7, 0xE8, 0xE9, 0xEA, 0xEB, 0xEC, 0xED, 0xEE, 0xEF, // Ex
    0xF0, 0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7, 0xF8, 0xF9, 0xFA, 0xFB, 0xFC, 0xFD, 0xFE, 0xFF, // Fx
];

#[inline(always)]
pub(crate) fn into_lower_case(src: &[u8]) -> Vec<u8> {
    src.iter().map(|&b| ASCII_TABLE[b as usize]).collect()
}

// METHOD

/// The four HTTP methods the `/files` endpoint understands.
///
/// `HEAD`/`PATCH`/`OPTIONS`/`TRACE`/`CONNECT` are not part of the handler
/// matrix this server implements and are rejected as [`ParseError::InvalidMethod`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GET` - download/view/list an existing file.
    Get,
    /// `PUT` - override or rename an existing file.
    Put,
    /// `POST` - upload a new file.
    Post,
    /// `DELETE` - remove an existing file.
    Delete,
}

impl Method {
    #[inline(always)]
    pub(crate) fn from_bytes(src: &[u8]) -> Result<Self, ParseError> {
        match src {
            b"GET" => Ok(Method::Get),
            b"PUT" => Ok(Method::Put),
            b"POST" => Ok(Method::Post),
            b"DELETE" => Ok(Method::Delete),
            _ => Err(ParseError::InvalidMethod),
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

// VERSION

/// HTTP protocol version. The wire parser accepts either token but rejects
/// whichever one isn't the server's configured `http.version` (§4.1, §4.9);
/// the `Http10` variant exists so that check can distinguish "malformed
/// version token" from "well-formed but not the configured version".
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Version {
    /// `HTTP/1.0`
    Http10,
    /// `HTTP/1.1`
    Http11,
}

impl Version {
    #[inline(always)]
    pub(crate) fn from_bytes(src: &[u8]) -> Result<Self, ParseError> {
        match src {
            b"HTTP/1.1" => Ok(Self::Http11),
            b"HTTP/1.0" => Ok(Self::Http10),
            _ => Err(ParseError::InvalidVersion),
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Version::Http10 => "HTTP/1.0",
            Version::Http11 => "HTTP/1.1",
        }
    }
}

// STATUS_CODE

macro_rules! set_status_codes {
    ($(
        $(#[$docs:meta])+
        $name:ident = ($num:expr, $str:expr);
    )+) => {
        /// HTTP status codes used by this server's responses and error envelopes.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum StatusCode { $(
            #[doc = concat!(stringify!($num), " ", $str)]
            $(#[$docs])+
            $name = $num,
        )+ }

        impl StatusCode {
            /// The numeric code, e.g. `404`.
            pub const fn code(&self) -> u16 {
                match self { $( StatusCode::$name => $num, )+ }
            }

            /// The reason phrase, e.g. `"Not Found"`.
            pub const fn reason(&self) -> &'static str {
                match self { $( StatusCode::$name => $str, )+ }
            }

            #[inline]
            pub(crate) fn first_line(&self, version: Version) -> Vec<u8> {
                format!("{} {} {}\r\n", version.as_str(), self.code(), self.reason()).into_bytes()
            }
        }
    }
}

set_status_codes! {
    /// Upload succeeded.
    Created = (201, "Created");
    /// Download/view/rename/override/delete succeeded.
    Ok = (200, "OK");

    /// Malformed request line, headers, body, or a business-rule violation
    /// (name collision, type-tag mismatch, unknown action).
    BadRequest = (400, "Bad Request");
    /// Requested file/id/name does not exist.
    NotFound = (404, "Not Found");
    /// The router has templates for the endpoint root but none for this method.
    MethodNotAllowed = (405, "Method Not Allowed");
    /// `Accept` offered nothing the handler can produce.
    NotAcceptable = (406, "Not Acceptable");
    /// Upload/override without `Content-Length`.
    LengthRequired = (411, "Length Required");
    /// `Content-Type` outside the handler's allow-list.
    UnsupportedMediaType = (415, "Unsupported Media Type");
    /// Too many headers for the configured limit.
    RequestHeaderFieldsTooLarge = (431, "Request Header Fields Too Large");

    /// Unhandled I/O failure, or a failed store rollback.
    InternalServerError = (500, "Internal Server Error");
    /// `Version::from_bytes` parsed a well-formed but unsupported version token.
    HttpVersionNotSupported = (505, "HTTP Version Not Supported");
}

// URL

/// A request URL, already split into the pieces the router and handlers need.
///
/// Path/query bytes are copied out of the request buffer once at parse time
/// (see `DESIGN.md` for why this crate, unlike its teacher, does not keep
/// these as zero-copy `'static` slices): the catalog and JSON bodies built
/// from handler output must outlive the connection's read buffer.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Default)]
pub struct Url {
    target: Vec<u8>,
    path: Vec<u8>,
    parts: Vec<Vec<u8>>,
    query: Option<Vec<u8>>,
    query_parts: Vec<(Vec<u8>, Vec<u8>)>,
}

impl Url {
    pub(crate) fn parse(target: &[u8]) -> Self {
        let query_pos = memchr::memchr(b'?', target);
        let (path, query) = match query_pos {
            Some(pos) => (&target[..pos], Some(&target[pos + 1..])),
            None => (target, None),
        };

        let parts = path
            .split(|&b| b == b'/')
            .filter(|s| !s.is_empty())
            .map(|s| s.to_vec())
            .collect();

        let query_parts: Vec<(Vec<u8>, Vec<u8>)> = query
            .and_then(|q| Query::parse(q, usize::MAX).ok())
            .unwrap_or_default();

        Self {
            target: target.to_vec(),
            path: path.to_vec(),
            parts,
            query: query.map(|q| q.to_vec()),
            query_parts,
        }
    }

    /// Full request target, path plus query string.
    pub fn target(&self) -> &[u8] {
        &self.target
    }

    /// The path component only.
    pub fn path(&self) -> &[u8] {
        &self.path
    }

    /// Path segments with empty segments (leading/trailing/doubled `/`) removed.
    pub fn path_segments(&self) -> Vec<&[u8]> {
        self.parts.iter().map(|p| p.as_slice()).collect()
    }

    /// Raw query string, without the leading `?`.
    pub fn query_full(&self) -> Option<&[u8]> {
        self.query.as_deref()
    }

    /// Look up a query parameter by exact key. First match wins.
    pub fn query(&self, key: &[u8]) -> Option<&[u8]> {
        self.query_parts
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_from_bytes() {
        assert_eq!(Method::from_bytes(b"GET").unwrap(), Method::Get);
        assert_eq!(Method::from_bytes(b"DELETE").unwrap(), Method::Delete);
        assert!(Method::from_bytes(b"TRACE").is_err());
    }

    #[test]
    fn version_from_bytes() {
        assert_eq!(Version::from_bytes(b"HTTP/1.1").unwrap(), Version::Http11);
        assert!(Version::from_bytes(b"HTTP/2.0").is_err());
    }

    #[test]
    fn url_parse_path_and_query() {
        let url = Url::parse(b"/files/id/1?action=view");
        assert_eq!(url.path(), b"/files/id/1");
        assert_eq!(url.path_segments(), vec![b"files".as_slice(), b"id", b"1"]);
        assert_eq!(url.query(b"action"), Some(b"view".as_slice()));
    }

    #[test]
    fn url_parse_no_query() {
        let url = Url::parse(b"/files/upload");
        assert_eq!(url.query_full(), None);
        assert_eq!(url.path_segments(), vec![b"files".as_slice(), b"upload"]);
    }
}
