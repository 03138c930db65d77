//! The error taxonomy: one sum type per subsystem, each convertible to an
//! HTTP status and a JSON error envelope (`{"status":..,"error":..,"reason":..}`).

use crate::http::types::StatusCode;
use serde::Serialize;

/// Malformed request line, headers, or body (C1).
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid HTTP method")]
    InvalidMethod,
    #[error("malformed request line")]
    MalformedRequestLine,
    #[error("invalid HTTP version token")]
    InvalidVersion,
    #[error("unsupported HTTP version")]
    UnsupportedVersion,
    #[error("malformed header line")]
    MalformedHeader,
    #[error("no headers present")]
    NoHeaders,
    #[error("too many headers")]
    TooManyHeaders,
    #[error("missing Content-Length header")]
    MissingContentLength,
    #[error("invalid Content-Length header")]
    InvalidContentLength,
    #[error("request body must not be empty")]
    EmptyBody,
    #[error("missing or malformed Content-Disposition header")]
    MissingContentDisposition,
}

impl ParseError {
    pub fn status(&self) -> StatusCode {
        match self {
            ParseError::MissingContentLength => StatusCode::LengthRequired,
            ParseError::UnsupportedVersion => StatusCode::HttpVersionNotSupported,
            ParseError::TooManyHeaders => StatusCode::RequestHeaderFieldsTooLarge,
            _ => StatusCode::BadRequest,
        }
    }
}

/// Unrecognized endpoint, missing URL segments, unknown action, invalid id (C2/C4).
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("no endpoint registered for this root")]
    UnknownRoot,
    #[error("no route matches this URL")]
    NoTemplateMatch,
    #[error("method not allowed for this endpoint")]
    MethodNotAllowed,
    #[error("unknown action '{0}'")]
    UnknownAction(String),
    #[error("identifier is not a valid id")]
    InvalidId,
    #[error("rename target has a different file type")]
    TypeMismatch,
}

impl UrlError {
    pub fn status(&self) -> StatusCode {
        match self {
            UrlError::MethodNotAllowed => StatusCode::MethodNotAllowed,
            UrlError::NoTemplateMatch | UrlError::InvalidId => StatusCode::NotFound,
            UrlError::TypeMismatch => StatusCode::BadRequest,
            UrlError::UnknownRoot | UrlError::UnknownAction(_) => StatusCode::BadRequest,
        }
    }
}

/// Content-type negotiation failure (C3).
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MediaError {
    #[error("unsupported request content type")]
    UnsupportedRequestType,
    #[error("no acceptable response content type")]
    NotAcceptable,
}

impl MediaError {
    pub fn status(&self) -> StatusCode {
        match self {
            MediaError::UnsupportedRequestType => StatusCode::UnsupportedMediaType,
            MediaError::NotAcceptable => StatusCode::NotAcceptable,
        }
    }
}

/// File store failures (C6), including the add() rollback sub-kind.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("'{0}' already exists")]
    NameCollision(String),
    #[error("no such file or id '{0}'")]
    NotFound(String),
    #[error("invalid identifier")]
    InvalidIdentifier,
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("write failed and rollback of '{0}' also failed; manual cleanup required")]
    RollbackFailed(String),
}

impl StoreError {
    pub fn status(&self) -> StatusCode {
        match self {
            StoreError::NameCollision(_) | StoreError::InvalidIdentifier => StatusCode::BadRequest,
            StoreError::NotFound(_) => StatusCode::NotFound,
            StoreError::Io(_) | StoreError::RollbackFailed(_) => StatusCode::InternalServerError,
        }
    }
}

/// Fatal: prevents startup (C9).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("settings file '{0}' could not be read: {1}")]
    Unreadable(String, std::io::Error),
    #[error("missing required setting '{0}'")]
    MissingKey(&'static str),
    #[error("setting '{0}' has an invalid value: '{1}'")]
    InvalidValue(&'static str, String),
}

/// The top-level sum of every subsystem's errors, the type handlers return.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Url(#[from] UrlError),
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Parse(e) => e.status(),
            AppError::Url(e) => e.status(),
            AppError::Media(e) => e.status(),
            AppError::Store(e) => e.status(),
        }
    }

    /// Builds the JSON error envelope body required by §7: `status`/`error`/`reason`.
    pub fn envelope(&self) -> Vec<u8> {
        #[derive(Serialize)]
        struct Envelope {
            status: u16,
            error: String,
            reason: String,
        }

        let status = self.status();
        serde_json::to_vec(&Envelope {
            status: status.code(),
            error: status.reason().to_string(),
            reason: self.to_string(),
        })
        .expect("envelope is always representable as JSON")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_statuses() {
        assert_eq!(ParseError::MissingContentLength.status(), StatusCode::LengthRequired);
        assert_eq!(ParseError::UnsupportedVersion.status(), StatusCode::HttpVersionNotSupported);
        assert_eq!(ParseError::InvalidMethod.status(), StatusCode::BadRequest);
    }

    #[test]
    fn store_error_statuses() {
        assert_eq!(StoreError::NotFound("x".into()).status(), StatusCode::NotFound);
        assert_eq!(StoreError::NameCollision("x".into()).status(), StatusCode::BadRequest);
    }

    #[test]
    fn envelope_shape() {
        let err = AppError::Store(StoreError::NotFound("a.txt".into()));
        let body = err.envelope();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["status"], 404);
        assert!(parsed["reason"].as_str().unwrap().contains("a.txt"));
    }
}
