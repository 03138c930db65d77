//! Upload handler: `POST /files/upload` (§4.5).

use super::{success_envelope, BINARY_MEDIA, JSON_TEXT_NONE};
use crate::errors::{AppError, ParseError};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::types::StatusCode;
use crate::router::negotiate;
use crate::store::FileStore;

pub(super) async fn handle(request: &Request, store: &FileStore) -> Result<Response, AppError> {
    negotiate::accept_request_type(request, BINARY_MEDIA)?;
    let response_type = negotiate::select_response_type(request, JSON_TEXT_NONE)?;

    let filename = request
        .header("Content-Disposition")
        .and_then(parse_content_disposition)
        .ok_or(ParseError::MissingContentDisposition)?;

    let body = request.body().ok_or(ParseError::MissingContentLength)?;
    if body.is_empty() {
        return Err(ParseError::EmptyBody.into());
    }

    let id = store.add(&filename, body).await?;

    let mut resp = Response::new();
    resp.status(StatusCode::Created);
    if response_type == "none" {
        return Ok(resp.no_body());
    }
    let envelope = success_envelope(
        201,
        "File saved on the server",
        Some(&format!("'{}' was given a unique identifier #{}", filename, id)),
    );
    Ok(resp.body_with(response_type, serde_json::to_vec(&envelope).expect("envelope is JSON")))
}

/// Parses `attachment; filename="<name>"` (§4.5 "Upload"). The URL path is
/// informational only per §9 — a dead-code path in the source parsed the
/// filename from there instead, and that path is deliberately not ported.
fn parse_content_disposition(value: &str) -> Option<String> {
    let marker = "filename=\"";
    let start = value.find(marker)? + marker.len();
    let rest = &value[start..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_attachment_filename() {
        assert_eq!(
            parse_content_disposition("attachment; filename=\"a.txt\""),
            Some("a.txt".to_string())
        );
    }

    #[test]
    fn rejects_missing_filename() {
        assert_eq!(parse_content_disposition("attachment"), None);
    }
}
