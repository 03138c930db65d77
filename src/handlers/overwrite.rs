//! Override handler: `PUT /files/{name|id}?action=override` (§4.5).
//!
//! Named `overwrite` internally — `override` is a Rust keyword — while the
//! action string on the wire stays `"override"` per §4.4's action table.

use super::{identifier_from_path, success_envelope, BINARY_MEDIA, JSON_TEXT_NONE};
use crate::errors::{AppError, ParseError};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::types::StatusCode;
use crate::router::negotiate;
use crate::router::template::Template;
use crate::store::FileStore;

pub(super) async fn handle(_template: &Template, request: &Request, store: &FileStore) -> Result<Response, AppError> {
    negotiate::accept_request_type(request, BINARY_MEDIA)?;
    let response_type = negotiate::select_response_type(request, JSON_TEXT_NONE)?;

    let identifier = identifier_from_path(request)?;
    let body = request.body().ok_or(ParseError::MissingContentLength)?;
    if body.is_empty() {
        return Err(ParseError::EmptyBody.into());
    }

    store.override_contents(&identifier, body).await?;

    let mut resp = Response::new();
    resp.status(StatusCode::Ok);
    if response_type == "none" {
        return Ok(resp.no_body());
    }
    let envelope = success_envelope(200, "File overwritten successfully", None);
    Ok(resp.body_with(response_type, serde_json::to_vec(&envelope).expect("envelope is JSON")))
}
