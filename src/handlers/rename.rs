//! Rename handler: `PUT /files/{name|id}?action=update-name&value={value}` (§4.5).

use super::{identifier_from_path, success_envelope, JSON_TEXT_NONE};
use crate::errors::{AppError, UrlError};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::types::StatusCode;
use crate::router::negotiate;
use crate::router::negotiate::ANY;
use crate::router::template::Template;
use crate::store::catalog::type_tag;
use crate::store::FileStore;

pub(super) async fn handle(_template: &Template, request: &Request, store: &FileStore) -> Result<Response, AppError> {
    negotiate::accept_request_type(request, &[ANY])?;
    let response_type = negotiate::select_response_type(request, JSON_TEXT_NONE)?;

    let identifier = identifier_from_path(request)?;
    let new_name = request
        .url()
        .query(b"value")
        .map(|v| String::from_utf8_lossy(v).into_owned())
        .ok_or(UrlError::NoTemplateMatch)?;

    let current = store.view(&identifier).await?;
    if type_tag(&current.file_name) != type_tag(&new_name) {
        return Err(UrlError::TypeMismatch.into());
    }

    store.rename(&identifier, &new_name).await?;

    let mut resp = Response::new();
    resp.status(StatusCode::Ok);
    if response_type == "none" {
        return Ok(resp.no_body());
    }
    let envelope = success_envelope(200, "File updated successfully", None);
    Ok(resp.body_with(response_type, serde_json::to_vec(&envelope).expect("envelope is JSON")))
}
