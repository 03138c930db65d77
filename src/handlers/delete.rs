//! Delete handler: `DELETE /files/{name|id}` (§4.5).

use super::{identifier_from_path, success_envelope, JSON_TEXT_NONE};
use crate::errors::AppError;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::types::StatusCode;
use crate::router::negotiate;
use crate::router::negotiate::ANY;
use crate::store::FileStore;

pub(super) async fn handle(request: &Request, store: &FileStore) -> Result<Response, AppError> {
    negotiate::accept_request_type(request, &[ANY])?;
    let response_type = negotiate::select_response_type(request, JSON_TEXT_NONE)?;

    let identifier = identifier_from_path(request)?;
    store.delete(&identifier).await?;

    let mut resp = Response::new();
    resp.status(StatusCode::Ok);
    if response_type == "none" {
        return Ok(resp.no_body());
    }
    let envelope = success_envelope(200, "File deleted successfully", None);
    Ok(resp.body_with(response_type, serde_json::to_vec(&envelope).expect("envelope is JSON")))
}
