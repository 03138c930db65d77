//! View handler: `GET /files/{name|id|query}?action=view` (§4.5).
//!
//! The response body is the list itself, not wrapped in a status envelope
//! (§4.5 "View").

use super::{identifier_from_path, query_keyword_from_path};
use crate::errors::AppError;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::types::StatusCode;
use crate::router::negotiate;
use crate::router::negotiate::ANY;
use crate::router::template::Template;
use crate::store::FileStore;

const OFFERED: &[&str] = &["application/json", "text/plain"];

pub(super) async fn handle(_template: &Template, request: &Request, store: &FileStore) -> Result<Response, AppError> {
    negotiate::accept_request_type(request, &[ANY])?;
    let response_type = negotiate::select_response_type(request, OFFERED)?;

    let entries = if let Ok(keyword) = query_keyword_from_path(request) {
        store.list(&keyword).await
    } else {
        let identifier = identifier_from_path(request)?;
        vec![store.view(&identifier).await?]
    };

    let mut resp = Response::new();
    resp.status(StatusCode::Ok);
    let body = serde_json::to_vec(&entries).expect("catalog entries are always representable as JSON");
    Ok(resp.body_with(response_type, body))
}
