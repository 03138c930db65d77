//! Download handler: `GET /files/{name|id}?action=download` (§4.5).

use super::{identifier_from_path, BINARY_MEDIA};
use crate::errors::AppError;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::types::StatusCode;
use crate::router::negotiate;
use crate::router::negotiate::ANY;
use crate::router::template::Template;
use crate::store::FileStore;

pub(super) async fn handle(_template: &Template, request: &Request, store: &FileStore) -> Result<Response, AppError> {
    negotiate::accept_request_type(request, &[ANY])?;
    let response_type = negotiate::select_response_type(request, BINARY_MEDIA)?;

    let identifier = identifier_from_path(request)?;
    let name = match &identifier {
        crate::store::Identifier::Name(n) => n.clone(),
        crate::store::Identifier::Id(_) => store.view(&identifier).await?.file_name,
    };
    let bytes = store.get(&identifier).await?;

    let mut resp = Response::new();
    resp.status(StatusCode::Ok)
        .header("Content-Disposition", &format!("attachment; filename=\"{}\"", name));
    Ok(resp.body_with(response_type, bytes))
}
