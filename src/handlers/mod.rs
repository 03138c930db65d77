//! Action handlers (C5): one per (method, action) pair.
//!
//! New business logic (the teacher ships no file-management handlers of its
//! own); request/response plumbing is grounded in the teacher's `Handler`
//! trait shape (`server/server_impl.rs`), collapsed from a user-pluggable
//! trait into a fixed dispatch table since this server has exactly six
//! actions rather than an arbitrary handler set.

mod delete;
mod download;
mod overwrite;
mod rename;
mod upload;
mod view;

use crate::errors::{AppError, UrlError};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::router::template::Template;
use crate::router::Action;
use crate::store::{FileStore, Identifier};

/// `Content-Type`s accepted by handlers whose allow-list is "binary media" (§4.5).
pub(crate) const BINARY_MEDIA: &[&str] = &[
    "application/octet-stream",
    "image/jpeg",
    "image/png",
    "image/gif",
    "audio/mpeg",
    "video/mp4",
];

/// Response offer-list shared by every handler that may answer with a JSON
/// envelope, plain text, or (for mutations whose caller doesn't need the
/// body) nothing at all.
pub(crate) const JSON_TEXT_NONE: &[&str] = &["application/json", "text/plain", "none"];

pub(crate) async fn run(
    action: Action,
    template: &Template,
    request: &Request,
    store: &FileStore,
) -> Result<Response, AppError> {
    match action {
        Action::Upload => upload::handle(request, store).await,
        Action::Download => download::handle(template, request, store).await,
        Action::View => view::handle(template, request, store).await,
        Action::Rename => rename::handle(template, request, store).await,
        Action::Override => overwrite::handle(template, request, store).await,
        Action::Delete => delete::handle(request, store).await,
    }
}

/// Resolves the `/name/<n>` or `/id/<n>` URL tail shared by most handlers
/// (§4.5 "Common URL tail shape"). The id form parses as a signed 64-bit
/// integer per spec wording; only positive values are valid catalog ids.
fn identifier_from_path(request: &Request) -> Result<Identifier, UrlError> {
    let segments = request.url().path_segments();
    let (kind, value) = match (segments.get(1), segments.get(2)) {
        (Some(kind), Some(value)) => (*kind, *value),
        _ => return Err(UrlError::NoTemplateMatch),
    };

    match kind {
        b"name" => Ok(Identifier::Name(String::from_utf8_lossy(value).into_owned())),
        b"id" => {
            let text = std::str::from_utf8(value).map_err(|_| UrlError::InvalidId)?;
            let id: i64 = text.parse().map_err(|_| UrlError::InvalidId)?;
            if id < 1 {
                return Err(UrlError::InvalidId);
            }
            Ok(Identifier::Id(id as u64))
        }
        _ => Err(UrlError::NoTemplateMatch),
    }
}

/// Resolves the `/query/<k>` URL tail (§4.5, View's third sub-shape).
fn query_keyword_from_path(request: &Request) -> Result<String, UrlError> {
    let segments = request.url().path_segments();
    match (segments.get(1), segments.get(2)) {
        (Some(&b"query"), Some(value)) => Ok(String::from_utf8_lossy(value).into_owned()),
        _ => Err(UrlError::NoTemplateMatch),
    }
}

/// Builds a handler's `{"status","message","info"?}`-shaped success envelope.
fn success_envelope(status: u16, message: &str, info: Option<&str>) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    map.insert("status".to_string(), status.into());
    map.insert("message".to_string(), message.into());
    if let Some(info) = info {
        map.insert("info".to_string(), info.into());
    }
    serde_json::Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::types::Method;

    #[test]
    fn identifier_from_path_parses_name_and_id() {
        let name_req = Request::for_test(Method::Get, b"/files/name/a.txt", vec![], None);
        assert!(matches!(identifier_from_path(&name_req), Ok(Identifier::Name(n)) if n == "a.txt"));

        let id_req = Request::for_test(Method::Get, b"/files/id/1", vec![], None);
        assert!(matches!(identifier_from_path(&id_req), Ok(Identifier::Id(1))));
    }

    #[test]
    fn identifier_from_path_rejects_non_numeric_id() {
        let req = Request::for_test(Method::Get, b"/files/id/abc", vec![], None);
        assert_eq!(identifier_from_path(&req), Err(UrlError::InvalidId));
    }

    #[test]
    fn query_keyword_from_path_reads_third_segment() {
        let req = Request::for_test(Method::Get, b"/files/query/report", vec![], None);
        assert_eq!(query_keyword_from_path(&req).unwrap(), "report");
    }
}
