//! Content-type negotiator (C3).
//!
//! New module (the teacher has no content negotiation of its own); grounded
//! in the teacher's request-accessor style (`Request::header`). `q=` priority
//! weights are deliberately ignored per §4.3/§9 — this is a faithfully
//! replicated limitation of the source, not an oversight.

use crate::errors::MediaError;
use crate::http::request::Request;

/// Marker meaning "accept any request content type".
pub(crate) const ANY: &str = "*";

/// Checks the request's `Content-Type` against a handler's allow-list (§4.3).
///
/// `acceptable` containing [`ANY`] accepts unconditionally. A missing
/// `Content-Type` header is also accepted (the handler's allow-list only
/// constrains *present* values).
pub(crate) fn accept_request_type(request: &Request, acceptable: &[&str]) -> Result<(), MediaError> {
    if acceptable.contains(&ANY) {
        return Ok(());
    }
    match request.header("Content-Type") {
        None => Ok(()),
        Some(ct) if acceptable.contains(&ct) => Ok(()),
        Some(_) => Err(MediaError::UnsupportedRequestType),
    }
}

/// Picks a response content type from `offered` (in preference order)
/// against the request's `Accept` header (§4.3).
pub(crate) fn select_response_type<'a>(
    request: &Request,
    offered: &[&'a str],
) -> Result<&'a str, MediaError> {
    let Some(accept) = request.header("Accept") else {
        return offered.first().copied().ok_or(MediaError::NotAcceptable);
    };

    let accepted: Vec<&str> = accept.split(',').map(|s| s.trim()).collect();
    if accepted.iter().any(|&a| a == "*/*") {
        return offered.first().copied().ok_or(MediaError::NotAcceptable);
    }

    offered
        .iter()
        .find(|&&o| accepted.contains(&o))
        .copied()
        .ok_or(MediaError::NotAcceptable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::types::Method;

    #[test]
    fn any_request_type_accepted_without_header() {
        let req = Request::for_test(Method::Get, b"/files/upload", vec![], None);
        assert!(accept_request_type(&req, &["application/octet-stream"]).is_ok());
    }

    #[test]
    fn unlisted_request_type_rejected() {
        let req = Request::for_test(
            Method::Post,
            b"/files/upload",
            vec![("Content-Type", "text/html")],
            None,
        );
        assert_eq!(
            accept_request_type(&req, &["application/octet-stream"]),
            Err(MediaError::UnsupportedRequestType)
        );
    }

    #[test]
    fn wildcard_accept_picks_first_offered() {
        let req = Request::for_test(Method::Get, b"/files/id/1", vec![("Accept", "*/*")], None);
        assert_eq!(select_response_type(&req, &["application/json", "text/plain"]), Ok("application/json"));
    }

    #[test]
    fn accept_picks_first_matching_offer_in_order() {
        let req = Request::for_test(
            Method::Get,
            b"/files/id/1",
            vec![("Accept", "text/plain, application/json")],
            None,
        );
        assert_eq!(select_response_type(&req, &["application/json", "text/plain"]), Ok("application/json"));
    }

    #[test]
    fn no_match_is_not_acceptable() {
        let req = Request::for_test(Method::Get, b"/files/id/1", vec![("Accept", "text/html")], None);
        assert_eq!(
            select_response_type(&req, &["application/json", "text/plain"]),
            Err(MediaError::NotAcceptable)
        );
    }
}
