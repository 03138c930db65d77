//! Router (C4): endpoint-root registry, method→template-list dispatch.
//!
//! Grounded in the teacher's `server_impl::ServerBuilder` registry-building
//! style, generalized from "one handler for the whole server" to "a per-root
//! table of (template, action) pairs bound to a file store".

pub(crate) mod negotiate;
pub(crate) mod template;

use crate::errors::{AppError, UrlError};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::types::Method;
use crate::store::FileStore;
use std::collections::HashMap;
use std::sync::Arc;
use template::Template;

/// The logical operation a matched template dispatches to (§4.4, §GLOSSARY "Action").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    Download,
    View,
    Override,
    Rename,
    Upload,
    Delete,
}

impl Action {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "download" => Some(Action::Download),
            "view" => Some(Action::View),
            "override" => Some(Action::Override),
            "update-name" => Some(Action::Rename),
            "upload" => Some(Action::Upload),
            "delete" => Some(Action::Delete),
            _ => None,
        }
    }
}

/// One registered template, paired with the action it dispatches to once
/// matched. `None` means the action isn't fixed at registration time and
/// must be read from the matched request's own `action` query value
/// (§4.4 "Handler selection by action").
struct Route {
    template: Template,
    action: Option<Action>,
}

/// One endpoint root's template table plus the store it's bound to (§3
/// "URL template table", §9 "registry keyed by endpoint-root string").
pub(crate) struct Endpoint {
    routes: HashMap<Method, Vec<Route>>,
    store: Arc<FileStore>,
}

impl Endpoint {
    pub(crate) fn new(store: Arc<FileStore>) -> Self {
        Self {
            routes: HashMap::new(),
            store,
        }
    }

    /// Registers one (method, template-string) route. `POST`/`DELETE` carry a
    /// method-implied action; `GET`/`PUT` templates carry an `{action}`
    /// placeholder and are resolved per-request at dispatch time.
    pub(crate) fn route(&mut self, method: Method, template: &str) {
        let tmpl = Template::parse(template);
        let action = fixed_action_for_method(method);
        self.routes
            .entry(method)
            .or_default()
            .push(Route { template: tmpl, action });
    }
}

/// The action implied by the method alone, for the two methods that don't
/// carry an `action` query parameter (§4.4).
fn fixed_action_for_method(method: Method) -> Option<Action> {
    match method {
        Method::Post => Some(Action::Upload),
        Method::Delete => Some(Action::Delete),
        _ => None,
    }
}

/// Resolves the action for a matched route: the method-implied action if
/// fixed, otherwise the request URL's own `action` query value, mapped
/// through the known action table. An unrecognized value is a 400, not a
/// routing failure — the template already matched (§4.4).
fn resolve_action(route: &Route, url: &crate::http::types::Url) -> Result<Action, UrlError> {
    if let Some(action) = route.action {
        return Ok(action);
    }
    let raw = route.template.extract("action", url).ok_or_else(|| UrlError::UnknownAction(String::new()))?;
    let value = String::from_utf8_lossy(raw).into_owned();
    match Action::from_str(&value) {
        Some(action) => Ok(action),
        None => Err(UrlError::UnknownAction(value)),
    }
}

/// The full registry: endpoint root → its template table + store.
pub(crate) struct Router {
    endpoints: HashMap<String, Endpoint>,
}

impl Router {
    pub(crate) fn new() -> Self {
        Self {
            endpoints: HashMap::new(),
        }
    }

    pub(crate) fn register(&mut self, root: &str, endpoint: Endpoint) {
        self.endpoints.insert(root.to_string(), endpoint);
    }

    /// Dispatches one request to a matching route and runs its handler (§4.4, §4.7).
    pub(crate) async fn dispatch(&self, request: &Request) -> Result<Response, AppError> {
        let root = request.endpoint_root();
        let endpoint = self.endpoints.get(&root).ok_or(UrlError::UnknownRoot)?;

        let candidates = endpoint
            .routes
            .get(&request.method())
            .ok_or(UrlError::MethodNotAllowed)?;

        let route = candidates
            .iter()
            .find(|r| r.template.matches(request.url()))
            .ok_or(UrlError::NoTemplateMatch)?;
        let action = resolve_action(route, request.url())?;

        crate::handlers::run(action, &route.template, request, &endpoint.store).await
    }

    /// Flushes every registered endpoint's store (§4.8's shutdown sequence).
    pub(crate) async fn flush_all(&self) -> Result<(), crate::errors::StoreError> {
        for endpoint in self.endpoints.values() {
            endpoint.store.flush().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::types::Url;

    #[test]
    fn fixed_action_for_method_covers_post_and_delete() {
        assert_eq!(fixed_action_for_method(Method::Post), Some(Action::Upload));
        assert_eq!(fixed_action_for_method(Method::Delete), Some(Action::Delete));
        assert_eq!(fixed_action_for_method(Method::Get), None);
        assert_eq!(fixed_action_for_method(Method::Put), None);
    }

    #[test]
    fn resolve_action_reads_the_requests_own_query_value() {
        let route = Route {
            template: Template::parse("/files/name/{name}?action={action}"),
            action: None,
        };
        let download = Url::parse(b"/files/name/a.txt?action=download");
        assert_eq!(resolve_action(&route, &download), Ok(Action::Download));
        let view = Url::parse(b"/files/name/a.txt?action=view");
        assert_eq!(resolve_action(&route, &view), Ok(Action::View));
    }

    #[test]
    fn resolve_action_rejects_unknown_action_value() {
        let route = Route {
            template: Template::parse("/files/name/{name}?action={action}"),
            action: None,
        };
        let url = Url::parse(b"/files/name/a.txt?action=nonsense");
        assert_eq!(resolve_action(&route, &url), Err(UrlError::UnknownAction("nonsense".to_string())));
    }

    #[test]
    fn resolve_action_is_fixed_for_method_implied_routes() {
        let route = Route {
            template: Template::parse("/files/upload"),
            action: Some(Action::Upload),
        };
        let url = Url::parse(b"/files/upload");
        assert_eq!(resolve_action(&route, &url), Ok(Action::Upload));
    }
}
