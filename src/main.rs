//! Binary entry point: loads settings (C9), wires up logging (C10), builds
//! the file store and router from the templates file, launches the listener
//! (C8), and hands control to the admin surface (C11).
//!
//! The teacher ships no binary at all (it's a library consumed by a
//! caller-provided `main`); this wiring is new, following the order settings
//! → logging → store/router → listener → admin that §2's data-flow
//! paragraph describes.

mod admin;
mod config;
mod errors;
mod handlers;
mod http;
mod limits;
mod log;
mod router;
mod server;
mod store;

use config::Settings;
use limits::{ConnLimits, ReqLimits, ServerLimits};
use router::{Endpoint, Router};
use server::listener::Listener;
use std::path::PathBuf;
use std::sync::Arc;
use store::FileStore;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let settings_path = std::env::args().nth(1).unwrap_or_else(|| "fileden.conf".to_string());

    let log_buffer = log::init();

    let settings = match Settings::load(&settings_path).await {
        Ok(s) => s,
        Err(e) => {
            error!(target: "main", "startup aborted: {e}");
            std::process::exit(1);
        }
    };

    let store = match FileStore::load(
        PathBuf::from(&settings.store_root),
        PathBuf::from(&settings.metadata_file),
        settings.metadata_id_key.clone(),
        settings.metadata_data_key.clone(),
    )
    .await
    {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!(target: "main", "failed to load file store: {e}");
            std::process::exit(1);
        }
    };

    let router = match build_router(&settings, store).await {
        Ok(r) => Arc::new(r),
        Err(e) => {
            error!(target: "main", "failed to load templates file: {e}");
            std::process::exit(1);
        }
    };

    let req_limits = ReqLimits {
        required_version: settings.http_version,
        ..ReqLimits::default()
    };
    let listener = Listener::new(
        settings.bind_addr(),
        router,
        ServerLimits::default(),
        ConnLimits::default(),
        req_limits,
    );
    listener.start().await;
    info!(target: "main", "{} ready on {}", settings.server_name, listener.bind_addr());

    tokio::select! {
        _ = admin::run(listener.clone(), log_buffer) => {}
        _ = tokio::signal::ctrl_c() => {
            info!(target: "main", "received interrupt, shutting down");
        }
    }

    if listener.is_running() {
        listener.shutdown().await;
    }
}

/// Builds the registry by reading the templates file (§6): a JSON mapping
/// from endpoint root to method name to an ordered list of template strings.
/// Every root in the file is bound to the single configured file store,
/// matching this spec's one-endpoint deployment.
async fn build_router(settings: &Settings, store: Arc<FileStore>) -> std::io::Result<Router> {
    let text = tokio::fs::read_to_string(&settings.templates_file).await?;
    let parsed: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    let mut router = Router::new();
    let Some(roots) = parsed.as_object() else {
        return Ok(router);
    };

    for (root, methods) in roots {
        let mut endpoint = Endpoint::new(store.clone());
        if let Some(methods) = methods.as_object() {
            for (method_name, templates) in methods {
                let Ok(method) = http::types::Method::from_bytes(method_name.as_bytes()) else {
                    continue;
                };
                if let Some(templates) = templates.as_array() {
                    for template in templates.iter().filter_map(|t| t.as_str()) {
                        endpoint.route(method, template);
                    }
                }
            }
        }
        router.register(root, endpoint);
    }

    Ok(router)
}
