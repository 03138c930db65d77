//! Settings loader (C9): a read-once key/value file producing a frozen
//! settings record (§6 "Settings source").
//!
//! New module; the `key=value`-per-line grammar (blank lines and
//! `#`-comments skipped, whitespace trimmed) is not specified beyond "a
//! key/value file" (§9 Open questions is silent on this), so it reuses the
//! wire codec's own split-on-first-delimiter idiom (C1's `": "` header
//! split) rather than inventing a new grammar or pulling in a config crate
//! for an unspecified format.

use crate::errors::ConfigError;
use crate::http::types::Version;
use std::collections::HashMap;

/// The frozen settings singleton (§3 "Settings"). Passed as explicit context
/// rather than read as global state, per §9 "Singletons with global state".
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(crate) http_version: Version,
    pub(crate) server_name: String,
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) store_root: String,
    pub(crate) metadata_file: String,
    pub(crate) templates_file: String,
    pub(crate) metadata_id_key: String,
    pub(crate) metadata_data_key: String,
}

const REQUIRED_KEYS: &[&str] = &[
    "http.version",
    "server.name",
    "server.host",
    "server.port",
    "store.root",
    "store.metadata_file",
    "store.templates_file",
    "metadata.id_key",
    "metadata.data_key",
];

impl Settings {
    /// Loads and validates settings from a key/value file (§6, §4.9 in SPEC_FULL.md).
    pub(crate) async fn load(path: &str) -> Result<Self, ConfigError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::Unreadable(path.to_string(), e))?;

        let values = parse_key_value(&text);
        for key in REQUIRED_KEYS {
            if !values.contains_key(*key) {
                return Err(ConfigError::MissingKey(key));
            }
        }

        let port = values["server.port"]
            .parse()
            .map_err(|_| ConfigError::InvalidValue("server.port", values["server.port"].clone()))?;

        let http_version = Version::from_bytes(values["http.version"].as_bytes())
            .map_err(|_| ConfigError::InvalidValue("http.version", values["http.version"].clone()))?;

        Ok(Self {
            http_version,
            server_name: values["server.name"].clone(),
            host: values["server.host"].clone(),
            port,
            store_root: values["store.root"].clone(),
            metadata_file: values["store.metadata_file"].clone(),
            templates_file: values["store.templates_file"].clone(),
            metadata_id_key: values["metadata.id_key"].clone(),
            metadata_data_key: values["metadata.data_key"].clone(),
        })
    }

    pub(crate) fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parses `key=value` lines, skipping blanks and `#`-comments.
fn parse_key_value(text: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            map.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lines_skipping_blanks_and_comments() {
        let text = "\n# a comment\nserver.host = 127.0.0.1\nserver.port=8080\n";
        let values = parse_key_value(text);
        assert_eq!(values.get("server.host").map(String::as_str), Some("127.0.0.1"));
        assert_eq!(values.get("server.port").map(String::as_str), Some("8080"));
        assert_eq!(values.len(), 2);
    }

    #[tokio::test]
    async fn missing_file_is_unreadable_error() {
        let err = Settings::load("/nonexistent/settings.conf").await.unwrap_err();
        assert!(matches!(err, ConfigError::Unreadable(_, _)));
    }

    fn complete_settings_text(http_version: &str) -> String {
        format!(
            "http.version={http_version}\n\
             server.name=fileden\n\
             server.host=127.0.0.1\n\
             server.port=8080\n\
             store.root=files\n\
             store.metadata_file=metadata.json\n\
             store.templates_file=templates.json\n\
             metadata.id_key=currentId\n\
             metadata.data_key=data\n"
        )
    }

    #[tokio::test]
    async fn loads_the_configured_http_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fileden.conf");
        tokio::fs::write(&path, complete_settings_text("HTTP/1.0")).await.unwrap();

        let settings = Settings::load(path.to_str().unwrap()).await.unwrap();
        assert_eq!(settings.http_version, Version::Http10);
    }

    #[tokio::test]
    async fn unrecognized_http_version_is_an_invalid_value_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fileden.conf");
        tokio::fs::write(&path, complete_settings_text("HTTP/2")).await.unwrap();

        let err = Settings::load(path.to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue("http.version", _)));
    }
}
