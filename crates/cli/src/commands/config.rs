use std::env;
use std::fs;
use std::path::Path;

use bulkrooms_core::config::{resolve_config_path, AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

/// One inspected setting: its dotted key, rendered value and the env vars
/// that can set it, highest precedence first.
struct Entry {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for entry in entries(&config) {
        let source = field_source(
            entry.key,
            entry.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(entry.key, &entry.value, source));
    }

    lines.join("\n")
}

fn entries(config: &AppConfig) -> Vec<Entry> {
    let optional = |value: Option<&str>| value.unwrap_or("<unset>").to_string();

    vec![
        entry(
            "server.bind_address",
            config.server.bind_address.clone(),
            &["BULKROOMS_SERVER_BIND_ADDRESS"],
        ),
        entry("server.port", config.server.port.to_string(), &["BULKROOMS_SERVER_PORT"]),
        entry(
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["BULKROOMS_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        entry(
            "webhook.url",
            redact_url(config.webhook.url.expose_secret()),
            &["BULKROOMS_WEBHOOK_URL"],
        ),
        entry(
            "webhook.quote_sheet",
            config.webhook.quote_sheet.clone(),
            &["BULKROOMS_WEBHOOK_QUOTE_SHEET"],
        ),
        entry(
            "webhook.contact_sheet",
            config.webhook.contact_sheet.clone(),
            &["BULKROOMS_WEBHOOK_CONTACT_SHEET"],
        ),
        entry(
            "webhook.timeout_secs",
            config
                .webhook
                .timeout_secs
                .map_or_else(|| "<none>".to_string(), |secs| secs.to_string()),
            &["BULKROOMS_WEBHOOK_TIMEOUT_SECS"],
        ),
        entry(
            "geolocation.enabled",
            config.geolocation.enabled.to_string(),
            &["BULKROOMS_GEOLOCATION_ENABLED"],
        ),
        entry(
            "geolocation.base_url",
            config.geolocation.base_url.clone(),
            &["BULKROOMS_GEOLOCATION_BASE_URL"],
        ),
        entry(
            "autosuggest.base_url",
            optional(config.autosuggest.base_url.as_deref()),
            &["BULKROOMS_AUTOSUGGEST_BASE_URL"],
        ),
        entry(
            "autosuggest.api_key",
            if config.autosuggest.api_key.is_some() { "<redacted>" } else { "<unset>" }.to_string(),
            &["BULKROOMS_AUTOSUGGEST_API_KEY"],
        ),
        entry(
            "autosuggest.default_region",
            config.autosuggest.default_region.clone(),
            &["BULKROOMS_AUTOSUGGEST_DEFAULT_REGION"],
        ),
        entry(
            "sessions.ttl_secs",
            config.sessions.ttl_secs.to_string(),
            &["BULKROOMS_SESSIONS_TTL_SECS"],
        ),
        entry(
            "counters.path",
            config.counters.path.display().to_string(),
            &["BULKROOMS_COUNTERS_PATH"],
        ),
        entry(
            "logging.level",
            config.logging.level.clone(),
            &["BULKROOMS_LOGGING_LEVEL", "BULKROOMS_LOG_LEVEL"],
        ),
        entry(
            "logging.format",
            format!("{:?}", config.logging.format),
            &["BULKROOMS_LOGGING_FORMAT", "BULKROOMS_LOG_FORMAT"],
        ),
    ]
}

fn entry(key: &'static str, value: String, env_keys: &'static [&'static str]) -> Entry {
    Entry { key, value, env_keys }
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps scheme and host; the path of a spreadsheet web app URL grants write access.
fn redact_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    match trimmed.split_once("://") {
        Some((scheme, rest)) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
            format!("{scheme}://{host}/***")
        }
        None => "<redacted>".to_string(),
    }
}
