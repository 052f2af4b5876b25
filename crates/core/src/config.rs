use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["bulkrooms.toml", "config/bulkrooms.toml"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub webhook: WebhookConfig,
    pub geolocation: GeolocationConfig,
    pub autosuggest: AutosuggestConfig,
    pub sessions: SessionConfig,
    pub counters: CounterConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct WebhookConfig {
    pub url: SecretString,
    pub quote_sheet: String,
    pub contact_sheet: String,
    /// No timeout unless set.
    pub timeout_secs: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct GeolocationConfig {
    pub enabled: bool,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct AutosuggestConfig {
    pub base_url: Option<String>,
    pub api_key: Option<SecretString>,
    pub default_region: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub ttl_secs: u64,
}

#[derive(Clone, Debug)]
pub struct CounterConfig {
    pub path: PathBuf,
    pub initial_hours_saved: u64,
    pub initial_savings: u64,
    pub hours_per_quote: u64,
    pub savings_per_quote: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub webhook_url: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub counters_path: Option<PathBuf>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            webhook: WebhookConfig {
                url: String::new().into(),
                quote_sheet: "Quotes".to_string(),
                contact_sheet: "Contact".to_string(),
                timeout_secs: None,
            },
            geolocation: GeolocationConfig {
                enabled: true,
                base_url: "https://ipapi.co".to_string(),
                timeout_secs: 5,
            },
            autosuggest: AutosuggestConfig {
                base_url: None,
                api_key: None,
                default_region: "IN".to_string(),
                timeout_secs: 5,
            },
            sessions: SessionConfig { ttl_secs: 3600 },
            counters: CounterConfig {
                path: PathBuf::from("data/counters.json"),
                initial_hours_saved: 0,
                initial_savings: 0,
                hours_per_quote: 6,
                savings_per_quote: 250,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATHS[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(webhook) = patch.webhook {
            if let Some(url) = webhook.url {
                self.webhook.url = secret_value(url);
            }
            if let Some(quote_sheet) = webhook.quote_sheet {
                self.webhook.quote_sheet = quote_sheet;
            }
            if let Some(contact_sheet) = webhook.contact_sheet {
                self.webhook.contact_sheet = contact_sheet;
            }
            if let Some(timeout_secs) = webhook.timeout_secs {
                self.webhook.timeout_secs = Some(timeout_secs);
            }
        }

        if let Some(geolocation) = patch.geolocation {
            if let Some(enabled) = geolocation.enabled {
                self.geolocation.enabled = enabled;
            }
            if let Some(base_url) = geolocation.base_url {
                self.geolocation.base_url = base_url;
            }
            if let Some(timeout_secs) = geolocation.timeout_secs {
                self.geolocation.timeout_secs = timeout_secs;
            }
        }

        if let Some(autosuggest) = patch.autosuggest {
            if let Some(base_url) = autosuggest.base_url {
                self.autosuggest.base_url = Some(base_url);
            }
            if let Some(api_key) = autosuggest.api_key {
                self.autosuggest.api_key = Some(secret_value(api_key));
            }
            if let Some(default_region) = autosuggest.default_region {
                self.autosuggest.default_region = default_region;
            }
            if let Some(timeout_secs) = autosuggest.timeout_secs {
                self.autosuggest.timeout_secs = timeout_secs;
            }
        }

        if let Some(sessions) = patch.sessions {
            if let Some(ttl_secs) = sessions.ttl_secs {
                self.sessions.ttl_secs = ttl_secs;
            }
        }

        if let Some(counters) = patch.counters {
            if let Some(path) = counters.path {
                self.counters.path = path;
            }
            if let Some(initial_hours_saved) = counters.initial_hours_saved {
                self.counters.initial_hours_saved = initial_hours_saved;
            }
            if let Some(initial_savings) = counters.initial_savings {
                self.counters.initial_savings = initial_savings;
            }
            if let Some(hours_per_quote) = counters.hours_per_quote {
                self.counters.hours_per_quote = hours_per_quote;
            }
            if let Some(savings_per_quote) = counters.savings_per_quote {
                self.counters.savings_per_quote = savings_per_quote;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("BULKROOMS_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("BULKROOMS_SERVER_PORT") {
            self.server.port = parse_u16("BULKROOMS_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("BULKROOMS_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("BULKROOMS_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("BULKROOMS_WEBHOOK_URL") {
            self.webhook.url = secret_value(value);
        }
        if let Some(value) = read_env("BULKROOMS_WEBHOOK_QUOTE_SHEET") {
            self.webhook.quote_sheet = value;
        }
        if let Some(value) = read_env("BULKROOMS_WEBHOOK_CONTACT_SHEET") {
            self.webhook.contact_sheet = value;
        }
        if let Some(value) = read_env("BULKROOMS_WEBHOOK_TIMEOUT_SECS") {
            self.webhook.timeout_secs = Some(parse_u64("BULKROOMS_WEBHOOK_TIMEOUT_SECS", &value)?);
        }

        if let Some(value) = read_env("BULKROOMS_GEOLOCATION_ENABLED") {
            self.geolocation.enabled = parse_bool("BULKROOMS_GEOLOCATION_ENABLED", &value)?;
        }
        if let Some(value) = read_env("BULKROOMS_GEOLOCATION_BASE_URL") {
            self.geolocation.base_url = value;
        }

        if let Some(value) = read_env("BULKROOMS_AUTOSUGGEST_BASE_URL") {
            self.autosuggest.base_url = Some(value);
        }
        if let Some(value) = read_env("BULKROOMS_AUTOSUGGEST_API_KEY") {
            self.autosuggest.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("BULKROOMS_AUTOSUGGEST_DEFAULT_REGION") {
            self.autosuggest.default_region = value;
        }

        if let Some(value) = read_env("BULKROOMS_SESSIONS_TTL_SECS") {
            self.sessions.ttl_secs = parse_u64("BULKROOMS_SESSIONS_TTL_SECS", &value)?;
        }

        if let Some(value) = read_env("BULKROOMS_COUNTERS_PATH") {
            self.counters.path = PathBuf::from(value);
        }

        let log_level =
            read_env("BULKROOMS_LOGGING_LEVEL").or_else(|| read_env("BULKROOMS_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("BULKROOMS_LOGGING_FORMAT").or_else(|| read_env("BULKROOMS_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(webhook_url) = overrides.webhook_url {
            self.webhook.url = secret_value(webhook_url);
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(counters_path) = overrides.counters_path {
            self.counters.path = counters_path;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_server(&self.server)?;
        validate_webhook(&self.webhook)?;
        validate_geolocation(&self.geolocation)?;
        validate_autosuggest(&self.autosuggest)?;
        validate_sessions(&self.sessions)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// First existing candidate: the explicit path, else the default locations.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    DEFAULT_CONFIG_PATHS.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn is_http_url(value: &str) -> bool {
    let value = value.trim();
    value.starts_with("http://") || value.starts_with("https://")
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_webhook(webhook: &WebhookConfig) -> Result<(), ConfigError> {
    let url = webhook.url.expose_secret();
    if url.trim().is_empty() {
        return Err(ConfigError::Validation(
            "webhook.url is required. Use the deployment URL of the spreadsheet web app \
             (BULKROOMS_WEBHOOK_URL)"
                .to_string(),
        ));
    }
    if !is_http_url(url) {
        return Err(ConfigError::Validation(
            "webhook.url must start with http:// or https://".to_string(),
        ));
    }

    if webhook.quote_sheet.trim().is_empty() || webhook.contact_sheet.trim().is_empty() {
        return Err(ConfigError::Validation(
            "webhook.quote_sheet and webhook.contact_sheet must not be empty".to_string(),
        ));
    }
    if webhook.quote_sheet == webhook.contact_sheet {
        return Err(ConfigError::Validation(
            "webhook.quote_sheet and webhook.contact_sheet must differ".to_string(),
        ));
    }

    if webhook.timeout_secs == Some(0) {
        return Err(ConfigError::Validation(
            "webhook.timeout_secs must be greater than zero when set".to_string(),
        ));
    }

    Ok(())
}

fn validate_geolocation(geolocation: &GeolocationConfig) -> Result<(), ConfigError> {
    if geolocation.enabled && !is_http_url(&geolocation.base_url) {
        return Err(ConfigError::Validation(
            "geolocation.base_url must start with http:// or https://".to_string(),
        ));
    }
    if geolocation.timeout_secs == 0 || geolocation.timeout_secs > 60 {
        return Err(ConfigError::Validation(
            "geolocation.timeout_secs must be in range 1..=60".to_string(),
        ));
    }
    Ok(())
}

fn validate_autosuggest(autosuggest: &AutosuggestConfig) -> Result<(), ConfigError> {
    if let Some(base_url) = &autosuggest.base_url {
        if !is_http_url(base_url) {
            return Err(ConfigError::Validation(
                "autosuggest.base_url must start with http:// or https://".to_string(),
            ));
        }
    }
    if autosuggest.timeout_secs == 0 || autosuggest.timeout_secs > 60 {
        return Err(ConfigError::Validation(
            "autosuggest.timeout_secs must be in range 1..=60".to_string(),
        ));
    }
    Ok(())
}

fn validate_sessions(sessions: &SessionConfig) -> Result<(), ConfigError> {
    if sessions.ttl_secs == 0 {
        return Err(ConfigError::Validation(
            "sessions.ttl_secs must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    server: Option<ServerPatch>,
    webhook: Option<WebhookPatch>,
    geolocation: Option<GeolocationPatch>,
    autosuggest: Option<AutosuggestPatch>,
    sessions: Option<SessionPatch>,
    counters: Option<CounterPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookPatch {
    url: Option<String>,
    quote_sheet: Option<String>,
    contact_sheet: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct GeolocationPatch {
    enabled: Option<bool>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct AutosuggestPatch {
    base_url: Option<String>,
    api_key: Option<String>,
    default_region: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SessionPatch {
    ttl_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct CounterPatch {
    path: Option<PathBuf>,
    initial_hours_saved: Option<u64>,
    initial_savings: Option<u64>,
    hours_per_quote: Option<u64>,
    savings_per_quote: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
