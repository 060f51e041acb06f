//! # configs
//!
//! Layered runtime settings for the relay binary.
//!
//! Precedence, lowest first: built-in defaults, the optional file
//! `config/relay.{toml,yaml,json}` (or the path in `RELAY_CONFIG`),
//! `RELAY__SECTION__KEY` variables, then the bare variable names older
//! deployments were configured with (`PORT`, `APP_URL`, `REDIS_URL`,
//! `DISCORD_ID`, `DISCORD_TOKEN`).

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use config::{Config, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "config/relay";
pub const ENV_PREFIX: &str = "RELAY";

/// Bare variable names honoured for compatibility, and the key each one sets.
const LEGACY_OVERRIDES: [(&str, &str); 5] = [
    ("PORT", "server.port"),
    ("APP_URL", "server.public_url"),
    ("REDIS_URL", "cache.redis_url"),
    ("DISCORD_ID", "notifier.discord_webhook_id"),
    ("DISCORD_TOKEN", "notifier.discord_webhook_token"),
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub cache: CacheSettings,
    pub notifier: NotifierSettings,
    pub geoip: GeoIpSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Base URL thumbnail links are published under
    pub public_url: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Redis,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    pub backend: CacheBackend,
    pub redis_url: String,
    pub ttl_seconds: u64,
}

#[derive(Debug, Deserialize)]
pub struct NotifierSettings {
    pub username: String,
    #[serde(default)]
    pub discord_webhook_id: Option<String>,
    #[serde(default)]
    pub discord_webhook_token: Option<SecretString>,
    pub rich_attachments: bool,
    pub timeout_secs: u64,
}

impl NotifierSettings {
    /// Webhook credentials, when both halves are configured and non-empty.
    pub fn discord_webhook(&self) -> Option<(&str, &SecretString)> {
        let id = self.discord_webhook_id.as_deref().filter(|id| !id.is_empty())?;
        let token = self
            .discord_webhook_token
            .as_ref()
            .filter(|token| !token.expose_secret().is_empty())?;
        Some((id, token))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeoIpSettings {
    pub enabled: bool,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl GeoIpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    pub format: LogFormat,
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
}

impl Settings {
    /// Reads `.env`, then builds settings from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let file = env::var("RELAY_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::from_sources(Some(&file), env::vars().collect())
    }

    /// Builds settings from an optional config file and an explicit set of
    /// environment variables.
    pub fn from_sources(file: Option<&str>, vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 11000)?
            .set_default("server.public_url", "http://localhost:11000")?
            .set_default("server.max_upload_bytes", 10 * 1024 * 1024)?
            .set_default("cache.backend", "redis")?
            .set_default("cache.redis_url", "redis://127.0.0.1:6379")?
            .set_default("cache.ttl_seconds", 604_800)?
            .set_default("notifier.username", "Plex")?
            .set_default("notifier.rich_attachments", false)?
            .set_default("notifier.timeout_secs", 10)?
            .set_default("geoip.enabled", true)?
            .set_default("geoip.base_url", "https://freegeoip.app/json")?
            .set_default("geoip.timeout_secs", 5)?
            .set_default("log.format", "pretty")?
            .set_default("log.filter", "info")?;

        if let Some(file) = file {
            tracing::debug!(file, "looking for configuration file");
            builder = builder.add_source(File::with_name(file).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .source(Some(vars.clone())),
        );

        for (var, key) in LEGACY_OVERRIDES {
            builder = builder.set_override_option(key, vars.get(var).cloned())?;
        }

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be non-zero".into()));
        }

        let public_url = Url::parse(&self.server.public_url).map_err(|e| {
            ConfigError::Invalid(format!("server.public_url {:?}: {e}", self.server.public_url))
        })?;
        if !matches!(public_url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "server.public_url must be http(s), got {}",
                public_url.scheme()
            )));
        }

        if self.cache.ttl_seconds == 0 {
            return Err(ConfigError::Invalid("cache.ttl_seconds must be non-zero".into()));
        }

        let has_id = self
            .notifier
            .discord_webhook_id
            .as_deref()
            .is_some_and(|id| !id.is_empty());
        let has_token = self
            .notifier
            .discord_webhook_token
            .as_ref()
            .is_some_and(|token| !token.expose_secret().is_empty());
        if has_id != has_token {
            return Err(ConfigError::Invalid(
                "notifier.discord_webhook_id and notifier.discord_webhook_token must be set together"
                    .into(),
            ));
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// One-line description safe to log; the webhook token is never included.
    pub fn summary(&self) -> String {
        let notifier = match self.notifier.discord_webhook() {
            Some((id, _)) => format!("discord(id={id}, rich={})", self.notifier.rich_attachments),
            None => "log".to_string(),
        };
        let cache = match self.cache.backend {
            CacheBackend::Redis => format!("redis({})", redact_userinfo(&self.cache.redis_url)),
            CacheBackend::Memory => "memory".to_string(),
        };
        format!(
            "listen={} public_url={} cache={} ttl={}s notifier={} geoip={}",
            self.bind_address(),
            self.server.public_url,
            cache,
            self.cache.ttl_seconds,
            notifier,
            if self.geoip.enabled { self.geoip.base_url.as_str() } else { "off" },
        )
    }
}

fn redact_userinfo(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) if url.password().is_some() => {
            let _ = url.set_password(Some("***"));
            url.to_string()
        }
        Ok(url) => url.to_string(),
        Err(_) => "<unparseable>".to_string(),
    }
}
