//! Configuration for the Trackdeck dashboard coordination layer.
//!
//! A TOML file under the platform config directory, merged with
//! `TRACKDECK_`-prefixed environment variables. Translates into the
//! transport settings `trackdeck_api` consumes.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use trackdeck_api::{TlsMode, TransportConfig};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Config struct ───────────────────────────────────────────────────

/// Dashboard configuration, merged from file and environment.
#[derive(Debug, Deserialize, Serialize)]
pub struct DashboardConfig {
    /// Base URL of the project-tracking service.
    pub service_url: Url,

    /// Bearer token for the session. Resolved from config or the
    /// `TRACKDECK_SESSION_TOKEN` environment variable.
    #[serde(skip_serializing)]
    pub session_token: Option<SecretString>,

    /// Rows per list page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Whether to connect the realtime change feed at all.
    #[serde(default = "default_feed_enabled")]
    pub feed_enabled: bool,

    /// Skip TLS certificate verification. Development setups only.
    #[serde(default)]
    pub insecure: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            session_token: None,
            page_size: default_page_size(),
            feed_enabled: default_feed_enabled(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

// Local development service; the parse cannot fail on a literal.
#[allow(clippy::unwrap_used)]
fn default_service_url() -> Url {
    Url::parse("http://localhost:3000").unwrap()
}
fn default_page_size() -> u32 {
    10
}
fn default_feed_enabled() -> bool {
    true
}
fn default_timeout() -> u64 {
    30
}

impl DashboardConfig {
    /// Derive the websocket endpoint for the change feed from the
    /// service URL. The feed lives on the same host as the REST API.
    pub fn feed_url(&self) -> Result<Url, ConfigError> {
        let mut url = self.service_url.clone();
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|()| ConfigError::Validation {
                field: "service_url".into(),
                reason: format!("cannot derive feed scheme from '{}'", self.service_url),
            })?;
        url.set_path("api/feed");
        Ok(url)
    }

    /// Translate into the transport settings the API client consumes.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            timeout: Duration::from_secs(self.timeout),
            tls: if self.insecure {
                TlsMode::DangerAcceptInvalid
            } else {
                TlsMode::Verify
            },
        }
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Validation {
                field: "page_size".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.timeout == 0 {
            return Err(ConfigError::Validation {
                field: "timeout".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        Ok(self)
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "trackdeck", "trackdeck").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("trackdeck");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load configuration from the canonical path plus environment.
pub fn load_config() -> Result<DashboardConfig, ConfigError> {
    load_from(&config_path())
}

/// Load configuration from an explicit file path plus environment.
/// A missing file is fine; defaults and env vars still apply.
pub fn load_from(path: &std::path::Path) -> Result<DashboardConfig, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(DashboardConfig::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("TRACKDECK_"));

    let config: DashboardConfig = figment.extract()?;
    config.validate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn defaults_apply_without_file_or_env() {
        figment::Jail::expect_with(|jail| {
            let cfg = load_from(&jail.directory().join("config.toml")).expect("load");
            assert_eq!(cfg.page_size, 10);
            assert!(cfg.feed_enabled);
            assert!(!cfg.insecure);
            assert!(cfg.session_token.is_none());
            assert_eq!(cfg.service_url.as_str(), "http://localhost:3000/");
            Ok(())
        });
    }

    #[test]
    fn file_values_override_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                    service_url = "https://track.example.com"
                    page_size = 25
                    feed_enabled = false
                "#,
            )?;
            let cfg = load_from(&jail.directory().join("config.toml")).expect("load");
            assert_eq!(cfg.page_size, 25);
            assert!(!cfg.feed_enabled);
            assert_eq!(cfg.service_url.host_str(), Some("track.example.com"));
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.toml", "page_size = 25")?;
            jail.set_env("TRACKDECK_PAGE_SIZE", "50");
            jail.set_env("TRACKDECK_SESSION_TOKEN", "tok-123");
            let cfg = load_from(&jail.directory().join("config.toml")).expect("load");
            assert_eq!(cfg.page_size, 50);
            assert_eq!(
                cfg.session_token.as_ref().expect("token").expose_secret(),
                "tok-123"
            );
            Ok(())
        });
    }

    #[test]
    fn zero_page_size_is_rejected() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.toml", "page_size = 0")?;
            let err = load_from(&jail.directory().join("config.toml")).unwrap_err();
            assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "page_size"));
            Ok(())
        });
    }

    #[test]
    fn feed_url_follows_service_scheme() {
        let mut cfg = DashboardConfig::default();
        assert_eq!(
            cfg.feed_url().expect("feed url").as_str(),
            "ws://localhost:3000/api/feed"
        );

        cfg.service_url = Url::parse("https://track.example.com").expect("url");
        assert_eq!(
            cfg.feed_url().expect("feed url").as_str(),
            "wss://track.example.com/api/feed"
        );
    }

    #[test]
    fn transport_reflects_insecure_and_timeout() {
        let cfg = DashboardConfig {
            insecure: true,
            timeout: 5,
            ..DashboardConfig::default()
        };
        let transport = cfg.transport();
        assert_eq!(transport.timeout, Duration::from_secs(5));
        assert_eq!(transport.tls, TlsMode::DangerAcceptInvalid);
    }
}
