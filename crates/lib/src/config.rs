//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.mogu/config.json`). Secrets can
//! also come from the environment: `LINE_CHANNEL_SECRET` and
//! `LINE_ACCESS_TOKEN` override the file when set.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Gateway server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Platform credentials and reply endpoint.
    #[serde(default)]
    pub line: LineConfig,

    /// Candidate lookup service.
    #[serde(default)]
    pub gourmet: GourmetConfig,

    /// Durable run record storage.
    #[serde(default)]
    pub runs: RunsConfig,
}

/// Gateway bind and port settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// HTTP port for the webhook intake (default 8090).
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    8090
}

fn default_gateway_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

/// Platform settings: channel secret for webhook signatures, bearer token for
/// the reply API, and an optional reply URL override (e.g. for tests).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineConfig {
    /// Channel secret for signature verification. Overridden by
    /// LINE_CHANNEL_SECRET env when set.
    pub channel_secret: Option<String>,
    /// Bearer token for the reply API. Overridden by LINE_ACCESS_TOKEN env
    /// when set.
    pub access_token: Option<String>,
    /// Reply endpoint override. Default is the platform's reply API URL.
    pub reply_url: Option<String>,
}

/// Candidate lookup service settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GourmetConfig {
    /// Base URL of the lookup API. Required for the gateway to start.
    pub base_url: Option<String>,
}

/// Run record storage settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunsConfig {
    /// Directory for persisted run records (default ~/.mogu/runs).
    pub directory: Option<PathBuf>,
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

fn config_non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Resolve the channel secret: env LINE_CHANNEL_SECRET overrides config.
pub fn resolve_channel_secret(config: &Config) -> Option<String> {
    env_non_empty("LINE_CHANNEL_SECRET")
        .or_else(|| config_non_empty(config.line.channel_secret.as_ref()))
}

/// Resolve the reply API bearer token: env LINE_ACCESS_TOKEN overrides config.
pub fn resolve_access_token(config: &Config) -> Option<String> {
    env_non_empty("LINE_ACCESS_TOKEN")
        .or_else(|| config_non_empty(config.line.access_token.as_ref()))
}

/// Resolve the run record directory: config override or ~/.mogu/runs.
pub fn resolve_runs_dir(config: &Config) -> PathBuf {
    config.runs.directory.clone().unwrap_or_else(|| {
        dirs::home_dir()
            .map(|h| h.join(".mogu").join("runs"))
            .unwrap_or_else(|| PathBuf::from("runs"))
    })
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("MOGU_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".mogu").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the default path (or MOGU_CONFIG_PATH). Missing file =>
/// default config. Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_gateway_port_and_bind() {
        let g = GatewayConfig::default();
        assert_eq!(g.port, 8090);
        assert_eq!(g.bind, "127.0.0.1");
    }

    #[test]
    fn parses_camel_case_config() {
        let json = r#"{
            "gateway": {"port": 9000, "bind": "0.0.0.0"},
            "line": {
                "channelSecret": "secret",
                "accessToken": "token",
                "replyUrl": "http://127.0.0.1:1/reply"
            },
            "gourmet": {"baseUrl": "http://127.0.0.1:1/gourmet"},
            "runs": {"directory": "/tmp/mogu-runs"}
        }"#;
        let config: Config = serde_json::from_str(json).expect("parse");
        assert_eq!(config.gateway.port, 9000);
        assert_eq!(config.line.channel_secret.as_deref(), Some("secret"));
        assert_eq!(config.gourmet.base_url.as_deref(), Some("http://127.0.0.1:1/gourmet"));
        assert_eq!(config.runs.directory, Some(PathBuf::from("/tmp/mogu-runs")));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = serde_json::from_str("{}").expect("parse");
        assert_eq!(config.gateway.port, 8090);
        assert!(config.line.channel_secret.is_none());
        assert!(config.gourmet.base_url.is_none());
    }

    #[test]
    fn blank_config_values_are_treated_as_unset() {
        let mut config = Config::default();
        config.line.channel_secret = Some("   ".to_string());
        assert_eq!(config_non_empty(config.line.channel_secret.as_ref()), None);
    }

    #[test]
    fn runs_dir_override() {
        let mut config = Config::default();
        config.runs.directory = Some(PathBuf::from("/data/runs"));
        assert_eq!(resolve_runs_dir(&config), PathBuf::from("/data/runs"));
    }
}
