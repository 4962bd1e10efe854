use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::sync::RetryPolicy;

/// Top-level server configuration, loaded from twilikt.toml.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    pub server: ServerSection,
    pub twitter: TwitterConfig,
    pub sync: RetryPolicy,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub web_address: String,
    /// Directory the page's scripts and styles are served from.
    pub assets_dir: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            web_address: "127.0.0.1:8080".into(),
            assets_dir: "static".into(),
        }
    }
}

/// Twitter API access.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TwitterConfig {
    #[serde(flatten)]
    pub credentials: TwitterCredentials,
    pub api_url: String,
    pub timeout_secs: u64,
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            credentials: TwitterCredentials::default(),
            api_url: "https://api.twitter.com".into(),
            timeout_secs: 30,
        }
    }
}

/// OAuth 1.0a consumer and access token pairs. `Debug` never prints them.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct TwitterCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl TwitterCredentials {
    pub fn is_complete(&self) -> bool {
        !self.consumer_key.is_empty()
            && !self.consumer_secret.is_empty()
            && !self.access_token.is_empty()
            && !self.access_token_secret.is_empty()
    }
}

impl fmt::Debug for TwitterCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(s: &str) -> &'static str {
            if s.is_empty() { "<not set>" } else { "<redacted>" }
        }
        f.debug_struct("TwitterCredentials")
            .field("consumer_key", &redact(&self.consumer_key))
            .field("consumer_secret", &redact(&self.consumer_secret))
            .field("access_token", &redact(&self.access_token))
            .field("access_token_secret", &redact(&self.access_token_secret))
            .finish()
    }
}

impl ServerConfig {
    /// Load config from a TOML file. Falls back to defaults if the file doesn't exist.
    /// Environment variables override TOML values.
    pub fn load(path: &str) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {path}"))?;
            Self::parse(&contents).with_context(|| format!("failed to parse config file {path}"))?
        } else {
            info!("No config file found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("WEB_ADDRESS") {
            self.server.web_address = v;
        }
        if let Some(v) = var("ASSETS_DIR") {
            self.server.assets_dir = v;
        }
        if let Some(v) = var("TWITTER_CONSUMER_KEY") {
            self.twitter.credentials.consumer_key = v;
        }
        if let Some(v) = var("TWITTER_CONSUMER_SECRET") {
            self.twitter.credentials.consumer_secret = v;
        }
        if let Some(v) = var("TWITTER_ACCESS_TOKEN") {
            self.twitter.credentials.access_token = v;
        }
        if let Some(v) = var("TWITTER_ACCESS_TOKEN_SECRET") {
            self.twitter.credentials.access_token_secret = v;
        }
        if let Some(v) = var("TWITTER_API_URL") {
            self.twitter.api_url = v;
        }
        if let Some(v) = var("SYNC_MAX_ATTEMPTS")
            && let Ok(n) = v.parse()
        {
            self.sync.max_attempts = n;
        }
    }
}
