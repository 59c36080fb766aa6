mod defaults;

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Address the webhook server listens on.
    #[serde(default = "defaults::bind")]
    pub bind: String,

    #[serde(default = "defaults::log_level")]
    pub log_level: String,

    /// The global minimum authorized approvals required to pass.
    #[serde(default = "defaults::min_reviews_required")]
    pub min_reviews_required: u32,

    #[serde(default)]
    pub github: GithubConfig,
}

#[derive(Deserialize)]
pub struct GithubConfig {
    /// The GitHub App id.
    #[serde(default)]
    pub app_id: u64,

    /// Path to the app's RSA private key (PEM).
    #[serde(default = "defaults::empty_string")]
    pub private_key_path: String,

    /// Shared secret GitHub signs webhook payloads with.
    #[serde(default = "defaults::empty_string")]
    pub secret_token: String,

    #[serde(default = "defaults::api_url")]
    pub api_url: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            app_id: 0,
            private_key_path: defaults::empty_string(),
            secret_token: defaults::empty_string(),
            api_url: defaults::api_url(),
        }
    }
}

impl fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubConfig")
            .field("app_id", &self.app_id)
            .field("private_key_path", &self.private_key_path)
            .field("secret_token", &"<redacted>")
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl Config {
    /// Loads config from the optional TOML file, applies `REVIEWBOT_*`
    /// environment overrides, then validates. A missing file is fine; the
    /// service can be configured entirely through the environment.
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let mut cfg = Self::read(path)?;
        cfg.apply_env().context("apply environment overrides")?;
        cfg.validate().context("validate config")?;
        Ok(cfg)
    }

    fn read<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => return Ok(Self::empty()),
        };
        let path = path.as_ref();

        match fs::read(path) {
            Ok(data) => {
                let toml_str = String::from_utf8(data).with_context(|| {
                    format!("decode config file '{}' into utf-8", path.display())
                })?;

                let cfg: Config = toml::from_str(&toml_str)
                    .with_context(|| format!("parse config file '{}' toml", path.display()))?;
                Ok(cfg)
            }

            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::empty()),

            Err(err) => Err(err).with_context(|| format!("read config file '{}'", path.display())),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(bind) = std::env::var("REVIEWBOT_BIND") {
            self.bind = bind;
        }
        if let Ok(level) = std::env::var("REVIEWBOT_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Ok(min) = std::env::var("REVIEWBOT_MIN_REVIEWS_REQUIRED") {
            self.min_reviews_required = min
                .parse()
                .context("parse REVIEWBOT_MIN_REVIEWS_REQUIRED")?;
        }
        if let Ok(app_id) = std::env::var("REVIEWBOT_APP_ID") {
            self.github.app_id = app_id.parse().context("parse REVIEWBOT_APP_ID")?;
        }
        if let Ok(path) = std::env::var("REVIEWBOT_PRIVATE_KEY_PATH") {
            self.github.private_key_path = path;
        }
        if let Ok(token) = std::env::var("REVIEWBOT_SECRET_TOKEN") {
            self.github.secret_token = token;
        }
        if let Ok(url) = std::env::var("REVIEWBOT_API_URL") {
            self.github.api_url = url;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.bind.is_empty() {
            bail!("bind address cannot be empty");
        }
        if self.github.app_id == 0 {
            bail!("github app id is required");
        }
        if self.github.private_key_path.is_empty() {
            bail!("github private key path is required");
        }
        if self.github.secret_token.is_empty() {
            bail!("github webhook secret token is required");
        }
        if self.github.api_url.is_empty() {
            bail!("github api url cannot be empty");
        }
        Ok(())
    }

    fn empty() -> Self {
        Self {
            bind: defaults::bind(),
            log_level: defaults::log_level(),
            min_reviews_required: defaults::min_reviews_required(),
            github: GithubConfig::default(),
        }
    }
}
