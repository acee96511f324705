//! 配置加载

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cloudsync_client::BasicAuth;
use serde::Deserialize;

use crate::cli::Cli;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/cloudsync/api/rest/";

const CONFIG_DIR: &str = "cloudsync-console";
const CONFIG_FILE: &str = "config.toml";

/// Console configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsoleConfig {
    pub base_url: String,
    /// HTTP basic login sent with every request
    pub auth: Option<AuthConfig>,
    pub log_level: String,
    /// Page size for `store objects`
    pub query_limit: u32,
}

#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl From<AuthConfig> for BasicAuth {
    fn from(auth: AuthConfig) -> Self {
        Self {
            username: auth.username,
            password: auth.password,
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth: None,
            log_level: "info".to_string(),
            query_limit: 20,
        }
    }
}

impl ConsoleConfig {
    /// Load from `--config`, else the per-user config file, else defaults;
    /// then apply flag/env overrides.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => match default_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };

        if let Some(base_url) = &cli.base_url {
            config.base_url.clone_from(base_url);
        }
        if let Some(level) = &cli.log_level {
            config.log_level.clone_from(level);
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}
