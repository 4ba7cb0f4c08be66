use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use comment_tree::{Actor, AuthContext, UserId};
use serde::{Deserialize, Serialize};

const APP_DIR: &str = "rtrack";
const SETTINGS_FILE: &str = "settings.json";
const TOKEN_FILE: &str = "token";
const TOKEN_ENV: &str = "RTRACK_TOKEN";

pub fn get_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR))
        .context("Could not find config directory")
}

/// Settings stored in `settings.json` under the config directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub api_base_url: String,
    pub items_per_page: usize,
    pub request_timeout_secs: u64,
    /// Identity used for comment mutations. Without it, or without a token,
    /// the CLI is read-only.
    pub user_id: Option<String>,
    pub user_name: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".to_string(),
            items_per_page: 10,
            request_timeout_secs: 15,
            user_id: None,
            user_name: None,
        }
    }
}

impl Settings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

pub struct Config {
    pub dir: PathBuf,
    pub settings: Settings,
    pub token: Option<String>,
}

impl Config {
    pub fn load(dir: &Path) -> Result<Self> {
        let settings = load_settings(dir)?;
        let token = match std::env::var(TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => Some(token.trim().to_string()),
            _ => load_token(dir)?,
        };
        Ok(Self {
            dir: dir.to_path_buf(),
            settings,
            token,
        })
    }

    /// Signed in only when both a token and a user id are configured.
    pub fn auth_context(&self) -> Result<AuthContext> {
        let (Some(_), Some(raw_id)) = (&self.token, &self.settings.user_id) else {
            log::info!("no token or user id configured, running read-only");
            return Ok(AuthContext::anonymous());
        };
        let user_id: UserId = raw_id
            .parse()
            .with_context(|| format!("Invalid userId in {}", self.dir.join(SETTINGS_FILE).display()))?;
        let display_name = self
            .settings
            .user_name
            .clone()
            .unwrap_or_else(|| user_id.to_string());
        Ok(AuthContext::authenticated(Actor::new(user_id, display_name)))
    }
}

pub fn load_settings(dir: &Path) -> Result<Settings> {
    let path = dir.join(SETTINGS_FILE);
    if !path.exists() {
        log::debug!("no settings at {}, using defaults", path.display());
        return Ok(Settings::default());
    }
    let file = File::open(&path)
        .with_context(|| format!("Failed to open settings file {}", path.display()))?;
    serde_json::from_reader(file)
        .with_context(|| format!("Invalid settings file {}", path.display()))
}

pub fn load_token(dir: &Path) -> Result<Option<String>> {
    let path = dir.join(TOKEN_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let token = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read token file {}", path.display()))?;
    let token = token.trim();
    Ok((!token.is_empty()).then(|| token.to_string()))
}
