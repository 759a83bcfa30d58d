use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::feed::types::SessionToken;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  #[serde(default)]
  pub feed: FeedConfig,
  #[serde(default)]
  pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Server root, e.g. http://127.0.0.1:8000/
  pub url: String,
  /// Prefix for posts, comments and follows
  #[serde(default = "default_community_prefix")]
  pub community_prefix: String,
  /// Prefix for profile lookups
  #[serde(default = "default_accounts_prefix")]
  pub accounts_prefix: String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

fn default_community_prefix() -> String {
  "api/v1/community/".to_string()
}

fn default_accounts_prefix() -> String {
  "api/v1/accounts/".to_string()
}

fn default_timeout_secs() -> u64 {
  15
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
  #[serde(default = "default_page_size")]
  pub page_size: u32,
}

impl Default for FeedConfig {
  fn default() -> Self {
    Self {
      page_size: default_page_size(),
    }
  }
}

fn default_page_size() -> u32 {
  10
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
  /// Write logs to a daily rolling file here instead of stderr
  pub directory: Option<PathBuf>,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./feedsync.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/feedsync/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/feedsync/config.yaml"
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("feedsync.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("feedsync").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;

    if config.feed.page_size == 0 {
      return Err(eyre!("feed.page_size must be at least 1"));
    }

    Ok(config)
  }

  /// Get the session token from environment variables.
  ///
  /// Checks FEEDSYNC_TOKEN first, then FEED_API_TOKEN as fallback. A missing
  /// token is not an error: the session just runs signed out.
  pub fn session_token() -> Option<SessionToken> {
    std::env::var("FEEDSYNC_TOKEN")
      .or_else(|_| std::env::var("FEED_API_TOKEN"))
      .ok()
      .filter(|t| !t.trim().is_empty())
      .map(SessionToken::new)
  }
}
