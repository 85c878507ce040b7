use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub store: StoreConfig,
  #[serde(default)]
  pub network: NetworkConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub auth: AuthConfig,
  /// Custom title for header (defaults to the project id if not set)
  pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
  pub project_id: String,
  #[serde(default = "default_database")]
  pub database: String,
  /// Web API key, sent as `?key=` on every request
  pub api_key: Option<String>,
  /// Override for emulators and tests
  #[serde(default = "default_base_url")]
  pub base_url: String,
  #[serde(default = "default_books_collection")]
  pub books_collection: String,
  #[serde(default = "default_cart_collection")]
  pub cart_collection: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
  /// `host:port` dialed by the connectivity probe
  #[serde(default = "default_probe_addr")]
  pub probe_addr: String,
  #[serde(default = "default_probe_timeout")]
  pub probe_timeout_secs: u64,
  #[serde(default = "default_request_timeout")]
  pub request_timeout_secs: u64,
}

impl Default for NetworkConfig {
  fn default() -> Self {
    Self {
      probe_addr: default_probe_addr(),
      probe_timeout_secs: default_probe_timeout(),
      request_timeout_secs: default_request_timeout(),
    }
  }
}

impl NetworkConfig {
  pub fn probe_timeout(&self) -> Duration {
    Duration::from_secs(self.probe_timeout_secs)
  }

  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.request_timeout_secs)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Database file (default: $XDG_DATA_HOME/bookstall/cache.db)
  pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      path: None,
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
  /// Account to sign in with; the password comes from the environment
  pub email: Option<String>,
}

fn default_database() -> String {
  "(default)".to_string()
}

fn default_base_url() -> String {
  "https://firestore.googleapis.com".to_string()
}

fn default_books_collection() -> String {
  "Books".to_string()
}

fn default_cart_collection() -> String {
  "Cart".to_string()
}

fn default_probe_addr() -> String {
  "firestore.googleapis.com:443".to_string()
}

fn default_probe_timeout() -> u64 {
  5
}

fn default_request_timeout() -> u64 {
  15
}

fn default_true() -> bool {
  true
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./bookstall.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/bookstall/config.yaml
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
        "No configuration file found. Create one at ~/.config/bookstall/config.yaml"
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("bookstall.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("bookstall").join("config.yaml");
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

  fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
    serde_yaml::from_str(contents)
  }

  /// Header title: the configured one, else the project id.
  pub fn display_title(&self) -> &str {
    self.title.as_deref().unwrap_or(&self.store.project_id)
  }

  /// Get the sign-in password from the environment.
  ///
  /// Checks BOOKSTALL_PASSWORD.
  pub fn get_password() -> Option<String> {
    std::env::var("BOOKSTALL_PASSWORD").ok()
  }

  /// Get a pre-issued ID token from the environment.
  ///
  /// Checks BOOKSTALL_ID_TOKEN. Used when no interactive sign-in is configured.
  pub fn get_id_token() -> Option<String> {
    std::env::var("BOOKSTALL_ID_TOKEN").ok()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_minimal_config_gets_defaults() {
    let config = Config::parse("store:\n  project_id: shelf-demo\n").unwrap();

    assert_eq!(config.store.project_id, "shelf-demo");
    assert_eq!(config.store.database, "(default)");
    assert_eq!(config.store.books_collection, "Books");
    assert_eq!(config.store.cart_collection, "Cart");
    assert_eq!(config.network.request_timeout(), Duration::from_secs(15));
    assert!(config.cache.enabled);
    assert!(config.auth.email.is_none());
    assert_eq!(config.display_title(), "shelf-demo");
  }

  #[test]
  fn test_full_config() {
    let yaml = r#"
title: My Bookshop
store:
  project_id: shelf-demo
  api_key: abc123
  base_url: http://localhost:8080
  books_collection: Catalog
network:
  probe_addr: localhost:8080
  probe_timeout_secs: 1
cache:
  enabled: false
  path: /tmp/shelf.db
auth:
  email: reader@example.com
"#;
    let config = Config::parse(yaml).unwrap();

    assert_eq!(config.display_title(), "My Bookshop");
    assert_eq!(config.store.api_key.as_deref(), Some("abc123"));
    assert_eq!(config.store.books_collection, "Catalog");
    assert_eq!(config.store.cart_collection, "Cart");
    assert_eq!(config.network.probe_timeout(), Duration::from_secs(1));
    assert_eq!(config.network.request_timeout_secs, 15);
    assert!(!config.cache.enabled);
    assert_eq!(config.cache.path, Some(PathBuf::from("/tmp/shelf.db")));
    assert_eq!(config.auth.email.as_deref(), Some("reader@example.com"));
  }

  #[test]
  fn test_missing_store_section_is_an_error() {
    assert!(Config::parse("title: nothing\n").is_err());
  }

  #[test]
  fn test_explicit_missing_path_is_an_error() {
    let err = Config::load(Some(Path::new("/definitely/not/here.yaml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }
}
