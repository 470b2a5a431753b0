//! Client configuration.
//!
//! Settings are read from a YAML file (by default
//! `<config_dir>/github-publish/config.yaml`) and may be overridden by
//! environment variables. A missing file yields the defaults.

use crate::error::{PublishError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_CLIENT_ID: &str = "61ef07373b60f4f075cd";
const DEFAULT_REDIRECT_URI: &str = "https://localhost:3000";
const DEFAULT_SCOPE: &str = "repo";
const DEFAULT_API_URL: &str = "https://api.github.com";
const DEFAULT_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const APP_DIR: &str = "github-publish";

/// Size of the authorization dialog, as a percentage of the host window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogSize {
    pub height: u8,
    pub width: u8,
}

impl Default for DialogSize {
    fn default() -> Self {
        Self {
            height: 50,
            width: 35,
        }
    }
}

/// Configuration for the GitHub session and its storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OAuth application client id.
    pub client_id: String,
    /// Where GitHub redirects after authorization.
    pub redirect_uri: String,
    /// Requested OAuth scope.
    pub scope: String,
    /// Base URL of the REST API.
    pub api_base_url: String,
    /// OAuth authorize endpoint.
    pub authorize_url: String,
    /// Directory holding persisted records. Defaults to the local data dir.
    pub storage_dir: Option<PathBuf>,
    /// Dialog dimensions.
    pub dialog: DialogSize,
    /// User-Agent sent with every API request.
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client_id: DEFAULT_CLIENT_ID.into(),
            redirect_uri: DEFAULT_REDIRECT_URI.into(),
            scope: DEFAULT_SCOPE.into(),
            api_base_url: DEFAULT_API_URL.into(),
            authorize_url: DEFAULT_AUTHORIZE_URL.into(),
            storage_dir: None,
            dialog: DialogSize::default(),
            user_agent: "github-publish".into(),
        }
    }
}

impl Config {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the OAuth client id.
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    /// Set the OAuth redirect URI.
    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = redirect_uri.into();
        self
    }

    /// Point the client at a different API host (GitHub Enterprise, test servers).
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        let mut url = url.into();
        if url.ends_with('/') {
            url.pop();
        }
        self.api_base_url = url;
        self
    }

    /// Set the storage directory.
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    /// Default location of the config file.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.yaml"))
    }

    /// Load config from a YAML file.
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            PublishError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config file: {}", e),
            ))
        })?;

        serde_yaml::from_str(&content).map_err(|e| {
            PublishError::InvalidConfig(format!("Failed to parse YAML config: {}", e))
        })
    }

    /// Save config to a YAML file.
    pub fn to_yaml(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Load from `path` (or the default location) and apply environment overrides.
    ///
    /// A missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).or_else(Self::default_path);
        let config = match path {
            Some(p) if p.exists() => Self::from_yaml(&p)?,
            _ => Self::default(),
        };
        config.with_env_overrides().validated()
    }

    /// Apply `GHPUB_*` environment overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(id) = std::env::var("GHPUB_CLIENT_ID") {
            self.client_id = id;
        }
        if let Ok(uri) = std::env::var("GHPUB_REDIRECT_URI") {
            self.redirect_uri = uri;
        }
        if let Ok(url) = std::env::var("GHPUB_API_URL") {
            self = self.with_api_base_url(url);
        }
        self
    }

    /// Reject configurations that cannot produce a working session.
    pub fn validated(self) -> Result<Self> {
        if self.client_id.trim().is_empty() {
            return Err(PublishError::InvalidConfig("client_id must not be empty".into()));
        }
        url::Url::parse(&self.api_base_url).map_err(|e| {
            PublishError::InvalidConfig(format!("api_base_url is not a URL: {}", e))
        })?;
        url::Url::parse(&self.authorize_url).map_err(|e| {
            PublishError::InvalidConfig(format!("authorize_url is not a URL: {}", e))
        })?;
        Ok(self)
    }

    /// Resolve the storage directory, falling back to the local data dir.
    pub fn storage_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.storage_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_local_dir().ok_or_else(|| {
            PublishError::InvalidConfig("Cannot determine data directory".into())
        })?;
        Ok(data_dir.join(APP_DIR).join("storage"))
    }
}
