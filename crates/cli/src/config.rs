//! Client configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Client configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Catalog backend (projects, features, strategies)
    pub catalog: CatalogConfig,

    /// Instructions backend
    pub instructions: InstructionsConfig,

    /// HTTP transport settings
    pub http: HttpConfig,
}

/// Catalog backend configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Base URL of the REST API, e.g. `http://127.0.0.1:8000/mainPage/api/`
    pub api_base_url: String,

    /// Root that stored image paths are served from
    pub media_base_url: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000/mainPage/api/".to_string(),
            media_base_url: "http://127.0.0.1:8000".to_string(),
        }
    }
}

/// Instructions backend configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstructionsConfig {
    pub base_url: String,
}

impl Default for InstructionsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
        }
    }
}

/// HTTP transport configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout. Unset means requests may wait indefinitely.
    pub request_timeout_secs: Option<u64>,

    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: None,
            user_agent: format!("testdeck/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl ClientConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check that every base URL is an absolute http(s) URL
    pub fn validate(&self) -> testdeck_common::Result<()> {
        for (key, value) in [
            ("catalog.api_base_url", &self.catalog.api_base_url),
            ("catalog.media_base_url", &self.catalog.media_base_url),
            ("instructions.base_url", &self.instructions.base_url),
        ] {
            if reqwest::Url::parse(value)
                .map(|u| !matches!(u.scheme(), "http" | "https"))
                .unwrap_or(true)
            {
                return Err(testdeck_common::Error::InvalidConfig(format!(
                    "{} must be an http(s) URL, got {:?}",
                    key, value
                )));
            }
        }
        if self.http.request_timeout_secs == Some(0) {
            return Err(testdeck_common::Error::InvalidConfig(
                "http.request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
