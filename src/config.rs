use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub selector: SelectorConfig,
}

/// Projects API connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ApiConfig {
    /// Base URL the `/projects` paths are appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token sent in the Authorization header
    #[serde(default)]
    pub token: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Which inputs the picker shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SelectorConfig {
    #[serde(default = "default_true")]
    pub show_search: bool,

    #[serde(default = "default_false")]
    pub show_date_filter: bool,
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            show_search: true,
            show_date_filter: false,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let config: Config =
            serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Load from `path` when it exists, defaults otherwise
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!(
                "No config at {}, using defaults",
                path.as_ref().display()
            );
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path.as_ref(), contents).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.api.base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "api.base_url cannot be empty".to_string(),
            ));
        }
        match url::Url::parse(base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(_) => {
                return Err(ConfigError::ValidationError(format!(
                    "api.base_url must be an http:// or https:// URL, got {base_url}"
                )));
            }
            Err(e) => {
                return Err(ConfigError::ValidationError(format!(
                    "api.base_url is not a valid URL ({e}): {base_url}"
                )));
            }
        }

        if self.api.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "api.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if matches!(&self.api.token, Some(token) if token.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "api.token cannot be blank; omit it instead".to_string(),
            ));
        }

        Ok(())
    }
}

/// `$XDG_CONFIG_HOME/projtree/config.json` (typically `~/.config/projtree/config.json`)
#[cfg(feature = "runtime")]
pub fn default_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|dir| dir.join("projtree").join("config.json"))
}

/// Configuration error types
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(msg) => write!(f, "IO error: {msg}"),
            ConfigError::ParseError(msg) => write!(f, "Parse error: {msg}"),
            ConfigError::SerializeError(msg) => write!(f, "Serialize error: {msg}"),
            ConfigError::ValidationError(msg) => write!(f, "Validation error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:8000/api");
        assert_eq!(config.api.timeout_secs, 30);
        assert!(config.api.token.is_none());
        assert!(config.selector.show_search);
        assert!(!config.selector.show_date_filter);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.api.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.api.base_url = "localhost:8000".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.api.base_url = "http://".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.api.token = Some("  ".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let mut config = Config::default();
        config.api.token = Some("secret".to_string());
        config.save_to_file(&config_path).unwrap();

        let loaded = Config::load_from_file(&config_path).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let json = r#"{
            "api": {
                "base_url": "https://studio.example.com/api"
            },
            "selector": {
                "show_date_filter": true
            }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.api.base_url, "https://studio.example.com/api");
        assert_eq!(config.api.timeout_secs, 30);
        assert!(config.selector.show_search);
        assert!(config.selector.show_date_filter);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(temp_dir.path().join("absent.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = Config::load_or_default(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
