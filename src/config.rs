//! Configuration file parser for ~/.config/mastty/config.toml.
//!
//! Unlike most settings, the server and access token have no sensible
//! default, so a missing file is an error the caller reports with setup
//! instructions. Every other key is optional.
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No config file at {}", .0.display())]
    Missing(PathBuf),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// Sections and keys use `#[serde(default)]`, so any subset may be given.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub auth: AuthConfig,
    pub timeline: TimelineConfig,
    pub images: ImageConfig,
    pub ui: UiConfig,
    /// Keybinding overrides. Keys are action names, values are key strings.
    pub keybindings: HashMap<String, String>,
}

/// Server credentials.
///
/// The token is a `SecretString`; `Debug` prints it redacted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Server address, e.g. `mastodon.social` or `https://example.social`.
    pub server: String,
    #[serde(deserialize_with = "deserialize_secret")]
    pub access_token: Option<SecretString>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Posts per older-page request.
    pub page_size: u32,
    /// Posts per refresh (newer) request.
    pub refresh_size: u32,
    /// Subscribe to live updates on startup.
    pub streaming: bool,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            refresh_size: 40,
            streaming: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub enabled: bool,
    /// Upper bound on cached tiles and decoded images. Unbounded when unset.
    pub max_tiles: Option<usize>,
    /// Largest image download accepted, in bytes.
    pub max_bytes: usize,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_tiles: None,
            max_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Split between the timeline list and the detail pane.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub left_ratio: u16,
    pub right_ratio: u16,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            left_ratio: 2,
            right_ratio: 3,
        }
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()).map(SecretString::from))
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_SECTIONS: &'static [(&'static str, &'static [&'static str])] = &[
        ("auth", &["server", "access_token"]),
        ("timeline", &["page_size", "refresh_size", "streaming"]),
        ("images", &["enabled", "max_tiles", "max_bytes"]),
        ("ui", &["left_ratio", "right_ratio"]),
        ("keybindings", &[]),
    ];

    /// `$XDG_CONFIG_HOME/mastty`, falling back to `~/.config/mastty`.
    pub fn default_dir() -> Option<PathBuf> {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
        Some(base.join("mastty"))
    }

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Err(ConfigError::Missing)`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as a warning
    ///
    /// Credentials are not checked here since the environment may still
    /// supply the token; call [`Config::validate`] once overrides are applied.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::read(path)?;
        tracing::info!(
            path = %path.display(),
            server = %config.auth.server,
            streaming = config.timeline.streaming,
            "Loaded configuration"
        );
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        // Check file size before reading
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::Missing(path.to_path_buf()));
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::Missing(path.to_path_buf()));
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::parse(&content)
    }

    /// Parse TOML text. Does not validate.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if let Ok(raw) = content.parse::<toml::Table>() {
            warn_unknown_keys(&raw);
        }
        Ok(toml::from_str(content)?)
    }

    /// Replace the file's token with `token`, when given. Used for the
    /// `MASTTY_ACCESS_TOKEN` environment variable.
    pub fn with_token_override(mut self, token: Option<String>) -> Self {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            tracing::debug!("Using access token from environment");
            self.auth.access_token = Some(SecretString::from(token));
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.server.trim().is_empty() {
            return Err(ConfigError::Invalid("[auth] server is not set".to_string()));
        }
        if self
            .auth
            .access_token
            .as_ref()
            .map_or(true, |t| t.expose_secret().trim().is_empty())
        {
            return Err(ConfigError::Invalid(
                "[auth] access_token is not set".to_string(),
            ));
        }
        if self.timeline.page_size == 0 || self.timeline.refresh_size == 0 {
            return Err(ConfigError::Invalid(
                "[timeline] page_size and refresh_size must be positive".to_string(),
            ));
        }
        if self.ui.left_ratio == 0 || self.ui.right_ratio == 0 {
            return Err(ConfigError::Invalid(
                "[ui] left_ratio and right_ratio must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn warn_unknown_keys(raw: &toml::Table) {
    for (key, value) in raw {
        let Some((_, known)) = Config::KNOWN_SECTIONS.iter().find(|(name, _)| name == key) else {
            tracing::warn!(key = %key, "Unknown section in config file, ignoring");
            continue;
        };
        // Keybinding names are validated by the registry
        if key == "keybindings" {
            continue;
        }
        if let Some(table) = value.as_table() {
            for inner in table.keys() {
                if !known.contains(&inner.as_str()) {
                    tracing::warn!(section = %key, key = %inner, "Unknown key in config file, ignoring");
                }
            }
        }
    }
}

/// Example file printed when no configuration exists.
pub const EXAMPLE_CONFIG: &str = r#"[auth]
server = "mastodon.social"
# Create a token under Preferences > Development > New application
# (scopes: read). May also be set with MASTTY_ACCESS_TOKEN.
access_token = "..."

[timeline]
page_size = 20
refresh_size = 40
streaming = true

[images]
enabled = true
"#;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[auth]
server = "example.social"
access_token = "abc123"
"#;

    fn write_temp(name: &str, content: &str) -> (PathBuf, PathBuf) {
        let dir = std::env::temp_dir().join(format!("mastty_config_test_{name}"));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.timeline.page_size, 20);
        assert_eq!(config.timeline.refresh_size, 40);
        assert!(config.timeline.streaming);
        assert!(config.images.enabled);
        assert_eq!(config.images.max_tiles, None);
        assert_eq!(config.images.max_bytes, 10 * 1024 * 1024);
        assert_eq!((config.ui.left_ratio, config.ui.right_ratio), (2, 3));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let path = Path::new("/tmp/mastty_test_nonexistent_config.toml");
        assert!(matches!(Config::load(path), Err(ConfigError::Missing(_))));
    }

    #[test]
    fn test_minimal_config_loads() {
        let (dir, path) = write_temp("minimal", MINIMAL);

        let config = Config::load(&path).unwrap();
        assert_eq!(config.auth.server, "example.social");
        assert_eq!(
            config.auth.access_token.as_ref().map(|t| t.expose_secret().to_string()),
            Some("abc123".to_string())
        );
        assert_eq!(config.timeline.page_size, 20);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let content = r#"
[auth]
server = "https://example.social"
access_token = "tok"

[timeline]
page_size = 30
refresh_size = 60
streaming = false

[images]
enabled = false
max_tiles = 256
max_bytes = 1024

[ui]
left_ratio = 1
right_ratio = 1

[keybindings]
quit = "Ctrl+q"
"#;
        let config = Config::parse(content).unwrap();
        config.validate().unwrap();
        assert_eq!(config.timeline.page_size, 30);
        assert!(!config.timeline.streaming);
        assert!(!config.images.enabled);
        assert_eq!(config.images.max_tiles, Some(256));
        assert_eq!(config.ui.left_ratio, 1);
        assert_eq!(
            config.keybindings.get("quit").map(String::as_str),
            Some("Ctrl+q")
        );
    }

    #[test]
    fn test_missing_token_is_invalid() {
        let config = Config::parse("[auth]\nserver = \"example.social\"\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_env_token_overrides_file() {
        let config = Config::parse("[auth]\nserver = \"example.social\"\n")
            .unwrap()
            .with_token_override(Some("from-env".to_string()));
        config.validate().unwrap();
        assert_eq!(
            config.auth.access_token.unwrap().expose_secret(),
            "from-env"
        );
    }

    #[test]
    fn test_blank_env_token_is_ignored() {
        let config = Config::parse(MINIMAL)
            .unwrap()
            .with_token_override(Some("  ".to_string()));
        assert_eq!(config.auth.access_token.unwrap().expose_secret(), "abc123");
    }

    #[test]
    fn test_zero_sizes_rejected() {
        let content = format!("{MINIMAL}\n[timeline]\npage_size = 0\n");
        let config = Config::parse(&content).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let result = Config::parse("this is not [valid toml");
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let content = format!("{MINIMAL}\ntotally_fake = 1\n[images]\nbogus = true\n");
        let config = Config::parse(&content).unwrap();
        assert_eq!(config.auth.server, "example.social");
    }

    #[test]
    fn test_wrong_type_returns_error() {
        assert!(Config::parse("[timeline]\npage_size = \"many\"\n").is_err());
    }

    #[test]
    fn test_too_large_file_rejected() {
        let (dir, path) = write_temp("too_large", &"a".repeat(1_048_577));

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_debug_masks_token() {
        let config = Config::parse(MINIMAL).unwrap();
        let debug_output = format!("{:?}", config);
        assert!(
            !debug_output.contains("abc123"),
            "Debug output should not contain the access token"
        );
    }

    #[test]
    fn test_example_config_is_valid() {
        let config = Config::parse(EXAMPLE_CONFIG).unwrap();
        config.validate().unwrap();
    }
}
