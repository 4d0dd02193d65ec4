// Keymirror Config - TOML with Serde
// Optional configuration file for the trigger, tap, and exit keys

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::key::key_from_name;
use crate::translator::{TranslatorConfig, DEFAULT_TAP_TIMEOUT};
use crate::Key;

/// Default name of the virtual output device
pub const DEFAULT_OUTPUT_NAME: &str = "keymirror";

/// Accepted range for `tap_timeout_ms`
const TAP_TIMEOUT_RANGE_MS: std::ops::RangeInclusive<u64> = 1..=5000;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Invalid key for {field}: {name:?}")]
    InvalidKey { field: &'static str, name: String },

    #[error("Timeout value out of range: tap_timeout_ms = {0} (expected 1..=5000)")]
    TimeoutOutOfRange(u64),

    #[error("Invalid output device name: {0:?}")]
    InvalidOutputName(String),
}

/// Root TOML table
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigToml {
    #[serde(default)]
    general: GeneralToml,

    #[serde(default)]
    output: OutputToml,
}

/// `[general]` section
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct GeneralToml {
    trigger_key: Option<String>,
    tap_key: Option<String>,
    exit_key: Option<String>,
    tap_timeout_ms: Option<u64>,
}

/// `[output]` section
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct OutputToml {
    device_name: Option<String>,
}

/// Resolved runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Key whose hold enables mirroring
    pub trigger_key: Key,
    /// Key emitted on a quick tap of the trigger
    pub tap_key: Key,
    /// Key that stops the run
    pub exit_key: Key,
    /// Quick-tap window
    pub tap_timeout: Duration,
    /// Name given to the virtual output device
    pub output_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trigger_key: Key::SPACE,
            tap_key: Key::SPACE,
            exit_key: Key::MUTE,
            tap_timeout: DEFAULT_TAP_TIMEOUT,
            output_name: DEFAULT_OUTPUT_NAME.to_string(),
        }
    }
}

fn resolve_key(field: &'static str, name: Option<String>, default: Key) -> Result<Key, ConfigError> {
    match name {
        None => Ok(default),
        Some(name) => key_from_name(&name).ok_or(ConfigError::InvalidKey { field, name }),
    }
}

impl Config {
    /// Parse a TOML document; missing fields keep their defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let raw: ConfigToml =
            toml::from_str(content).map_err(|e| ConfigError::TomlParse(e.to_string()))?;
        let defaults = Config::default();

        let tap_timeout = match raw.general.tap_timeout_ms {
            None => defaults.tap_timeout,
            Some(ms) if TAP_TIMEOUT_RANGE_MS.contains(&ms) => Duration::from_millis(ms),
            Some(ms) => return Err(ConfigError::TimeoutOutOfRange(ms)),
        };

        let output_name = match raw.output.device_name {
            None => defaults.output_name,
            Some(name) if name.trim().is_empty() => {
                return Err(ConfigError::InvalidOutputName(name))
            }
            Some(name) => name,
        };

        Ok(Self {
            trigger_key: resolve_key("trigger_key", raw.general.trigger_key, defaults.trigger_key)?,
            tap_key: resolve_key("tap_key", raw.general.tap_key, defaults.tap_key)?,
            exit_key: resolve_key("exit_key", raw.general.exit_key, defaults.exit_key)?,
            tap_timeout,
            output_name,
        })
    }

    /// Load and parse a config file.
    pub fn from_toml_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// `~/.config/keymirror/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("keymirror").join("config.toml"))
    }

    /// Load `explicit` if given; otherwise the default path if it exists;
    /// otherwise built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            log::debug!("Loading config from {}", path.display());
            return Self::from_toml_path(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => {
                log::debug!("Loading config from {}", path.display());
                Self::from_toml_path(path)
            }
            _ => {
                log::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Settings consumed by the translator.
    pub fn translator_config(&self) -> TranslatorConfig {
        TranslatorConfig {
            trigger_key: self.trigger_key,
            tap_key: self.tap_key,
            tap_timeout: self.tap_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.trigger_key, Key::SPACE);
        assert_eq!(config.exit_key, Key::MUTE);
        assert_eq!(config.tap_timeout, Duration::from_millis(250));
        assert_eq!(config.output_name, "keymirror");
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_toml(
            r#"
            [general]
            trigger_key = "CAPSLOCK"
            tap_key = "ESC"
            exit_key = "KEY_PAUSE"
            tap_timeout_ms = 180

            [output]
            device_name = "mirror-kbd"
            "#,
        )
        .unwrap();

        assert_eq!(config.trigger_key, Key::from(58));
        assert_eq!(config.tap_key, Key::ESC);
        assert_eq!(config.exit_key, Key::from(119));
        assert_eq!(config.tap_timeout, Duration::from_millis(180));
        assert_eq!(config.output_name, "mirror-kbd");
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let config = Config::from_toml("[general]\ntap_key = \"enter\"\n").unwrap();
        assert_eq!(config.tap_key, Key::from(28));
        assert_eq!(config.trigger_key, Key::SPACE);
        assert_eq!(config.output_name, DEFAULT_OUTPUT_NAME);
    }

    #[test]
    fn test_translator_config() {
        let config = Config::from_toml("[general]\ntap_timeout_ms = 300\n").unwrap();
        let translator = config.translator_config();
        assert_eq!(translator.trigger_key, Key::SPACE);
        assert_eq!(translator.tap_key, Key::SPACE);
        assert_eq!(translator.tap_timeout, Duration::from_millis(300));
    }

    #[test]
    fn test_invalid_key_name() {
        let err = Config::from_toml("[general]\ntrigger_key = \"HYPERSPACE\"\n").unwrap_err();
        match err {
            ConfigError::InvalidKey { field, name } => {
                assert_eq!(field, "trigger_key");
                assert_eq!(name, "HYPERSPACE");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_timeout_out_of_range() {
        assert!(matches!(
            Config::from_toml("[general]\ntap_timeout_ms = 0\n"),
            Err(ConfigError::TimeoutOutOfRange(0))
        ));
        assert!(matches!(
            Config::from_toml("[general]\ntap_timeout_ms = 60000\n"),
            Err(ConfigError::TimeoutOutOfRange(60000))
        ));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(matches!(
            Config::from_toml("[general]\nhold_key = \"A\"\n"),
            Err(ConfigError::TomlParse(_))
        ));
        assert!(matches!(
            Config::from_toml("[rows]\nleft = \"qwert\"\n"),
            Err(ConfigError::TomlParse(_))
        ));
    }

    #[test]
    fn test_blank_output_name_rejected() {
        assert!(matches!(
            Config::from_toml("[output]\ndevice_name = \"  \"\n"),
            Err(ConfigError::InvalidOutputName(_))
        ));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = Config::load(Some(Path::new("/nonexistent/keymirror/config.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_from_toml_path() {
        let path = std::env::temp_dir().join(format!("keymirror-config-{}.toml", std::process::id()));
        fs::write(&path, "[general]\nexit_key = \"ESC\"\n").unwrap();
        let config = Config::from_toml_path(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(config.exit_key, Key::ESC);
    }
}
