//! TOML configuration file loading
//!
//! Supports `~/.config/voice-router/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouterConfigFile {
    /// Wake/sleep phrases and timing windows
    #[serde(default)]
    pub router: RouterFileConfig,

    /// Exchange-rate providers
    #[serde(default)]
    pub fx: FxFileConfig,

    /// Weather provider
    #[serde(default)]
    pub weather: WeatherFileConfig,

    /// Speech output
    #[serde(default)]
    pub speech: SpeechFileConfig,
}

/// Router phrases and windows (seconds)
#[derive(Debug, Default, Deserialize)]
pub struct RouterFileConfig {
    pub wake_phrases: Option<Vec<String>>,
    pub sleep_phrases: Option<Vec<String>>,
    pub wake_window_secs: Option<f64>,
    pub debounce_secs: Option<f64>,
    pub post_tts_suppress_secs: Option<f64>,
    pub keep_awake_secs: Option<f64>,
    pub post_tts_grace_secs: Option<f64>,
}

/// Exchange-rate provider configuration
#[derive(Debug, Default, Deserialize)]
pub struct FxFileConfig {
    /// Per-request timeout
    pub timeout_secs: Option<f64>,
    /// Extra rounds over all providers after the first
    pub retries: Option<u32>,
    /// Access key for exchangerate.host
    pub exchangerate_host_key: Option<String>,
}

/// Weather provider configuration
#[derive(Debug, Default, Deserialize)]
pub struct WeatherFileConfig {
    /// WeatherAPI key
    pub api_key: Option<String>,
    /// City used when the query names none
    pub default_city: Option<String>,
    /// Per-request timeout
    pub timeout_secs: Option<f64>,
    /// Days of forecast to request
    pub forecast_days: Option<u8>,
}

/// Speech output configuration
#[derive(Debug, Default, Deserialize)]
pub struct SpeechFileConfig {
    /// External command that speaks its last argument (e.g. "espeak -v en")
    pub command: Option<String>,
}

/// Load the TOML config file from `path`, or from the standard path
///
/// Returns `RouterConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file(path: Option<&Path>) -> RouterConfigFile {
    let Some(path) = path.map(Path::to_path_buf).or_else(config_file_path) else {
        return RouterConfigFile::default();
    };

    if !path.exists() {
        return RouterConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match parse_config_file(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                RouterConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            RouterConfigFile::default()
        }
    }
}

/// Parse config file contents
///
/// # Errors
///
/// Returns error if the contents are not valid TOML for this schema
pub fn parse_config_file(content: &str) -> crate::Result<RouterConfigFile> {
    Ok(toml::from_str(content)?)
}

/// Return the config file path: `~/.config/voice-router/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("voice-router").join("config.toml"))
}
