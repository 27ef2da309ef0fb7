//! Configuration management for the voice router
//!
//! Values resolve as env > toml > default.

pub mod file;

use std::path::Path;
use std::time::Duration;

use crate::{Error, Result};

pub use file::{RouterConfigFile, config_file_path, load_config_file, parse_config_file};

/// Voice router configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Wake/sleep phrases and timing windows
    pub router: RouterConfig,

    /// Exchange-rate providers
    pub fx: FxConfig,

    /// Weather provider
    pub weather: WeatherConfig,

    /// Speech output
    pub speech: SpeechConfig,
}

/// Router phrases and timing windows
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Phrases that wake the assistant when they open an utterance
    pub wake_phrases: Vec<String>,

    /// Phrases that put the assistant to sleep
    pub sleep_phrases: Vec<String>,

    /// How long a wake phrase keeps the assistant awake
    pub wake_window: Duration,

    /// Identical utterances within this window are dropped
    pub debounce_window: Duration,

    /// Input ignored for this long after a handler spoke
    pub post_tts_suppress: Duration,

    /// Minimum remaining wake time when a query is dispatched
    pub keep_awake_on_activity: Duration,

    /// Minimum remaining wake time after a handler returns
    pub post_tts_grace: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            wake_phrases: vec!["hey there".to_string(), "hello there".to_string()],
            sleep_phrases: vec![
                "sleep".to_string(),
                "stop listening".to_string(),
                "go to sleep".to_string(),
            ],
            wake_window: Duration::from_secs(8),
            debounce_window: Duration::from_millis(2500),
            post_tts_suppress: Duration::from_millis(1250),
            keep_awake_on_activity: Duration::from_secs(6),
            post_tts_grace: Duration::from_secs(6),
        }
    }
}

/// Exchange-rate provider configuration
#[derive(Debug, Clone)]
pub struct FxConfig {
    /// Per-request timeout
    pub timeout: Duration,

    /// Extra rounds over all providers after the first
    pub retries: u32,

    /// Pause between rounds
    pub retry_pause: Duration,

    /// Access key for exchangerate.host (`EXCHANGERATE_HOST_KEY`)
    pub exchangerate_host_key: Option<String>,
}

impl Default for FxConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(4),
            retries: 1,
            retry_pause: Duration::from_millis(150),
            exchangerate_host_key: None,
        }
    }
}

/// Weather provider configuration
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    /// WeatherAPI key (`WEATHERAPI_KEY`)
    pub api_key: Option<String>,

    /// City used when the query names none (`VOICE_ROUTER_DEFAULT_CITY`)
    pub default_city: String,

    /// Per-request timeout
    pub timeout: Duration,

    /// Days of forecast to request
    pub forecast_days: u8,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_city: "Toronto".to_string(),
            timeout: Duration::from_secs(10),
            forecast_days: 5,
        }
    }
}

/// Speech output configuration
#[derive(Debug, Clone, Default)]
pub struct SpeechConfig {
    /// External speak command (`VOICE_ROUTER_SPEAK_COMMAND`); console output when unset
    pub command: Option<String>,
}

impl Config {
    /// Load configuration from env and the optional TOML file
    ///
    /// # Errors
    ///
    /// Returns error if a configured value is out of range
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::from_file(file::load_config_file(path))?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Overlay a parsed config file on the defaults
    ///
    /// # Errors
    ///
    /// Returns error if a duration is negative or not finite
    pub fn from_file(fc: RouterConfigFile) -> Result<Self> {
        let defaults = Self::default();

        let router = RouterConfig {
            wake_phrases: fc.router.wake_phrases.unwrap_or(defaults.router.wake_phrases),
            sleep_phrases: fc
                .router
                .sleep_phrases
                .unwrap_or(defaults.router.sleep_phrases),
            wake_window: secs_or(
                "router.wake_window_secs",
                fc.router.wake_window_secs,
                defaults.router.wake_window,
            )?,
            debounce_window: secs_or(
                "router.debounce_secs",
                fc.router.debounce_secs,
                defaults.router.debounce_window,
            )?,
            post_tts_suppress: secs_or(
                "router.post_tts_suppress_secs",
                fc.router.post_tts_suppress_secs,
                defaults.router.post_tts_suppress,
            )?,
            keep_awake_on_activity: secs_or(
                "router.keep_awake_secs",
                fc.router.keep_awake_secs,
                defaults.router.keep_awake_on_activity,
            )?,
            post_tts_grace: secs_or(
                "router.post_tts_grace_secs",
                fc.router.post_tts_grace_secs,
                defaults.router.post_tts_grace,
            )?,
        };

        let fx = FxConfig {
            timeout: secs_or("fx.timeout_secs", fc.fx.timeout_secs, defaults.fx.timeout)?,
            retries: fc.fx.retries.unwrap_or(defaults.fx.retries),
            retry_pause: defaults.fx.retry_pause,
            exchangerate_host_key: fc.fx.exchangerate_host_key,
        };

        let weather = WeatherConfig {
            api_key: fc.weather.api_key,
            default_city: fc
                .weather
                .default_city
                .unwrap_or(defaults.weather.default_city),
            timeout: secs_or(
                "weather.timeout_secs",
                fc.weather.timeout_secs,
                defaults.weather.timeout,
            )?,
            forecast_days: fc
                .weather
                .forecast_days
                .unwrap_or(defaults.weather.forecast_days),
        };

        let speech = SpeechConfig {
            command: fc.speech.command,
        };

        Ok(Self {
            router,
            fx,
            weather,
            speech,
        })
    }

    /// Environment variables win over file values
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("WEATHERAPI_KEY") {
            self.weather.api_key = Some(key);
        }
        if let Ok(city) = std::env::var("VOICE_ROUTER_DEFAULT_CITY") {
            self.weather.default_city = city;
        }
        if let Ok(key) = std::env::var("EXCHANGERATE_HOST_KEY") {
            self.fx.exchangerate_host_key = Some(key);
        }
        if let Ok(command) = std::env::var("VOICE_ROUTER_SPEAK_COMMAND") {
            self.speech.command = Some(command);
        }
    }

    /// Reject configurations the router cannot run with
    ///
    /// # Errors
    ///
    /// Returns error if no wake phrase is configured, the default city is
    /// blank or the forecast range is empty
    pub fn validate(&self) -> Result<()> {
        if self.router.wake_phrases.iter().all(|p| p.trim().is_empty()) {
            return Err(Error::Config("at least one wake phrase is required".to_string()));
        }
        if self.weather.default_city.trim().is_empty() {
            return Err(Error::Config("weather.default_city must not be empty".to_string()));
        }
        if self.weather.forecast_days == 0 {
            return Err(Error::Config("weather.forecast_days must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Seconds from the config file, or `default` when absent
fn secs_or(field: &str, value: Option<f64>, default: Duration) -> Result<Duration> {
    value.map_or(Ok(default), |secs| {
        Duration::try_from_secs_f64(secs)
            .map_err(|e| Error::Config(format!("{field}: {e}")))
    })
}
