//! Remote data providers
//!
//! - [`fx`]: per-unit exchange rates with ordered source fallback
//! - [`weather`]: current conditions and daily forecasts from WeatherAPI

pub mod fx;
pub mod weather;

pub use fx::{ExchangeRateHostSource, FallbackRateProvider, FrankfurterSource, RateProvider};
pub use weather::{CurrentConditions, ForecastDay, WeatherApiClient, WeatherProvider};

use std::time::Duration;

use crate::Result;

/// HTTP client shared by a provider's requests
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("voice-router/", env!("CARGO_PKG_VERSION")))
        .build()?)
}
