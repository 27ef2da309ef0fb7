//! WeatherAPI client (`api.weatherapi.com`)

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::http_client;
use crate::config::WeatherConfig;
use crate::{Error, Result};

const BASE_URL: &str = "https://api.weatherapi.com/v1";

/// Conditions right now
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentConditions {
    pub condition: String,
    pub temp_c: f64,
    pub wind_kph: f64,
    pub precip_mm: f64,
}

/// One forecast day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub condition: String,
    pub avg_temp_c: f64,
    pub max_temp_c: f64,
    pub min_temp_c: f64,
    /// Percent
    pub chance_of_rain: f64,
    pub max_wind_kph: f64,
}

/// Weather data source
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Current conditions in `city`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be parsed
    async fn current(&self, city: &str) -> Result<CurrentConditions>;

    /// Daily forecast for `city`, today first
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be parsed
    async fn forecast(&self, city: &str, days: u8) -> Result<Vec<ForecastDay>>;
}

#[derive(Debug, Deserialize)]
struct ApiCondition {
    text: String,
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    current: ApiCurrent,
}

#[derive(Debug, Deserialize)]
struct ApiCurrent {
    temp_c: f64,
    wind_kph: f64,
    #[serde(default)]
    precip_mm: f64,
    condition: ApiCondition,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    forecast: ApiForecast,
}

#[derive(Debug, Deserialize)]
struct ApiForecast {
    #[serde(default)]
    forecastday: Vec<ApiForecastDay>,
}

#[derive(Debug, Deserialize)]
struct ApiForecastDay {
    date: NaiveDate,
    day: ApiDay,
}

#[derive(Debug, Deserialize)]
struct ApiDay {
    avgtemp_c: f64,
    maxtemp_c: f64,
    mintemp_c: f64,
    #[serde(default)]
    daily_chance_of_rain: f64,
    maxwind_kph: f64,
    condition: ApiCondition,
}

impl From<ApiCurrent> for CurrentConditions {
    fn from(c: ApiCurrent) -> Self {
        Self {
            condition: c.condition.text,
            temp_c: c.temp_c,
            wind_kph: c.wind_kph,
            precip_mm: c.precip_mm,
        }
    }
}

impl From<ApiForecastDay> for ForecastDay {
    fn from(d: ApiForecastDay) -> Self {
        Self {
            date: d.date,
            condition: d.day.condition.text,
            avg_temp_c: d.day.avgtemp_c,
            max_temp_c: d.day.maxtemp_c,
            min_temp_c: d.day.mintemp_c,
            chance_of_rain: d.day.daily_chance_of_rain,
            max_wind_kph: d.day.maxwind_kph,
        }
    }
}

/// WeatherAPI.com client
#[derive(Debug, Clone)]
pub struct WeatherApiClient {
    api_key: Option<String>,
    client: reqwest::Client,
}

impl WeatherApiClient {
    /// Create a client; a missing key fails at request time
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            api_key,
            client: http_client(timeout)?,
        })
    }

    /// Build from [`WeatherConfig`]
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn from_config(config: &WeatherConfig) -> Result<Self> {
        Self::new(config.api_key.clone(), config.timeout)
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Config("WEATHERAPI_KEY is not set".to_string()))
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let key = self.api_key()?;

        let response = self
            .client
            .get(format!("{BASE_URL}/{endpoint}"))
            .query(&[("key", key), ("aqi", "no")])
            .query(params)
            .send()
            .await?;

        let response = response.error_for_status().map_err(Error::Http)?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiClient {
    async fn current(&self, city: &str) -> Result<CurrentConditions> {
        tracing::debug!(city, "fetching current weather");
        let body: CurrentResponse = self.get("current.json", &[("q", city)]).await?;
        Ok(body.current.into())
    }

    async fn forecast(&self, city: &str, days: u8) -> Result<Vec<ForecastDay>> {
        tracing::debug!(city, days, "fetching forecast");
        let days = days.to_string();
        let body: ForecastResponse = self
            .get(
                "forecast.json",
                &[("q", city), ("days", days.as_str()), ("alerts", "no")],
            )
            .await?;
        Ok(body.forecast.forecastday.into_iter().map(Into::into).collect())
    }
}
