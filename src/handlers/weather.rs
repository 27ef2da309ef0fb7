//! Weather queries
//!
//! A query is answered from the forecast when it asks for one or names a
//! day other than today, and from current conditions otherwise. The topic
//! (temperature, rain, wind) only shapes the current-conditions sentence.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;

use crate::clock::Clock;
use crate::config::WeatherConfig;
use crate::providers::{CurrentConditions, ForecastDay, WeatherProvider};
use crate::router::DomainHandler;
use crate::slots::{WeatherSlotExtractor, When, tokenize};
use crate::voice::Speaker;
use crate::{Error, Result};

pub const CONNECTION_PROBLEM: &str =
    "There was a problem connecting to the weather service. Please check the city name or your network.";
pub const UNEXPECTED: &str = "An unexpected error occurred. Please try again later.";

/// Well-known cities and how to say them
const CITY_ALIASES: &[(&str, &str)] = &[
    ("toronto", "Toronto"),
    ("busan", "Busan"),
    ("seoul", "Seoul"),
    ("miyazaki", "Miyazaki"),
    ("tokyo", "Tokyo"),
    ("new york", "New York"),
];

/// What the user asked about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherTopic {
    Temperature,
    Precipitation,
    Wind,
    Forecast,
    Current,
}

impl WeatherTopic {
    /// First matching topic word wins in this order
    #[must_use]
    pub fn detect(tokens: &[String]) -> Self {
        if has_any(tokens, &["temperature"]) {
            Self::Temperature
        } else if has_any(tokens, &["precipitation"]) || tokens.iter().any(|t| t.starts_with("rain")) {
            Self::Precipitation
        } else if has_any(tokens, &["wind", "windy"]) {
            Self::Wind
        } else if has_any(tokens, &["forecast", "tomorrow"])
            || tokens.windows(2).any(|w| w[0] == "day" && w[1] == "after")
        {
            Self::Forecast
        } else {
            Self::Current
        }
    }
}

fn has_any(tokens: &[String], words: &[&str]) -> bool {
    tokens.iter().any(|t| words.contains(&t.as_str()))
}

/// Answers weather queries
pub struct WeatherQueryHandler {
    provider: Arc<dyn WeatherProvider>,
    speaker: Arc<dyn Speaker>,
    clock: Arc<dyn Clock>,
    default_city: String,
    forecast_days: u8,
    extractor: WeatherSlotExtractor,
}

impl WeatherQueryHandler {
    #[must_use]
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        speaker: Arc<dyn Speaker>,
        clock: Arc<dyn Clock>,
        config: &WeatherConfig,
    ) -> Self {
        Self {
            provider,
            speaker,
            clock,
            default_city: config.default_city.clone(),
            forecast_days: config.forecast_days,
            extractor: WeatherSlotExtractor::default(),
        }
    }

    /// Display name of the city the query is about
    #[must_use]
    pub fn resolve_city(&self, query: &str) -> String {
        let padded = format!(" {} ", tokenize(query).join(" "));

        if let Some((_, name)) = CITY_ALIASES
            .iter()
            .find(|(alias, _)| padded.contains(&format!(" {alias} ")))
        {
            return (*name).to_string();
        }

        self.extractor
            .extract(query)
            .city
            .map_or_else(|| self.default_city.clone(), |city| title_case(&city))
    }

    /// Compute the reply for `query` without speaking it
    pub async fn answer(&self, query: &str) -> String {
        let tokens = tokenize(query);
        let topic = WeatherTopic::detect(&tokens);
        let city = self.resolve_city(query);

        let today = self.clock.today();
        let (date, label) = When::detect(&tokens).map_or_else(
            || (today, "today".to_string()),
            |when| (when.resolve(today), when.label(today)),
        );

        tracing::debug!(%city, ?topic, %date, "weather query");

        let reply = if topic == WeatherTopic::Forecast || date != today {
            self.forecast_reply(&city, date, &label).await
        } else {
            self.current_reply(&city, topic).await
        };

        reply.unwrap_or_else(|e| {
            tracing::warn!(%city, error = %e, "weather lookup failed");
            match e {
                Error::Http(_) | Error::Config(_) => CONNECTION_PROBLEM.to_string(),
                _ => UNEXPECTED.to_string(),
            }
        })
    }

    async fn forecast_reply(&self, city: &str, date: NaiveDate, label: &str) -> Result<String> {
        let days = self.provider.forecast(city, self.forecast_days).await?;

        Ok(days.iter().find(|d| d.date == date).map_or_else(
            || format!("I could not find the forecast for {city} on {label}."),
            |day| forecast_sentence(city, label, day),
        ))
    }

    async fn current_reply(&self, city: &str, topic: WeatherTopic) -> Result<String> {
        let current = self.provider.current(city).await?;
        Ok(current_sentence(city, topic, &current))
    }
}

fn forecast_sentence(city: &str, label: &str, day: &ForecastDay) -> String {
    format!(
        "The weather in {city} on {label} will be {}, with an average temperature of {} degrees Celsius, \
         a high of {}, a low of {}, {} percent chance of rain, and winds up to {} kilometers per hour.",
        day.condition,
        day.avg_temp_c,
        day.max_temp_c,
        day.min_temp_c,
        day.chance_of_rain,
        day.max_wind_kph,
    )
}

fn current_sentence(city: &str, topic: WeatherTopic, c: &CurrentConditions) -> String {
    match topic {
        WeatherTopic::Temperature => {
            format!("The current temperature in {city} is {} degrees Celsius.", c.temp_c)
        }
        WeatherTopic::Precipitation if c.precip_mm > 0.0 => format!(
            "It is currently {} in {city}, with {} millimeters of precipitation.",
            c.condition, c.precip_mm
        ),
        WeatherTopic::Precipitation => format!(
            "It is currently {} in {city}, with no precipitation detected.",
            c.condition
        ),
        WeatherTopic::Wind => format!(
            "The wind speed in {city} is {} kilometers per hour, and the weather is {}.",
            c.wind_kph, c.condition
        ),
        WeatherTopic::Forecast | WeatherTopic::Current => format!(
            "The weather in {city} right now is {}, with a temperature of {} degrees Celsius \
             and winds at {} kilometers per hour.",
            c.condition, c.temp_c, c.wind_kph
        ),
    }
}

fn title_case(city: &str) -> String {
    city.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl DomainHandler for WeatherQueryHandler {
    async fn handle(&self, query: &str) -> Result<()> {
        let reply = self.answer(query).await;
        self.speaker.speak(&reply).await
    }
}
