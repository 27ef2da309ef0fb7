//! Exchange-rate sources
//!
//! Sources are tried in order for `retries + 1` rounds with a short pause
//! between rounds:
//!
//! 1. Frankfurter (`api.frankfurter.dev`)
//! 2. Frankfurter mirror (`api.frankfurter.app`)
//! 3. exchangerate.host `/convert`
//!
//! Every source quotes one unit of `from` in `to`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::http_client;
use crate::config::FxConfig;
use crate::slots::CurrencyCode;
use crate::{Error, Result};

/// Primary Frankfurter host
pub const FRANKFURTER_HOST: &str = "api.frankfurter.dev";

/// Frankfurter mirror
pub const FRANKFURTER_MIRROR_HOST: &str = "api.frankfurter.app";

const EXCHANGERATE_HOST_URL: &str = "https://api.exchangerate.host/convert";

/// A source of exchange rates
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Value of one unit of `from` in `to`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response carries no usable rate
    async fn fetch_rate(&self, from: CurrencyCode, to: CurrencyCode) -> Result<f64>;
}

/// Frankfurter `/latest` response
#[derive(Debug, Deserialize)]
struct FrankfurterResponse {
    #[serde(default)]
    rates: HashMap<String, f64>,
}

/// exchangerate.host `/convert` response
#[derive(Debug, Deserialize)]
struct ConvertResponse {
    success: Option<bool>,
    result: Option<f64>,
}

/// A Frankfurter instance
#[derive(Debug, Clone)]
pub struct FrankfurterSource {
    host: String,
    client: reqwest::Client,
}

impl FrankfurterSource {
    #[must_use]
    pub fn new(host: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            host: host.into(),
            client,
        }
    }
}

#[async_trait]
impl RateProvider for FrankfurterSource {
    fn name(&self) -> &str {
        &self.host
    }

    async fn fetch_rate(&self, from: CurrencyCode, to: CurrencyCode) -> Result<f64> {
        let response = self
            .client
            .get(format!("https://{}/latest", self.host))
            .query(&[("from", from.as_str()), ("to", to.as_str())])
            .send()
            .await?;

        let response = response.error_for_status().map_err(Error::Http)?;
        let body: FrankfurterResponse = response.json().await?;

        let rate = body
            .rates
            .get(to.as_str())
            .copied()
            .ok_or_else(|| Error::Provider(format!("{} returned no {to} rate", self.host)))?;

        usable_rate(&self.host, rate)
    }
}

/// exchangerate.host conversion endpoint
#[derive(Debug, Clone)]
pub struct ExchangeRateHostSource {
    access_key: Option<String>,
    client: reqwest::Client,
}

impl ExchangeRateHostSource {
    #[must_use]
    pub const fn new(access_key: Option<String>, client: reqwest::Client) -> Self {
        Self { access_key, client }
    }
}

#[async_trait]
impl RateProvider for ExchangeRateHostSource {
    fn name(&self) -> &str {
        "exchangerate.host"
    }

    async fn fetch_rate(&self, from: CurrencyCode, to: CurrencyCode) -> Result<f64> {
        let mut request = self.client.get(EXCHANGERATE_HOST_URL).query(&[
            ("from", from.as_str()),
            ("to", to.as_str()),
            ("amount", "1"),
        ]);
        if let Some(key) = &self.access_key {
            request = request.query(&[("access_key", key.as_str())]);
        }

        let response = request.send().await?.error_for_status().map_err(Error::Http)?;
        let body: ConvertResponse = response.json().await?;

        if body.success == Some(false) {
            return Err(Error::Provider("exchangerate.host reported failure".to_string()));
        }

        let rate = body
            .result
            .ok_or_else(|| Error::Provider("exchangerate.host returned no result".to_string()))?;

        usable_rate(self.name(), rate)
    }
}

/// Ordered sources with bounded retry
pub struct FallbackRateProvider {
    sources: Vec<Arc<dyn RateProvider>>,
    retries: u32,
    pause: Duration,
}

impl std::fmt::Debug for FallbackRateProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.sources.iter().map(|s| s.name()).collect();
        f.debug_struct("FallbackRateProvider")
            .field("sources", &names)
            .field("retries", &self.retries)
            .field("pause", &self.pause)
            .finish()
    }
}

impl FallbackRateProvider {
    #[must_use]
    pub fn new(sources: Vec<Arc<dyn RateProvider>>, retries: u32, pause: Duration) -> Self {
        Self {
            sources,
            retries,
            pause,
        }
    }

    /// Frankfurter, its mirror, then exchangerate.host
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn from_config(config: &FxConfig) -> Result<Self> {
        let client = http_client(config.timeout)?;

        let sources: Vec<Arc<dyn RateProvider>> = vec![
            Arc::new(FrankfurterSource::new(FRANKFURTER_HOST, client.clone())),
            Arc::new(FrankfurterSource::new(FRANKFURTER_MIRROR_HOST, client.clone())),
            Arc::new(ExchangeRateHostSource::new(
                config.exchangerate_host_key.clone(),
                client,
            )),
        ];

        Ok(Self::new(sources, config.retries, config.retry_pause))
    }
}

#[async_trait]
impl RateProvider for FallbackRateProvider {
    fn name(&self) -> &str {
        "fallback"
    }

    async fn fetch_rate(&self, from: CurrencyCode, to: CurrencyCode) -> Result<f64> {
        let mut last_error = None;

        for round in 0..=self.retries {
            if round > 0 {
                tokio::time::sleep(self.pause).await;
            }

            for source in &self.sources {
                match source.fetch_rate(from, to).await {
                    Ok(rate) => {
                        tracing::debug!(source = source.name(), %from, %to, rate, "rate fetched");
                        return usable_rate(source.name(), rate);
                    }
                    Err(e) => {
                        tracing::warn!(source = source.name(), round, error = %e, "rate source failed");
                        last_error = Some(e);
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Provider("no rate sources configured".to_string())))
    }
}

/// Reject rates that cannot be multiplied or inverted
fn usable_rate(source: &str, rate: f64) -> Result<f64> {
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(Error::Provider(format!("{source} returned unusable rate {rate}")))
    }
}
