//! Exchange-rate queries

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::Result;
use crate::providers::RateProvider;
use crate::router::DomainHandler;
use crate::slots::{AllowedPairs, CurrencyCode, CurrencyPairResolver, PairDirection, PairResolution};
use crate::voice::Speaker;

pub const UNSUPPORTED: &str = "That pair is not supported.";
pub const FETCH_FAILED: &str = "I couldn't fetch the exchange rate right now.";
pub const GUIDANCE: &str = "Please say like: from Korea to Japan, or 1000 won to CAD.";

/// A priced conversion ready to be spoken
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quote {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    pub display_amount: f64,
    /// Units of `to` per unit of `from`
    pub rate: f64,
    /// Whether the amount was spoken by the user
    pub explicit_amount: bool,
}

impl Quote {
    /// Price `pair` at `rate`
    ///
    /// Without a spoken amount one unit is quoted, except between KRW and
    /// JPY where single units are too small to be useful and 100 is quoted.
    #[must_use]
    pub fn new(pair: &PairResolution, rate: f64) -> Self {
        let display_amount = pair.amount.unwrap_or_else(|| default_amount(pair.from, pair.to));
        Self {
            from: pair.from,
            to: pair.to,
            display_amount,
            rate,
            explicit_amount: pair.amount.is_some(),
        }
    }

    #[must_use]
    pub fn value(&self) -> f64 {
        self.display_amount * self.rate
    }

    /// Sentence to speak
    #[must_use]
    pub fn spoken(&self) -> String {
        let (from, to) = (self.from, self.to);
        if self.explicit_amount {
            format!("{:.2} {from} is {:.2} {to}.", self.display_amount, self.value())
        } else if (self.display_amount - 1.0).abs() < f64::EPSILON {
            format!("One {from} is {:.4} {to}.", self.rate)
        } else {
            format!("{} {from} is {:.2} {to}.", self.display_amount, self.value())
        }
    }
}

fn default_amount(from: CurrencyCode, to: CurrencyCode) -> f64 {
    use CurrencyCode::{Jpy, Krw};

    if matches!((from, to), (Krw, Jpy) | (Jpy, Krw)) {
        100.0
    } else {
        1.0
    }
}

enum QuoteFailure {
    Unsupported,
    Fetch(crate::Error),
}

/// Answers currency conversion queries
pub struct FxQueryHandler {
    resolver: CurrencyPairResolver,
    allowed: AllowedPairs,
    rates: Arc<dyn RateProvider>,
    speaker: Arc<dyn Speaker>,
}

impl FxQueryHandler {
    #[must_use]
    pub fn new(rates: Arc<dyn RateProvider>, speaker: Arc<dyn Speaker>) -> Self {
        Self {
            resolver: CurrencyPairResolver::default(),
            allowed: AllowedPairs::default(),
            rates,
            speaker,
        }
    }

    /// Replace the allowed conversion directions
    #[must_use]
    pub fn with_allowed_pairs(mut self, allowed: AllowedPairs) -> Self {
        self.allowed = allowed;
        self
    }

    /// Compute the reply for `query` without speaking it
    ///
    /// The connector rule is tried first. If it resolves a pair whose fetch
    /// fails, the free-form rule gets one more attempt on the same query.
    pub async fn answer(&self, query: &str) -> String {
        let mut connector_fetch_failed = false;

        if let Some(pair) = self.resolver.resolve_connector(query) {
            tracing::debug!(from = %pair.from, to = %pair.to, amount = ?pair.amount, "connector pair");
            match self.quote(&pair).await {
                Ok(quote) => return quote.spoken(),
                Err(QuoteFailure::Unsupported) => return UNSUPPORTED.to_string(),
                Err(QuoteFailure::Fetch(e)) => {
                    tracing::warn!(error = %e, "connector pair fetch failed, trying free-form");
                    connector_fetch_failed = true;
                }
            }
        }

        if let Some(pair) = self.resolver.resolve_free_form(query) {
            tracing::debug!(from = %pair.from, to = %pair.to, amount = ?pair.amount, "free-form pair");
            return match self.quote(&pair).await {
                Ok(quote) => quote.spoken(),
                Err(QuoteFailure::Unsupported) => UNSUPPORTED.to_string(),
                Err(QuoteFailure::Fetch(e)) => {
                    tracing::warn!(error = %e, "free-form pair fetch failed");
                    FETCH_FAILED.to_string()
                }
            };
        }

        if connector_fetch_failed {
            FETCH_FAILED.to_string()
        } else {
            tracing::info!(query, "no currency pair recognized");
            GUIDANCE.to_string()
        }
    }

    /// Validate and price a pair with one provider call
    async fn quote(&self, pair: &PairResolution) -> std::result::Result<Quote, QuoteFailure> {
        let direction = self
            .allowed
            .check(pair.from, pair.to)
            .ok_or(QuoteFailure::Unsupported)?;

        let rate = match direction {
            PairDirection::AsSpoken => self
                .rates
                .fetch_rate(pair.from, pair.to)
                .await
                .map_err(QuoteFailure::Fetch)?,
            PairDirection::Reversed => {
                tracing::debug!(from = %pair.from, to = %pair.to, "pair allowed reversed");
                let reverse = self
                    .rates
                    .fetch_rate(pair.to, pair.from)
                    .await
                    .map_err(QuoteFailure::Fetch)?;
                if reverse <= 0.0 || !reverse.is_finite() {
                    return Err(QuoteFailure::Fetch(crate::Error::Provider(format!(
                        "cannot invert rate {reverse}"
                    ))));
                }
                1.0 / reverse
            }
        };

        Ok(Quote::new(pair, rate))
    }
}

#[async_trait]
impl DomainHandler for FxQueryHandler {
    async fn handle(&self, query: &str) -> Result<()> {
        let reply = self.answer(query).await;
        self.speaker.speak(&reply).await
    }
}
