//! Domain classification
//!
//! Precedence is fixed: currency keywords or the currency-mention heuristic,
//! then weather keywords, else unknown. Place names double as currency
//! aliases (`japan`, `canada`), so "weather in japan" is a currency query.

use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;

use crate::slots::currency::currency_tokens;
use crate::slots::{AliasTable, CurrencyCode, CurrencyPairResolver, WeatherSlotExtractor};

static FX_INTENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(exchange(?:\s+rate)?|currency|fx|rate|rates)\b").expect("valid regex")
});

static WEATHER_INTENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(weather|temperature|forecast)\b").expect("valid regex"));

/// Connectors that make a single currency mention look like a conversion
const CONNECTORS: &[&str] = &["to", "in", "into"];

/// Domain an utterance belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Weather,
    Fx,
    Unknown,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Weather => "weather",
            Self::Fx => "fx",
            Self::Unknown => "unknown",
        })
    }
}

/// Slot-filled view of an utterance
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "domain", rename_all = "lowercase")]
pub enum Intent {
    Weather {
        city: Option<String>,
        when: Option<NaiveDate>,
        raw_query: String,
    },
    Fx {
        from: CurrencyCode,
        to: CurrencyCode,
        amount: Option<f64>,
    },
    Unknown {
        raw_query: String,
    },
}

/// Keyword and heuristic domain classifier
#[derive(Debug)]
pub struct IntentClassifier {
    aliases: &'static AliasTable,
    resolver: CurrencyPairResolver,
    weather: WeatherSlotExtractor,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new(AliasTable::standard())
    }
}

impl IntentClassifier {
    #[must_use]
    pub fn new(aliases: &'static AliasTable) -> Self {
        Self {
            aliases,
            resolver: CurrencyPairResolver::new(aliases),
            weather: WeatherSlotExtractor::default(),
        }
    }

    /// Assign a domain
    #[must_use]
    pub fn classify(&self, text: &str) -> Domain {
        if FX_INTENT.is_match(text) || self.looks_like_fx(text) {
            Domain::Fx
        } else if WEATHER_INTENT.is_match(text) {
            Domain::Weather
        } else {
            Domain::Unknown
        }
    }

    /// Whether the utterance carries any domain signal
    ///
    /// Relevant utterances pass the short-utterance filter and wake the
    /// assistant implicitly.
    #[must_use]
    pub fn is_relevant(&self, text: &str) -> bool {
        self.classify(text) != Domain::Unknown
    }

    /// Currency mentions without an explicit keyword
    ///
    /// Two distinct currencies, or a connector plus at least one currency.
    #[must_use]
    pub fn looks_like_fx(&self, text: &str) -> bool {
        let tokens = currency_tokens(text);
        let codes = self.aliases.distinct_codes(&tokens);
        let has_connector = tokens.iter().any(|t| CONNECTORS.contains(&t.as_str()));

        codes.len() >= 2 || (has_connector && !codes.is_empty())
    }

    /// Drop leading noise before the first domain keyword
    #[must_use]
    pub fn slice_from_keyword<'a>(&self, text: &'a str) -> &'a str {
        FX_INTENT
            .find(text)
            .or_else(|| WEATHER_INTENT.find(text))
            .map_or(text, |m| &text[m.start()..])
    }

    /// Classify and fill slots
    ///
    /// A currency utterance whose pair cannot be resolved yields
    /// [`Intent::Unknown`]; the router still hands it to the fx handler,
    /// which answers with spoken guidance.
    #[must_use]
    pub fn parse(&self, text: &str, today: NaiveDate) -> Intent {
        match self.classify(text) {
            Domain::Weather => {
                let slots = self.weather.extract(text);
                Intent::Weather {
                    city: slots.city,
                    when: slots.when.map(|w| w.resolve(today)),
                    raw_query: text.to_string(),
                }
            }
            Domain::Fx => self.resolver.resolve(text).map_or_else(
                || Intent::Unknown {
                    raw_query: text.to_string(),
                },
                |pair| Intent::Fx {
                    from: pair.from,
                    to: pair.to,
                    amount: pair.amount,
                },
            ),
            Domain::Unknown => Intent::Unknown {
                raw_query: text.to_string(),
            },
        }
    }

    /// Weather slot extractor shared with the router
    #[must_use]
    pub const fn weather_slots(&self) -> &WeatherSlotExtractor {
        &self.weather
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> IntentClassifier {
        IntentClassifier::default()
    }

    #[test]
    fn test_keyword_precedence() {
        let c = classifier();
        assert_eq!(c.classify("exchange rate for yen"), Domain::Fx);
        assert_eq!(c.classify("weather in toronto"), Domain::Weather);
        assert_eq!(c.classify("currency forecast"), Domain::Fx);
        assert_eq!(c.classify("what time is it"), Domain::Unknown);
    }

    #[test]
    fn test_fx_heuristic() {
        let c = classifier();
        assert_eq!(c.classify("won usd"), Domain::Fx);
        assert_eq!(c.classify("100 yen to"), Domain::Fx);
        assert_eq!(c.classify("how much is yen"), Domain::Unknown);
    }

    #[test]
    fn test_currency_mentions_outrank_weather_keywords() {
        let c = classifier();
        assert_eq!(c.classify("weather in japan"), Domain::Fx);
        assert_eq!(c.classify("forecast for canada"), Domain::Fx);
        assert_eq!(c.classify("weather won yen"), Domain::Fx);
        assert_eq!(c.classify("weather in busan"), Domain::Weather);
    }

    #[test]
    fn test_keywords_are_whole_words() {
        let c = classifier();
        assert_eq!(c.classify("the ratepayer said hi"), Domain::Unknown);
        assert_eq!(c.classify("weatherman on tv"), Domain::Unknown);
    }

    #[test]
    fn test_slice_from_keyword() {
        let c = classifier();
        assert_eq!(
            c.slice_from_keyword("um okay exchange rate won to usd"),
            "exchange rate won to usd"
        );
        assert_eq!(c.slice_from_keyword("so the weather in seoul"), "weather in seoul");
        assert_eq!(c.slice_from_keyword("won to usd"), "won to usd");
    }

    #[test]
    fn test_parse_intents() {
        let c = classifier();
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();

        assert_eq!(
            c.parse("1000 won to cad", today),
            Intent::Fx {
                from: CurrencyCode::Krw,
                to: CurrencyCode::Cad,
                amount: Some(1000.0),
            }
        );
        assert_eq!(
            c.parse("weather in busan tomorrow", today),
            Intent::Weather {
                city: Some("busan".to_string()),
                when: NaiveDate::from_ymd_opt(2026, 10, 17),
                raw_query: "weather in busan tomorrow".to_string(),
            }
        );
        assert!(matches!(c.parse("exchange rate", today), Intent::Unknown { .. }));
    }
}
