//! Rule-based slot extraction
//!
//! Each extraction strategy is a [`SlotRule`] over the token stream of an
//! utterance. Rules are tried in a fixed priority order and the first rule
//! that produces a [`SlotSet`] wins.

pub mod currency;
pub mod weather;

use std::sync::LazyLock;

use regex::Regex;

pub use currency::{
    AliasTable, AllowedPairs, ConnectorPairRule, CurrencyCode, CurrencyPairResolver,
    FreeFormPairRule, PairDirection, PairResolution, ResolutionPath,
};
pub use weather::{LeadingCityRule, PrepositionCityRule, WeatherSlotExtractor, WeatherSlots, When};

/// Word, number and arrow tokens
static TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z]+|\d+(?:\.\d+)?|->|→").expect("valid regex"));

/// Structured values pulled out of an utterance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotSet {
    pub city: Option<String>,
    pub when: Option<When>,
    pub from: Option<CurrencyCode>,
    pub to: Option<CurrencyCode>,
    pub amount: Option<f64>,
}

/// One extraction strategy
pub trait SlotRule: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Try to extract slots from the token stream
    fn try_match(&self, tokens: &[String]) -> Option<SlotSet>;
}

/// Split text into lower-case words, numbers and arrow connectors
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_REGEX
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Parse a numeric token
#[must_use]
pub fn parse_number(token: &str) -> Option<f64> {
    if token.starts_with(|c: char| c.is_ascii_digit()) {
        token.parse().ok()
    } else {
        None
    }
}

/// Run rules in order, returning the first match and the rule that made it
#[must_use]
pub fn first_match<'r>(
    rules: &'r [Box<dyn SlotRule>],
    tokens: &[String],
) -> Option<(&'r str, SlotSet)> {
    rules.iter().find_map(|rule| {
        let slots = rule.try_match(tokens)?;
        tracing::trace!(rule = rule.name(), ?slots, "slot rule matched");
        Some((rule.name(), slots))
    })
}
