//! Currency pair resolution
//!
//! Two rules run in order over the utterance tokens:
//!
//! 1. [`ConnectorPairRule`]: `[amount] [from] <currency> to|in|into|->|→ <currency>`
//! 2. [`FreeFormPairRule`]: collects every currency mention and infers the
//!    pair from their order, for utterances where the recognizer dropped or
//!    never heard a connector (`"exchange kor usd"`).
//!
//! Validation against [`AllowedPairs`] happens after resolution.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::Serialize;

use super::{SlotRule, SlotSet, parse_number, tokenize};
use crate::Error;

/// Currencies the router can quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CurrencyCode {
    Krw,
    Jpy,
    Usd,
    Cad,
}

impl CurrencyCode {
    /// All supported codes
    pub const ALL: [Self; 4] = [Self::Krw, Self::Jpy, Self::Usd, Self::Cad];

    /// ISO 4217 code
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Krw => "KRW",
            Self::Jpy => "JPY",
            Self::Usd => "USD",
            Self::Cad => "CAD",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurrencyCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|code| code.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::Provider(format!("unknown currency code: {s}")))
    }
}

/// Spoken names that map to a currency
const ALIASES: &[(&str, CurrencyCode)] = &[
    ("kor", CurrencyCode::Krw),
    ("krw", CurrencyCode::Krw),
    ("won", CurrencyCode::Krw),
    ("korean", CurrencyCode::Krw),
    ("korea", CurrencyCode::Krw),
    ("jp", CurrencyCode::Jpy),
    ("jpy", CurrencyCode::Jpy),
    ("yen", CurrencyCode::Jpy),
    ("japanese", CurrencyCode::Jpy),
    ("japan", CurrencyCode::Jpy),
    ("usd", CurrencyCode::Usd),
    ("dollar", CurrencyCode::Usd),
    ("dollars", CurrencyCode::Usd),
    ("us", CurrencyCode::Usd),
    ("america", CurrencyCode::Usd),
    ("american", CurrencyCode::Usd),
    ("cad", CurrencyCode::Cad),
    ("canadian", CurrencyCode::Cad),
    ("canada", CurrencyCode::Cad),
];

/// Two-word currency names collapsed to a single code token before matching
const COMPOUNDS: &[(&str, &str, &str)] = &[
    ("canadian", "dollar", "cad"),
    ("canadian", "dollars", "cad"),
    ("us", "dollar", "usd"),
    ("us", "dollars", "usd"),
    ("american", "dollar", "usd"),
    ("american", "dollars", "usd"),
    ("japanese", "yen", "jpy"),
    ("korean", "won", "krw"),
];

/// Known recognizer slips, matched as token prefixes
const MISRECOGNITIONS: &[(&str, &str)] = &[
    ("corea", "korea"),
    ("career", "korea"),
    ("kore", "korea"),
    ("japa", "japan"),
    ("canad", "canada"),
    ("americ", "america"),
];

/// Connective nouns that never name a currency
const FILLERS: &[&str] = &["currency", "exchange", "rate", "rates", "hello", "there", "the"];

/// Word connectors used by the free-form rule
const CONNECTORS: &[&str] = &["to", "in", "into"];

/// All connectors accepted by the connector rule
const CONNECTOR_TOKENS: &[&str] = &["to", "in", "into", "->", "→"];

static STANDARD_ALIASES: LazyLock<AliasTable> =
    LazyLock::new(|| AliasTable::new(ALIASES.iter().copied()));

/// Lower-case token to currency lookup
#[derive(Debug, Clone)]
pub struct AliasTable {
    aliases: HashMap<String, CurrencyCode>,
}

impl AliasTable {
    /// Build a table from `(alias, code)` entries
    pub fn new<'a>(entries: impl IntoIterator<Item = (&'a str, CurrencyCode)>) -> Self {
        Self {
            aliases: entries
                .into_iter()
                .map(|(alias, code)| (alias.to_lowercase(), code))
                .collect(),
        }
    }

    /// The built-in table
    #[must_use]
    pub fn standard() -> &'static Self {
        &STANDARD_ALIASES
    }

    /// Resolve a token; bare ISO codes are accepted even without an alias
    #[must_use]
    pub fn lookup(&self, token: &str) -> Option<CurrencyCode> {
        let lowered = token.trim().to_lowercase();
        self.aliases
            .get(&lowered)
            .copied()
            .or_else(|| lowered.parse().ok())
    }

    /// Distinct currencies mentioned in `tokens`
    #[must_use]
    pub fn distinct_codes(&self, tokens: &[String]) -> HashSet<CurrencyCode> {
        tokens.iter().filter_map(|t| self.lookup(t)).collect()
    }
}

/// Replace a token with its intended form when it starts with a known slip
#[must_use]
pub fn correct_misrecognition(token: &str) -> &str {
    MISRECOGNITIONS
        .iter()
        .find(|(prefix, _)| token.starts_with(prefix))
        .map_or(token, |(_, fixed)| *fixed)
}

/// Merge two-word currency names into their code
#[must_use]
pub fn collapse_compounds(tokens: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let compound = tokens.get(i + 1).and_then(|next| {
            COMPOUNDS
                .iter()
                .find(|(first, second, _)| tokens[i] == *first && next == second)
        });
        if let Some((_, _, code)) = compound {
            out.push((*code).to_string());
            i += 2;
        } else {
            out.push(tokens[i].clone());
            i += 1;
        }
    }
    out
}

/// Tokens ready for the pair rules
#[must_use]
pub fn currency_tokens(text: &str) -> Vec<String> {
    collapse_compounds(&tokenize(text))
}

fn is_currency_shaped(token: &str) -> bool {
    (2..=12).contains(&token.len()) && token.chars().all(|c| c.is_ascii_alphabetic())
}

/// `[amount] [from] <currency> <connector> <currency>`
#[derive(Debug, Clone)]
pub struct ConnectorPairRule {
    aliases: &'static AliasTable,
}

impl ConnectorPairRule {
    #[must_use]
    pub const fn new(aliases: &'static AliasTable) -> Self {
        Self { aliases }
    }

    /// Leftmost connector flanked by two word tokens, resolved or not
    fn find_shape<'t>(tokens: &'t [String]) -> Option<(usize, &'t str, &'t str)> {
        (1..tokens.len().saturating_sub(1)).find_map(|i| {
            if !CONNECTOR_TOKENS.contains(&tokens[i].as_str()) {
                return None;
            }
            let (from, to) = (tokens[i - 1].as_str(), tokens[i + 1].as_str());
            (is_currency_shaped(from) && is_currency_shaped(to)).then_some((i - 1, from, to))
        })
    }
}

impl SlotRule for ConnectorPairRule {
    fn name(&self) -> &'static str {
        "connector"
    }

    fn try_match(&self, tokens: &[String]) -> Option<SlotSet> {
        let (from_idx, from_tok, to_tok) = Self::find_shape(tokens)?;

        let (Some(from), Some(to)) = (self.aliases.lookup(from_tok), self.aliases.lookup(to_tok))
        else {
            tracing::debug!(from = from_tok, to = to_tok, "connector tokens are not currencies");
            return None;
        };

        let mut marker = from_idx;
        if marker >= 1 && tokens[marker - 1] == "from" {
            marker -= 1;
        }
        let amount = marker
            .checked_sub(1)
            .and_then(|i| parse_number(&tokens[i]));

        Some(SlotSet {
            from: Some(from),
            to: Some(to),
            amount,
            ..SlotSet::default()
        })
    }
}

/// Order-based inference over every currency mention
#[derive(Debug, Clone)]
pub struct FreeFormPairRule {
    aliases: &'static AliasTable,
}

impl FreeFormPairRule {
    #[must_use]
    pub const fn new(aliases: &'static AliasTable) -> Self {
        Self { aliases }
    }

    /// `(position, code)` for every currency mention, in utterance order
    fn mentions(&self, tokens: &[String]) -> Vec<(usize, CurrencyCode)> {
        tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| !FILLERS.contains(&t.as_str()))
            .filter_map(|(i, t)| {
                self.aliases
                    .lookup(correct_misrecognition(t))
                    .map(|code| (i, code))
            })
            .collect()
    }
}

/// Last two distinct codes, in utterance order
fn last_two_distinct(mentions: &[(usize, CurrencyCode)]) -> Option<(CurrencyCode, CurrencyCode)> {
    let (_, last) = *mentions.last()?;
    let before = mentions
        .iter()
        .rev()
        .map(|(_, code)| *code)
        .find(|code| *code != last)?;
    Some((before, last))
}

impl SlotRule for FreeFormPairRule {
    fn name(&self) -> &'static str {
        "free-form"
    }

    fn try_match(&self, tokens: &[String]) -> Option<SlotSet> {
        let mentions = self.mentions(tokens);

        let around_connector = tokens
            .iter()
            .position(|t| CONNECTORS.contains(&t.as_str()))
            .and_then(|conn| {
                let left = mentions.iter().rev().find(|(i, _)| *i < conn)?.1;
                let right = mentions.iter().find(|(i, _)| *i > conn)?.1;
                Some((left, right))
            });

        let (from, to) = around_connector.or_else(|| last_two_distinct(&mentions))?;
        let amount = tokens.iter().find_map(|t| parse_number(t));

        Some(SlotSet {
            from: Some(from),
            to: Some(to),
            amount,
            ..SlotSet::default()
        })
    }
}

/// Which rule produced a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionPath {
    Connector,
    FreeForm,
}

/// A currency pair as spoken, with an optional amount
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PairResolution {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    pub amount: Option<f64>,
    pub path: ResolutionPath,
}

impl PairResolution {
    fn from_slots(slots: &SlotSet, path: ResolutionPath) -> Option<Self> {
        Some(Self {
            from: slots.from?,
            to: slots.to?,
            amount: slots.amount,
            path,
        })
    }
}

/// Two-stage currency pair resolver
#[derive(Debug, Clone)]
pub struct CurrencyPairResolver {
    connector: ConnectorPairRule,
    free_form: FreeFormPairRule,
}

impl Default for CurrencyPairResolver {
    fn default() -> Self {
        Self::new(AliasTable::standard())
    }
}

impl CurrencyPairResolver {
    #[must_use]
    pub const fn new(aliases: &'static AliasTable) -> Self {
        Self {
            connector: ConnectorPairRule::new(aliases),
            free_form: FreeFormPairRule::new(aliases),
        }
    }

    /// Connector rule first, free-form rule second
    #[must_use]
    pub fn resolve(&self, text: &str) -> Option<PairResolution> {
        let tokens = currency_tokens(text);
        self.resolve_connector_tokens(&tokens)
            .or_else(|| self.resolve_free_form_tokens(&tokens))
    }

    /// Connector rule only
    #[must_use]
    pub fn resolve_connector(&self, text: &str) -> Option<PairResolution> {
        self.resolve_connector_tokens(&currency_tokens(text))
    }

    /// Free-form rule only
    #[must_use]
    pub fn resolve_free_form(&self, text: &str) -> Option<PairResolution> {
        self.resolve_free_form_tokens(&currency_tokens(text))
    }

    fn resolve_connector_tokens(&self, tokens: &[String]) -> Option<PairResolution> {
        let slots = self.connector.try_match(tokens)?;
        PairResolution::from_slots(&slots, ResolutionPath::Connector)
    }

    fn resolve_free_form_tokens(&self, tokens: &[String]) -> Option<PairResolution> {
        let slots = self.free_form.try_match(tokens)?;
        PairResolution::from_slots(&slots, ResolutionPath::FreeForm)
    }
}

/// How a requested pair relates to the allowed set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairDirection {
    /// The pair is allowed as spoken
    AsSpoken,
    /// Only the reverse direction is allowed
    Reversed,
}

/// Conversion directions the router is willing to quote
#[derive(Debug, Clone)]
pub struct AllowedPairs {
    pairs: HashSet<(CurrencyCode, CurrencyCode)>,
}

impl Default for AllowedPairs {
    fn default() -> Self {
        use CurrencyCode::{Cad, Jpy, Krw, Usd};

        Self::new([
            (Krw, Usd),
            (Krw, Cad),
            (Krw, Jpy),
            (Jpy, Cad),
            (Jpy, Usd),
            (Jpy, Krw),
            (Usd, Cad),
        ])
    }
}

impl AllowedPairs {
    pub fn new(pairs: impl IntoIterator<Item = (CurrencyCode, CurrencyCode)>) -> Self {
        Self {
            pairs: pairs.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, from: CurrencyCode, to: CurrencyCode) -> bool {
        self.pairs.contains(&(from, to))
    }

    /// Check a pair, recovering with the reverse direction when only that one is allowed
    #[must_use]
    pub fn check(&self, from: CurrencyCode, to: CurrencyCode) -> Option<PairDirection> {
        if self.contains(from, to) {
            Some(PairDirection::AsSpoken)
        } else if self.contains(to, from) {
            Some(PairDirection::Reversed)
        } else {
            None
        }
    }
}
