//! Weather slot extraction: city and target date

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::Serialize;

use super::{SlotRule, SlotSet, first_match, tokenize};

/// Words that end a city phrase
const WEATHER_WORDS: &[&str] = &["weather", "forecast", "temperature"];

/// Words that can never begin a city name
const STOP_WORDS: &[&str] = &[
    "what", "whats", "how", "hows", "is", "are", "will", "be", "s", "the", "a", "an", "this",
    "that", "it", "its", "there", "my", "our", "your", "me", "us", "tell", "please", "pls",
    "thanks", "thank", "could", "can", "would", "you", "hey", "hello", "weather", "forecast",
    "temperature", "rain", "wind",
];

/// Words that terminate a city candidate after it started
const TRAILING_WORDS: &[&str] = &[
    "please", "pls", "thanks", "right", "like", "going", "and", "on", "at", "in", "for", "is",
    "will", "the", "a", "an", "this", "next", "day", "with", "weather", "forecast",
    "temperature",
];

/// Longest city phrase considered, in words
const MAX_CITY_WORDS: usize = 3;

const WEEKDAYS: [(&str, Weekday); 7] = [
    ("monday", Weekday::Mon),
    ("tuesday", Weekday::Tue),
    ("wednesday", Weekday::Wed),
    ("thursday", Weekday::Thu),
    ("friday", Weekday::Fri),
    ("saturday", Weekday::Sat),
    ("sunday", Weekday::Sun),
];

/// A relative date mentioned in a weather query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum When {
    Now,
    Today,
    Tomorrow,
    DayAfterTomorrow,
    Weekday(#[serde(serialize_with = "serialize_weekday")] Weekday),
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_weekday<S: serde::Serializer>(day: &Weekday, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&day.to_string())
}

impl When {
    /// Find the when-token in a token stream
    ///
    /// `day after tomorrow` wins over `tomorrow`, relative words win over
    /// weekday names.
    #[must_use]
    pub fn detect(tokens: &[String]) -> Option<Self> {
        let has = |word: &str| tokens.iter().any(|t| t == word);

        if tokens
            .windows(3)
            .any(|w| w[0] == "day" && w[1] == "after" && w[2] == "tomorrow")
        {
            return Some(Self::DayAfterTomorrow);
        }
        if has("tomorrow") {
            return Some(Self::Tomorrow);
        }
        if has("today") || has("tonight") {
            return Some(Self::Today);
        }
        if has("now") {
            return Some(Self::Now);
        }
        WEEKDAYS
            .iter()
            .find(|(name, _)| has(name))
            .map(|(_, day)| Self::Weekday(*day))
    }

    /// Concrete date, never in the past
    ///
    /// A weekday resolves to the nearest upcoming one, today included.
    #[must_use]
    pub fn resolve(self, today: NaiveDate) -> NaiveDate {
        let ahead = match self {
            Self::Now | Self::Today => 0,
            Self::Tomorrow => 1,
            Self::DayAfterTomorrow => 2,
            Self::Weekday(day) => {
                let target = day.num_days_from_monday();
                let current = today.weekday().num_days_from_monday();
                (7 + target - current) % 7
            }
        };
        today
            .checked_add_days(Days::new(u64::from(ahead)))
            .unwrap_or(today)
    }

    /// Spoken label for `resolved` relative to `today`
    #[must_use]
    pub fn label(self, today: NaiveDate) -> String {
        match self {
            Self::Now | Self::Today => "today".to_string(),
            Self::Tomorrow => "tomorrow".to_string(),
            Self::DayAfterTomorrow => "the day after tomorrow".to_string(),
            Self::Weekday(_) if self.resolve(today) == today => "today".to_string(),
            Self::Weekday(day) => WEEKDAYS
                .iter()
                .find(|(_, d)| *d == day)
                .map_or_else(|| day.to_string(), |(name, _)| (*name).to_string()),
        }
    }

    fn is_when_word(token: &str) -> bool {
        matches!(token, "now" | "today" | "tonight" | "tomorrow")
            || WEEKDAYS.iter().any(|(name, _)| *name == token)
    }
}

fn is_city_word(token: &str) -> bool {
    token.chars().all(char::is_alphabetic) && !When::is_when_word(token)
}

/// Collect a city phrase starting at `tokens[0]`
fn city_candidate(tokens: &[String]) -> Option<String> {
    let first = tokens.first()?;
    if STOP_WORDS.contains(&first.as_str()) || !is_city_word(first) {
        return None;
    }

    let words: Vec<&str> = tokens
        .iter()
        .map(String::as_str)
        .take_while(|t| is_city_word(t) && !TRAILING_WORDS.contains(t))
        .take(MAX_CITY_WORDS)
        .collect();

    (!words.is_empty()).then(|| words.join(" "))
}

/// `<city> weather|forecast` at the start of the utterance
#[derive(Debug, Clone, Copy, Default)]
pub struct LeadingCityRule;

impl SlotRule for LeadingCityRule {
    fn name(&self) -> &'static str {
        "leading-city"
    }

    fn try_match(&self, tokens: &[String]) -> Option<SlotSet> {
        let keyword = tokens
            .iter()
            .position(|t| matches!(t.as_str(), "weather" | "forecast"))?;
        if keyword == 0 || keyword > MAX_CITY_WORDS {
            return None;
        }

        let city = city_candidate(&tokens[..keyword])?;
        // the whole prefix must be the city, not a sentence
        if city.split(' ').count() != keyword {
            return None;
        }

        Some(SlotSet {
            city: Some(city),
            ..SlotSet::default()
        })
    }
}

/// `in|for|at <city>` anywhere in the utterance
#[derive(Debug, Clone, Copy, Default)]
pub struct PrepositionCityRule;

impl SlotRule for PrepositionCityRule {
    fn name(&self) -> &'static str {
        "preposition-city"
    }

    fn try_match(&self, tokens: &[String]) -> Option<SlotSet> {
        tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| matches!(t.as_str(), "in" | "for" | "at"))
            .find_map(|(i, _)| city_candidate(&tokens[i + 1..]))
            .map(|city| SlotSet {
                city: Some(city),
                ..SlotSet::default()
            })
    }
}

/// City and date slots of a weather query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WeatherSlots {
    pub city: Option<String>,
    pub when: Option<When>,
}

/// Ordered weather slot rules
pub struct WeatherSlotExtractor {
    city_rules: Vec<Box<dyn SlotRule>>,
}

impl Default for WeatherSlotExtractor {
    fn default() -> Self {
        Self {
            city_rules: vec![Box::new(LeadingCityRule), Box::new(PrepositionCityRule)],
        }
    }
}

impl std::fmt::Debug for WeatherSlotExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.city_rules.iter().map(|r| r.name()).collect();
        f.debug_struct("WeatherSlotExtractor")
            .field("city_rules", &names)
            .finish()
    }
}

impl WeatherSlotExtractor {
    /// Extract city and when-token; either may be absent
    #[must_use]
    pub fn extract(&self, text: &str) -> WeatherSlots {
        let tokens = tokenize(text);
        let city = first_match(&self.city_rules, &tokens).and_then(|(_, slots)| slots.city);

        WeatherSlots {
            city,
            when: When::detect(&tokens),
        }
    }

    /// Whether the utterance names a date or time at all
    #[must_use]
    pub fn has_when(&self, text: &str) -> bool {
        When::detect(&tokenize(text)).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> WeatherSlots {
        WeatherSlotExtractor::default().extract(text)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_leading_city() {
        assert_eq!(extract("toronto weather").city.as_deref(), Some("toronto"));
        assert_eq!(extract("new york forecast tomorrow").city.as_deref(), Some("new york"));
    }

    #[test]
    fn test_preposition_city() {
        assert_eq!(extract("weather in seoul").city.as_deref(), Some("seoul"));
        assert_eq!(
            extract("what s the weather in new york today please").city.as_deref(),
            Some("new york")
        );
        assert_eq!(
            extract("forecast for tomorrow in busan").city.as_deref(),
            Some("busan")
        );
        assert_eq!(
            extract("forecast for seoul the day after tomorrow").city.as_deref(),
            Some("seoul")
        );
    }

    #[test]
    fn test_stop_words_reject_city() {
        assert_eq!(extract("what is the weather").city, None);
        assert_eq!(extract("weather for the week").city, None);
        assert_eq!(extract("how is the weather today").city, None);
    }

    #[test]
    fn test_when_detection() {
        assert_eq!(extract("weather tomorrow").when, Some(When::Tomorrow));
        assert_eq!(
            extract("weather the day after tomorrow").when,
            Some(When::DayAfterTomorrow)
        );
        assert_eq!(extract("weather right now").when, Some(When::Now));
        assert_eq!(extract("weather on friday").when, Some(When::Weekday(Weekday::Fri)));
        assert_eq!(extract("weather in tokyo").when, None);
        assert!(WeatherSlotExtractor::default().has_when("sunday forecast"));
    }

    #[test]
    fn test_weekday_never_in_past() {
        // 2026-10-16 is a Friday
        let friday = date(2026, 10, 16);
        assert_eq!(When::Weekday(Weekday::Fri).resolve(friday), friday);
        assert_eq!(When::Weekday(Weekday::Thu).resolve(friday), date(2026, 10, 22));
        assert_eq!(When::Weekday(Weekday::Sat).resolve(friday), date(2026, 10, 17));

        for offset in 0..7 {
            let today = friday + Days::new(offset);
            let resolved = When::Weekday(Weekday::Fri).resolve(today);
            assert!(resolved >= today);
            assert!(resolved - today < chrono::TimeDelta::days(7));
            assert_eq!(resolved.weekday(), Weekday::Fri);
        }
    }

    #[test]
    fn test_relative_dates() {
        let today = date(2026, 12, 31);
        assert_eq!(When::Tomorrow.resolve(today), date(2027, 1, 1));
        assert_eq!(When::DayAfterTomorrow.resolve(today), date(2027, 1, 2));
        assert_eq!(When::Now.resolve(today), today);
    }

    #[test]
    fn test_labels() {
        let friday = date(2026, 10, 16);
        assert_eq!(When::Weekday(Weekday::Fri).label(friday), "today");
        assert_eq!(When::Weekday(Weekday::Mon).label(friday), "monday");
        assert_eq!(When::DayAfterTomorrow.label(friday), "the day after tomorrow");
    }
}
