//! Wake and sleep phrase matching
//!
//! Phrases are matched as utterance prefixes, longest phrase first, and only
//! at a word boundary: `hey therefore` does not match `hey there`.

use super::normalize::normalize;

/// A phrase matched at the start of an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhraseMatch<'a> {
    /// The configured phrase that matched
    pub phrase: &'a str,
    /// Utterance remainder with leading separators removed
    pub rest: &'a str,
}

/// Prefix matcher over a fixed set of phrases
#[derive(Debug, Clone)]
pub struct PhraseMatcher {
    phrases: Vec<String>,
}

impl PhraseMatcher {
    /// Build a matcher, normalizing every phrase and ordering longest first
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut phrases: Vec<String> = phrases
            .into_iter()
            .map(|p| normalize(p.as_ref()))
            .filter(|p| !p.is_empty())
            .collect();
        phrases.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        phrases.dedup();

        tracing::debug!(phrases = ?phrases, "phrase matcher initialized");

        Self { phrases }
    }

    /// Match a configured phrase at the start of `text`
    #[must_use]
    pub fn match_prefix<'a>(&'a self, text: &'a str) -> Option<PhraseMatch<'a>> {
        self.phrases.iter().find_map(|phrase| {
            let tail = text.strip_prefix(phrase.as_str())?;
            if tail.chars().next().is_some_and(char::is_alphanumeric) {
                return None;
            }
            Some(PhraseMatch {
                phrase,
                rest: tail.trim_start_matches(is_separator),
            })
        })
    }

    /// Whether `text` starts with (or equals) a configured phrase
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        self.match_prefix(text).is_some()
    }

    /// Remove a leading phrase, if any
    #[must_use]
    pub fn strip<'a>(&'a self, text: &'a str) -> &'a str {
        self.match_prefix(text).map_or(text, |m| m.rest)
    }

    /// Configured phrases, longest first
    #[must_use]
    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | '.' | '!' | '?' | ';' | ':' | '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wake() -> PhraseMatcher {
        PhraseMatcher::new(["hey there", "hello there", "hey"])
    }

    #[test]
    fn test_word_boundary() {
        let m = wake();
        assert!(m.match_prefix("hey therefore").is_some_and(|m| m.phrase == "hey"));
        assert!(PhraseMatcher::new(["hey there"]).match_prefix("hey therefore").is_none());

        let hit = m.match_prefix("hey there weather").unwrap();
        assert_eq!(hit.phrase, "hey there");
        assert_eq!(hit.rest, "weather");
    }

    #[test]
    fn test_longest_match_first() {
        let m = wake();
        assert_eq!(m.phrases()[0].len(), "hello there".len());
        assert_eq!(m.match_prefix("hey there").unwrap().phrase, "hey there");
    }

    #[test]
    fn test_strip_separators() {
        let m = wake();
        assert_eq!(m.strip("hey there, what's up"), "what's up");
        assert_eq!(m.strip("hey there"), "");
        assert_eq!(m.strip("weather today"), "weather today");
    }

    #[test]
    fn test_phrases_are_normalized() {
        let m = PhraseMatcher::new(["  Go To SLEEP! ", "", "sleep"]);
        assert_eq!(m.phrases(), &["go to sleep", "sleep"]);
        assert!(m.matches("go to sleep now"));
        assert!(!m.matches("sleepy"));
    }
}
