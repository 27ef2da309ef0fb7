//! Transcript canonicalization

/// Canonicalize a raw transcript
///
/// Lower-cases, replaces non-word characters with a space and collapses runs
/// of whitespace. The replacement rule is narrowed for numbers so amounts
/// stay parseable: a comma between two digits is dropped (`1,000` → `1000`)
/// and a period between two digits is kept (`2.5`). Every other non-word
/// character becomes a space.
///
/// The result is a fixed point: `normalize(&normalize(x)) == normalize(x)`.
#[must_use]
pub fn normalize(raw: &str) -> String {
    let lowered: Vec<char> = raw.to_lowercase().chars().collect();
    let mut out = String::with_capacity(lowered.len());

    for (i, &c) in lowered.iter().enumerate() {
        if is_word_char(c) {
            out.push(c);
            continue;
        }

        let between_digits = i > 0
            && lowered[i - 1].is_ascii_digit()
            && lowered.get(i + 1).is_some_and(char::is_ascii_digit);

        match c {
            ',' if between_digits => {}
            '.' if between_digits => out.push('.'),
            _ => out.push(' '),
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Number of whitespace-separated words
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_punctuation_and_case() {
        assert_eq!(normalize("  Hey,  THERE!! "), "hey there");
        assert_eq!(normalize("What's the weather?"), "what s the weather");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in [
            "  Hey,  THERE!! ",
            "1,000 won -> CAD",
            "convert 2.5 dollars. to yen...",
            "\tmixed\nwhitespace  ",
            "",
        ] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn test_normalize_keeps_amounts() {
        assert_eq!(normalize("1,000 won to CAD"), "1000 won to cad");
        assert_eq!(normalize("2.5 USD in yen."), "2.5 usd in yen");
        assert_eq!(normalize("yen, 5"), "yen 5");
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("hey there"), 2);
        assert_eq!(word_count(""), 0);
    }
}
