//! Text normalization into comparable word tokens.

use regex::Regex;
use std::sync::LazyLock;

/// Alphanumeric run with at most one internal apostrophe group ("don't").
static WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[a-z0-9]+(?:'[a-z0-9]+)?").expect("word pattern is valid")
});

/// Split text into lowercase word tokens.
///
/// Punctuation and whitespace are dropped; an apostrophe is kept only between
/// two alphanumeric runs. Normalizing already-normalized text is a no-op.
pub fn tokenize_words(text: &str) -> Vec<String> {
    WORD_RE
        .find_iter(text)
        .map(|m| m.as_str().to_ascii_lowercase())
        .collect()
}

/// First token of a single recognizer word, if any.
pub fn normalize_word(word: &str) -> Option<String> {
    WORD_RE
        .find(word.trim())
        .map(|m| m.as_str().to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_punctuation_and_lowercases() {
        assert_eq!(
            tokenize_words("Hello, World! I want to BUY milk."),
            vec!["hello", "world", "i", "want", "to", "buy", "milk"]
        );
    }

    #[test]
    fn keeps_internal_apostrophes() {
        assert_eq!(tokenize_words("Don't stop 'em"), vec!["don't", "stop", "em"]);
        assert_eq!(tokenize_words("John's 90s"), vec!["john's", "90s"]);
    }

    #[test]
    fn normalizing_is_idempotent() {
        let once = tokenize_words("It's   twelve-thirty, isn't it?").join(" ");
        let twice = tokenize_words(&once).join(" ");
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_and_symbol_only_text_yields_nothing() {
        assert!(tokenize_words("").is_empty());
        assert!(tokenize_words(" -- ... !!").is_empty());
    }

    #[test]
    fn normalize_word_takes_first_token() {
        assert_eq!(normalize_word(" Milk."), Some("milk".to_string()));
        assert_eq!(normalize_word("ice-cream"), Some("ice".to_string()));
        assert_eq!(normalize_word("..."), None);
    }
}
