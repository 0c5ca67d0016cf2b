//! Recognition-biasing hints derived from the target sentence.
//!
//! Hints bias a later attempt towards the expected vocabulary; they never
//! override what the recognizer hears.

use crate::normalize::tokenize_words;
use std::collections::HashSet;

/// Hotword candidates shorter than this are skipped.
pub const MIN_HOTWORD_LEN: usize = 4;

/// Maximum number of hotwords forwarded to the recognizer.
pub const MAX_HOTWORDS: usize = 12;

/// Titles longer than this (in characters) are truncated in the prompt.
pub const MAX_TITLE_CHARS: usize = 120;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "get", "got", "had",
    "has", "have", "he", "her", "here", "hers", "him", "his", "how", "i", "if", "in", "is", "it",
    "its", "me", "my", "of", "on", "or", "our", "ours", "she", "so", "than", "that", "the",
    "their", "them", "there", "these", "they", "this", "to", "too", "us", "was", "we", "were",
    "what", "when", "where", "which", "who", "why", "with", "you", "your", "yours",
];

/// Hotwords and initial prompt for a biased attempt.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Hints {
    /// Space-separated hotword list
    pub hotwords: Option<String>,
    /// Short context sentence for the decoder
    pub initial_prompt: Option<String>,
}

impl Hints {
    pub fn build(target_text: &str, title: Option<&str>) -> Self {
        Self {
            hotwords: build_hotwords(target_text, title),
            initial_prompt: build_initial_prompt(title),
        }
    }

    /// Whether there is anything to bias with.
    pub fn is_derivable(&self) -> bool {
        self.hotwords.is_some() || self.initial_prompt.is_some()
    }
}

/// Deduplicated content words from title then target, in first-seen order.
pub fn build_hotwords(target_text: &str, title: Option<&str>) -> Option<String> {
    let title_words = title.map(|t| tokenize_words(t.trim())).unwrap_or_default();
    let target_words = tokenize_words(target_text);

    let mut seen = HashSet::new();
    let unique: Vec<String> = title_words
        .into_iter()
        .chain(target_words)
        .filter(|w| w.len() >= MIN_HOTWORD_LEN && !STOPWORDS.contains(&w.as_str()))
        .filter(|w| seen.insert(w.clone()))
        .take(MAX_HOTWORDS)
        .collect();

    if unique.is_empty() {
        return None;
    }
    Some(unique.join(" "))
}

pub fn build_initial_prompt(title: Option<&str>) -> Option<String> {
    let title = title.map(str::trim).filter(|t| !t.is_empty())?;
    let title: String = title.chars().take(MAX_TITLE_CHARS).collect();
    Some(format!("English shadowing exercise. Topic: {title}."))
}
