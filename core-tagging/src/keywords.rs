//! Local keyword extraction by term frequency.

use crate::document::KeywordExtractor;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

const DEFAULT_MAX_KEYWORDS: usize = 10;
const MIN_WORD_LENGTH: usize = 3;

const STOP_WORDS: &[&str] = &[
    "about", "after", "all", "also", "and", "any", "are", "because", "been", "before", "being",
    "but", "can", "could", "did", "does", "for", "from", "had", "has", "have", "her", "here",
    "him", "his", "how", "into", "its", "just", "more", "most", "not", "now", "only", "other",
    "our", "out", "over", "she", "should", "some", "such", "than", "that", "the", "their",
    "them", "then", "there", "these", "they", "this", "those", "through", "too", "under",
    "very", "was", "were", "what", "when", "where", "which", "while", "who", "why", "will",
    "with", "would", "you", "your",
];

/// Ranks words by occurrence count, ties broken by first appearance.
#[derive(Debug, Clone)]
pub struct FrequencyKeywordExtractor {
    max_keywords: usize,
}

impl FrequencyKeywordExtractor {
    pub fn new(max_keywords: usize) -> Self {
        Self { max_keywords }
    }

    pub fn keywords(&self, text: &str) -> Vec<String> {
        // word -> (count, first position)
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();

        let words = text
            .split(|c: char| !c.is_alphanumeric())
            .map(str::to_lowercase)
            .filter(|word| word.chars().count() >= MIN_WORD_LENGTH)
            .filter(|word| !word.chars().all(|c| c.is_ascii_digit()))
            .filter(|word| !STOP_WORDS.contains(&word.as_str()));

        for (position, word) in words.enumerate() {
            counts.entry(word).or_insert((0, position)).0 += 1;
        }

        let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
        ranked.sort_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_b.cmp(count_a).then(first_a.cmp(first_b))
        });

        ranked
            .into_iter()
            .take(self.max_keywords)
            .map(|(word, _)| word)
            .collect()
    }
}

impl Default for FrequencyKeywordExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_KEYWORDS)
    }
}

#[async_trait]
impl KeywordExtractor for FrequencyKeywordExtractor {
    async fn extract_keywords(&self, text: &str) -> Result<Vec<String>> {
        Ok(self.keywords(text))
    }
}
