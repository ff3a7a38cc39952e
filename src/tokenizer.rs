use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;

use crate::error::{Error, Result};

lazy_static::lazy_static! {
    /// Fallback list used when no stopword file is supplied. Contractions are
    /// absent because punctuation is deleted before the stopword check.
    static ref DEFAULT_STOPWORDS: HashSet<&'static str> = {
        [
            "a", "about", "above", "after", "again", "against", "all", "am", "an", "and",
            "any", "are", "as", "at", "be", "because", "been", "before", "being", "below",
            "between", "both", "but", "by", "cannot", "could", "did", "do", "does", "doing",
            "down", "during", "each", "few", "for", "from", "further", "had", "has", "have",
            "having", "he", "her", "here", "hers", "herself", "him", "himself", "his", "how",
            "i", "if", "in", "into", "is", "it", "its", "itself", "me", "more", "most", "my",
            "myself", "no", "nor", "not", "of", "off", "on", "once", "only", "or", "other",
            "ought", "our", "ours", "ourselves", "out", "over", "own", "same", "she",
            "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
            "themselves", "then", "there", "these", "they", "this", "those", "through", "to",
            "too", "under", "until", "up", "very", "was", "we", "were", "what", "when",
            "where", "which", "while", "who", "whom", "why", "with", "would", "you", "your",
            "yours", "yourself", "yourselves",
        ]
        .iter()
        .copied()
        .collect()
    };
}

/// Text analysis pipeline: lowercase, strip punctuation, split, drop
/// stopwords, stem.
///
/// The stemmer and stopword set are fixed at construction; build one per
/// process and pass it down.
pub struct Tokenizer {
    stemmer: Stemmer,
    stopwords: HashSet<String>,
}

impl Tokenizer {
    pub fn new(stopwords: HashSet<String>) -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::English),
            stopwords,
        }
    }

    /// Tokenizer using the built-in English stopword list
    pub fn with_default_stopwords() -> Self {
        Self::new(
            DEFAULT_STOPWORDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }

    /// Lowercase and delete ASCII punctuation. Deletion, not substitution:
    /// "don't" becomes "dont" and "sci-fi" becomes "scifi".
    pub fn clean(text: &str) -> String {
        text.to_lowercase()
            .chars()
            .filter(|c| !c.is_ascii_punctuation())
            .collect()
    }

    /// Cleaned words with no stopword removal or stemming
    pub fn words(text: &str) -> Vec<String> {
        Self::clean(text)
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    /// Remove stopwords
    fn stopword_filter(&self, words: Vec<String>) -> Vec<String> {
        words
            .into_iter()
            .filter(|w| {
                let w = w.trim_end_matches('\n');
                !w.is_empty() && !self.stopwords.contains(w)
            })
            .collect()
    }

    /// Apply stemming
    fn stemmer_filter(&self, words: Vec<String>) -> Vec<String> {
        words
            .into_iter()
            .map(|w| self.stemmer.stem(&w).into_owned())
            .collect()
    }

    /// Full analysis pipeline. Duplicates and order are kept.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let words = Self::words(text);
        let words = self.stopword_filter(words);
        self.stemmer_filter(words)
    }

    /// Normalize a lookup key, which must yield exactly one term.
    pub fn single_term(&self, term: &str) -> Result<String> {
        let mut tokens = self.tokenize(term);
        if tokens.len() != 1 {
            return Err(Error::InvalidTerm {
                term: term.to_string(),
                tokens,
            });
        }
        Ok(tokens.remove(0))
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::with_default_stopwords()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stopwords(words: &[&str]) -> HashSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_empty_text() {
        let tokenizer = Tokenizer::default();
        assert!(tokenizer.tokenize("").is_empty());
        assert!(tokenizer.tokenize("   \n\t ").is_empty());
    }

    #[test]
    fn test_only_stopwords_and_punctuation() {
        let tokenizer = Tokenizer::new(stopwords(&["the", "a", "of"]));
        assert!(tokenizer.tokenize("The... a, OF!! -- ?").is_empty());
    }

    #[test]
    fn test_punctuation_is_deleted_not_split() {
        let tokenizer = Tokenizer::new(HashSet::new());
        assert_eq!(tokenizer.tokenize("don't"), vec!["dont"]);
        assert_eq!(Tokenizer::words("Hello,World! again"), vec!["helloworld", "again"]);
    }

    #[test]
    fn test_stopwords_checked_after_cleaning() {
        let tokenizer = Tokenizer::new(stopwords(&["the"]));
        assert_eq!(tokenizer.tokenize("THE, Matrix"), vec!["matrix"]);
    }

    #[test]
    fn test_stemming_and_duplicates_kept() {
        let tokenizer = Tokenizer::new(HashSet::new());
        assert_eq!(
            tokenizer.tokenize("Running cats run"),
            vec!["run", "cat", "run"]
        );
    }

    #[test]
    fn test_single_term() {
        let tokenizer = Tokenizer::new(stopwords(&["the"]));
        assert_eq!(tokenizer.single_term("Matrix").unwrap(), "matrix");
        assert_eq!(tokenizer.single_term("the matrix").unwrap(), "matrix");

        let err = tokenizer.single_term("matrix reloaded").unwrap_err();
        assert!(matches!(err, Error::InvalidTerm { ref tokens, .. } if tokens.len() == 2));

        let err = tokenizer.single_term("the").unwrap_err();
        assert!(matches!(err, Error::InvalidTerm { ref tokens, .. } if tokens.is_empty()));
    }
}
