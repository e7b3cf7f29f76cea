//! Verbatim quote verification against a [`CorpusIndex`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::corpus::CorpusIndex;

/// Quote verification settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Search truncation-tolerant word windows instead of the whole quote
    pub fuzzy: bool,
    /// Quotes with fewer words are rejected outright
    pub min_words: usize,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            fuzzy: true,
            min_words: 3,
        }
    }
}

/// Outcome of verifying one quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// The quote as extracted
    pub quote: String,
    /// Document the quote was found in
    pub source_document: Option<String>,
}

impl VerificationResult {
    /// Whether the quote was found in the corpus.
    pub fn matched(&self) -> bool {
        self.source_document.is_some()
    }
}

/// Checks whether quoted spans occur in the indexed corpus.
///
/// Matching is substring search on lowercased text. In fuzzy mode a quote is
/// looked up through up to three word windows (first five words, first eight,
/// words three to seven) so that a quote the model truncated or padded at the
/// edges still verifies. Windows match across any run of whitespace in the
/// corpus, never across a document boundary.
#[derive(Debug, Clone, Default)]
pub struct CitationVerifier {
    config: VerifierConfig,
}

impl CitationVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: VerifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Id of the document containing `quote`, using the configured mode.
    pub fn verify<'i>(&self, quote: &str, index: &'i CorpusIndex) -> Option<&'i str> {
        self.verify_with(quote, index, self.config.fuzzy)
    }

    /// Id of the document containing `quote`, with an explicit fuzzy flag.
    ///
    /// When several windows match, the one occurring earliest in the global
    /// text decides the document.
    pub fn verify_with<'i>(
        &self,
        quote: &str,
        index: &'i CorpusIndex,
        fuzzy: bool,
    ) -> Option<&'i str> {
        let clean = quote.trim().to_lowercase();
        let words: Vec<&str> = clean.split_whitespace().collect();
        if words.len() < self.config.min_words {
            return None;
        }

        let offset = if fuzzy {
            find_windows(&search_windows(&words), index)
        } else {
            index.find(&clean)
        };

        offset.and_then(|offset| index.resolve_offset(offset))
    }

    /// Verify `quote` and wrap the outcome.
    pub fn check(&self, quote: &str, index: &CorpusIndex) -> VerificationResult {
        VerificationResult {
            quote: quote.to_string(),
            source_document: self.verify(quote, index).map(String::from),
        }
    }
}

/// Verify with default settings and the given mode.
pub fn verify<'i>(quote: &str, index: &'i CorpusIndex, fuzzy: bool) -> Option<&'i str> {
    CitationVerifier::new().verify_with(quote, index, fuzzy)
}

/// Candidate windows for fuzzy lookup, deduplicated in order.
fn search_windows<'w>(words: &[&'w str]) -> Vec<Vec<&'w str>> {
    if words.len() <= 3 {
        return Vec::new();
    }

    let mut windows = vec![words[..words.len().min(5)].to_vec()];
    if words.len() >= 8 {
        windows.push(words[..8].to_vec());
    }
    if words.len() >= 7 {
        windows.push(words[2..7].to_vec());
    }
    windows.dedup();
    windows
}

/// Earliest offset of any window in the index, any whitespace between words.
///
/// All windows go into one alternation; the leftmost match is the smallest
/// offset any single window would give.
fn find_windows(windows: &[Vec<&str>], index: &CorpusIndex) -> Option<usize> {
    if windows.is_empty() {
        return None;
    }

    let alternatives: Vec<String> = windows
        .iter()
        .map(|window| {
            let escaped: Vec<String> = window.iter().map(|w| regex::escape(w)).collect();
            format!("(?:{})", escaped.join(r"\s+"))
        })
        .collect();

    match Regex::new(&alternatives.join("|")) {
        Ok(pattern) => index.find_pattern(&pattern),
        Err(e) => {
            warn!(error = %e, "skipping unsearchable quote");
            None
        }
    }
}
