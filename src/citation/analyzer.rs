//! Per-response citation analysis and running totals.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::verifier::CitationVerifier;
use crate::corpus::CorpusIndex;
use crate::extract::QuoteExtractor;

const SPECULATION_TAGS: [&str; 2] = ["[SPECULATION]", "[THEORY]"];

/// Citation quality of a single agent response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationAnalysis {
    pub agent_id: String,
    /// Number of quotes extracted from the response
    pub quotes_found: usize,
    /// Verified quotes with the document each was found in
    pub verified: Vec<(String, String)>,
    pub unverified: Vec<String>,
    /// Response flags its own content as speculative
    pub has_speculation_tag: bool,
    /// `verified / quotes_found`, or 0 without quotes
    pub citation_rate: f64,
}

/// Running citation totals across responses.
///
/// Owned by whoever drives the session. Per-turn tallies can be built
/// independently and combined with [`merge`](Self::merge).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationTally {
    pub total_quotes_found: usize,
    pub verified_quotes: usize,
}

impl CitationTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one response's counts.
    pub fn record(&mut self, analysis: &CitationAnalysis) {
        self.total_quotes_found += analysis.quotes_found;
        self.verified_quotes += analysis.verified.len();
    }

    pub fn merge(&mut self, other: &CitationTally) {
        self.total_quotes_found += other.total_quotes_found;
        self.verified_quotes += other.verified_quotes;
    }

    /// Verified fraction, `None` before any quote was seen.
    pub fn rate(&self) -> Option<f64> {
        (self.total_quotes_found > 0)
            .then(|| self.verified_quotes as f64 / self.total_quotes_found as f64)
    }

    /// Human-readable summary line.
    pub fn stats(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CitationTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rate() {
            None => write!(f, "No quotes analyzed yet."),
            Some(rate) => write!(
                f,
                "Citation Rate: {}/{} ({:.1}% verified)",
                self.verified_quotes,
                self.total_quotes_found,
                rate * 100.0
            ),
        }
    }
}

/// Extracts and verifies the quotes in agent responses.
#[derive(Debug, Clone, Default)]
pub struct CitationAnalyzer {
    extractor: QuoteExtractor,
    verifier: CitationVerifier,
    tally: CitationTally,
}

impl CitationAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_components(extractor: QuoteExtractor, verifier: CitationVerifier) -> Self {
        Self {
            extractor,
            verifier,
            tally: CitationTally::new(),
        }
    }

    /// Analyze `text` without touching the running totals.
    pub fn analyze(&self, agent_id: &str, text: &str, index: &CorpusIndex) -> CitationAnalysis {
        let quotes = self.extractor.extract(text);
        let quotes_found = quotes.len();

        let mut verified = Vec::new();
        let mut unverified = Vec::new();
        for quote in quotes {
            match self.verifier.verify(&quote, index) {
                Some(document) => {
                    let document = document.to_string();
                    verified.push((quote, document));
                }
                None => unverified.push(quote),
            }
        }

        let upper = text.to_uppercase();
        let has_speculation_tag = SPECULATION_TAGS.iter().any(|tag| upper.contains(tag));

        let citation_rate = if quotes_found > 0 {
            verified.len() as f64 / quotes_found as f64
        } else {
            0.0
        };

        debug!(
            agent = agent_id,
            quotes = quotes_found,
            verified = verified.len(),
            "analyzed response citations"
        );

        CitationAnalysis {
            agent_id: agent_id.to_string(),
            quotes_found,
            verified,
            unverified,
            has_speculation_tag,
            citation_rate,
        }
    }

    /// Analyze `text` and add its counts to the running totals.
    pub fn analyze_response(
        &mut self,
        agent_id: &str,
        text: &str,
        index: &CorpusIndex,
    ) -> CitationAnalysis {
        let analysis = self.analyze(agent_id, text, index);
        self.tally.record(&analysis);
        analysis
    }

    pub fn tally(&self) -> &CitationTally {
        &self.tally
    }

    /// Summary of all responses analyzed so far.
    pub fn stats(&self) -> String {
        self.tally.stats()
    }
}
