//! Similarity-based scoring against a corpus snapshot.
//!
//! Where [`CitationVerifier`](crate::citation::CitationVerifier) asks whether a
//! quote occurs verbatim, the scores here ask whether a span is *similar
//! enough* to some run of corpus words: a window of the span's word count
//! slides over each document, and the span is grounded when any window reaches
//! the threshold. Claims are paraphrased, so this is the measure used for
//! novelty; session-level citation accuracy reuses it over quotes.
//!
//! Every scan is `O(spans * corpus words)`. That is fine for libraries of a
//! few dozen papers; an n-gram prefilter would be the next step for larger
//! corpora.

use serde::{Deserialize, Serialize};

use crate::corpus::Corpus;
use crate::similarity::{RatcliffObershelp, Similarity};

/// Thresholds for the session scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Minimum window similarity for a quote to count as accurate
    pub citation_threshold: f64,
    /// Minimum window similarity for a claim to count as grounded
    pub novelty_threshold: f64,
    /// A critique pair changed when `1 - similarity` exceeds this
    pub change_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            citation_threshold: 0.80,
            novelty_threshold: 0.80,
            change_threshold: 0.05,
        }
    }
}

/// Corpus documents split into lowercased words, computed once per scan.
struct WordCorpus<'a> {
    documents: Vec<(&'a str, Vec<String>)>,
}

impl<'a> WordCorpus<'a> {
    fn new(corpus: &'a Corpus) -> Self {
        let documents = corpus
            .iter()
            .map(|doc| {
                let words = doc
                    .text
                    .to_lowercase()
                    .split_whitespace()
                    .map(String::from)
                    .collect();
                (doc.id.as_str(), words)
            })
            .collect();
        Self { documents }
    }
}

/// Classifies spans as grounded or novel and computes the session scores.
#[derive(Debug, Clone, Default)]
pub struct NoveltyClassifier<S = RatcliffObershelp> {
    similarity: S,
    config: ScoringConfig,
}

impl NoveltyClassifier {
    /// Classifier with the default similarity and thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: ScoringConfig) -> Self {
        Self {
            similarity: RatcliffObershelp,
            config,
        }
    }
}

impl<S: Similarity> NoveltyClassifier<S> {
    /// Classifier backed by a custom similarity measure.
    pub fn with_similarity(similarity: S, config: ScoringConfig) -> Self {
        Self { similarity, config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Id of the first document with a window similar to `span`, if any.
    pub fn grounding_document<'c>(
        &self,
        span: &str,
        corpus: &'c Corpus,
        threshold: f64,
    ) -> Option<&'c str> {
        self.find_grounding(span, &WordCorpus::new(corpus), threshold)
    }

    /// Whether any corpus window reaches `threshold` similarity with `span`.
    pub fn is_grounded(&self, span: &str, corpus: &Corpus, threshold: f64) -> bool {
        self.grounding_document(span, corpus, threshold).is_some()
    }

    /// Fraction of `claims` not grounded in the corpus, rounded to 2 decimals.
    pub fn novel_claim_density(&self, claims: &[impl AsRef<str>], corpus: &Corpus) -> f64 {
        let words = WordCorpus::new(corpus);
        let novel = claims
            .iter()
            .filter(|claim| {
                self.find_grounding(claim.as_ref(), &words, self.config.novelty_threshold)
                    .is_none()
            })
            .count();
        fraction(novel, claims.len())
    }

    /// Fraction of `quotes` grounded in the corpus, rounded to 2 decimals.
    pub fn citation_accuracy(&self, quotes: &[impl AsRef<str>], corpus: &Corpus) -> f64 {
        let words = WordCorpus::new(corpus);
        let matched = quotes
            .iter()
            .filter(|quote| {
                self.find_grounding(quote.as_ref(), &words, self.config.citation_threshold)
                    .is_some()
            })
            .count();
        fraction(matched, quotes.len())
    }

    /// Fraction of `(before, after)` pairs that materially changed.
    pub fn critique_change_rate(
        &self,
        pairs: &[(impl AsRef<str>, impl AsRef<str>)],
    ) -> f64 {
        let changed = pairs
            .iter()
            .filter(|(before, after)| {
                1.0 - self.similarity.similarity(before.as_ref(), after.as_ref())
                    > self.config.change_threshold
            })
            .count();
        fraction(changed, pairs.len())
    }

    fn find_grounding<'c>(
        &self,
        span: &str,
        corpus: &WordCorpus<'c>,
        threshold: f64,
    ) -> Option<&'c str> {
        let span_len = span.split_whitespace().count();
        if span_len == 0 {
            return None;
        }

        corpus.documents.iter().find_map(|(id, words)| {
            // A document shorter than the span is compared as a single window.
            let window_count = words.len().saturating_sub(span_len) + 1;
            (0..window_count)
                .any(|start| {
                    let end = (start + span_len).min(words.len());
                    let window = words[start..end].join(" ");
                    self.similarity.meets_threshold(span, &window, threshold)
                })
                .then_some(*id)
        })
    }
}

/// Novel-claim density with the default similarity.
pub fn compute_novel_claim_density(
    claims: &[impl AsRef<str>],
    corpus: &Corpus,
    threshold: f64,
) -> f64 {
    NoveltyClassifier::from_config(ScoringConfig {
        novelty_threshold: threshold,
        ..Default::default()
    })
    .novel_claim_density(claims, corpus)
}

/// Citation accuracy with the default similarity.
pub fn compute_citation_accuracy(
    quotes: &[impl AsRef<str>],
    corpus: &Corpus,
    threshold: f64,
) -> f64 {
    NoveltyClassifier::from_config(ScoringConfig {
        citation_threshold: threshold,
        ..Default::default()
    })
    .citation_accuracy(quotes, corpus)
}

/// Critique-change rate with the default similarity.
pub fn compute_critique_change_rate(
    pairs: &[(impl AsRef<str>, impl AsRef<str>)],
    change_threshold: f64,
) -> f64 {
    NoveltyClassifier::from_config(ScoringConfig {
        change_threshold,
        ..Default::default()
    })
    .critique_change_rate(pairs)
}

fn fraction(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(count as f64 / total as f64)
}

/// Round to 2 decimals, ties to even.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
