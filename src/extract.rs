//! Quote and claim extraction from agent output.
//!
//! Quotes are spans the agent presents as verbatim citations; they go to the
//! [`CitationVerifier`](crate::citation::CitationVerifier). Claims are
//! declarative sentences built around a causal or predictive phrase; they are
//! only used for novelty scoring.
//!
//! Claim detection is a recall-oriented heuristic, not a parser. It will pick
//! up some rhetorical sentences and miss claims phrased without one of the
//! indicator phrases; both are acceptable for session-level density metrics.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default claim-indicator fragments (regex syntax).
pub const DEFAULT_CLAIM_INDICATORS: [&str; 14] = [
    r"scales?\s+as",
    r"implies?\b",
    r"predicts?\b",
    r"suggests?\b",
    r"requires?\b",
    r"yields?\b",
    r"produces?\b",
    r"causes?\b",
    r"leads?\s+to",
    r"results?\s+in",
    r"means?\s+that",
    r"shows?\s+that",
    r"is\s+proportional",
    r"demonstrates?\b",
];

static DOUBLE_QUOTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]+)""#).expect("double quote pattern is valid"));
static SMART_DOUBLE_QUOTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("\u{201c}([^\u{201d}]+)\u{201d}").expect("smart double quote pattern is valid")
});

/// A run of non-terminators closed by one sentence terminator.
static SENTENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^.!?]+[.!?]").expect("sentence pattern is valid"));

static DEFAULT_CLAIM_RE: LazyLock<Regex> = LazyLock::new(|| {
    claim_regex(DEFAULT_CLAIM_INDICATORS.iter().copied())
        .expect("default claim indicators are valid")
});

static DEFAULT_QUOTES: LazyLock<QuoteExtractor> = LazyLock::new(QuoteExtractor::new);
static DEFAULT_CLAIMS: LazyLock<ClaimExtractor> = LazyLock::new(ClaimExtractor::new);

/// Extraction thresholds and patterns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Quotes need strictly more words than this
    pub min_quote_words: usize,
    /// Claims need strictly more words than this
    pub min_claim_words: usize,
    /// Also extract `'single'` and `‘smart single’` quoted spans
    pub include_single_quotes: bool,
    /// Claim-indicator regex fragments
    pub claim_indicators: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_quote_words: 3,
            min_claim_words: 4,
            include_single_quotes: true,
            claim_indicators: DEFAULT_CLAIM_INDICATORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// A quote pulled from one turn of agent output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedQuote {
    pub text: String,
    /// Turn number (1-based) the quote came from
    pub source_turn: usize,
}

/// A claim sentence pulled from one turn of agent output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedClaim {
    pub text: String,
    /// Turn number (1-based) the claim came from
    pub source_turn: usize,
}

/// Pulls quoted spans out of free text.
#[derive(Debug, Clone)]
pub struct QuoteExtractor {
    min_words: usize,
    include_single: bool,
}

impl Default for QuoteExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl QuoteExtractor {
    /// Extractor with default settings (more than 3 words, single quotes on).
    pub fn new() -> Self {
        Self {
            min_words: 3,
            include_single: true,
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            min_words: config.min_quote_words,
            include_single: config.include_single_quotes,
        }
    }

    /// Quotes need strictly more than `min_words` words.
    pub fn with_min_words(mut self, min_words: usize) -> Self {
        self.min_words = min_words;
        self
    }

    /// Toggle single-quote extraction.
    pub fn with_single_quotes(mut self, include: bool) -> Self {
        self.include_single = include;
        self
    }

    /// Extract meaningful quotes in order of appearance. Duplicates are kept.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let mut spans: Vec<(usize, &str)> = [&*DOUBLE_QUOTE_RE, &*SMART_DOUBLE_QUOTE_RE]
            .into_iter()
            .flat_map(|re| re.captures_iter(text))
            .filter_map(|cap| cap.get(1))
            .map(|m| (m.start(), m.as_str()))
            .collect();
        if self.include_single {
            spans.extend(single_quoted_spans(text, '\'', '\''));
            spans.extend(single_quoted_spans(text, '\u{2018}', '\u{2019}'));
        }
        spans.sort_by_key(|(start, _)| *start);

        spans
            .into_iter()
            .filter(|(_, quote)| word_count(quote) > self.min_words)
            .map(|(_, quote)| quote.to_string())
            .collect()
    }
}

/// Pulls declarative claim sentences out of free text.
#[derive(Debug, Clone)]
pub struct ClaimExtractor {
    min_words: usize,
    claim_re: Regex,
}

impl Default for ClaimExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimExtractor {
    /// Extractor with the default indicator phrases.
    pub fn new() -> Self {
        Self {
            min_words: 4,
            claim_re: DEFAULT_CLAIM_RE.clone(),
        }
    }

    /// Extractor with custom indicator fragments (regex syntax).
    pub fn with_indicators<I, S>(indicators: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let indicators: Vec<S> = indicators.into_iter().collect();
        if indicators.is_empty() {
            return Err(Error::config("at least one claim indicator is required"));
        }
        let claim_re = claim_regex(indicators.iter().map(|s| s.as_ref()))
            .map_err(|e| Error::config(format!("invalid claim indicator: {}", e)))?;

        Ok(Self {
            min_words: 4,
            claim_re,
        })
    }

    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        let extractor = Self::with_indicators(&config.claim_indicators)?;
        Ok(extractor.with_min_words(config.min_claim_words))
    }

    /// Claims need strictly more than `min_words` words.
    pub fn with_min_words(mut self, min_words: usize) -> Self {
        self.min_words = min_words;
        self
    }

    /// Extract claim sentences in order of appearance.
    ///
    /// A sentence starts at the beginning of the text, after `.`/`!`/`?`
    /// followed by whitespace, or at the start of a line. It must begin with an
    /// uppercase letter, contain an indicator phrase, and end with a terminator.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let mut claims = Vec::new();

        for chunk in SENTENCE_RE.find_iter(text) {
            let body = chunk.as_str();
            let after_boundary = chunk.start() == 0 || body.starts_with(char::is_whitespace);

            let mut starts: Vec<usize> = Vec::new();
            if after_boundary {
                starts.push(body.len() - body.trim_start().len());
            }
            starts.extend(body.match_indices('\n').map(|(i, _)| i + 1));

            let claim = starts
                .into_iter()
                .filter(|&start| start < body.len())
                .map(|start| &body[start..])
                .find(|candidate| self.claim_re.is_match(candidate));

            if let Some(claim) = claim {
                let claim = claim.trim();
                if word_count(claim) > self.min_words {
                    claims.push(claim.to_string());
                }
            }
        }

        claims
    }
}

/// Extract quotes with default settings.
pub fn extract_quotes(text: &str) -> Vec<String> {
    DEFAULT_QUOTES.extract(text)
}

/// Extract claims with default settings.
pub fn extract_claims(text: &str) -> Vec<String> {
    DEFAULT_CLAIMS.extract(text)
}

pub(crate) fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Spans between `open` and `close` marks, skipping apostrophes inside words.
///
/// A mark opens a quote only when not preceded by a word character and closes
/// one only when not followed by one, so `that's ... you'd` is not a quote.
fn single_quoted_spans(text: &str, open: char, close: char) -> Vec<(usize, &str)> {
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;
    let mut prev: Option<char> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let next = chars.peek().map(|&(_, n)| n);
        match start {
            Some(s) if c == close && !next.is_some_and(is_word_char) => {
                if i > s {
                    spans.push((s, &text[s..i]));
                }
                start = None;
            }
            None if c == open && !prev.is_some_and(is_word_char) => {
                start = Some(i + c.len_utf8());
            }
            _ => {}
        }
        prev = Some(c);
    }

    spans
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn claim_regex<'a>(
    indicators: impl Iterator<Item = &'a str>,
) -> std::result::Result<Regex, regex::Error> {
    let alternatives: Vec<String> = indicators.map(|i| format!("(?:{})", i)).collect();
    Regex::new(&format!(
        r"^\p{{Lu}}[^.!?]*?(?:{})[^.!?]+[.!?]$",
        alternatives.join("|")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE_WITH_CITATION: &str = "James, that's fascinating. The DRR paper says \
        \"heat flux scales as U-cubed at high frequencies\" which implies the thermal ceiling \
        is real. But Elena, the energy density you'd need suggests this is impractical at scale.";

    const RESPONSE_NOVEL: &str = "I think the resonance lattice produces a phase-locked harmonic \
        cascade that results in spontaneous symmetry restoration. This implies a new class of \
        topological insulators.";

    #[test]
    fn test_extract_double_quoted() {
        let quotes = extract_quotes(RESPONSE_WITH_CITATION);
        assert_eq!(quotes, vec!["heat flux scales as U-cubed at high frequencies"]);
    }

    #[test]
    fn test_contractions_are_not_quotes() {
        let text = "It's clear the model can't hold, and we'd need more data before it's done.";
        assert!(extract_quotes(text).is_empty());

        let text = "That\u{2019}s odd, since we\u{2019}d expect the lattice to settle.";
        assert!(extract_quotes(text).is_empty());
    }

    #[test]
    fn test_single_quotes_around_contractions() {
        let text = "She's sure: 'the field's decay rate is fixed' and \
            'the coupling isn't linear here'.";
        assert_eq!(
            extract_quotes(text),
            vec![
                "the field's decay rate is fixed",
                "the coupling isn't linear here",
            ]
        );
    }

    #[test]
    fn test_skip_short_quotes() {
        assert!(extract_quotes("She said \"yes\" and left.").is_empty());
        assert!(extract_quotes("He wrote \"only three words\" here.").is_empty());
        assert_eq!(extract_quotes("He wrote \"now exactly four words\".").len(), 1);
    }

    #[test]
    fn test_smart_and_single_quotes_in_order() {
        let text = "First 'single quoted span of words' then \u{201c}smart double quoted span here\u{201d} \
            and \"plain double quoted span here\" last \u{2018}smart single quoted span here\u{2019}.";
        let quotes = extract_quotes(text);
        assert_eq!(
            quotes,
            vec![
                "single quoted span of words",
                "smart double quoted span here",
                "plain double quoted span here",
                "smart single quoted span here",
            ]
        );
    }

    #[test]
    fn test_single_quotes_can_be_disabled() {
        let extractor = QuoteExtractor::new().with_single_quotes(false);
        let text = "She noted 'a single quoted span of words' in passing.";
        assert!(extractor.extract(text).is_empty());
        assert_eq!(extract_quotes(text).len(), 1);
    }

    #[test]
    fn test_duplicate_quotes_preserved() {
        let text = "\"the same quote appears twice\" and again \"the same quote appears twice\"";
        assert_eq!(extract_quotes(text).len(), 2);
    }

    #[test]
    fn test_quote_extraction_empty_input() {
        assert!(extract_quotes("").is_empty());
        assert!(extract_quotes("\"unterminated quote with many words").is_empty());
    }

    #[test]
    fn test_extract_claims_declarative() {
        let claims = extract_claims(RESPONSE_NOVEL);
        assert_eq!(
            claims,
            vec![
                "I think the resonance lattice produces a phase-locked harmonic cascade that \
                 results in spontaneous symmetry restoration.",
                "This implies a new class of topological insulators.",
            ]
        );
    }

    #[test]
    fn test_extract_claims_across_sentences() {
        let claims = extract_claims(RESPONSE_WITH_CITATION);
        assert_eq!(claims.len(), 2);
        assert!(claims[0].starts_with("The DRR paper says"));
        assert!(claims[1].starts_with("But Elena"));
    }

    #[test]
    fn test_claims_need_uppercase_start_and_terminator() {
        assert!(extract_claims("this implies something about the field.").is_empty());
        assert!(extract_claims("This implies something about the field").is_empty());
    }

    #[test]
    fn test_short_claims_filtered() {
        assert!(extract_claims("This implies more.").is_empty());
        assert!(extract_claims("This implies much more.").is_empty());
        assert_eq!(extract_claims("This implies much more here.").len(), 1);
    }

    #[test]
    fn test_indicator_inside_longer_word() {
        assert_eq!(
            extract_claims("It is fine because the field decays fast over time."),
            vec!["It is fine because the field decays fast over time."]
        );
        assert_eq!(
            extract_claims("The model reproduces the observed spectrum well."),
            vec!["The model reproduces the observed spectrum well."]
        );
    }

    #[test]
    fn test_claim_at_line_start() {
        let text = "notes from the session\nThe lattice produces stable harmonic modes.";
        assert_eq!(
            extract_claims(text),
            vec!["The lattice produces stable harmonic modes."]
        );
    }

    #[test]
    fn test_boundary_requires_whitespace() {
        // "3.5" is not a sentence boundary
        let text = "Gain was 3.5 which implies the amplifier saturates early.";
        assert!(extract_claims(text).is_empty());
    }

    #[test]
    fn test_custom_indicators() {
        let extractor = ClaimExtractor::with_indicators(["contradicts"]).unwrap();
        let text = "This result contradicts the earlier lattice model. This implies nothing new here.";
        assert_eq!(
            extractor.extract(text),
            vec!["This result contradicts the earlier lattice model."]
        );
    }

    #[test]
    fn test_invalid_indicators() {
        assert!(ClaimExtractor::with_indicators(["(unclosed"]).is_err());
        assert!(ClaimExtractor::with_indicators(Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_from_config() {
        let config = ExtractionConfig {
            min_claim_words: 2,
            ..Default::default()
        };
        let extractor = ClaimExtractor::from_config(&config).unwrap();
        assert_eq!(extractor.extract("This implies more.").len(), 1);
    }
}
