//! Guardrails for text crossing the model boundary.
//!
//! Corpus text is sanitized before it is placed into a prompt, so a paper
//! cannot smuggle in control tokens or fake turn headers. Model output is
//! screened for the garbled shapes small local models produce when they
//! degrade (token soup, runs of capitals, punctuation storms).

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Control tokens that must never reach a prompt verbatim.
const CONTROL_TOKENS: [&str; 4] = ["<|endoftext|>", "<|im_start|>", "<|im_end|>", "|eoc_fim|"];

/// Characters counted as "special" by the gibberish heuristic.
const SPECIAL_CHARS: &str = ":;/\\|<>{}[]()@#$%^&*+=~`";

static CAPS_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]{8,}").expect("caps pattern is valid"));

static CORRUPTION_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        // End of context markers
        (r"(?i)\|eoc_fim\|", "end-of-context marker"),
        (r"(?i)ARILEX|AIVERI|RIECK", "known corruption sequence"),
        // Gibberish compound words
        (r"(?i)ingly:\w*scape", "gibberish compound"),
        (r"(?i):\s*\n\s*:\s*\n", "colon-only lines"),
        (r"(?i)##\d+\s*\(", "numbered header gibberish"),
        (r"(?i)SING\w{10,}", "runaway token"),
        (r"(?i)[A-Z]{4,}:[A-Z]{4,}", "colon-joined capitals"),
    ]
    .into_iter()
    .map(|(pattern, label)| (Regex::new(pattern).expect("corruption pattern is valid"), label))
    .collect()
});

/// Neutralize text before it is embedded in a prompt.
///
/// Replaces control tokens, turns `###` headers into `>>>`, defuses the
/// `[SEARCH:` trigger and trims surrounding whitespace.
pub fn sanitize_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut cleaned = text.to_string();
    for token in CONTROL_TOKENS {
        cleaned = cleaned.replace(token, "[TOKEN_REMOVED]");
    }
    cleaned = cleaned.replace("###", ">>>");
    cleaned = cleaned.replace("[SEARCH:", "[SEARCH;");

    cleaned.trim().to_string()
}

/// Why a response was judged corrupted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Corruption {
    /// Fewer than 10 characters after trimming
    TooShort,
    /// Eight or more consecutive capitals
    ExcessiveCapitals,
    /// More than 15% of characters are symbols
    SpecialCharacters,
    /// A known corruption pattern matched
    Pattern(&'static str),
    /// More than half the lines are blank or near-blank
    EmptyLines,
    /// Average word length above 15 characters
    LongWords,
}

impl fmt::Display for Corruption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort => write!(f, "response too short"),
            Self::ExcessiveCapitals => write!(f, "excessive consecutive capitals"),
            Self::SpecialCharacters => write!(f, "too many special characters"),
            Self::Pattern(label) => write!(f, "corruption pattern detected: {}", label),
            Self::EmptyLines => write!(f, "too many empty lines"),
            Self::LongWords => write!(f, "average word length too high"),
        }
    }
}

/// Screen model output for corruption. Returns the first heuristic that fires.
pub fn detect_corruption(text: &str) -> Option<Corruption> {
    if text.trim().chars().count() < 10 {
        return Some(Corruption::TooShort);
    }

    if CAPS_RUN_RE.is_match(text) {
        return Some(Corruption::ExcessiveCapitals);
    }

    let total_chars = text.chars().count();
    let special = text.chars().filter(|c| SPECIAL_CHARS.contains(*c)).count();
    if total_chars > 20 && special as f64 / total_chars as f64 > 0.15 {
        return Some(Corruption::SpecialCharacters);
    }

    for (pattern, label) in CORRUPTION_PATTERNS.iter() {
        if pattern.is_match(text) {
            return Some(Corruption::Pattern(label));
        }
    }

    let lines: Vec<&str> = text.split('\n').collect();
    let empty_lines = lines
        .iter()
        .filter(|line| line.trim().chars().count() <= 2)
        .count();
    if lines.len() > 5 && empty_lines as f64 / lines.len() as f64 > 0.5 {
        return Some(Corruption::EmptyLines);
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    if !words.is_empty() {
        let total: usize = words.iter().map(|w| w.chars().count()).sum();
        if total as f64 / words.len() as f64 > 15.0 {
            return Some(Corruption::LongWords);
        }
    }

    None
}
