//! # rain-grounding
//!
//! Grounding checks for multi-agent research meetings: is what the agents
//! quote actually in the papers they were given, and how much of what they
//! claim is new?
//!
//! ## Core Components
//!
//! - **Corpus**: documents, the global [`CorpusIndex`], library loading
//! - **Extract**: quoted spans and declarative claims from agent output
//! - **Citation**: live verbatim verification of quotes against the index
//! - **Novelty**: similarity-based grounding, citation accuracy, critique change
//! - **Metrics**: per-session accumulation and a one-line JSONL record on finalize
//!
//! ## Example
//!
//! ```rust
//! use rain_grounding::{CitationAnalyzer, Corpus, CorpusIndex, Document};
//! use rain_grounding::{MetricsLog, SessionInfo, SessionMetrics};
//!
//! let corpus: Corpus = [Document::new(
//!     "DRR_paper.md",
//!     "Heat flux scales as U-cubed at high frequencies under load.",
//! )]
//! .into_iter()
//! .collect();
//! let index = CorpusIndex::build(&corpus);
//!
//! let response = "The paper says \"heat flux scales as U-cubed at high frequencies\".";
//! let mut analyzer = CitationAnalyzer::new();
//! let analysis = analyzer.analyze_response("James", response, &index);
//! assert_eq!(analysis.citation_rate, 1.0);
//!
//! let dir = std::env::temp_dir().join(format!("rain-doc-{}", std::process::id()));
//! std::fs::create_dir_all(&dir).unwrap();
//! let log = MetricsLog::new(dir.join("metrics_log.jsonl"));
//!
//! let mut session = SessionMetrics::new(SessionInfo::new("DRR thermal limits"), corpus, log);
//! session.record_turn("James", response).unwrap();
//! let record = session.finalize().unwrap();
//! assert_eq!(record.citation_accuracy, 1.0);
//! # std::fs::remove_dir_all(&dir).unwrap();
//! ```

pub mod citation;
pub mod config;
pub mod corpus;
pub mod error;
pub mod extract;
pub mod guardrails;
pub mod metrics;
pub mod novelty;
pub mod similarity;

mod proptest;

// Re-exports for convenience
pub use citation::{
    CitationAnalysis, CitationAnalyzer, CitationTally, CitationVerifier, VerificationResult,
    VerifierConfig,
};
pub use config::GroundingConfig;
pub use corpus::{
    prompt_context, ContextBudget, Corpus, CorpusIndex, Document, LibraryConfig, LibraryLoader,
};
pub use error::{Error, Result};
pub use extract::{
    extract_claims, extract_quotes, ClaimExtractor, ExtractedClaim, ExtractedQuote,
    ExtractionConfig, QuoteExtractor,
};
pub use guardrails::{detect_corruption, sanitize_text, Corruption};
pub use metrics::{MetricsLog, MetricsRecord, SessionInfo, SessionMetrics, SessionState};
pub use novelty::{
    compute_citation_accuracy, compute_critique_change_rate, compute_novel_claim_density,
    NoveltyClassifier, ScoringConfig,
};
pub use similarity::{RatcliffObershelp, SequenceMatcher, Similarity};
