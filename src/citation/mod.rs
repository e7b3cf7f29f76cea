//! Live citation checking for agent turns.
//!
//! [`CitationVerifier`] answers "does this quote occur in the corpus, and
//! where"; [`CitationAnalyzer`] runs extraction plus verification over a whole
//! response and keeps the session's running [`CitationTally`].
//!
//! ## Example
//!
//! ```rust
//! use rain_grounding::citation::CitationAnalyzer;
//! use rain_grounding::corpus::{CorpusIndex, Document};
//!
//! let documents = vec![Document::new(
//!     "paper.md",
//!     "Heat flux scales as U-cubed at high frequencies under load.",
//! )];
//! let index = CorpusIndex::build(&documents);
//!
//! let mut analyzer = CitationAnalyzer::new();
//! let analysis = analyzer.analyze_response(
//!     "James",
//!     "The paper says \"heat flux scales as U-cubed at high frequencies\".",
//!     &index,
//! );
//! assert_eq!(analysis.verified[0].1, "paper.md");
//! assert_eq!(analyzer.stats(), "Citation Rate: 1/1 (100.0% verified)");
//! ```

mod analyzer;
mod verifier;

pub use analyzer::{CitationAnalysis, CitationAnalyzer, CitationTally};
pub use verifier::{verify, CitationVerifier, VerificationResult, VerifierConfig};
