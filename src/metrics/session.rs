//! Session-level accumulation of turns and critique passes.

use std::fmt;

use chrono::{SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::log::MetricsLog;
use super::record::MetricsRecord;
use crate::config::GroundingConfig;
use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::extract::{ClaimExtractor, ExtractedClaim, ExtractedQuote, QuoteExtractor};
use crate::guardrails::detect_corruption;
use crate::novelty::NoveltyClassifier;

/// Identity of a session as written to its record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub topic: String,
    pub model: String,
    /// Critique passes per turn in recursive mode (0 when off)
    pub recursive_depth: u32,
}

impl SessionInfo {
    /// Session on `topic` with a fresh id.
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            topic: topic.into(),
            model: "unknown".to_string(),
            recursive_depth: 0,
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_recursive_depth(mut self, depth: u32) -> Self {
        self.recursive_depth = depth;
        self
    }
}

/// Lifecycle of a [`SessionMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Created,
    Accumulating,
    /// Record written; no further changes accepted
    Finalized,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Created => write!(f, "created"),
            SessionState::Accumulating => write!(f, "accumulating"),
            SessionState::Finalized => write!(f, "finalized"),
        }
    }
}

/// Accumulates one session's quotes, claims and critique pairs, and persists
/// the resulting scores once.
///
/// The corpus is a snapshot taken at creation; every score is computed
/// against it regardless of what the library looks like later.
#[derive(Debug)]
pub struct SessionMetrics {
    info: SessionInfo,
    corpus: Corpus,
    log: MetricsLog,
    quote_extractor: QuoteExtractor,
    claim_extractor: ClaimExtractor,
    classifier: NoveltyClassifier,
    state: SessionState,
    turn_count: usize,
    quotes: Vec<ExtractedQuote>,
    claims: Vec<ExtractedClaim>,
    critique_pairs: Vec<(String, String)>,
}

impl SessionMetrics {
    /// Session with default extraction and scoring, logging to `log`.
    pub fn new(info: SessionInfo, corpus: Corpus, log: MetricsLog) -> Self {
        Self {
            info,
            corpus,
            log,
            quote_extractor: QuoteExtractor::new(),
            claim_extractor: ClaimExtractor::new(),
            classifier: NoveltyClassifier::new(),
            state: SessionState::Created,
            turn_count: 0,
            quotes: Vec::new(),
            claims: Vec::new(),
            critique_pairs: Vec::new(),
        }
    }

    /// Session using the extraction, scoring and log settings of `config`.
    pub fn from_config(
        info: SessionInfo,
        corpus: Corpus,
        config: &GroundingConfig,
    ) -> Result<Self> {
        let mut session = Self::new(info, corpus, MetricsLog::new(&config.metrics_log));
        session.quote_extractor = QuoteExtractor::from_config(&config.extraction);
        session.claim_extractor = ClaimExtractor::from_config(&config.extraction)?;
        session.classifier = NoveltyClassifier::from_config(config.scoring);
        Ok(session)
    }

    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn log(&self) -> &MetricsLog {
        &self.log
    }

    pub fn turn_count(&self) -> usize {
        self.turn_count
    }

    pub fn quotes(&self) -> &[ExtractedQuote] {
        &self.quotes
    }

    pub fn claims(&self) -> &[ExtractedClaim] {
        &self.claims
    }

    pub fn critique_pairs(&self) -> &[(String, String)] {
        &self.critique_pairs
    }

    /// Record one agent turn: extract its quotes and claims and count it.
    pub fn record_turn(&mut self, agent_name: &str, response: &str) -> Result<()> {
        self.ensure_open()?;
        self.turn_count += 1;
        let turn = self.turn_count;

        if let Some(reason) = detect_corruption(response) {
            warn!(agent = agent_name, turn, %reason, "response looks corrupted");
        }

        let quotes = self.quote_extractor.extract(response);
        let claims = self.claim_extractor.extract(response);
        debug!(
            agent = agent_name,
            turn,
            quotes = quotes.len(),
            claims = claims.len(),
            "recorded turn"
        );

        self.quotes.extend(quotes.into_iter().map(|text| ExtractedQuote {
            text,
            source_turn: turn,
        }));
        self.claims.extend(claims.into_iter().map(|text| ExtractedClaim {
            text,
            source_turn: turn,
        }));
        self.state = SessionState::Accumulating;
        Ok(())
    }

    /// Record one critique pass as its before and after text.
    pub fn record_critique(
        &mut self,
        pre_text: impl Into<String>,
        post_text: impl Into<String>,
    ) -> Result<()> {
        self.ensure_open()?;
        self.critique_pairs.push((pre_text.into(), post_text.into()));
        self.state = SessionState::Accumulating;
        Ok(())
    }

    /// Current scores. Does not write anything.
    pub fn summary(&self) -> MetricsRecord {
        let quotes: Vec<&str> = self.quotes.iter().map(|q| q.text.as_str()).collect();
        let claims: Vec<&str> = self.claims.iter().map(|c| c.text.as_str()).collect();

        MetricsRecord {
            session_id: self.info.session_id.clone(),
            timestamp: Utc::now().trunc_subsecs(0),
            topic: self.info.topic.clone(),
            turn_count: self.turn_count,
            citation_accuracy: self.classifier.citation_accuracy(&quotes, &self.corpus),
            novel_claim_density: self.classifier.novel_claim_density(&claims, &self.corpus),
            critique_change_rate: self.classifier.critique_change_rate(&self.critique_pairs),
            model: self.info.model.clone(),
            recursive_depth: self.info.recursive_depth,
        }
    }

    /// Compute the summary, append it to the log and close the session.
    ///
    /// A session writes at most one record. If the append fails the session
    /// stays open and `finalize` can be retried.
    #[instrument(skip(self), fields(session_id = %self.info.session_id))]
    pub fn finalize(&mut self) -> Result<MetricsRecord> {
        self.ensure_open()?;

        let record = self.summary();
        self.log.append(&record)?;
        self.state = SessionState::Finalized;

        info!(
            path = %self.log.path().display(),
            turns = record.turn_count,
            citation_accuracy = record.citation_accuracy,
            novel_claim_density = record.novel_claim_density,
            critique_change_rate = record.critique_change_rate,
            "persisted session metrics"
        );
        Ok(record)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state == SessionState::Finalized {
            return Err(Error::session_finalized(&self.info.session_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::Path;

    const RESPONSE_WITH_CITATION: &str = "James, that's fascinating. The DRR paper says \
        \"heat flux scales as U-cubed at high frequencies\" which implies the thermal ceiling \
        is real. But Elena, the energy density you'd need suggests this is impractical at scale.";

    const RESPONSE_NOVEL: &str = "I think the resonance lattice produces a phase-locked harmonic \
        cascade that results in spontaneous symmetry restoration. This implies a new class of \
        topological insulators.";

    fn sample_corpus() -> Corpus {
        [
            (
                "DRR_paper.md",
                "Dynamic Resonance Rooting shows that heat flux scales as U-cubed \
                 at high frequencies. The geometric coupling between frequency and \
                 spatial pattern produces self-similar structures. Thermal limits \
                 are reached above 100 kHz under continuous load.",
            ),
            (
                "Coherence_Depth.md",
                "The coherence depth function C_alpha(u) measures how deep patterns \
                 persist in oscillatory fields. Spectral spacing reveals hidden \
                 geometric structure in the data.",
            ),
        ]
        .into_iter()
        .collect()
    }

    fn session(log_path: &Path) -> SessionMetrics {
        let info = SessionInfo::new("DRR thermal limits")
            .with_session_id("test-001")
            .with_model("qwen2.5-coder-7b-instruct")
            .with_recursive_depth(2);
        SessionMetrics::new(info, sample_corpus(), MetricsLog::new(log_path))
    }

    #[test]
    fn test_full_session() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("metrics_log.jsonl");
        let mut session = session(&log_path);
        assert_eq!(session.state(), SessionState::Created);

        session.record_turn("James", RESPONSE_WITH_CITATION).unwrap();
        session.record_turn("Elena", RESPONSE_NOVEL).unwrap();
        session
            .record_critique(
                "The thermal limits are real.",
                "The thermal limits are real, confirmed by DRR heat flux U^3 scaling.",
            )
            .unwrap();
        session
            .record_critique("I think this works.", "I think this works.")
            .unwrap();
        assert_eq!(session.state(), SessionState::Accumulating);

        let record = session.finalize().unwrap();
        assert_eq!(session.state(), SessionState::Finalized);

        assert_eq!(record.session_id, "test-001");
        assert_eq!(record.topic, "DRR thermal limits");
        assert_eq!(record.turn_count, 2);
        assert_eq!(record.model, "qwen2.5-coder-7b-instruct");
        assert_eq!(record.recursive_depth, 2);
        assert_eq!(record.citation_accuracy, 1.0);
        assert_eq!(record.novel_claim_density, 1.0);
        assert_eq!(record.critique_change_rate, 0.5);

        let content = fs::read_to_string(&log_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 1);

        let persisted: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        for key in [
            "session_id",
            "timestamp",
            "topic",
            "turns",
            "citation_accuracy",
            "novel_claim_density",
            "critique_change_rate",
            "model",
            "recursive_depth",
        ] {
            assert!(persisted.get(key).is_some(), "missing key: {}", key);
        }
        assert_eq!(MetricsRecord::from_json_line(lines[0]).unwrap(), record);
    }

    #[test]
    fn test_turn_provenance() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(&dir.path().join("metrics_log.jsonl"));

        session.record_turn("James", RESPONSE_WITH_CITATION).unwrap();
        session.record_turn("Elena", RESPONSE_NOVEL).unwrap();
        session.record_turn("James", RESPONSE_WITH_CITATION).unwrap();

        let quote_turns: Vec<usize> = session.quotes().iter().map(|q| q.source_turn).collect();
        assert_eq!(quote_turns, vec![1, 3]);
        let claim_turns: Vec<usize> = session.claims().iter().map(|c| c.source_turn).collect();
        assert_eq!(claim_turns, vec![1, 1, 2, 2, 3, 3]);
    }

    #[test]
    fn test_sessions_append_to_one_log() {
        let dir = tempfile::tempdir().unwrap();
        let log = MetricsLog::new(dir.path().join("metrics_log.jsonl"));

        for i in 0..3 {
            let info = SessionInfo::new("test").with_session_id(format!("s-{}", i));
            let mut session = SessionMetrics::new(info, Corpus::new(), log.clone());
            session.record_turn("James", "Hello team.").unwrap();
            session.finalize().unwrap();
        }

        let records = log.read_records().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].session_id, "s-2");
        assert_eq!(records[0].model, "unknown");
    }

    #[test]
    fn test_summary_does_not_write() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("metrics_log.jsonl");
        let mut session = session(&log_path);

        session.record_turn("Elena", "Test.").unwrap();
        let summary = session.summary();

        assert_eq!(summary.turn_count, 1);
        assert_eq!(summary.citation_accuracy, 0.0);
        assert!(!log_path.exists());
        assert_eq!(session.state(), SessionState::Accumulating);
    }

    #[test]
    fn test_finalize_twice_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("metrics_log.jsonl");
        let mut session = session(&log_path);

        session.finalize().unwrap();
        let err = session.finalize().unwrap_err();
        assert!(matches!(
            err,
            Error::SessionFinalized { ref session_id } if session_id == "test-001"
        ));
        assert!(session.record_turn("James", "More.").is_err());
        assert!(session.record_critique("a", "b").is_err());

        let content = fs::read_to_string(&log_path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn test_failed_append_keeps_session_open() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("later").join("metrics_log.jsonl");
        let mut session = session(&log_path);
        session.record_turn("James", RESPONSE_WITH_CITATION).unwrap();

        assert!(matches!(session.finalize(), Err(Error::Io { .. })));
        assert_eq!(session.state(), SessionState::Accumulating);

        fs::create_dir(dir.path().join("later")).unwrap();
        let record = session.finalize().unwrap();
        assert_eq!(record.turn_count, 1);
        assert_eq!(session.state(), SessionState::Finalized);
    }

    #[test]
    fn test_generated_session_id() {
        let a = SessionInfo::new("topic");
        let b = SessionInfo::new("topic");
        assert_ne!(a.session_id, b.session_id);
        assert!(Uuid::parse_str(&a.session_id).is_ok());
    }

    #[test]
    fn test_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = GroundingConfig::default();
        config.metrics_log = dir.path().join("custom.jsonl");
        config.extraction.min_quote_words = 8;

        let mut session =
            SessionMetrics::from_config(SessionInfo::new("t"), sample_corpus(), &config).unwrap();
        session.record_turn("James", RESPONSE_WITH_CITATION).unwrap();

        // The cited quote has exactly eight words
        assert!(session.quotes().is_empty());
        assert_eq!(session.log().path(), config.metrics_log.as_path());
    }
}
