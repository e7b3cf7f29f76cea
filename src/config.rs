//! Crate-wide configuration.
//!
//! Every section has defaults matching the reference meeting setup, so an
//! empty JSON object is a valid configuration:
//!
//! ```json
//! {
//!   "extraction": { "min_quote_words": 3, "min_claim_words": 4 },
//!   "verification": { "fuzzy": true },
//!   "scoring": { "citation_threshold": 0.8, "change_threshold": 0.05 },
//!   "library": { "root": "~/research/library", "recursive": true },
//!   "metrics_log": "$RAIN_HOME/metrics_log.jsonl"
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::citation::VerifierConfig;
use crate::corpus::{ContextBudget, LibraryConfig};
use crate::error::{Error, Result};
use crate::extract::{ClaimExtractor, ExtractionConfig};
use crate::metrics::DEFAULT_LOG_PATH;
use crate::novelty::ScoringConfig;

/// Configuration for corpus loading, extraction, verification and scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundingConfig {
    pub extraction: ExtractionConfig,
    pub verification: VerifierConfig,
    pub scoring: ScoringConfig,
    pub library: LibraryConfig,
    pub context: ContextBudget,
    /// JSONL file session records are appended to
    pub metrics_log: PathBuf,
}

impl Default for GroundingConfig {
    fn default() -> Self {
        Self {
            extraction: ExtractionConfig::default(),
            verification: VerifierConfig::default(),
            scoring: ScoringConfig::default(),
            library: LibraryConfig::default(),
            context: ContextBudget::default(),
            metrics_log: PathBuf::from(DEFAULT_LOG_PATH),
        }
    }
}

impl GroundingConfig {
    /// Parse, expand paths and validate.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut config: Self = serde_json::from_str(json)?;
        config.expand_paths()?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json(&json)
    }

    /// Expand `~` and environment variables in the library root and log path.
    pub fn expand_paths(&mut self) -> Result<()> {
        self.library.root = expand_path(&self.library.root)?;
        self.metrics_log = expand_path(&self.metrics_log)?;
        Ok(())
    }

    /// Reject thresholds outside `[0, 1]`, zero word minimums and unusable
    /// claim indicators.
    pub fn validate(&self) -> Result<()> {
        let thresholds = [
            ("scoring.citation_threshold", self.scoring.citation_threshold),
            ("scoring.novelty_threshold", self.scoring.novelty_threshold),
            ("scoring.change_threshold", self.scoring.change_threshold),
        ];
        for (name, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::config(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.extraction.min_quote_words == 0 {
            return Err(Error::config("extraction.min_quote_words must be positive"));
        }
        if self.extraction.min_claim_words == 0 {
            return Err(Error::config("extraction.min_claim_words must be positive"));
        }
        if self.verification.min_words == 0 {
            return Err(Error::config("verification.min_words must be positive"));
        }
        if self.library.max_files == 0 {
            return Err(Error::config("library.max_files must be positive"));
        }

        ClaimExtractor::from_config(&self.extraction)?;
        Ok(())
    }
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    let raw = path
        .to_str()
        .ok_or_else(|| Error::config(format!("non UTF-8 path: {}", path.display())))?;
    let expanded = shellexpand::full(raw)
        .map_err(|e| Error::config(format!("cannot expand {}: {}", raw, e)))?;
    Ok(PathBuf::from(expanded.as_ref()))
}
