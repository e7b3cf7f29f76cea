//! The persisted per-session metrics record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp layout used in the metrics log.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// One session's scores, written as a single JSON line on finalize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub session_id: String,
    /// When the scores were computed (UTC, second precision)
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    pub topic: String,
    #[serde(rename = "turns", alias = "turn_count")]
    pub turn_count: usize,
    /// Fraction of quotes that similarity-match the corpus
    pub citation_accuracy: f64,
    /// Fraction of claims not traceable to the corpus
    pub novel_claim_density: f64,
    /// Fraction of critique passes that changed the text
    pub critique_change_rate: f64,
    pub model: String,
    pub recursive_depth: u32,
}

impl MetricsRecord {
    /// Serialize as one log line, without the trailing newline.
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json_line(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }
}

mod timestamp {
    use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if let Ok(naive) = NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
