//! Append-only JSONL log of session records.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::record::MetricsRecord;
use crate::error::{Error, Result};

/// Default log file name, relative to the working directory.
pub const DEFAULT_LOG_PATH: &str = "metrics_log.jsonl";

/// A metrics log file. Each finalized session adds exactly one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsLog {
    path: PathBuf,
}

impl Default for MetricsLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_PATH)
    }
}

impl MetricsLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `record` as one line.
    ///
    /// The file is opened in append mode and the line, newline included, goes
    /// out in a single write, so earlier lines are never rewritten.
    pub fn append(&self, record: &MetricsRecord) -> Result<()> {
        let mut line = record.to_json_line()?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::io(&self.path, e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| Error::io(&self.path, e))
    }

    /// All records in file order. A missing log has no records.
    pub fn read_records(&self) -> Result<Vec<MetricsRecord>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(&self.path, e)),
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| MetricsRecord::from_json_line(line).map_err(Error::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(session_id: &str) -> MetricsRecord {
        MetricsRecord {
            session_id: session_id.to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
            topic: "test".to_string(),
            turn_count: 1,
            citation_accuracy: 0.0,
            novel_claim_density: 0.0,
            critique_change_rate: 0.0,
            model: "unknown".to_string(),
            recursive_depth: 0,
        }
    }

    #[test]
    fn test_append_creates_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let log = MetricsLog::new(dir.path().join("metrics_log.jsonl"));

        log.append(&record("s-0")).unwrap();
        log.append(&record("s-1")).unwrap();

        let content = fs::read_to_string(log.path()).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.ends_with('\n'));

        let ids: Vec<String> = log
            .read_records()
            .unwrap()
            .into_iter()
            .map(|r| r.session_id)
            .collect();
        assert_eq!(ids, vec!["s-0", "s-1"]);
    }

    #[test]
    fn test_existing_lines_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics_log.jsonl");
        let earlier = record("old").to_json_line().unwrap();
        fs::write(&path, format!("{}\n", earlier)).unwrap();

        MetricsLog::new(&path).append(&record("new")).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(&earlier));
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_missing_log_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = MetricsLog::new(dir.path().join("absent.jsonl"));
        assert!(log.read_records().unwrap().is_empty());
    }

    #[test]
    fn test_append_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let log = MetricsLog::new(dir.path().join("missing").join("metrics_log.jsonl"));

        let err = log.append(&record("s")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_corrupt_line_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics_log.jsonl");
        fs::write(&path, "not json\n").unwrap();

        let err = MetricsLog::new(&path).read_records().unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
