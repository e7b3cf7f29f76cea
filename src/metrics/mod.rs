//! Session metrics: accumulate a meeting's turns, score them once, persist once.
//!
//! A [`SessionMetrics`] moves through `created -> accumulating -> finalized`.
//! While accumulating it collects every quote and claim extracted from agent
//! turns plus `(before, after)` critique pairs. [`SessionMetrics::finalize`]
//! scores them against the session's corpus snapshot and appends a single
//! [`MetricsRecord`] to the JSONL [`MetricsLog`]:
//!
//! ```text
//! {"session_id":"...","timestamp":"2026-03-14T09:26:53Z","topic":"...","turns":2,
//!  "citation_accuracy":1.0,"novel_claim_density":0.5,"critique_change_rate":0.5,
//!  "model":"...","recursive_depth":2}
//! ```

mod log;
mod record;
mod session;

pub use log::{MetricsLog, DEFAULT_LOG_PATH};
pub use record::{MetricsRecord, TIMESTAMP_FORMAT};
pub use session::{SessionInfo, SessionMetrics, SessionState};
