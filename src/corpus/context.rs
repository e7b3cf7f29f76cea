//! Prompt context assembly from a corpus.

use serde::{Deserialize, Serialize};

use super::types::Corpus;
use crate::guardrails::sanitize_text;

/// Remaining budget below which no further paper is included.
const MIN_REMAINING_BUDGET: usize = 1000;

/// Character budgets for the paper block placed in agent prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextBudget {
    /// Maximum characters taken from a single paper
    pub snippet_length: usize,
    /// Maximum characters across all papers
    pub total_length: usize,
}

impl Default for ContextBudget {
    fn default() -> Self {
        Self {
            snippet_length: 3000,
            total_length: 20000,
        }
    }
}

/// Render sanitized papers as `--- PAPER: <id> ---` blocks within `budget`.
///
/// Papers are taken in corpus order until less than 1000 characters of budget
/// remain. Papers left out are still indexed and verifiable; they just do not
/// appear in the prompt.
pub fn prompt_context(corpus: &Corpus, budget: &ContextBudget) -> String {
    let mut blocks = Vec::new();
    let mut used = 0usize;

    for document in corpus {
        let remaining = budget.total_length.saturating_sub(used);
        if remaining <= MIN_REMAINING_BUDGET {
            break;
        }

        let safe = sanitize_text(&document.text);
        let take = safe
            .chars()
            .count()
            .min(budget.snippet_length)
            .min(remaining);
        let snippet: String = safe.chars().take(take).collect();

        blocks.push(format!("--- PAPER: {} ---\n{}\n", document.id, snippet));
        used += take;
    }

    blocks.join("\n")
}
