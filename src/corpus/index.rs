//! Global search index over a corpus.
//!
//! All documents are lowercased and concatenated into one string, separated by
//! a single [`DOCUMENT_DELIMITER`]. A table of breakpoints records where each
//! document starts, so any match offset in the global text maps back to its
//! document with a binary search.

use std::collections::HashSet;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::types::Document;

/// Separator between documents in the global text.
///
/// Never present inside an indexed body: bodies have it replaced by a space.
pub const DOCUMENT_DELIMITER: char = '\0';

/// Start offset of one document inside the global text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakpoint {
    /// Byte offset into the global text
    pub offset: usize,
    /// Document that starts at `offset`
    pub document_id: String,
}

/// Read-only, lowercased concatenation of a corpus with offset attribution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorpusIndex {
    global_text: String,
    breakpoints: Vec<Breakpoint>,
}

impl CorpusIndex {
    /// Create an empty index. Every lookup against it returns `None`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from documents in order.
    ///
    /// Documents with a blank id, or an id already indexed, are skipped with a
    /// warning rather than failing the whole build.
    pub fn build<'a, I>(documents: I) -> Self
    where
        I: IntoIterator<Item = &'a Document>,
    {
        let mut seen: HashSet<&'a str> = HashSet::new();
        let mut fragments: Vec<String> = Vec::new();
        let mut breakpoints = Vec::new();
        let mut offset = 0usize;

        for document in documents {
            if document.id.trim().is_empty() {
                warn!("skipping document with empty id");
                continue;
            }
            if !seen.insert(document.id.as_str()) {
                warn!(document_id = %document.id, "skipping duplicate document id");
                continue;
            }

            let body = normalize_body(&document.text);
            breakpoints.push(Breakpoint {
                offset,
                document_id: document.id.clone(),
            });
            // +1 for the delimiter that follows every body but the last
            offset += body.len() + 1;
            fragments.push(body);
        }

        let global_text = fragments.join(DOCUMENT_DELIMITER.to_string().as_str());

        debug!(
            documents = breakpoints.len(),
            bytes = global_text.len(),
            "built corpus index"
        );

        Self {
            global_text,
            breakpoints,
        }
    }

    /// Replace this index with a fresh build. Nothing from the previous build survives.
    pub fn rebuild<'a, I>(&mut self, documents: I)
    where
        I: IntoIterator<Item = &'a Document>,
    {
        *self = Self::build(documents);
    }

    /// Map a global-text offset to the document that contains it.
    ///
    /// Picks the breakpoint with the largest offset not exceeding `offset`.
    pub fn resolve_offset(&self, offset: usize) -> Option<&str> {
        let position = self.breakpoints.partition_point(|b| b.offset <= offset);
        let idx = position.checked_sub(1)?;
        self.breakpoints.get(idx).map(|b| b.document_id.as_str())
    }

    /// Earliest byte offset of `needle` in the global text.
    ///
    /// `needle` is matched as-is; callers lowercase it first.
    pub fn find(&self, needle: &str) -> Option<usize> {
        if needle.is_empty() {
            return None;
        }
        self.global_text.find(needle)
    }

    /// Earliest byte offset where `pattern` matches the global text.
    pub fn find_pattern(&self, pattern: &Regex) -> Option<usize> {
        pattern.find(&self.global_text).map(|m| m.start())
    }

    /// The lowercased, delimiter-joined corpus text.
    pub fn global_text(&self) -> &str {
        &self.global_text
    }

    /// Document start offsets in load order.
    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.breakpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakpoints.is_empty()
    }
}

/// Lowercase a body and strip the delimiter. Byte length of the lowercased
/// text is preserved, so breakpoint arithmetic stays exact.
fn normalize_body(text: &str) -> String {
    text.to_lowercase().replace(DOCUMENT_DELIMITER, " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(pairs: &[(&str, &str)]) -> Vec<Document> {
        pairs.iter().map(|(id, text)| Document::new(*id, *text)).collect()
    }

    #[test]
    fn test_breakpoint_arithmetic() {
        let documents = docs(&[("a.md", "Alpha Beta"), ("b.md", "Gamma"), ("c.md", "Delta")]);
        let index = CorpusIndex::build(&documents);

        assert_eq!(index.global_text(), "alpha beta\0gamma\0delta");
        let offsets: Vec<usize> = index.breakpoints().iter().map(|b| b.offset).collect();
        assert_eq!(offsets, vec![0, 11, 17]);
    }

    #[test]
    fn test_resolve_offset() {
        let documents = docs(&[("a.md", "alpha beta"), ("b.md", "gamma")]);
        let index = CorpusIndex::build(&documents);

        assert_eq!(index.resolve_offset(0), Some("a.md"));
        assert_eq!(index.resolve_offset(10), Some("a.md"));
        assert_eq!(index.resolve_offset(11), Some("b.md"));
        assert_eq!(index.resolve_offset(500), Some("b.md"));
    }

    #[test]
    fn test_empty_index() {
        let index = CorpusIndex::build(std::iter::empty());
        assert!(index.is_empty());
        assert_eq!(index.global_text(), "");
        assert_eq!(index.resolve_offset(0), None);
        assert_eq!(index.find("anything"), None);
    }

    #[test]
    fn test_find_earliest() {
        let documents = docs(&[("a.md", "one two three"), ("b.md", "two three four")]);
        let index = CorpusIndex::build(&documents);

        let offset = index.find("two three").unwrap();
        assert_eq!(index.resolve_offset(offset), Some("a.md"));

        let offset = index.find("three four").unwrap();
        assert_eq!(index.resolve_offset(offset), Some("b.md"));

        assert_eq!(index.find(""), None);
    }

    #[test]
    fn test_rebuild_resets_state() {
        let first = docs(&[("a.md", "alpha"), ("b.md", "beta")]);
        let second = docs(&[("c.md", "gamma")]);

        let mut index = CorpusIndex::build(&first);
        index.rebuild(&second);

        assert_eq!(index.len(), 1);
        assert_eq!(index.global_text(), "gamma");
        assert_eq!(index.find("alpha"), None);
        assert_eq!(index, CorpusIndex::build(&second));
    }

    #[test]
    fn test_delimiter_in_body_is_neutralized() {
        let documents = docs(&[("a.md", "left\0right"), ("b.md", "next")]);
        let index = CorpusIndex::build(&documents);

        assert_eq!(index.global_text(), "left right\0next");
        assert_eq!(index.breakpoints()[1].offset, 11);
    }

    #[test]
    fn test_skips_blank_and_duplicate_ids() {
        let documents = docs(&[
            ("a.md", "alpha"),
            ("  ", "ghost"),
            ("a.md", "again"),
            ("b.md", "beta"),
        ]);
        let index = CorpusIndex::build(&documents);

        let ids: Vec<&str> = index
            .breakpoints()
            .iter()
            .map(|b| b.document_id.as_str())
            .collect();
        assert_eq!(ids, vec!["a.md", "b.md"]);
        assert_eq!(index.find("ghost"), None);
    }

    #[test]
    fn test_multibyte_lowercase_offsets() {
        let documents = docs(&[("a.md", "ÜBER Straße"), ("b.md", "Zürich Lake")]);
        let index = CorpusIndex::build(&documents);

        let offset = index.find("zürich").unwrap();
        assert_eq!(index.resolve_offset(offset), Some("b.md"));
        assert_eq!(
            index.breakpoints()[1].offset,
            "über straße".len() + 1
        );
    }
}
