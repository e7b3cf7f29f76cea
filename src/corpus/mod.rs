//! Research corpus: documents, the global search index, and library loading.
//!
//! A session loads its documents once (usually through [`LibraryLoader`]),
//! builds a [`CorpusIndex`] from them, and keeps the [`Corpus`] itself as the
//! snapshot that end-of-session metrics are scored against.
//!
//! ## Example
//!
//! ```rust
//! use rain_grounding::corpus::{Corpus, CorpusIndex, Document};
//!
//! let corpus: Corpus = [Document::new("paper.md", "Heat flux scales as U-cubed.")]
//!     .into_iter()
//!     .collect();
//! let index = CorpusIndex::build(&corpus);
//!
//! let offset = index.find("u-cubed").unwrap();
//! assert_eq!(index.resolve_offset(offset), Some("paper.md"));
//! ```

pub mod context;
pub mod index;
pub mod library;
pub mod types;

pub use context::{prompt_context, ContextBudget};
pub use index::{Breakpoint, CorpusIndex, DOCUMENT_DELIMITER};
pub use library::{LibraryConfig, LibraryLoader};
pub use types::{Corpus, Document};
