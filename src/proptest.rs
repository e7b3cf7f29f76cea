//! Property-based tests for the grounding pipeline using proptest.
//!
//! - A quote taken verbatim from a document always verifies to that document
//! - Quotes made only of words absent from the corpus never verify
//! - Every global offset resolves to the document whose range contains it
//! - Rebuilding an index from the same documents is deterministic
//! - Similarity stays within `[0, 1]` and is `1.0` on identical input
