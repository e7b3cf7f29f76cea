//! String similarity for grounding checks.
//!
//! Novelty, citation accuracy and critique-change scoring all compare text
//! through the [`Similarity`] trait. The default, [`RatcliffObershelp`], is the
//! matching-blocks ratio `2 * M / T` over characters, where `M` is the total
//! size of the recursively found longest common blocks and `T` the combined
//! length. For sequences of 200+ characters, characters occurring in more than
//! 1% of the second string are not used to seed matches (they can still extend
//! a match), which keeps long comparisons fast.

use std::collections::HashMap;

/// Normalized similarity between two strings.
///
/// Implementations return a value in `[0, 1]`, `1.0` for identical strings and
/// `0.0` for strings sharing no characters.
pub trait Similarity {
    fn similarity(&self, a: &str, b: &str) -> f64;

    /// Whether `similarity(a, b) >= threshold`. Implementations may answer from
    /// a cheap upper bound without computing the full ratio.
    fn meets_threshold(&self, a: &str, b: &str, threshold: f64) -> bool {
        self.similarity(a, b) >= threshold
    }
}

/// Case-insensitive Ratcliff/Obershelp ratio.
#[derive(Debug, Clone, Copy, Default)]
pub struct RatcliffObershelp;

impl Similarity for RatcliffObershelp {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        SequenceMatcher::new(&a.to_lowercase(), &b.to_lowercase()).ratio()
    }

    fn meets_threshold(&self, a: &str, b: &str, threshold: f64) -> bool {
        let a = a.to_lowercase();
        let b = b.to_lowercase();
        let (len_a, len_b) = (a.chars().count(), b.chars().count());
        if ratio_of(len_a.min(len_b), len_a + len_b) < threshold {
            return false;
        }

        let matcher = SequenceMatcher::new(&a, &b);
        matcher.quick_ratio() >= threshold && matcher.ratio() >= threshold
    }
}

/// Character-level matching-blocks comparison of two strings.
#[derive(Debug, Clone)]
pub struct SequenceMatcher {
    a: Vec<char>,
    b: Vec<char>,
    /// Positions of each (non-popular) character of `b`
    b2j: HashMap<char, Vec<usize>>,
}

impl SequenceMatcher {
    /// Length from which popular characters stop seeding matches.
    const AUTOJUNK_MIN_LEN: usize = 200;

    pub fn new(a: &str, b: &str) -> Self {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();

        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &c) in b.iter().enumerate() {
            b2j.entry(c).or_default().push(j);
        }

        if b.len() >= Self::AUTOJUNK_MIN_LEN {
            let limit = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= limit);
        }

        Self { a, b, b2j }
    }

    /// Similarity ratio in `[0, 1]`. Two empty strings are identical.
    pub fn ratio(&self) -> f64 {
        ratio_of(self.matching_chars(), self.a.len() + self.b.len())
    }

    /// Upper bound on [`ratio`](Self::ratio) from shared character counts.
    pub fn quick_ratio(&self) -> f64 {
        let mut available: HashMap<char, usize> = HashMap::new();
        for &c in &self.b {
            *available.entry(c).or_default() += 1;
        }

        let mut matches = 0;
        for c in &self.a {
            if let Some(count) = available.get_mut(c) {
                if *count > 0 {
                    *count -= 1;
                    matches += 1;
                }
            }
        }
        ratio_of(matches, self.a.len() + self.b.len())
    }

    /// Upper bound on [`ratio`](Self::ratio) from lengths alone.
    pub fn real_quick_ratio(&self) -> f64 {
        ratio_of(self.a.len().min(self.b.len()), self.a.len() + self.b.len())
    }

    /// Total size of all matching blocks.
    pub fn matching_chars(&self) -> usize {
        let mut pending = vec![(0, self.a.len(), 0, self.b.len())];
        let mut matches = 0;

        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let (i, j, k) = self.find_longest_match(alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            matches += k;
            if alo < i && blo < j {
                pending.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                pending.push((i + k, ahi, j + k, bhi));
            }
        }

        matches
    }

    /// Longest block with `a[i..i+k] == b[j..j+k]` inside the given ranges.
    ///
    /// Ties go to the block starting earliest in `a`, then earliest in `b`.
    fn find_longest_match(
        &self,
        alo: usize,
        ahi: usize,
        blo: usize,
        bhi: usize,
    ) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);

        // j2len[j] = length of the match ending at a[i-1], b[j]
        let mut j2len: HashMap<usize, usize> = HashMap::new();
        for i in alo..ahi {
            let mut next_j2len = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next_j2len.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            j2len = next_j2len;
        }

        // Popular characters never seed a match but may extend one.
        while best_i > alo && best_j > blo && self.a[best_i - 1] == self.b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && self.a[best_i + best_size] == self.b[best_j + best_size]
        {
            best_size += 1;
        }

        (best_i, best_j, best_size)
    }
}

fn ratio_of(matches: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        2.0 * matches as f64 / total as f64
    }
}
