//! Approximate string matching with scores in `[0, 100]`.
//!
//! Scores follow the Ratcliff/Obershelp measure: twice the number of characters
//! in matching blocks over the combined length. [`WeightedRatio`] combines the
//! whole-string ratio with partial (best aligned window) and token-based
//! variants, weighting them by how different the two strings are in length.

use std::collections::{BTreeSet, HashMap};

/// Similarity score, 0 (nothing in common) to 100 (identical after preprocessing)
pub type Score = u8;

const UNBASE_SCALE: f64 = 0.95;
const PARTIAL_SCALE: f64 = 0.9;
const LONG_PARTIAL_SCALE: f64 = 0.6;

/// Sequences at least this long drop their popular characters from matching
const AUTOJUNK_MIN_LEN: usize = 200;

/// Scores how well `candidate` matches `query`
pub trait Similarity {
    fn score(&self, query: &str, candidate: &str) -> Score;
}

/// Default scorer, see [`weighted_ratio`]
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedRatio;

impl Similarity for WeightedRatio {
    fn score(&self, query: &str, candidate: &str) -> Score {
        weighted_ratio(query, candidate)
    }
}

/// Highest-scoring choice and its score.
///
/// Ties go to the earliest choice, so a stable choice order gives a stable answer.
/// `None` only when there are no choices.
pub fn extract_one<'c, S, I>(scorer: &S, query: &str, choices: I) -> Option<(&'c str, Score)>
where
    S: Similarity + ?Sized,
    I: IntoIterator<Item = &'c str>,
{
    let mut best: Option<(&'c str, Score)> = None;
    for choice in choices {
        let score = scorer.score(query, choice);
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((choice, score));
        }
    }
    best
}

/// Drop Latin-1 supplement characters, turn every other non-word character
/// into a space, lowercase, trim.
pub fn preprocess(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if ('\u{80}'..='\u{ff}').contains(&c) {
            continue;
        }
        if c.is_alphanumeric() || c == '_' {
            out.extend(c.to_lowercase());
        } else {
            out.push(' ');
        }
    }
    out.trim().to_string()
}

/// Half-way cases round to even
fn to_score(value: f64) -> Score {
    value.round_ties_even().clamp(0.0, 100.0) as Score
}

/// A run of `size` equal characters at `a[a..]` and `b[b..]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Block {
    a: usize,
    b: usize,
    size: usize,
}

/// Recursive longest-common-block alignment of two character sequences
struct SequenceMatcher<'s> {
    a: &'s [char],
    b: &'s [char],
    b2j: HashMap<char, Vec<usize>>,
}

impl<'s> SequenceMatcher<'s> {
    fn new(a: &'s [char], b: &'s [char]) -> Self {
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, c) in b.iter().enumerate() {
            b2j.entry(*c).or_default().push(j);
        }
        if b.len() >= AUTOJUNK_MIN_LEN {
            let limit = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= limit);
        }
        Self { a, b, b2j }
    }

    /// Longest block inside `a[alo..ahi]` x `b[blo..bhi]`, earliest in `a` then `b` on ties
    fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> Block {
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
        let mut j2len: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut next = HashMap::new();
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
                    next.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            j2len = next;
        }

        // Popular characters are missing from b2j; grow the block over them
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

        Block {
            a: best_i,
            b: best_j,
            size: best_size,
        }
    }

    /// Non-adjacent matching blocks in order, ending with a zero-size block at the two lengths
    fn matching_blocks(&self) -> Vec<Block> {
        let mut pending = vec![(0, self.a.len(), 0, self.b.len())];
        let mut found = Vec::new();
        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let block = self.find_longest_match(alo, ahi, blo, bhi);
            if block.size == 0 {
                continue;
            }
            found.push(block);
            if alo < block.a && blo < block.b {
                pending.push((alo, block.a, blo, block.b));
            }
            if block.a + block.size < ahi && block.b + block.size < bhi {
                pending.push((block.a + block.size, ahi, block.b + block.size, bhi));
            }
        }
        found.sort_unstable();

        let mut blocks: Vec<Block> = Vec::with_capacity(found.len() + 1);
        for block in found {
            match blocks.last_mut() {
                Some(last) if last.a + last.size == block.a && last.b + last.size == block.b => {
                    last.size += block.size;
                }
                _ => blocks.push(block),
            }
        }
        blocks.push(Block {
            a: self.a.len(),
            b: self.b.len(),
            size: 0,
        });
        blocks
    }

    /// `2 * matched / (len_a + len_b)`, 1.0 for two empty sequences
    fn ratio(&self) -> f64 {
        let total = self.a.len() + self.b.len();
        if total == 0 {
            return 1.0;
        }
        let matched: usize = self.matching_blocks().iter().map(|b| b.size).sum();
        2.0 * matched as f64 / total as f64
    }
}

/// Ratcliff/Obershelp similarity of the whole strings
pub fn ratio(a: &str, b: &str) -> Score {
    if a == b {
        return 100;
    }
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    to_score(100.0 * SequenceMatcher::new(&a, &b).ratio())
}

/// Best ratio of the shorter string against the windows of the longer one
/// that line up with its matching blocks
pub fn partial_ratio(a: &str, b: &str) -> Score {
    if a == b {
        return 100;
    }
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };

    let mut best = 0.0_f64;
    for block in SequenceMatcher::new(short, long).matching_blocks() {
        let start = block.b.saturating_sub(block.a);
        let end = (start + short.len()).min(long.len());
        let similarity = SequenceMatcher::new(short, &long[start..end]).ratio();
        if similarity > 0.995 {
            return 100;
        }
        best = best.max(similarity);
    }
    to_score(100.0 * best)
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Ratio after sorting the whitespace-separated tokens of both strings
pub fn token_sort_ratio(a: &str, b: &str, partial: bool) -> Score {
    let (a, b) = (sorted_tokens(a), sorted_tokens(b));
    if partial {
        partial_ratio(&a, &b)
    } else {
        ratio(&a, &b)
    }
}

/// Ratio that ignores tokens repeated in either string and rewards a shared token core
pub fn token_set_ratio(a: &str, b: &str, partial: bool) -> Score {
    if a == b {
        return 100;
    }
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let a_tokens: BTreeSet<&str> = a.split_whitespace().collect();
    let b_tokens: BTreeSet<&str> = b.split_whitespace().collect();

    let common = a_tokens
        .intersection(&b_tokens)
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    let only_a = a_tokens
        .difference(&b_tokens)
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    let only_b = b_tokens
        .difference(&a_tokens)
        .copied()
        .collect::<Vec<_>>()
        .join(" ");

    let with_a = format!("{} {}", common, only_a).trim().to_string();
    let with_b = format!("{} {}", common, only_b).trim().to_string();

    let score = |x: &str, y: &str| if partial { partial_ratio(x, y) } else { ratio(x, y) };
    score(&common, &with_a)
        .max(score(&common, &with_b))
        .max(score(&with_a, &with_b))
}

/// Weighted combination of the ratios above.
///
/// Strings of similar length (less than 1.5x apart) are compared whole, with
/// token-sort and token-set ratios scaled by 0.95. More lopsided pairs also get
/// partial variants, scaled by 0.9, or by 0.6 once one string is over 8x longer.
pub fn weighted_ratio(a: &str, b: &str) -> Score {
    let a = preprocess(a);
    let b = preprocess(b);
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let base = ratio(&a, &b) as f64;
    let a_len = a.chars().count() as f64;
    let b_len = b.chars().count() as f64;
    let len_ratio = a_len.max(b_len) / a_len.min(b_len);

    let best = if len_ratio < 1.5 {
        let sort = token_sort_ratio(&a, &b, false) as f64 * UNBASE_SCALE;
        let set = token_set_ratio(&a, &b, false) as f64 * UNBASE_SCALE;
        base.max(sort).max(set)
    } else {
        let partial_scale = if len_ratio > 8.0 {
            LONG_PARTIAL_SCALE
        } else {
            PARTIAL_SCALE
        };
        let partial = partial_ratio(&a, &b) as f64 * partial_scale;
        let sort = token_sort_ratio(&a, &b, true) as f64 * UNBASE_SCALE * partial_scale;
        let set = token_set_ratio(&a, &b, true) as f64 * UNBASE_SCALE * partial_scale;
        base.max(partial).max(sort).max(set)
    };

    to_score(best)
}
