//! Composite name similarity.
//!
//! Four metrics, each an integer in `[0, 100]`, summed into a composite in
//! `[0, 400]`:
//!
//! - `ratio`: indel similarity of the raw strings, `200 * LCS / (|a| + |b|)`.
//! - `partial_ratio`: best `ratio` of the shorter string against every
//!   equal-length window of the longer one.
//! - `token_sort_ratio`: `ratio` after folding accents, lowercasing, dropping
//!   punctuation and sorting tokens.
//! - `token_set_ratio`: best pairing of the shared-token core with each
//!   side's leftovers, on the same folded tokens.
//!
//! All metrics work on `char`s, not bytes. Any empty input scores 0.

use std::collections::BTreeSet;

use serde::Serialize;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Upper bound of the composite score.
pub const MAX_SCORE: u32 = 400;

/// Per-metric breakdown of a composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub ratio: u32,
    pub partial_ratio: u32,
    pub token_sort_ratio: u32,
    pub token_set_ratio: u32,
}

impl ScoreBreakdown {
    pub fn compute(a: &str, b: &str) -> Self {
        Self {
            ratio: ratio(a, b),
            partial_ratio: partial_ratio(a, b),
            token_sort_ratio: token_sort_ratio(a, b),
            token_set_ratio: token_set_ratio(a, b),
        }
    }

    pub fn total(&self) -> u32 {
        self.ratio + self.partial_ratio + self.token_sort_ratio + self.token_set_ratio
    }
}

/// Composite similarity of two names, `0..=400`.
pub fn score(a: &str, b: &str) -> u32 {
    ScoreBreakdown::compute(a, b).total()
}

pub fn ratio(a: &str, b: &str) -> u32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

pub fn partial_ratio(a: &str, b: &str) -> u32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let (shorter, longer) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
    if shorter.len() == longer.len() {
        return ratio_chars(shorter, longer);
    }

    let mut best = 0;
    for window in longer.windows(shorter.len()) {
        best = best.max(ratio_chars(shorter, window));
        if best == 100 {
            break;
        }
    }
    best
}

pub fn token_sort_ratio(a: &str, b: &str) -> u32 {
    let a = tokens(a);
    let b = tokens(b);
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    ratio(&sorted_join(a.iter()), &sorted_join(b.iter()))
}

pub fn token_set_ratio(a: &str, b: &str) -> u32 {
    let a: BTreeSet<String> = tokens(a).into_iter().collect();
    let b: BTreeSet<String> = tokens(b).into_iter().collect();
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let shared = sorted_join(a.intersection(&b));
    let only_a = sorted_join(a.difference(&b));
    let only_b = sorted_join(b.difference(&a));

    let with_a = format!("{shared} {only_a}").trim().to_string();
    let with_b = format!("{shared} {only_b}").trim().to_string();

    ratio(&shared, &with_a)
        .max(ratio(&shared, &with_b))
        .max(ratio(&with_a, &with_b))
}

/// Lowercased, accent-folded alphanumeric tokens.
pub fn tokens(s: &str) -> Vec<String> {
    fold(s).split_whitespace().map(str::to_string).collect()
}

fn fold(s: &str) -> String {
    s.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect()
}

fn sorted_join<'a, I>(tokens: I) -> String
where
    I: Iterator<Item = &'a String>,
{
    let mut sorted: Vec<&str> = tokens.map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.join(" ")
}

fn ratio_chars(a: &[char], b: &[char]) -> u32 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    // round(200 * lcs / total), half up, in integers
    let total = a.len() + b.len();
    ((400 * lcs_len(a, b) + total) / (2 * total)) as u32
}

/// Longest common subsequence length, two-row DP.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
