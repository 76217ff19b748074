//! N-gram frequency index over stemmed text

use super::stem::is_boundary;
use super::stopwords::is_stop_word;
use std::collections::BTreeMap;

/// Longest n-gram the index records by default.
pub const DEFAULT_MAX_NGRAM: usize = 4;

/// Mapping of n-gram string (space-joined stems) to occurrence count.
pub type NgramIndex = BTreeMap<String, u64>;

/// Build the n-gram index of a stemmed token stream.
///
/// N-grams of length 1 to `max_n` are counted within boundary-delimited
/// segments. An n-gram never starts or ends with a stopword and is never
/// made only of numbers.
pub fn build_ngram_index(stemmed_text: &str, max_n: usize) -> NgramIndex {
    let mut index = NgramIndex::new();
    let tokens: Vec<&str> = stemmed_text.split_whitespace().collect();

    for segment in tokens.split(|t| is_boundary(t)) {
        for n in 1..=max_n.min(segment.len()) {
            for window in segment.windows(n) {
                if is_candidate(window) {
                    *index.entry(window.join(" ")).or_insert(0) += 1;
                }
            }
        }
    }

    index
}

fn is_candidate(window: &[&str]) -> bool {
    let (Some(first), Some(last)) = (window.first(), window.last()) else {
        return false;
    };
    if is_stop_word(first) || is_stop_word(last) {
        return false;
    }
    !window.iter().all(|t| t.chars().all(|c| !c.is_alphabetic()))
}

/// Number of tokens in an n-gram.
pub fn ngram_len(ngram: &str) -> usize {
    ngram.split_whitespace().count()
}

/// Whether `needle` occurs in `haystack` as a contiguous token subsequence.
pub fn contains_phrase(haystack: &str, needle: &str) -> bool {
    let hay: Vec<&str> = haystack.split_whitespace().collect();
    let needle: Vec<&str> = needle.split_whitespace().collect();
    let found = find_phrase(&hay, &needle).next().is_some();
    found
}

/// Start positions of every occurrence of `needle` in `tokens`.
pub fn find_phrase<'a>(
    tokens: &'a [&'a str],
    needle: &'a [&'a str],
) -> impl Iterator<Item = usize> + 'a {
    let n = needle.len();
    tokens
        .windows(n.max(1))
        .enumerate()
        .filter(move |(_, w)| n > 0 && *w == needle)
        .map(|(i, _)| i)
}
