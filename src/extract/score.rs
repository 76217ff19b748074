//! Collocation scoring over an n-gram index

use crate::text::{contains_phrase, ngram_len, NgramIndex};
use std::collections::BTreeMap;

/// Residual scores of the multi-word n-grams of `index` that pass `accept`.
///
/// N-grams are visited longest first. The score of an n-gram is its index
/// count minus the scores of already accepted longer n-grams containing it,
/// so occurrences swallowed by a larger phrase are not counted twice.
pub fn residual_scores<F>(index: &NgramIndex, mut accept: F) -> BTreeMap<String, i64>
where
    F: FnMut(&str, i64) -> bool,
{
    let mut candidates: Vec<(&str, usize, i64)> = index
        .iter()
        .map(|(ngram, &count)| (ngram.as_str(), ngram_len(ngram), count as i64))
        .filter(|&(_, len, _)| len > 1)
        .collect();
    candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let mut accepted: Vec<(&str, usize, i64)> = Vec::new();
    for (ngram, len, count) in candidates {
        let consumed: i64 = accepted
            .iter()
            .filter(|(bigger, bigger_len, _)| *bigger_len > len && contains_phrase(bigger, ngram))
            .map(|&(_, _, score)| score)
            .sum();
        let score = count - consumed;
        if accept(ngram, score) {
            accepted.push((ngram, len, score));
        }
    }

    accepted
        .into_iter()
        .map(|(ngram, _, score)| (ngram.to_string(), score))
        .collect()
}

/// Pointwise mutual information of an n-gram, from the unigram counts of
/// the same index. `None` when a word or the n-gram itself is missing.
pub fn pmi(index: &NgramIndex, ngram: &str) -> Option<f64> {
    let total: u64 = index
        .iter()
        .filter(|(k, _)| ngram_len(k) == 1)
        .map(|(_, &v)| v)
        .sum();
    if total == 0 {
        return None;
    }
    let total = total as f64;

    let joint = *index.get(ngram)? as f64 / total;
    let mut independent = 1.0;
    for word in ngram.split_whitespace() {
        // Stopwords are not indexed as unigrams; they do not constrain the phrase.
        if let Some(&count) = index.get(word) {
            independent *= count as f64 / total;
        }
    }

    Some((joint / independent).log2())
}
