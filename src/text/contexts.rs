//! Text snippets around n-gram occurrences

use super::ngram::find_phrase;

/// Tokens of context kept on each side of an occurrence.
pub const CONTEXT_WINDOW: usize = 8;

/// Snippets of `stemmed_text` around each occurrence of `ngram`.
///
/// Occurrences that sit inside an occurrence of one of `bigger_ngrams` are
/// skipped, so a phrase is not shown where a larger collocation swallowed it.
pub fn get_contexts(stemmed_text: &str, ngram: &str, bigger_ngrams: &[String]) -> Vec<String> {
    let tokens: Vec<&str> = stemmed_text.split_whitespace().collect();
    let needle: Vec<&str> = ngram.split_whitespace().collect();

    let mut covered: Vec<(usize, usize)> = Vec::new();
    for bigger in bigger_ngrams {
        let bigger_tokens: Vec<&str> = bigger.split_whitespace().collect();
        covered.extend(find_phrase(&tokens, &bigger_tokens).map(|s| (s, s + bigger_tokens.len())));
    }

    find_phrase(&tokens, &needle)
        .filter(|&start| {
            let end = start + needle.len();
            !covered.iter().any(|&(s, e)| s <= start && end <= e)
        })
        .map(|start| {
            let from = start.saturating_sub(CONTEXT_WINDOW);
            let to = (start + needle.len() + CONTEXT_WINDOW).min(tokens.len());
            tokens[from..to].join(" ")
        })
        .collect()
}
