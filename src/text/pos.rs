//! Heuristic part-of-speech tagging
//!
//! Assigns a coarse Penn-style tag to every word using stopword lookup,
//! capitalization and suffix rules. Good enough to tell whether a phrase
//! starts or ends with a noun, verb or adjective, which is all the feature
//! builder asks of it.

use super::stem::{tokenize, StemMethod, Token};
use super::stopwords::is_stop_word;
use std::collections::HashMap;

/// Coarse part-of-speech tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PosTag {
    Noun,
    ProperNoun,
    Verb,
    Adjective,
    Number,
    Function,
}

impl PosTag {
    /// Penn-style code used in tag patterns (e.g. `"JJ NN"`).
    pub fn code(&self) -> &'static str {
        match self {
            PosTag::Noun => "NN",
            PosTag::ProperNoun => "NNP",
            PosTag::Verb => "VB",
            PosTag::Adjective => "JJ",
            PosTag::Number => "CD",
            PosTag::Function => "IN",
        }
    }
}

/// A stemmed word together with its tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedToken {
    pub stem: String,
    pub tag: PosTag,
}

const NOUN_SUFFIXES: &[&str] = &[
    "tion", "sion", "ment", "ness", "ity", "ance", "ence", "ism", "ist", "ship", "hood", "ure",
    "age", "dom",
];

const ADJECTIVE_SUFFIXES: &[&str] = &[
    "al", "ive", "ous", "ic", "able", "ible", "ful", "less", "ary", "ular", "ian",
];

const VERB_SUFFIXES: &[&str] = &["ize", "ise", "ify", "ate"];

/// Tag raw text, returning boundary-delimited segments of tagged stems.
pub fn tag_text(text: &str, method: StemMethod) -> Vec<Vec<TaggedToken>> {
    let tokens = tokenize(text);
    let stems = method.stem_tokens(&tokens);

    let mut segments = Vec::new();
    let mut current: Vec<TaggedToken> = Vec::new();
    let mut sentence_start = true;
    let mut prev_function = false;

    for (token, stem) in tokens.iter().zip(stems) {
        match token {
            Token::Boundary(_) => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
                if token.ends_sentence() {
                    sentence_start = true;
                }
                prev_function = false;
            }
            Token::Word(word) => {
                let tag = classify(word, sentence_start, prev_function);
                prev_function = tag == PosTag::Function;
                sentence_start = false;
                current.push(TaggedToken { stem, tag });
            }
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }

    segments
}

fn classify(word: &str, sentence_start: bool, prev_function: bool) -> PosTag {
    let lower = word.to_lowercase();

    if is_stop_word(&lower) {
        return PosTag::Function;
    }
    if lower.chars().all(|c| !c.is_alphabetic()) {
        return PosTag::Number;
    }
    if !sentence_start && word.chars().next().is_some_and(char::is_uppercase) {
        return PosTag::ProperNoun;
    }
    if NOUN_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
        return PosTag::Noun;
    }
    // Gerunds act as nouns unless introduced by a function word ("by using").
    if lower.len() > 5 && lower.ends_with("ing") {
        return if prev_function { PosTag::Verb } else { PosTag::Noun };
    }
    if lower.len() > 4 && lower.ends_with("ed") {
        return PosTag::Verb;
    }
    if lower.len() > 4 && VERB_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
        return PosTag::Verb;
    }
    if lower.len() > 3 && ADJECTIVE_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
        return PosTag::Adjective;
    }
    PosTag::Noun
}

/// Most frequent tag pattern among the occurrences of `ngram` (a
/// space-joined stem sequence) in the tagged segments.
///
/// Ties are broken by the lexicographically smallest pattern. Returns
/// `None` when the n-gram does not occur.
pub fn dominant_pattern(segments: &[Vec<TaggedToken>], ngram: &str) -> Option<String> {
    let needle: Vec<&str> = ngram.split_whitespace().collect();
    if needle.is_empty() {
        return None;
    }

    let mut patterns: HashMap<String, usize> = HashMap::new();
    for segment in segments {
        for window in segment.windows(needle.len()) {
            if window.iter().zip(&needle).all(|(t, n)| t.stem == *n) {
                let pattern = window.iter().map(|t| t.tag.code()).collect::<Vec<_>>().join(" ");
                *patterns.entry(pattern).or_insert(0) += 1;
            }
        }
    }

    patterns
        .into_iter()
        .max_by(|(pa, ca), (pb, cb)| ca.cmp(cb).then_with(|| pb.cmp(pa)))
        .map(|(pattern, _)| pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(text: &str) -> Vec<&'static str> {
        tag_text(text, StemMethod::Porter)
            .into_iter()
            .flatten()
            .map(|t| t.tag.code())
            .collect()
    }

    #[test]
    fn tags_common_shapes() {
        assert_eq!(tags("neural network"), vec!["JJ", "NN"]);
        assert_eq!(tags("the classification"), vec!["IN", "NN"]);
        assert_eq!(tags("we optimized 42 models"), vec!["IN", "VB", "CD", "NN"]);
    }

    #[test]
    fn gerund_depends_on_previous_word() {
        assert_eq!(tags("machine learning"), vec!["NN", "NN"]);
        assert_eq!(tags("by learning"), vec!["IN", "VB"]);
    }

    #[test]
    fn capitalized_words_inside_sentence_are_proper_nouns() {
        assert_eq!(tags("Models from Google. Models"), vec!["NN", "IN", "NNP", "NN"]);
    }

    #[test]
    fn segments_split_at_boundaries() {
        let segments = tag_text("neural network, deep model", StemMethod::Porter);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0][1].stem, "network");
    }

    #[test]
    fn dominant_pattern_picks_most_frequent() {
        let segments = tag_text(
            "Neural network. A neural network. Neural Network again.",
            StemMethod::Porter,
        );
        assert_eq!(dominant_pattern(&segments, "neural network").as_deref(), Some("JJ NN"));
        assert_eq!(dominant_pattern(&segments, "missing phrase"), None);
    }
}
