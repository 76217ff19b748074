//! Tokenization and pluggable stemming strategies

use super::lemma::lemmatize;
use super::stopwords::is_stop_word;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Punctuation kept as standalone tokens. N-grams never span them.
const BOUNDARY_CHARS: &[char] = &['.', ',', ';', ':', '!', '?', '(', ')'];

/// A raw token produced by [`tokenize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A word with its original casing, surrounding punctuation stripped
    Word(String),
    /// Clause or sentence punctuation
    Boundary(char),
}

impl Token {
    /// Whether this boundary ends a sentence.
    pub fn ends_sentence(&self) -> bool {
        matches!(self, Token::Boundary('.' | '!' | '?'))
    }
}

/// Whether a token of a stemmed stream is a boundary token.
pub fn is_boundary(token: &str) -> bool {
    let mut chars = token.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if BOUNDARY_CHARS.contains(&c))
}

/// Split raw text into words and boundary tokens.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();

    for chunk in text.split_whitespace() {
        let mut trailing = Vec::new();
        let mut rest = chunk;

        while let Some(c) = rest.chars().next() {
            if c.is_alphanumeric() {
                break;
            }
            if BOUNDARY_CHARS.contains(&c) {
                tokens.push(Token::Boundary(c));
            }
            rest = &rest[c.len_utf8()..];
        }

        while let Some(c) = rest.chars().next_back() {
            if c.is_alphanumeric() {
                break;
            }
            if BOUNDARY_CHARS.contains(&c) {
                trailing.push(Token::Boundary(c));
            }
            rest = &rest[..rest.len() - c.len_utf8()];
        }

        if !rest.is_empty() {
            tokens.push(Token::Word(rest.to_string()));
        }
        tokens.extend(trailing.into_iter().rev());
    }

    tokens
}

/// Stemming strategy chosen when an article is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StemMethod {
    /// Lowercasing plus noun lemmatization; words stay dictionary words
    #[default]
    Lemma,
    /// English Snowball (Porter2) stemming of content words
    Porter,
    /// Lowercasing only, no lemmatization
    Lowercase,
}

impl StemMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            StemMethod::Lemma => "lemma",
            StemMethod::Porter => "porter",
            StemMethod::Lowercase => "lowercase",
        }
    }

    /// Names accepted by `FromStr`, for CLI choices.
    pub fn names() -> &'static [&'static str] {
        &["lemma", "porter", "lowercase"]
    }

    /// Normalize already tokenized input into stemmed tokens.
    pub fn stem_tokens(&self, tokens: &[Token]) -> Vec<String> {
        let stemmer = Stemmer::create(Algorithm::English);
        tokens
            .iter()
            .map(|token| match token {
                Token::Boundary(c) => c.to_string(),
                Token::Word(word) => self.stem_word(&stemmer, word),
            })
            .collect()
    }

    /// Normalize raw text into a space-joined stemmed token stream.
    pub fn stem_text(&self, text: &str) -> String {
        self.stem_tokens(&tokenize(text)).join(" ")
    }

    fn stem_word(&self, stemmer: &Stemmer, word: &str) -> String {
        let lower = word.to_lowercase();
        match self {
            StemMethod::Lowercase => lower,
            _ if is_stop_word(&lower) => lower,
            StemMethod::Lemma => lemmatize(&lower),
            StemMethod::Porter => stemmer.stem(&lower).into_owned(),
        }
    }
}

impl std::fmt::Display for StemMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StemMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lemma" | "wordnet" => Ok(StemMethod::Lemma),
            "porter" => Ok(StemMethod::Porter),
            "lowercase" => Ok(StemMethod::Lowercase),
            other => Err(format!("unknown stem method '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_separates_punctuation() {
        let tokens = tokenize("Neural networks, (deep) models.");
        assert_eq!(
            tokens,
            vec![
                Token::Word("Neural".into()),
                Token::Word("networks".into()),
                Token::Boundary(','),
                Token::Boundary('('),
                Token::Word("deep".into()),
                Token::Boundary(')'),
                Token::Word("models".into()),
                Token::Boundary('.'),
            ]
        );
    }

    #[test]
    fn tokenize_drops_quotes_and_keeps_inner_hyphens() {
        let tokens = tokenize("\"named-entity\" recognition");
        assert_eq!(
            tokens,
            vec![Token::Word("named-entity".into()), Token::Word("recognition".into())]
        );
    }

    #[test]
    fn porter_stems_content_words_only() {
        let stemmed = StemMethod::Porter.stem_text("The networks were running.");
        assert_eq!(stemmed, "the network were run .");
    }

    #[test]
    fn lemma_keeps_dictionary_words() {
        let stemmed = StemMethod::Lemma.stem_text("Named entity recognition with Machine Learning models.");
        assert_eq!(stemmed, "named entity recognition with machine learning model .");
    }

    #[test]
    fn lowercase_keeps_inflections() {
        let stemmed = StemMethod::Lowercase.stem_text("Neural Networks");
        assert_eq!(stemmed, "neural networks");
    }

    #[test]
    fn stem_method_parses_its_names() {
        for name in StemMethod::names() {
            let method: StemMethod = name.parse().unwrap();
            assert_eq!(method.as_str(), *name);
        }
        assert_eq!("wordnet".parse::<StemMethod>().unwrap(), StemMethod::Lemma);
        assert!("snowball".parse::<StemMethod>().is_err());
    }

    #[test]
    fn boundary_detection() {
        assert!(is_boundary("."));
        assert!(is_boundary("("));
        assert!(!is_boundary("net"));
        assert!(!is_boundary(".."));
    }
}
