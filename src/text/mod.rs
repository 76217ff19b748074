//! Text normalization: tokenization, stemming, tagging and n-gram indexing

mod contexts;
mod lemma;
mod ngram;
mod pos;
mod stem;
mod stopwords;

pub use contexts::{get_contexts, CONTEXT_WINDOW};
pub use lemma::lemmatize;
pub use ngram::{
    build_ngram_index, contains_phrase, find_phrase, ngram_len, NgramIndex, DEFAULT_MAX_NGRAM,
};
pub use pos::{dominant_pattern, tag_text, PosTag, TaggedToken};
pub use stem::{is_boundary, tokenize, StemMethod, Token};
pub use stopwords::is_stop_word;
