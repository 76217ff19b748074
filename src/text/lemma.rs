//! Noun lemmatization that keeps dictionary words
//!
//! Plural nouns are reduced to their singular; every other word is kept as
//! written. Verb and adjective forms ("learning", "named") stay intact, so
//! lemmatized phrases still name real resources.

/// Irregular plurals, and words ending in `s` that are not plurals
const EXCEPTIONS: &[(&str, &str)] = &[
    ("afterwards", "afterwards"),
    ("always", "always"),
    ("analyses", "analysis"),
    ("axes", "axis"),
    ("bases", "basis"),
    ("bayes", "bayes"),
    ("besides", "besides"),
    ("biases", "bias"),
    ("caches", "cache"),
    ("children", "child"),
    ("cookies", "cookie"),
    ("criteria", "criterion"),
    ("diagnoses", "diagnosis"),
    ("does", "does"),
    ("feet", "foot"),
    ("hypotheses", "hypothesis"),
    ("indices", "index"),
    ("lens", "lens"),
    ("matrices", "matrix"),
    ("men", "man"),
    ("mice", "mouse"),
    ("movies", "movie"),
    ("news", "news"),
    ("niches", "niche"),
    ("perhaps", "perhaps"),
    ("phenomena", "phenomenon"),
    ("series", "series"),
    ("sometimes", "sometimes"),
    ("species", "species"),
    ("syntheses", "synthesis"),
    ("theses", "thesis"),
    ("towards", "towards"),
    ("vertices", "vertex"),
    ("whereas", "whereas"),
    ("women", "woman"),
];

/// Endings of singular words that merely end in `s`
const SINGULAR_ENDINGS: &[&str] = &["ss", "us", "is", "ics"];

/// Singular form of a lowercase word; non-plurals are returned unchanged.
pub fn lemmatize(word: &str) -> String {
    if let Some((_, lemma)) = EXCEPTIONS.iter().find(|(plural, _)| *plural == word) {
        return lemma.to_string();
    }
    if let Some(stem) = word.strip_suffix("'s") {
        return stem.to_string();
    }
    if word.chars().count() <= 3
        || !word.ends_with('s')
        || SINGULAR_ENDINGS.iter().any(|e| word.ends_with(e))
    {
        return word.to_string();
    }

    if word.len() > 4 {
        if let Some(stem) = word.strip_suffix("ies") {
            return format!("{}y", stem);
        }
    }
    for ending in ["sses", "xes", "ches", "shes"] {
        if word.ends_with(ending) {
            return word[..word.len() - 2].to_string();
        }
    }
    word[..word.len() - 1].to_string()
}
