//! Collocation extraction for one article
//!
//! Turns an article's n-gram index into article collocations, merging what
//! the index scores against what the cluster already knows, then backfills
//! newly discovered phrases into the cluster's other articles.

use super::reconciler::Reconciler;
use super::score::{pmi, residual_scores};
use super::{ExtractError, ExtractResult};
use crate::corpus::{Article, ArticleCollocation, ArticleId};
use crate::search::TextIndex;
use crate::storage::CorpusStore;
use crate::text::{contains_phrase, ngram_len, NgramIndex, DEFAULT_MAX_NGRAM};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, info};

/// Tuning of the extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// A phrase is accepted when its score is strictly above this
    pub threshold: i64,
    /// Longest n-gram indexed for new articles
    pub max_ngram: usize,
    /// Minimum pointwise mutual information, when set
    pub min_pmi: Option<f64>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            threshold: 2,
            max_ngram: DEFAULT_MAX_NGRAM,
            min_pmi: None,
        }
    }
}

/// Scored and partitioned candidates of one index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// Accepted phrases and their scores
    pub scores: BTreeMap<String, i64>,
    /// Known phrases that did not score but occur in the index, with their
    /// local counts
    pub revalidated: BTreeMap<String, i64>,
    /// Accepted phrases the cluster did not know before
    pub new: BTreeSet<String>,
}

impl Extraction {
    /// Article collocation counts to create, revalidated first.
    pub fn rows(&self) -> impl Iterator<Item = (&str, i64)> {
        self.revalidated
            .iter()
            .chain(self.scores.iter().filter(|(_, score)| **score > 0))
            .map(|(ngram, &count)| (ngram.as_str(), count))
    }

    /// New phrases, longest first, so a phrase is backfilled only after
    /// every new phrase that contains it.
    pub fn new_longest_first(&self) -> Vec<&str> {
        let mut ngrams: Vec<&str> = self.new.iter().map(String::as_str).collect();
        ngrams.sort_by(|a, b| ngram_len(b).cmp(&ngram_len(a)).then_with(|| a.cmp(b)));
        ngrams
    }
}

/// What `Extractor::create_collocations` did
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionReport {
    pub article_id: ArticleId,
    /// The article had an empty index or already had collocations
    pub skipped: bool,
    pub created: Vec<ArticleCollocation>,
    /// Rows added to other articles of the cluster
    pub backfilled: Vec<ArticleCollocation>,
    pub new_ngrams: Vec<String>,
    /// New phrases were propagated in a single pass; a full
    /// reconciliation of the cluster should follow.
    pub needs_reconciliation: bool,
}

impl ExtractionReport {
    fn skipped(article_id: ArticleId) -> Self {
        Self {
            article_id,
            skipped: true,
            ..Default::default()
        }
    }
}

/// Residual count of `ngram` in an article whose index counts it
/// `index_count` times, given the article's existing collocations.
///
/// Occurrences already counted by collocations containing the phrase are
/// subtracted. Only a strictly positive residual is returned.
pub fn backfill_residual(
    index_count: i64,
    existing: &[ArticleCollocation],
    ngram: &str,
) -> Option<i64> {
    let consumed: i64 = existing
        .iter()
        .filter(|row| contains_phrase(&row.ngram, ngram))
        .map(|row| row.count)
        .sum();
    let residual = index_count - consumed;
    (residual > 0).then_some(residual)
}

/// Scores n-gram indexes and writes the resulting article collocations
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    config: ExtractorConfig,
}

impl Extractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Score `index` and partition its phrases against the n-grams the
    /// cluster already knows.
    pub fn extract(&self, index: &NgramIndex, existing: &HashSet<String>) -> Extraction {
        let threshold = self.config.threshold;
        let min_pmi = self.config.min_pmi;

        let scores = residual_scores(index, |ngram, score| {
            score > threshold
                && min_pmi.map_or(true, |min| pmi(index, ngram).is_some_and(|p| p >= min))
        });

        let revalidated = existing
            .iter()
            .filter(|ngram| !scores.contains_key(*ngram))
            .filter_map(|ngram| index.get(ngram).map(|&count| (ngram.clone(), count as i64)))
            .collect();

        let new = scores
            .keys()
            .filter(|ngram| !existing.contains(*ngram))
            .cloned()
            .collect();

        Extraction {
            scores,
            revalidated,
            new,
        }
    }

    /// Create the article collocations of `article` and backfill newly
    /// discovered phrases into other articles of its cluster.
    pub fn create_collocations(
        &self,
        store: &dyn CorpusStore,
        text_index: &dyn TextIndex,
        reconciler: &Reconciler,
        article: &Article,
    ) -> ExtractResult<ExtractionReport> {
        let index = article
            .ngram_index()
            .map_err(|source| ExtractError::CorruptIndex {
                article_id: article.id,
                source,
            })?;

        if index.is_empty() || store.has_article_collocations(article.id)? {
            debug!(article_id = article.id, "Skipping collocation extraction");
            return Ok(ExtractionReport::skipped(article.id));
        }

        let existing = store.collocation_ngrams(article.cluster)?;
        let extraction = self.extract(&index, &existing);

        let mut report = ExtractionReport {
            article_id: article.id,
            ..Default::default()
        };

        for (ngram, count) in extraction.rows() {
            let row = ArticleCollocation {
                article_id: article.id,
                ngram: ngram.to_string(),
                count,
            };
            store.insert_article_collocation(&row)?;
            reconciler.on_created(store, article.cluster, ngram, count)?;
            report.created.push(row);
        }

        for ngram in extraction.new_longest_first() {
            self.backfill(store, text_index, reconciler, article, ngram, &mut report.backfilled)?;
        }

        report.new_ngrams = extraction.new.into_iter().collect();
        report.needs_reconciliation = !report.new_ngrams.is_empty();

        info!(
            article_id = article.id,
            created = report.created.len(),
            backfilled = report.backfilled.len(),
            new = report.new_ngrams.len(),
            "Extracted collocations"
        );

        Ok(report)
    }

    fn backfill(
        &self,
        store: &dyn CorpusStore,
        text_index: &dyn TextIndex,
        reconciler: &Reconciler,
        article: &Article,
        ngram: &str,
        backfilled: &mut Vec<ArticleCollocation>,
    ) -> ExtractResult<()> {
        for other_id in text_index.query_phrase(ngram, article.id) {
            let Some(other) = store.load_article(other_id)? else {
                continue;
            };
            if other.cluster != article.cluster {
                continue;
            }

            let other_index = other
                .ngram_index()
                .map_err(|source| ExtractError::CorruptIndex {
                    article_id: other.id,
                    source,
                })?;
            let Some(&index_count) = other_index.get(ngram) else {
                continue;
            };
            if store.load_article_collocation(other.id, ngram)?.is_some() {
                continue;
            }

            let rows = store.article_collocations(other.id)?;
            let Some(residual) = backfill_residual(index_count as i64, &rows, ngram) else {
                continue;
            };

            let row = ArticleCollocation {
                article_id: other.id,
                ngram: ngram.to_string(),
                count: residual,
            };
            store.insert_article_collocation(&row)?;
            reconciler.on_created(store, other.cluster, ngram, residual)?;
            debug!(article_id = other.id, ngram, count = residual, "Backfilled collocation");
            backfilled.push(row);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(pairs: &[(&str, u64)]) -> NgramIndex {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn known(ngrams: &[&str]) -> HashSet<String> {
        ngrams.iter().map(|s| s.to_string()).collect()
    }

    fn row(ngram: &str, count: i64) -> ArticleCollocation {
        ArticleCollocation {
            article_id: 1,
            ngram: ngram.to_string(),
            count,
        }
    }

    #[test]
    fn partitions_known_and_new() {
        let extractor = Extractor::default();
        let index = index(&[
            ("neural", 5),
            ("network", 5),
            ("neural network", 5),
            ("decision tree", 1),
            ("random forest", 3),
        ]);
        let existing = known(&["decision tree", "random forest", "support vector machine"]);

        let extraction = extractor.extract(&index, &existing);

        assert_eq!(extraction.scores.get("neural network"), Some(&5));
        assert_eq!(extraction.scores.get("random forest"), Some(&3));
        assert_eq!(extraction.revalidated, BTreeMap::from([("decision tree".to_string(), 1)]));
        assert_eq!(extraction.new, BTreeSet::from(["neural network".to_string()]));
        assert_eq!(extraction.rows().count(), 3);
    }

    #[test]
    fn threshold_is_exclusive() {
        let extractor = Extractor::default();
        let extraction = extractor.extract(&index(&[("neural network", 2)]), &HashSet::new());
        assert!(extraction.scores.is_empty());
    }

    #[test]
    fn pmi_gate_rejects_loose_phrases() {
        let extractor = Extractor::new(ExtractorConfig {
            min_pmi: Some(10.0),
            ..Default::default()
        });
        let index = index(&[("neural", 5), ("network", 5), ("neural network", 5)]);
        assert!(extractor.extract(&index, &HashSet::new()).scores.is_empty());
    }

    #[test]
    fn new_phrases_are_ordered_longest_first() {
        let extraction = Extraction {
            new: BTreeSet::from([
                "neural network".to_string(),
                "neural network model".to_string(),
                "deep model".to_string(),
            ]),
            ..Default::default()
        };
        assert_eq!(
            extraction.new_longest_first(),
            vec!["neural network model", "deep model", "neural network"]
        );
    }

    #[test]
    fn residual_subtracts_containing_collocations() {
        let rows = [row("deep neural network", 2), row("network model", 4)];
        assert_eq!(backfill_residual(5, &rows, "neural network"), Some(3));
        assert_eq!(backfill_residual(2, &rows, "neural network"), None);
    }

    #[test]
    fn residual_containment_respects_token_boundaries() {
        let rows = [row("neural networks", 4)];
        assert_eq!(backfill_residual(3, &rows, "neural network"), Some(3));
    }
}
