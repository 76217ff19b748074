//! Per-collocation statistics over a cluster

use crate::corpus::{ArticleCollocation, ClusterId};
use crate::storage::{CollocationFilter, CorpusStore, StorageError, StorageResult};
use crate::text::{contains_phrase, get_contexts};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Scores describing how a collocation behaves across its cluster
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollocationStats {
    pub ngram: String,
    /// Aggregate count
    pub count_score: i64,
    /// Number of articles containing the collocation
    pub often_score_glob: usize,
    /// How often the collocation is consumed by bigger ones
    pub often_consumed_score: i64,
    /// Collocations of the same articles sharing a word, minus the article count
    pub often_word_local: i64,
    /// Per-article count to number of articles with that count
    pub occur_distribution: BTreeMap<i64, usize>,
}

/// Compute the statistics of one collocation of `cluster`.
pub fn collocation_stats(
    store: &dyn CorpusStore,
    cluster: ClusterId,
    ngram: &str,
) -> StorageResult<CollocationStats> {
    let colloc = store
        .load_collocation(cluster, ngram)?
        .ok_or_else(|| StorageError::CollocationNotFound {
            cluster,
            ngram: ngram.to_string(),
        })?;
    let occurrences = store.ngram_occurrences(cluster, ngram)?;

    let mut occur_distribution = BTreeMap::new();
    for row in &occurrences {
        *occur_distribution.entry(row.count).or_insert(0) += 1;
    }

    Ok(CollocationStats {
        ngram: colloc.ngram.clone(),
        count_score: colloc.count,
        often_score_glob: occurrences.len(),
        often_consumed_score: often_consumed_score(store, cluster, ngram, colloc.count)?,
        often_word_local: often_word_local(store, ngram, &occurrences)?,
        occur_distribution,
    })
}

fn often_consumed_score(
    store: &dyn CorpusStore,
    cluster: ClusterId,
    ngram: &str,
    count: i64,
) -> StorageResult<i64> {
    if count <= 0 {
        return Ok(0);
    }
    let total: i64 = store
        .list_collocations(cluster, &CollocationFilter::new().containing(ngram))?
        .iter()
        .filter(|c| contains_phrase(&c.ngram, ngram))
        .map(|c| c.count)
        .sum();
    Ok(total / count - 1)
}

fn often_word_local(
    store: &dyn CorpusStore,
    ngram: &str,
    occurrences: &[ArticleCollocation],
) -> StorageResult<i64> {
    let words: HashSet<&str> = ngram.split_whitespace().collect();
    let mut sharing = 0i64;

    for occurrence in occurrences {
        sharing += store
            .article_collocations(occurrence.article_id)?
            .iter()
            .filter(|row| row.ngram.split_whitespace().any(|w| words.contains(w)))
            .count() as i64;
    }

    Ok(sharing - occurrences.len() as i64)
}

/// Every context of `ngram` across the cluster's articles, or the n-gram
/// itself when none is found.
pub fn all_contexts(
    store: &dyn CorpusStore,
    cluster: ClusterId,
    ngram: &str,
) -> StorageResult<Vec<String>> {
    let mut contexts = Vec::new();

    for occurrence in store.ngram_occurrences(cluster, ngram)? {
        let Some(article) = store.load_article(occurrence.article_id)? else {
            continue;
        };
        let bigger = bigger_ngrams(store, &occurrence, ngram)?;
        contexts.extend(get_contexts(&article.stemmed_text, ngram, &bigger));
    }

    if contexts.is_empty() {
        contexts.push(ngram.to_string());
    }
    Ok(contexts)
}

/// Collocations of the same article that contain `ngram`, excluding itself
fn bigger_ngrams(
    store: &dyn CorpusStore,
    occurrence: &ArticleCollocation,
    ngram: &str,
) -> StorageResult<Vec<String>> {
    Ok(store
        .article_collocations(occurrence.article_id)?
        .into_iter()
        .filter(|row| row.ngram != ngram && contains_phrase(&row.ngram, ngram))
        .map(|row| row.ngram)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{ArticleId, NewArticle};
    use crate::storage::{OpenStore, SqliteStore};

    const CS: ClusterId = ClusterId::ComputerScience;

    fn create_test_store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn add_article(store: &SqliteStore, stemmed: &str) -> ArticleId {
        store
            .insert_article(&NewArticle::new(stemmed, CS, 2013), stemmed, "")
            .unwrap()
            .id
    }

    fn add_row(store: &SqliteStore, article_id: ArticleId, ngram: &str, count: i64) {
        store
            .insert_article_collocation(&ArticleCollocation {
                article_id,
                ngram: ngram.to_string(),
                count,
            })
            .unwrap();
        store.increment_collocation(CS, ngram, count).unwrap();
    }

    #[test]
    fn test_scores() {
        let store = create_test_store();
        let a = add_article(&store, "we train a deep neural network . neural network");
        let b = add_article(&store, "neural network model");

        add_row(&store, a, "neural network", 2);
        add_row(&store, a, "deep neural network", 2);
        add_row(&store, b, "neural network", 2);
        add_row(&store, b, "network model", 1);

        let stats = collocation_stats(&store, CS, "neural network").unwrap();
        assert_eq!(stats.count_score, 4);
        assert_eq!(stats.often_score_glob, 2);
        // (4 + 2) / 4 - 1
        assert_eq!(stats.often_consumed_score, 0);
        // a: 2 rows share a word, b: 2 rows, minus 2 articles
        assert_eq!(stats.often_word_local, 2);
        assert_eq!(stats.occur_distribution, BTreeMap::from([(2, 2)]));
    }

    #[test]
    fn test_missing_collocation_is_an_error() {
        let store = create_test_store();
        let err = collocation_stats(&store, CS, "neural network").unwrap_err();
        assert!(matches!(err, StorageError::CollocationNotFound { .. }));
    }

    #[test]
    fn test_contexts_skip_bigger_collocations() {
        let store = create_test_store();
        let a = add_article(&store, "we train a deep neural network . neural network converge");
        add_row(&store, a, "neural network", 1);
        add_row(&store, a, "deep neural network", 1);

        let contexts = all_contexts(&store, CS, "neural network").unwrap();
        assert_eq!(contexts.len(), 1);
        assert!(contexts[0].ends_with("neural network converge"));
    }

    #[test]
    fn test_contexts_fall_back_to_ngram() {
        let store = create_test_store();
        let a = add_article(&store, "unrelated text");
        add_row(&store, a, "neural network", 1);

        assert_eq!(
            all_contexts(&store, CS, "neural network").unwrap(),
            vec!["neural network".to_string()]
        );
    }
}
