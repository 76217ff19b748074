//! Maintenance of per-cluster aggregate collocation counts
//!
//! The aggregate count of an n-gram equals the sum of the per-article
//! counts of that n-gram within its cluster. The corpus service calls the
//! `on_*` hooks synchronously after each mutation of an article
//! collocation; `reconcile_cluster` repairs any drift in one pass.

use crate::corpus::{ClusterId, Collocation};
use crate::storage::{CollocationFilter, CorpusStore, StorageResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// What happens to an aggregate row whose count drops to zero or below
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroCountPolicy {
    /// Keep the row at zero so its provenance source survives
    #[default]
    Retain,
    /// Remove the row
    Delete,
}

/// Outcome of a full reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    /// Rows whose count was corrected
    pub updated: usize,
    /// Rows created for n-grams that had no aggregate
    pub created: usize,
    /// Orphan rows set to zero
    pub zeroed: usize,
    /// Orphan rows removed
    pub deleted: usize,
}

impl ReconcileSummary {
    pub fn is_clean(&self) -> bool {
        self.updated + self.created + self.zeroed + self.deleted == 0
    }
}

/// Keeps aggregate rows in step with article collocation rows
#[derive(Debug, Clone, Copy, Default)]
pub struct Reconciler {
    policy: ZeroCountPolicy,
}

impl Reconciler {
    pub fn new(policy: ZeroCountPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ZeroCountPolicy {
        self.policy
    }

    /// An article collocation with `count` was created.
    pub fn on_created(
        &self,
        store: &dyn CorpusStore,
        cluster: ClusterId,
        ngram: &str,
        count: i64,
    ) -> StorageResult<Collocation> {
        store.increment_collocation(cluster, ngram, count)
    }

    /// An article collocation's count was changed: recompute from scratch.
    pub fn on_updated(
        &self,
        store: &dyn CorpusStore,
        cluster: ClusterId,
        ngram: &str,
    ) -> StorageResult<Option<Collocation>> {
        let sum = store.sum_article_counts(cluster, ngram)?;
        if sum <= 0 {
            return self.apply_zero_policy(store, cluster, ngram);
        }
        store.save_collocation_count(cluster, ngram, sum)?;
        store.load_collocation(cluster, ngram)
    }

    /// An article collocation with `count` was deleted.
    ///
    /// Returns the remaining aggregate row, if any.
    pub fn on_deleted(
        &self,
        store: &dyn CorpusStore,
        cluster: ClusterId,
        ngram: &str,
        count: i64,
    ) -> StorageResult<Option<Collocation>> {
        if store.load_collocation(cluster, ngram)?.is_none() {
            warn!(cluster = %cluster, ngram, "No aggregate row to decrement");
            return Ok(None);
        }

        let colloc = store.increment_collocation(cluster, ngram, -count)?;
        if colloc.count > 0 {
            return Ok(Some(colloc));
        }
        self.apply_zero_policy(store, cluster, ngram)
    }

    fn apply_zero_policy(
        &self,
        store: &dyn CorpusStore,
        cluster: ClusterId,
        ngram: &str,
    ) -> StorageResult<Option<Collocation>> {
        match self.policy {
            ZeroCountPolicy::Retain => {
                store.save_collocation_count(cluster, ngram, 0)?;
                store.load_collocation(cluster, ngram)
            }
            ZeroCountPolicy::Delete => {
                store.delete_collocation(cluster, ngram)?;
                Ok(None)
            }
        }
    }

    /// Recompute every aggregate of `cluster` from its article collocations.
    pub fn reconcile_cluster(
        &self,
        store: &dyn CorpusStore,
        cluster: ClusterId,
    ) -> StorageResult<ReconcileSummary> {
        let mut summary = ReconcileSummary::default();

        let mut current: HashMap<String, i64> = store
            .list_collocations(cluster, &CollocationFilter::new())?
            .into_iter()
            .map(|c| (c.ngram, c.count))
            .collect();

        for (ngram, sum) in store.cluster_article_sums(cluster)? {
            match current.remove(&ngram) {
                Some(count) if count == sum => {}
                Some(count) => {
                    debug!(ngram = %ngram, from = count, to = sum, "Correcting aggregate");
                    store.save_collocation_count(cluster, &ngram, sum)?;
                    summary.updated += 1;
                }
                None => {
                    store.save_collocation_count(cluster, &ngram, sum)?;
                    summary.created += 1;
                }
            }
        }

        // Whatever is left has no article collocation behind it
        for (ngram, count) in current {
            match self.policy {
                ZeroCountPolicy::Retain if count != 0 => {
                    store.save_collocation_count(cluster, &ngram, 0)?;
                    summary.zeroed += 1;
                }
                ZeroCountPolicy::Retain => {}
                ZeroCountPolicy::Delete => {
                    store.delete_collocation(cluster, &ngram)?;
                    summary.deleted += 1;
                }
            }
        }

        info!(
            cluster = %cluster,
            updated = summary.updated,
            created = summary.created,
            zeroed = summary.zeroed,
            deleted = summary.deleted,
            "Reconciled cluster"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{ArticleCollocation, ArticleId, NewArticle};
    use crate::storage::{OpenStore, SqliteStore};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const CS: ClusterId = ClusterId::ComputerScience;

    fn create_test_store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn add_article(store: &SqliteStore, cluster: ClusterId) -> ArticleId {
        store
            .insert_article(&NewArticle::new("text", cluster, 2013), "text", "")
            .unwrap()
            .id
    }

    fn add_row(
        store: &SqliteStore,
        reconciler: &Reconciler,
        article_id: ArticleId,
        ngram: &str,
        count: i64,
    ) {
        store
            .insert_article_collocation(&ArticleCollocation {
                article_id,
                ngram: ngram.to_string(),
                count,
            })
            .unwrap();
        let cluster = store.load_article(article_id).unwrap().unwrap().cluster;
        reconciler.on_created(store, cluster, ngram, count).unwrap();
    }

    fn aggregate(store: &SqliteStore, ngram: &str) -> Option<i64> {
        store.load_collocation(CS, ngram).unwrap().map(|c| c.count)
    }

    #[test]
    fn test_create_then_delete_returns_to_zero() {
        let store = create_test_store();
        let reconciler = Reconciler::default();
        let a = add_article(&store, CS);

        add_row(&store, &reconciler, a, "neural network", 5);
        assert_eq!(aggregate(&store, "neural network"), Some(5));

        let row = store.delete_article_collocation(a, "neural network").unwrap().unwrap();
        let remaining = reconciler.on_deleted(&store, CS, &row.ngram, row.count).unwrap();

        assert_eq!(remaining.map(|c| c.count), Some(0));
        assert_eq!(aggregate(&store, "neural network"), Some(0));
    }

    #[test]
    fn test_delete_policy_removes_row() {
        let store = create_test_store();
        let reconciler = Reconciler::new(ZeroCountPolicy::Delete);
        let a = add_article(&store, CS);

        add_row(&store, &reconciler, a, "neural network", 2);
        store.delete_article_collocation(a, "neural network").unwrap();
        assert!(reconciler.on_deleted(&store, CS, "neural network", 2).unwrap().is_none());
        assert_eq!(aggregate(&store, "neural network"), None);
    }

    #[test]
    fn test_retain_keeps_source() {
        let store = create_test_store();
        let reconciler = Reconciler::default();
        let a = add_article(&store, CS);

        add_row(&store, &reconciler, a, "neural network", 2);
        store.set_collocation_source(CS, "neural network", "dbpedia").unwrap();
        store.delete_article_collocation(a, "neural network").unwrap();
        let kept = reconciler.on_deleted(&store, CS, "neural network", 2).unwrap().unwrap();
        assert_eq!(kept.source, "dbpedia");
    }

    #[test]
    fn test_update_resums_within_cluster() {
        let store = create_test_store();
        let reconciler = Reconciler::default();
        let a = add_article(&store, CS);
        let b = add_article(&store, CS);
        let other = add_article(&store, ClusterId::ScienceWise);

        add_row(&store, &reconciler, a, "neural network", 3);
        add_row(&store, &reconciler, b, "neural network", 4);
        add_row(&store, &reconciler, other, "neural network", 10);

        store.set_article_collocation_count(a, "neural network", 1).unwrap();
        let updated = reconciler.on_updated(&store, CS, "neural network").unwrap().unwrap();
        assert_eq!(updated.count, 5);
    }

    #[test]
    fn test_deleting_unknown_aggregate_is_tolerated() {
        let store = create_test_store();
        let reconciler = Reconciler::default();
        assert!(reconciler.on_deleted(&store, CS, "ghost phrase", 3).unwrap().is_none());
        assert_eq!(aggregate(&store, "ghost phrase"), None);
    }

    #[test]
    fn test_reconcile_cluster_repairs_drift() {
        let store = create_test_store();
        let reconciler = Reconciler::default();
        let a = add_article(&store, CS);

        add_row(&store, &reconciler, a, "neural network", 3);
        // Drift: a row inserted without its hook, an aggregate edited by hand
        store
            .insert_article_collocation(&ArticleCollocation {
                article_id: a,
                ngram: "decision tree".to_string(),
                count: 2,
            })
            .unwrap();
        store.save_collocation_count(CS, "neural network", 11).unwrap();
        store.save_collocation_count(CS, "orphan phrase", 4).unwrap();

        let summary = reconciler.reconcile_cluster(&store, CS).unwrap();
        assert_eq!(
            summary,
            ReconcileSummary {
                updated: 1,
                created: 1,
                zeroed: 1,
                deleted: 0
            }
        );
        assert_eq!(aggregate(&store, "neural network"), Some(3));
        assert_eq!(aggregate(&store, "decision tree"), Some(2));
        assert_eq!(aggregate(&store, "orphan phrase"), Some(0));

        assert!(reconciler.reconcile_cluster(&store, CS).unwrap().is_clean());
    }

    #[test]
    fn test_random_sequences_keep_aggregates_exact() {
        let store = create_test_store();
        let reconciler = Reconciler::default();
        let articles: Vec<ArticleId> = (0..4).map(|_| add_article(&store, CS)).collect();
        let ngrams = ["neural network", "decision tree", "support vector machine"];
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..200 {
            let article = articles[rng.gen_range(0..articles.len())];
            let ngram = ngrams[rng.gen_range(0..ngrams.len())];

            match store.load_article_collocation(article, ngram).unwrap() {
                None => add_row(&store, &reconciler, article, ngram, rng.gen_range(1..6)),
                Some(row) if rng.gen_bool(0.5) => {
                    store.delete_article_collocation(article, ngram).unwrap();
                    reconciler.on_deleted(&store, CS, ngram, row.count).unwrap();
                }
                Some(_) => {
                    store
                        .set_article_collocation_count(article, ngram, rng.gen_range(1..6))
                        .unwrap();
                    reconciler.on_updated(&store, CS, ngram).unwrap();
                }
            }

            for ngram in ngrams {
                let sum = store.sum_article_counts(CS, ngram).unwrap();
                assert_eq!(aggregate(&store, ngram).unwrap_or(0), sum);
            }
        }
    }
}
