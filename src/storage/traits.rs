//! Storage trait definitions

use crate::corpus::{
    Article, ArticleCollocation, ArticleId, ClusterId, Collocation, NewArticle, Relevance,
};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Article not found: {0}")]
    ArticleNotFound(ArticleId),

    #[error("Collocation '{ngram}' not found in {cluster}")]
    CollocationNotFound { cluster: ClusterId, ngram: String },

    #[error("Article {article_id} already has collocation '{ngram}'")]
    DuplicateArticleCollocation { article_id: ArticleId, ngram: String },

    #[error("Collocation '{ngram}' must have a positive count, got {count}")]
    InvalidCount { ngram: String, count: i64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParse(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Filter criteria for listing articles
#[derive(Debug, Clone, Default)]
pub struct ArticleFilter {
    pub cluster: Option<ClusterId>,
    /// Only articles published up to this year
    pub max_year: Option<i32>,
    pub limit: Option<usize>,
}

impl ArticleFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_cluster(mut self, cluster: ClusterId) -> Self {
        self.cluster = Some(cluster);
        self
    }

    pub fn up_to_year(mut self, year: i32) -> Self {
        self.max_year = Some(year);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Filter criteria for listing aggregate collocations
#[derive(Debug, Clone, Default)]
pub struct CollocationFilter {
    /// Substring the n-gram must contain
    pub containing: Option<String>,
    /// Minimum aggregate count
    pub min_count: Option<i64>,
    pub limit: Option<usize>,
}

impl CollocationFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn containing(mut self, fragment: impl Into<String>) -> Self {
        self.containing = Some(fragment.into());
        self
    }

    pub fn with_min_count(mut self, count: i64) -> Self {
        self.min_count = Some(count);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Entity store for articles, per-article collocations and per-cluster
/// aggregates.
///
/// Implementations must be thread-safe (Send + Sync). Counter updates
/// (`increment_collocation`) must be atomic at the storage layer.
pub trait CorpusStore: Send + Sync {
    // === Article Operations ===

    /// Insert a new article with its derived stemmed text and serialized index
    fn insert_article(
        &self,
        article: &NewArticle,
        stemmed_text: &str,
        index_json: &str,
    ) -> StorageResult<Article>;

    /// Load an article by ID
    fn load_article(&self, id: ArticleId) -> StorageResult<Option<Article>>;

    /// Replace title and abstract (used after document cleaning)
    fn update_article_metadata(
        &self,
        id: ArticleId,
        title: &str,
        abstract_text: &str,
    ) -> StorageResult<bool>;

    /// Delete an article row (its collocation rows cascade)
    fn delete_article(&self, id: ArticleId) -> StorageResult<bool>;

    /// List articles matching filter criteria, newest first
    fn list_articles(&self, filter: &ArticleFilter) -> StorageResult<Vec<Article>>;

    // === Article Collocation Operations ===

    /// Insert a row; fails with `DuplicateArticleCollocation` if (ngram, article) exists
    fn insert_article_collocation(&self, row: &ArticleCollocation) -> StorageResult<()>;

    /// Load the row for (article, ngram)
    fn load_article_collocation(
        &self,
        article_id: ArticleId,
        ngram: &str,
    ) -> StorageResult<Option<ArticleCollocation>>;

    /// Overwrite the count of an existing row
    fn set_article_collocation_count(
        &self,
        article_id: ArticleId,
        ngram: &str,
        count: i64,
    ) -> StorageResult<bool>;

    /// Delete a row, returning it if it existed
    fn delete_article_collocation(
        &self,
        article_id: ArticleId,
        ngram: &str,
    ) -> StorageResult<Option<ArticleCollocation>>;

    /// All rows of an article, ordered by count descending
    fn article_collocations(&self, article_id: ArticleId)
        -> StorageResult<Vec<ArticleCollocation>>;

    /// Whether an article has any collocation rows
    fn has_article_collocations(&self, article_id: ArticleId) -> StorageResult<bool>;

    /// All rows for an n-gram across the cluster's articles
    fn ngram_occurrences(
        &self,
        cluster: ClusterId,
        ngram: &str,
    ) -> StorageResult<Vec<ArticleCollocation>>;

    /// Sum of per-article counts for an n-gram within a cluster
    fn sum_article_counts(&self, cluster: ClusterId, ngram: &str) -> StorageResult<i64>;

    /// Per-ngram sums of per-article counts across a cluster
    fn cluster_article_sums(&self, cluster: ClusterId) -> StorageResult<Vec<(String, i64)>>;

    // === Aggregate Collocation Operations ===

    /// Load the aggregate row of an n-gram
    fn load_collocation(&self, cluster: ClusterId, ngram: &str)
        -> StorageResult<Option<Collocation>>;

    /// Atomically add `delta` to the aggregate count, creating the row with
    /// `delta` if it does not exist. Returns the updated row.
    fn increment_collocation(
        &self,
        cluster: ClusterId,
        ngram: &str,
        delta: i64,
    ) -> StorageResult<Collocation>;

    /// Create or overwrite the aggregate count
    fn save_collocation_count(
        &self,
        cluster: ClusterId,
        ngram: &str,
        count: i64,
    ) -> StorageResult<()>;

    /// Replace the provenance source tags of an aggregate row
    fn set_collocation_source(
        &self,
        cluster: ClusterId,
        ngram: &str,
        source: &str,
    ) -> StorageResult<bool>;

    /// Delete an aggregate row
    fn delete_collocation(&self, cluster: ClusterId, ngram: &str) -> StorageResult<bool>;

    /// List aggregate rows, ordered by count descending
    fn list_collocations(
        &self,
        cluster: ClusterId,
        filter: &CollocationFilter,
    ) -> StorageResult<Vec<Collocation>>;

    /// Every n-gram known to the cluster
    fn collocation_ngrams(&self, cluster: ClusterId) -> StorageResult<HashSet<String>>;

    // === Relevance Operations ===

    /// Record a relevance judgement for a cluster collocation
    fn save_relevance(
        &self,
        cluster: ClusterId,
        ngram: &str,
        relevance: Relevance,
    ) -> StorageResult<()>;

    /// Load a relevance judgement
    fn load_relevance(&self, cluster: ClusterId, ngram: &str) -> StorageResult<Option<Relevance>>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: CorpusStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
