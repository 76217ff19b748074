//! Corpus service
//!
//! `CorpusService` is the single entry point for operations over the corpus.
//! It owns the store and text index, runs extraction when articles are
//! added, and keeps aggregate counts in step by calling the reconciler
//! synchronously after every article collocation mutation.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::classify::{Classifier, ClassifierError, Label};
use crate::config::{Config, ConfigError};
use crate::corpus::{
    Article, ArticleCollocation, ArticleId, ClusterId, Collocation, NewArticle, Relevance,
};
use crate::dbpedia::{
    cache_key, is_category, CacheError, CategoryGraph, CrawlError, Crawler, GraphCache,
    KnowledgeGraphClient,
};
use crate::extract::{
    all_contexts, collocation_stats, CollocationStats, ExtractError, ExtractionReport, Extractor,
    ExtractorConfig, ReconcileSummary, Reconciler, ZeroCountPolicy,
};
use crate::features::{build_features, CollocationFeatures, ComponentIndex};
use crate::pdf::{clean_extracted, DocumentError, PlainTextExtractor, TextExtractor};
use crate::search::{IndexedDocument, TextIndex};
use crate::storage::{ArticleFilter, CollocationFilter, CorpusStore, StorageError};
use crate::text::build_ngram_index;

/// Provenance tag marking collocations known to DBpedia
pub const DBPEDIA_SOURCE: &str = "dbpedia";

/// Errors from corpus operations
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Crawl(#[from] CrawlError),

    #[error("Graph cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Source document {0} is missing")]
    MissingDocument(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No knowledge-graph crawler configured")]
    NoCrawler,
}

/// Result type for corpus operations
pub type CorpusResult<T> = Result<T, CorpusError>;

/// An added article and what extraction did for it
#[derive(Debug, Clone)]
pub struct AddedArticle {
    pub article: Article,
    pub report: ExtractionReport,
}

/// Single entry point for corpus operations.
#[derive(Clone)]
pub struct CorpusService {
    store: Arc<dyn CorpusStore>,
    index: Arc<dyn TextIndex>,
    documents: Arc<dyn TextExtractor>,
    extractor: Extractor,
    reconciler: Reconciler,
    crawler: Option<Arc<Crawler>>,
    cache: Option<GraphCache>,
}

impl CorpusService {
    pub fn new(store: Arc<dyn CorpusStore>, index: Arc<dyn TextIndex>) -> Self {
        Self {
            store,
            index,
            documents: Arc::new(PlainTextExtractor),
            extractor: Extractor::default(),
            reconciler: Reconciler::default(),
            crawler: None,
            cache: None,
        }
    }

    /// Wire a service from configuration. The crawler queries `client`.
    pub fn from_config(
        config: &Config,
        store: Arc<dyn CorpusStore>,
        index: Arc<dyn TextIndex>,
        client: Arc<dyn KnowledgeGraphClient>,
    ) -> CorpusResult<Self> {
        let crawler = Crawler::new(client, config.resource_overrides()?)
            .with_depth(config.crawl_depth);
        let cache = GraphCache::new(&config.cache_dir).with_policy(config.cache_policy);

        Ok(Self::new(store, index)
            .with_extractor(config.extractor.clone())
            .with_zero_count_policy(config.zero_count_policy)
            .with_crawler(crawler)
            .with_graph_cache(cache))
    }

    pub fn with_extractor(mut self, config: ExtractorConfig) -> Self {
        self.extractor = Extractor::new(config);
        self
    }

    pub fn with_zero_count_policy(mut self, policy: ZeroCountPolicy) -> Self {
        self.reconciler = Reconciler::new(policy);
        self
    }

    pub fn with_crawler(mut self, crawler: Crawler) -> Self {
        self.crawler = Some(Arc::new(crawler));
        self
    }

    pub fn with_graph_cache(mut self, cache: GraphCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_document_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.documents = extractor;
        self
    }

    pub fn store(&self) -> &dyn CorpusStore {
        self.store.as_ref()
    }

    // --- Articles ---

    /// Store an article, index it and extract its collocations.
    pub fn add_article(&self, new: NewArticle) -> CorpusResult<AddedArticle> {
        let stemmed = new.stem_method.stem_text(&new.text);
        let ngram_index = build_ngram_index(&stemmed, self.extractor.config().max_ngram);
        let index_json = serde_json::to_string(&ngram_index)?;

        let article = self.store.insert_article(&new, &stemmed, &index_json)?;
        self.index.index_document(IndexedDocument::new(
            article.id,
            article.cluster,
            article.year,
            &article.stemmed_text,
        ));

        let report = self.extractor.create_collocations(
            self.store.as_ref(),
            self.index.as_ref(),
            &self.reconciler,
            &article,
        )?;
        if report.needs_reconciliation {
            info!(
                article_id = article.id,
                new = report.new_ngrams.len(),
                "New collocations found; cluster needs reconciliation"
            );
        }

        Ok(AddedArticle { article, report })
    }

    /// Add the text of a document, then fill in the title and abstract
    /// found by cleaning it.
    pub fn add_document(
        &self,
        path: &Path,
        cluster: ClusterId,
        year: i32,
        venue: Option<&str>,
    ) -> CorpusResult<AddedArticle> {
        let extracted = self.documents.extract(path)?;

        let mut new = NewArticle::new(extracted.text, cluster, year).with_document_path(path);
        if let Some(venue) = venue {
            new = new.with_venue(venue);
        }
        let AddedArticle { article, report } = self.add_article(new)?;

        let article = self.refresh_metadata(&article)?;
        Ok(AddedArticle { article, report })
    }

    /// Re-derive title and abstract from an article's text.
    pub fn refresh_metadata(&self, article: &Article) -> CorpusResult<Article> {
        let cleaned = clean_extracted(&article.text);
        self.store
            .update_article_metadata(article.id, &cleaned.title, &cleaned.abstract_text)?;
        self.article(article.id)
    }

    /// Run extraction for an already stored article.
    pub fn create_collocations(&self, article_id: ArticleId) -> CorpusResult<ExtractionReport> {
        let article = self.article(article_id)?;
        Ok(self.extractor.create_collocations(
            self.store.as_ref(),
            self.index.as_ref(),
            &self.reconciler,
            &article,
        )?)
    }

    /// Re-index every stored article; returns how many were indexed.
    pub fn rebuild_text_index(&self) -> CorpusResult<usize> {
        let articles = self.store.list_articles(&ArticleFilter::new())?;
        for article in &articles {
            self.index.index_document(IndexedDocument::new(
                article.id,
                article.cluster,
                article.year,
                &article.stemmed_text,
            ));
        }
        Ok(articles.len())
    }

    pub fn article(&self, article_id: ArticleId) -> CorpusResult<Article> {
        self.store
            .load_article(article_id)?
            .ok_or(CorpusError::Storage(StorageError::ArticleNotFound(article_id)))
    }

    pub fn list_articles(&self, filter: &ArticleFilter) -> CorpusResult<Vec<Article>> {
        Ok(self.store.list_articles(filter)?)
    }

    /// Delete an article, its source document and its collocations.
    ///
    /// The source document is removed first; if it is already missing the
    /// delete is aborted and nothing is removed.
    pub fn delete_article(&self, article_id: ArticleId) -> CorpusResult<()> {
        let article = self.article(article_id)?;

        if let Some(path) = &article.document_path {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(CorpusError::MissingDocument(path.clone()));
                }
                Err(e) => return Err(e.into()),
            }
        }

        for row in self.store.article_collocations(article_id)? {
            self.store.delete_article_collocation(article_id, &row.ngram)?;
            self.reconciler
                .on_deleted(self.store.as_ref(), article.cluster, &row.ngram, row.count)?;
        }
        self.store.delete_article(article_id)?;
        self.index.remove_document(article_id);

        if let Some(cache) = &self.cache {
            cache.invalidate(article_id)?;
        }

        info!(article_id, "Deleted article");
        Ok(())
    }

    // --- Article collocations ---

    pub fn article_collocations(
        &self,
        article_id: ArticleId,
    ) -> CorpusResult<Vec<ArticleCollocation>> {
        Ok(self.store.article_collocations(article_id)?)
    }

    /// Delete one article collocation and decrement its aggregate.
    pub fn delete_article_collocation(
        &self,
        article_id: ArticleId,
        ngram: &str,
    ) -> CorpusResult<Option<ArticleCollocation>> {
        let article = self.article(article_id)?;
        let Some(row) = self.store.delete_article_collocation(article_id, ngram)? else {
            return Ok(None);
        };
        self.reconciler
            .on_deleted(self.store.as_ref(), article.cluster, ngram, row.count)?;
        Ok(Some(row))
    }

    /// Change the count of an article collocation and re-sum its aggregate.
    pub fn update_article_collocation(
        &self,
        article_id: ArticleId,
        ngram: &str,
        count: i64,
    ) -> CorpusResult<Option<Collocation>> {
        let article = self.article(article_id)?;
        if !self.store.set_article_collocation_count(article_id, ngram, count)? {
            return Ok(None);
        }
        Ok(self
            .reconciler
            .on_updated(self.store.as_ref(), article.cluster, ngram)?)
    }

    /// Relevance of an article's collocation, `Unknown` without an
    /// aggregate row or a recorded judgement.
    pub fn relevance(&self, article_id: ArticleId, ngram: &str) -> CorpusResult<Relevance> {
        let article = self.article(article_id)?;
        if self.store.load_collocation(article.cluster, ngram)?.is_none() {
            return Ok(Relevance::Unknown);
        }
        Ok(self
            .store
            .load_relevance(article.cluster, ngram)?
            .unwrap_or(Relevance::Unknown))
    }

    // --- Cluster collocations ---

    pub fn list_collocations(
        &self,
        cluster: ClusterId,
        filter: &CollocationFilter,
    ) -> CorpusResult<Vec<Collocation>> {
        Ok(self.store.list_collocations(cluster, filter)?)
    }

    /// Recompute every aggregate of a cluster.
    pub fn reconcile_cluster(&self, cluster: ClusterId) -> CorpusResult<ReconcileSummary> {
        Ok(self
            .reconciler
            .reconcile_cluster(self.store.as_ref(), cluster)?)
    }

    /// Add a provenance tag to a cluster collocation; false when absent.
    pub fn add_source(&self, cluster: ClusterId, ngram: &str, tag: &str) -> CorpusResult<bool> {
        let Some(colloc) = self.store.load_collocation(cluster, ngram)? else {
            return Ok(false);
        };
        if colloc.has_source(tag) {
            return Ok(true);
        }
        let source = if colloc.source.is_empty() {
            tag.to_string()
        } else {
            format!("{} {}", colloc.source, tag)
        };
        Ok(self.store.set_collocation_source(cluster, ngram, &source)?)
    }

    pub fn set_relevance(
        &self,
        cluster: ClusterId,
        ngram: &str,
        relevance: Relevance,
    ) -> CorpusResult<()> {
        if self.store.load_collocation(cluster, ngram)?.is_none() {
            return Err(StorageError::CollocationNotFound {
                cluster,
                ngram: ngram.to_string(),
            }
            .into());
        }
        Ok(self.store.save_relevance(cluster, ngram, relevance)?)
    }

    pub fn collocation_stats(
        &self,
        cluster: ClusterId,
        ngram: &str,
    ) -> CorpusResult<CollocationStats> {
        Ok(collocation_stats(self.store.as_ref(), cluster, ngram)?)
    }

    pub fn contexts(&self, cluster: ClusterId, ngram: &str) -> CorpusResult<Vec<String>> {
        Ok(all_contexts(self.store.as_ref(), cluster, ngram)?)
    }

    // --- Graphs, features and classification ---

    /// Collocations of an article whose aggregate is tagged `dbpedia`
    pub fn graph_seeds(&self, article: &Article) -> CorpusResult<Vec<String>> {
        let mut seeds = Vec::new();
        for row in self.store.article_collocations(article.id)? {
            if let Some(colloc) = self.store.load_collocation(article.cluster, &row.ngram)? {
                if colloc.has_source(DBPEDIA_SOURCE) {
                    seeds.push(row.ngram);
                }
            }
        }
        Ok(seeds)
    }

    /// The category graph of an article, crawled on first use and cached.
    pub async fn article_graph(&self, article_id: ArticleId) -> CorpusResult<CategoryGraph> {
        let crawler = self.crawler.clone().ok_or(CorpusError::NoCrawler)?;
        let article = self.article(article_id)?;
        let seeds = self.graph_seeds(&article)?;
        let key = cache_key(&seeds, crawler.depth(), crawler.overrides().version);

        let build = || async move { crawler.crawl(&seeds).await.0 };
        match &self.cache {
            Some(cache) => Ok(cache.get_or_build(article_id, &key, build).await?),
            None => Ok(build().await),
        }
    }

    /// Drop the cached graph of an article
    pub fn invalidate_graph(&self, article_id: ArticleId) -> CorpusResult<bool> {
        match &self.cache {
            Some(cache) => Ok(cache.invalidate(article_id)?),
            None => Ok(false),
        }
    }

    /// Feature vectors of every collocation of an article.
    pub async fn build_features(
        &self,
        article_id: ArticleId,
    ) -> CorpusResult<Vec<CollocationFeatures>> {
        let article = self.article(article_id)?;
        let graph = match self.crawler {
            Some(_) => self.article_graph(article_id).await?,
            None => {
                warn!(article_id, "No crawler configured; building features without a graph");
                CategoryGraph::new()
            }
        };

        let rows = self.store.article_collocations(article_id)?;
        let mut aggregates = HashMap::new();
        for row in &rows {
            if let Some(colloc) = self.store.load_collocation(article.cluster, &row.ngram)? {
                aggregates.insert(row.ngram.clone(), colloc);
            }
        }

        let mut dblp = HashSet::new();
        for node in graph.nodes().filter(|n| !is_category(n)) {
            if let Some(colloc) = self.store.load_collocation(article.cluster, node)? {
                if colloc.has_source("dblp") {
                    dblp.insert(node.to_string());
                }
            }
        }

        let components = ComponentIndex::new(&graph, &dblp);
        Ok(build_features(&article, &rows, &aggregates, &components))
    }

    /// Label every collocation of an article.
    pub async fn classify_article(
        &self,
        article_id: ArticleId,
        classifier: &dyn Classifier,
    ) -> CorpusResult<Vec<(String, Label)>> {
        let mut labels = Vec::new();
        for features in self.build_features(article_id).await? {
            let label = classifier.predict(&features.features)?;
            labels.push((features.ngram, label));
        }
        Ok(labels)
    }
}
