//! Collocate: terminology extraction over clustered scientific corpora
//!
//! Extracts candidate terminological phrases ("collocations") from articles,
//! keeps corpus-wide aggregate counts per cluster, crawls DBpedia category
//! graphs around an article's collocations and labels collocations with a
//! frozen classifier.
//!
//! # Core Concepts
//!
//! - **Articles**: stored with their stemmed text and n-gram frequency index
//! - **Article collocations**: per-article phrase counts found by extraction
//! - **Collocations**: per-cluster aggregates, kept equal to the sum of their
//!   article collocations by the reconciler
//! - **Category graphs**: DBpedia neighborhoods of an article's collocations,
//!   used for classification features
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use collocate::{ClusterId, CorpusService, MemoryIndex, NewArticle, OpenStore, SqliteStore};
//!
//! let store = SqliteStore::open_in_memory().unwrap();
//! let service = CorpusService::new(Arc::new(store), Arc::new(MemoryIndex::new()));
//! let text = "A neural network. The neural network. Neural network weights.";
//! let added = service
//!     .add_article(NewArticle::new(text, ClusterId::ComputerScience, 2013))
//!     .unwrap();
//! assert!(!added.report.skipped);
//! ```

pub mod api;
pub mod classify;
pub mod config;
pub mod corpus;
pub mod dbpedia;
pub mod extract;
pub mod features;
pub mod pdf;
pub mod search;
pub mod storage;
pub mod text;

pub use api::{AddedArticle, CorpusError, CorpusResult, CorpusService, DBPEDIA_SOURCE};
pub use classify::{Classifier, ClassifierError, Label, LinearModel};
pub use config::{Config, ConfigError};
pub use corpus::{
    Article, ArticleCollocation, ArticleId, ClusterId, Collocation, NewArticle, Relevance,
};
pub use dbpedia::{CategoryGraph, Crawler, GraphCache, KnowledgeGraphClient, SparqlClient};
pub use extract::{ExtractionReport, Extractor, ExtractorConfig, Reconciler, ZeroCountPolicy};
pub use search::{MemoryIndex, TextIndex};
pub use storage::{CorpusStore, OpenStore, SqliteStore, StorageError, StorageResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
