//! Articles, collocations and their per-article counts

use super::cluster::ClusterId;
use crate::text::{NgramIndex, StemMethod};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Row id of a stored article
pub type ArticleId = i64;

/// Input for creating an article. Stemmed text and n-gram index are
/// derived by the service, never supplied.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub abstract_text: String,
    pub text: String,
    pub cluster: ClusterId,
    pub venue: Option<String>,
    pub year: i32,
    pub link: Option<String>,
    pub citations: i64,
    /// Source document on disk, removed together with the article
    pub document_path: Option<PathBuf>,
    pub stem_method: StemMethod,
}

impl NewArticle {
    pub fn new(text: impl Into<String>, cluster: ClusterId, year: i32) -> Self {
        Self {
            title: String::new(),
            abstract_text: String::new(),
            text: text.into(),
            cluster,
            venue: None,
            year,
            link: None,
            citations: 0,
            document_path: None,
            stem_method: cluster.default_stem_method(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_abstract(mut self, abstract_text: impl Into<String>) -> Self {
        self.abstract_text = abstract_text.into();
        self
    }

    pub fn with_venue(mut self, venue: impl Into<String>) -> Self {
        self.venue = Some(venue.into());
        self
    }

    pub fn with_document_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.document_path = Some(path.into());
        self
    }

    pub fn with_stem_method(mut self, method: StemMethod) -> Self {
        self.stem_method = method;
        self
    }
}

/// A stored article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub abstract_text: String,
    pub text: String,
    pub stemmed_text: String,
    /// JSON-serialized [`NgramIndex`]; derivable from `stemmed_text`
    pub index: String,
    pub cluster: ClusterId,
    pub venue: Option<String>,
    pub year: i32,
    pub link: Option<String>,
    pub citations: i64,
    pub document_path: Option<PathBuf>,
    pub stem_method: StemMethod,
    pub created_at: DateTime<Utc>,
}

impl Article {
    /// Deserialize the persisted n-gram index. An empty column is an empty index.
    pub fn ngram_index(&self) -> Result<NgramIndex, serde_json::Error> {
        if self.index.trim().is_empty() {
            return Ok(NgramIndex::new());
        }
        serde_json::from_str(&self.index)
    }
}

impl std::fmt::Display for Article {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}: {}",
            self.venue.as_deref().unwrap_or("-"),
            self.year,
            self.title
        )
    }
}

/// Occurrence count of a collocation within one article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleCollocation {
    pub article_id: ArticleId,
    pub ngram: String,
    pub count: i64,
}

/// Aggregate statistics of a collocation within a cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collocation {
    pub ngram: String,
    pub count: i64,
    /// Provenance tags such as `dbpedia` or `dblp`, space separated
    pub source: String,
}

impl Collocation {
    pub fn new(ngram: impl Into<String>, count: i64) -> Self {
        Self {
            ngram: ngram.into(),
            count,
            source: String::new(),
        }
    }

    pub fn has_source(&self, tag: &str) -> bool {
        self.source.contains(tag)
    }
}

/// Relevance judgement attached to a cluster collocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relevance {
    Relevant,
    Irrelevant,
    /// No aggregate row or no judgement recorded
    Unknown,
}

impl Relevance {
    /// Numeric form: 1, 0, or the -1 sentinel for unknown.
    pub fn as_i8(&self) -> i8 {
        match self {
            Relevance::Relevant => 1,
            Relevance::Irrelevant => 0,
            Relevance::Unknown => -1,
        }
    }

    pub fn from_flag(is_relevant: bool) -> Self {
        if is_relevant {
            Relevance::Relevant
        } else {
            Relevance::Irrelevant
        }
    }
}
