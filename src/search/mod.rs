//! Full-text index over article text
//!
//! Articles are indexed by their stemmed token stream. Phrase queries are
//! exact token-sequence matches, so callers pass stemmed phrases.

use crate::corpus::{ArticleId, ClusterId};
use crate::text::find_phrase;
use dashmap::DashMap;

/// A document as seen by the text index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedDocument {
    pub id: ArticleId,
    pub cluster: ClusterId,
    pub year: i32,
    tokens: Vec<String>,
}

impl IndexedDocument {
    pub fn new(id: ArticleId, cluster: ClusterId, year: i32, stemmed_text: &str) -> Self {
        Self {
            id,
            cluster,
            year,
            tokens: stemmed_text.split_whitespace().map(str::to_string).collect(),
        }
    }

    /// Whether the document contains the phrase as a contiguous token run
    pub fn contains(&self, phrase: &str) -> bool {
        let tokens: Vec<&str> = self.tokens.iter().map(String::as_str).collect();
        let needle: Vec<&str> = phrase.split_whitespace().collect();
        let found = find_phrase(&tokens, &needle).next().is_some();
        found
    }
}

/// Full-text search collaborator
pub trait TextIndex: Send + Sync {
    /// Add or replace a document
    fn index_document(&self, document: IndexedDocument);

    /// Drop a document; returns whether it was indexed
    fn remove_document(&self, id: ArticleId) -> bool;

    /// Ids of documents containing `phrase`, excluding `exclude`, ascending
    fn query_phrase(&self, phrase: &str, exclude: ArticleId) -> Vec<ArticleId>;
}

/// In-memory phrase index
#[derive(Debug, Default)]
pub struct MemoryIndex {
    documents: DashMap<ArticleId, IndexedDocument>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl TextIndex for MemoryIndex {
    fn index_document(&self, document: IndexedDocument) {
        self.documents.insert(document.id, document);
    }

    fn remove_document(&self, id: ArticleId) -> bool {
        self.documents.remove(&id).is_some()
    }

    fn query_phrase(&self, phrase: &str, exclude: ArticleId) -> Vec<ArticleId> {
        let mut ids: Vec<ArticleId> = self
            .documents
            .iter()
            .filter(|entry| *entry.key() != exclude && entry.value().contains(phrase))
            .map(|entry| *entry.key())
            .collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: ArticleId, text: &str) -> IndexedDocument {
        IndexedDocument::new(id, ClusterId::ComputerScience, 2013, text)
    }

    #[test]
    fn test_query_phrase_excludes_document() {
        let index = MemoryIndex::new();
        index.index_document(doc(1, "a neural network model"));
        index.index_document(doc(2, "neural network"));
        index.index_document(doc(3, "network neural"));

        assert_eq!(index.query_phrase("neural network", 0), vec![1, 2]);
        assert_eq!(index.query_phrase("neural network", 1), vec![2]);
    }

    #[test]
    fn test_phrase_match_is_token_aware() {
        let index = MemoryIndex::new();
        index.index_document(doc(1, "neural networks"));
        assert!(index.query_phrase("neural network", 0).is_empty());
    }

    #[test]
    fn test_reindex_and_remove() {
        let index = MemoryIndex::new();
        index.index_document(doc(1, "decision tree"));
        index.index_document(doc(1, "neural network"));
        assert_eq!(index.len(), 1);
        assert_eq!(index.query_phrase("neural network", 0), vec![1]);

        assert!(index.remove_document(1));
        assert!(!index.remove_document(1));
        assert!(index.is_empty());
    }
}
