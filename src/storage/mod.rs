//! Storage backends
//!
//! Corpus entities are persisted through the `CorpusStore` trait.
//! The primary implementation is `SqliteStore`.

mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{
    ArticleFilter, CollocationFilter, CorpusStore, OpenStore, StorageError, StorageResult,
};
