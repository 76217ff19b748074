//! Collocation extraction, aggregate reconciliation and statistics

mod extractor;
mod reconciler;
mod score;
mod stats;

pub use extractor::{
    backfill_residual, Extraction, ExtractionReport, Extractor, ExtractorConfig,
};
pub use reconciler::{ReconcileSummary, Reconciler, ZeroCountPolicy};
pub use score::{pmi, residual_scores};
pub use stats::{all_contexts, collocation_stats, CollocationStats};

use crate::corpus::ArticleId;
use crate::storage::StorageError;
use thiserror::Error;

/// Errors raised while extracting collocations
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Article {article_id} has a corrupt n-gram index: {source}")]
    CorruptIndex {
        article_id: ArticleId,
        source: serde_json::Error,
    },
}

/// Result type for extraction
pub type ExtractResult<T> = Result<T, ExtractError>;
