//! Batch orchestration for an embedding backfill run.
//!
//! Pulls the working set once, partitions it into provider-legal batches,
//! drives the embedding client per batch, and commits vectors back to the
//! store. Batches run strictly sequentially; a fatal error abandons the
//! remaining batches but still releases the store connection and reports
//! the counters accumulated up to that point.

use crate::error::BackfillError;
use crate::models::{PendingDocument, RunReport};
use crate::services::{DocumentStore, Embedder};
use crate::utils::retry::{RetryConfig, with_retry};

/// Options for one backfill run.
#[derive(Debug, Clone)]
pub struct BackfillOptions {
    /// Maximum documents per embedding call (provider hard limit).
    pub batch_size: usize,
    /// Cap on documents processed this run; None processes all.
    pub limit: Option<usize>,
    /// Retry policy for transient embedding-call failures.
    pub retry: RetryConfig,
}

impl Default for BackfillOptions {
    fn default() -> Self {
        Self {
            batch_size: crate::models::DEFAULT_BATCH_SIZE as usize,
            limit: None,
            retry: RetryConfig::default(),
        }
    }
}

/// Progress notification delivered after each completed batch.
#[derive(Debug, Clone)]
pub struct BatchProgress {
    pub batch_index: usize,
    pub batch_count: usize,
    pub documents: usize,
    pub updated: u64,
}

/// A fatal run error together with the counters accumulated before it.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct BackfillFailure {
    pub report: RunReport,
    pub error: BackfillError,
}

/// Run the backfill pipeline end to end.
///
/// The store connection is released exactly once on every exit path. The
/// returned report (or the failure's partial report) carries the run
/// counters; `duration_ms` is left for the caller to stamp.
pub async fn run_backfill<F>(
    store: &dyn DocumentStore,
    embedder: &dyn Embedder,
    options: &BackfillOptions,
    on_batch: F,
) -> Result<RunReport, BackfillFailure>
where
    F: FnMut(&BatchProgress),
{
    let mut report = RunReport::default();
    let outcome = drive(store, embedder, options, &mut report, on_batch).await;
    store.close().await;

    match outcome {
        Ok(()) => Ok(report),
        Err(error) => Err(BackfillFailure { report, error }),
    }
}

async fn drive<F>(
    store: &dyn DocumentStore,
    embedder: &dyn Embedder,
    options: &BackfillOptions,
    report: &mut RunReport,
    mut on_batch: F,
) -> Result<(), BackfillError>
where
    F: FnMut(&BatchProgress),
{
    let batch_size = options.batch_size.max(1);

    let mut documents = store.fetch_pending().await?;
    if let Some(limit) = options.limit {
        documents.truncate(limit);
    }
    report.documents_found = documents.len() as u64;

    if documents.is_empty() {
        return Ok(());
    }

    let batch_count = documents.len().div_ceil(batch_size);

    for (batch_index, batch) in documents.chunks(batch_size).enumerate() {
        let texts: Vec<String> = batch.iter().map(|doc| doc.text.clone()).collect();

        let vectors = with_retry(&options.retry, || embedder.embed(&texts))
            .await
            .into_result()?;

        // The provider contract says one vector per text, positionally
        // aligned; verify the count here rather than trusting it.
        if vectors.len() != texts.len() {
            return Err(BackfillError::VectorCountMismatch {
                expected: texts.len(),
                received: vectors.len(),
            });
        }

        let updated = store.apply_embeddings(batch, &vectors).await?;

        report.batches_processed += 1;
        report.documents_updated += updated;

        on_batch(&BatchProgress {
            batch_index,
            batch_count,
            documents: batch.len(),
            updated,
        });
    }

    Ok(())
}
