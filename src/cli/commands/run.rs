//! Run command implementation.

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;

use crate::cli::output::get_formatter;
use crate::models::{Config, DEFAULT_BATCH_SIZE, OutputFormat};
use crate::services::{
    BackfillOptions, DocumentStore, EmbeddingClient, PgDocumentStore, run_backfill,
};
use crate::utils::retry::RetryConfig;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Report the pending document count without calling the embedding API
    #[arg(long)]
    pub dry_run: bool,

    /// Maximum number of documents to process this run
    #[arg(long, short = 'l')]
    pub limit: Option<usize>,

    /// Override the configured batch size
    #[arg(long, short = 'b')]
    pub batch_size: Option<usize>,
}

pub async fn handle_run(args: RunArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);
    let start_time = Instant::now();

    let batch_size = args
        .batch_size
        .unwrap_or(config.embedding.batch_size as usize);
    if batch_size == 0 || batch_size > DEFAULT_BATCH_SIZE as usize {
        anyhow::bail!(
            "batch size must be between 1 and the provider limit of {}",
            DEFAULT_BATCH_SIZE
        );
    }

    let store = PgDocumentStore::connect(&config.store)
        .await
        .context("failed to connect to document store")?;

    if args.dry_run {
        let pending = store.count_pending().await;
        store.close().await;
        let pending = pending.context("failed to count pending documents")?;
        println!(
            "{}",
            formatter.format_message(&format!(
                "Dry run: {} documents awaiting embeddings in {}",
                pending,
                store.table()
            ))
        );
        return Ok(());
    }

    let embedder =
        EmbeddingClient::new(&config.embedding).context("failed to build embedding client")?;

    if verbose {
        println!(
            "Embedding with model {} at {}",
            embedder.model(),
            embedder.base_url()
        );
    }

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )
            .unwrap()
            .progress_chars("#>-"),
    );

    let options = BackfillOptions {
        batch_size,
        limit: args.limit,
        retry: RetryConfig::new(config.embedding.max_retries),
    };

    let outcome = run_backfill(&store, &embedder, &options, |progress| {
        if pb.length() == Some(0) {
            pb.set_length(progress.batch_count as u64);
        }
        pb.inc(1);
        if verbose {
            pb.println(format!(
                "Updated {} documents in batch {} of {}",
                progress.updated,
                progress.batch_index + 1,
                progress.batch_count
            ));
        }
    })
    .await;

    pb.finish_and_clear();

    match outcome {
        Ok(mut report) => {
            report.duration_ms = start_time.elapsed().as_millis() as u64;
            print!("{}", formatter.format_run_report(&report));
            Ok(())
        }
        Err(failure) => {
            // Report the counts accumulated before the failure, then
            // surface the error with a fatal exit status.
            let mut report = failure.report;
            report.duration_ms = start_time.elapsed().as_millis() as u64;
            print!("{}", formatter.format_run_report(&report));
            Err(failure.error.into())
        }
    }
}
