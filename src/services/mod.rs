mod backfill;
mod embedding;
mod store;

pub use backfill::{BackfillFailure, BackfillOptions, BatchProgress, run_backfill};
pub use embedding::{Embedder, EmbeddingClient, InputType};
pub use store::{DocumentStore, PgDocumentStore};
