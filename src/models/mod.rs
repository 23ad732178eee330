mod config;
mod document;
mod report;

pub use config::{
    Config, DEFAULT_BATCH_SIZE, DEFAULT_EMBEDDING_MODEL, DEFAULT_EMBEDDING_URL, DEFAULT_STORE_URL,
    DEFAULT_TABLE, EmbeddingConfig, StoreConfig,
};
pub use document::PendingDocument;
pub use report::{OutputFormat, RunReport};
