use anyhow::Result;

use crate::cli::output::{StatusInfo, get_formatter};
use crate::models::{Config, OutputFormat};
use crate::services::{DocumentStore, EmbeddingClient, PgDocumentStore};

pub async fn handle_status(format: OutputFormat, _verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let (store_connected, documents_pending) = match PgDocumentStore::connect(&config.store).await {
        Ok(store) => {
            let connected = store.health_check().await.unwrap_or(false);
            let pending = if connected {
                store.count_pending().await.unwrap_or(0)
            } else {
                0
            };
            store.close().await;
            (connected, pending)
        }
        Err(_) => (false, 0),
    };

    let embedding_reachable = match EmbeddingClient::new(&config.embedding) {
        Ok(client) => client.health_check().await.is_ok(),
        Err(_) => false,
    };

    let status = StatusInfo {
        store_url: config.store.url.clone(),
        store_connected,
        table: config.store.qualified_table_name(),
        documents_pending,
        embedding_url: config.embedding.url.clone(),
        embedding_model: config.embedding.model.clone(),
        embedding_reachable,
    };

    print!("{}", formatter.format_status(&status));

    if !store_connected || !embedding_reachable {
        eprintln!();
        if !store_connected {
            eprintln!(
                "Warning: document store not accessible. Check connection settings or EMBFILL_DATABASE_URL."
            );
        }
        if !embedding_reachable {
            eprintln!(
                "Warning: embedding API not reachable at {}.",
                config.embedding.url
            );
        }
    }

    Ok(())
}
