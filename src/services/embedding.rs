//! Embedding client for the managed inference API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::EmbeddingError;
use crate::models::EmbeddingConfig;

/// Input type for embedding generation, as understood by the provider.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    /// For documents being indexed
    SearchDocument,
    /// For search queries
    SearchQuery,
}

/// Request body for the model invoke endpoint.
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    texts: &'a [String],
    input_type: InputType,
}

/// Response from the model invoke endpoint.
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Turns a list of texts into a list of vectors via a remote call.
///
/// Implementations must return vectors positionally aligned with the input
/// texts; the batch orchestrator verifies the count but trusts the order.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

/// Client for the remote embedding API.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl EmbeddingClient {
    /// Create a new embedding client with the given configuration.
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Check if the embedding API is reachable.
    pub async fn health_check(&self) -> Result<(), EmbeddingError> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EmbeddingError::ServerError(format!(
                "health check failed with status: {}",
                response.status()
            )));
        }

        Ok(())
    }

    /// Generate embeddings for a batch of documents.
    ///
    /// The caller is responsible for keeping the batch within the provider's
    /// size limit. Empty-string texts are legal inputs and receive a vector
    /// like any other text.
    pub async fn embed_documents(
        &self,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbedRequest {
            texts,
            input_type: InputType::SearchDocument,
        };

        let mut builder = self.client.post(self.invoke_url()).json(&request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                EmbeddingError::Timeout
            } else {
                EmbeddingError::RequestError(e)
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ServerError(format!(
                "status {}: {}",
                status, body
            )));
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        // The positional alignment contract cannot be verified, but the
        // count can; fail loudly rather than mis-pair downstream.
        if embed_response.embeddings.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                received: embed_response.embeddings.len(),
            });
        }

        Ok(embed_response.embeddings)
    }

    fn invoke_url(&self) -> String {
        format!("{}/model/{}/invoke", self.base_url, self.model)
    }

    /// Get the base URL of the embedding API.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the configured model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Embedder for EmbeddingClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.embed_documents(texts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let config = EmbeddingConfig::default();
        let client = EmbeddingClient::new(&config);
        assert!(client.is_ok());
    }

    #[test]
    fn test_base_url_trimming() {
        let config = EmbeddingConfig {
            url: "http://localhost:11411/".to_string(),
            ..Default::default()
        };
        let client = EmbeddingClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:11411");
    }

    #[test]
    fn test_invoke_url() {
        let config = EmbeddingConfig {
            url: "http://localhost:11411".to_string(),
            model: "cohere.embed-english-v3".to_string(),
            ..Default::default()
        };
        let client = EmbeddingClient::new(&config).unwrap();
        assert_eq!(
            client.invoke_url(),
            "http://localhost:11411/model/cohere.embed-english-v3/invoke"
        );
    }

    #[test]
    fn test_request_payload_shape() {
        let texts = vec!["hello".to_string(), String::new()];
        let request = EmbedRequest {
            texts: &texts,
            input_type: InputType::SearchDocument,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["input_type"], "search_document");
        assert_eq!(json["texts"][0], "hello");
        assert_eq!(json["texts"][1], "");
    }

    #[tokio::test]
    async fn test_empty_input_short_circuits() {
        let client = EmbeddingClient::new(&EmbeddingConfig::default()).unwrap();
        let embeddings = client.embed_documents(&[]).await.unwrap();
        assert!(embeddings.is_empty());
    }
}
