//! OpenAiEmbeddingModel -- concrete [`EmbeddingModel`] for OpenAI-compatible
//! embedding endpoints (OpenAI, Azure-style proxies, Ollama, LM Studio).
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use brandmind_core::embedding::EmbeddingModel;
use brandmind_types::config::EmbeddingConfig;
use brandmind_types::error::EmbeddingError;

use super::types::{EmbeddingRequest, EmbeddingResponse};

/// Embedding client for `POST {base_url}/embeddings`.
///
/// Every response vector is checked against the configured dimension, so a
/// misconfigured model surfaces as `MalformedResponse` rather than as rows
/// that can never match.
pub struct OpenAiEmbeddingModel {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    base_url: String,
    model: String,
    dimension: usize,
}

impl OpenAiEmbeddingModel {
    /// Build a client from config. `api_key` may be `None` for local servers.
    pub fn new(config: &EmbeddingConfig, api_key: Option<SecretString>) -> Result<Self, EmbeddingError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                EmbeddingError::ServiceUnavailable(format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            dimension: config.dimension,
        })
    }

    fn url(&self) -> String {
        format!("{}/embeddings", self.base_url)
    }

    fn check_dimension(&self, vector: Vec<f32>) -> Result<Vec<f32>, EmbeddingError> {
        if vector.len() != self.dimension {
            return Err(EmbeddingError::MalformedResponse(format!(
                "expected {} dimensions from {}, got {}",
                self.dimension,
                self.model,
                vector.len()
            )));
        }
        Ok(vector)
    }
}

impl EmbeddingModel for OpenAiEmbeddingModel {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: text,
            encoding_format: "float",
        };

        let mut builder = self.client.post(self.url()).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| EmbeddingError::ServiceUnavailable(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, model = %self.model, "embedding request rejected");
            return Err(match status.as_u16() {
                400 | 413 | 422 => EmbeddingError::InvalidInput(format!("HTTP {status}: {error_body}")),
                401 | 403 => EmbeddingError::ServiceUnavailable(format!(
                    "authentication failed (HTTP {status})"
                )),
                429 => EmbeddingError::ServiceUnavailable(format!("rate limited: {error_body}")),
                _ => EmbeddingError::ServiceUnavailable(format!("HTTP {status}: {error_body}")),
            });
        }

        let body: EmbeddingResponse = response.json().await.map_err(|e| {
            EmbeddingError::MalformedResponse(format!("failed to parse response: {e}"))
        })?;

        let vector = body
            .data
            .into_iter()
            .min_by_key(|d| d.index)
            .map(|d| d.embedding)
            .ok_or_else(|| {
                EmbeddingError::MalformedResponse("response contained no embeddings".to_string())
            })?;

        self.check_dimension(vector)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
