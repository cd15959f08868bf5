//! Embedding Client: the single point of entry for calls to the embedding model.
//!
//! Speaks the OpenAI-compatible `POST {base}/embeddings` protocol, which is also
//! served by local runtimes (Ollama, llama.cpp server, text-embeddings-inference).
//! No retries: a failed call is reported to the caller, which falls back to
//! lexical scoring.
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Expected {expected} embeddings, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("Embedding model returned an empty vector")]
    EmptyVector,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Client for an OpenAI-compatible embeddings endpoint.
#[derive(Clone)]
pub struct EmbeddingClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl EmbeddingClient {
    pub fn new(base_url: &str, api_key: Option<String>, model: String) -> Result<Self, EmbeddingError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Embeds every input, returning vectors in input order.
    pub async fn embed(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let request_body = EmbeddingRequest {
            model: &self.model,
            input: inputs,
        };

        let mut request = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .json(&request_body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: EmbeddingResponse = response.json().await?;
        let vectors = order_embeddings(parsed, inputs.len())?;

        debug!(
            "Embedding call succeeded: inputs={}, dims={}",
            inputs.len(),
            vectors.first().map(Vec::len).unwrap_or(0)
        );

        Ok(vectors)
    }
}

/// Sorts response items by their `index` field and checks the count matches the request.
fn order_embeddings(
    mut response: EmbeddingResponse,
    expected: usize,
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    if response.data.len() != expected {
        return Err(EmbeddingError::CountMismatch {
            expected,
            actual: response.data.len(),
        });
    }
    response.data.sort_by_key(|d| d.index);
    if response.data.iter().any(|d| d.embedding.is_empty()) {
        return Err(EmbeddingError::EmptyVector);
    }
    Ok(response.data.into_iter().map(|d| d.embedding).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> EmbeddingResponse {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_order_embeddings_sorts_by_index() {
        let response = parse(
            r#"{"data": [
                {"embedding": [0.0, 1.0], "index": 1},
                {"embedding": [1.0, 0.0], "index": 0}
            ]}"#,
        );
        let vectors = order_embeddings(response, 2).unwrap();
        assert_eq!(vectors[0], vec![1.0, 0.0]);
        assert_eq!(vectors[1], vec![0.0, 1.0]);
    }

    #[test]
    fn test_order_embeddings_rejects_count_mismatch() {
        let response = parse(r#"{"data": [{"embedding": [1.0], "index": 0}]}"#);
        let err = order_embeddings(response, 2).unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::CountMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_order_embeddings_rejects_empty_vector() {
        let response = parse(r#"{"data": [{"embedding": [], "index": 0}]}"#);
        assert!(matches!(
            order_embeddings(response, 1),
            Err(EmbeddingError::EmptyVector)
        ));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client =
            EmbeddingClient::new("http://localhost:11434/v1/", None, "nomic".to_string()).unwrap();
        assert_eq!(client.base_url, "http://localhost:11434/v1");
        assert_eq!(client.model(), "nomic");
    }
}
