//! Dense text embeddings.
//!
//! [`EmbeddingProvider`] is the seam between the pipeline and whatever service
//! turns text into vectors. [`OpenAIEmbeddings`] talks to any
//! OpenAI-compatible `/embeddings` endpoint.

use crate::types::{AppError, Result};
use crate::utils::config::OpenAIConfig;
use async_openai::{
    config::OpenAIConfig as ClientConfig, types::CreateEmbeddingRequestArgs, Client,
};
use async_trait::async_trait;

/// Maps text to fixed-dimension vectors.
///
/// `embed` returns exactly one vector per input, in input order. A call
/// either succeeds for every input or fails as a whole.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Name used in logs and error messages.
    fn provider_name(&self) -> &'static str;

    /// Dimension of every vector this provider returns.
    fn dimensions(&self) -> usize;

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| AppError::provider(self.provider_name(), "empty embedding response"))
    }
}

pub struct OpenAIEmbeddings {
    client: Client<ClientConfig>,
    model: String,
    dimensions: usize,
    request_dimensions: bool,
    batch_size: usize,
}

impl OpenAIEmbeddings {
    pub fn new(
        api_key: impl Into<String>,
        api_base: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
        batch_size: usize,
    ) -> Self {
        let config = ClientConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base);

        Self {
            client: Client::with_config(config),
            model: model.into(),
            dimensions,
            request_dimensions: true,
            batch_size: batch_size.max(1),
        }
    }

    /// Whether to ask the service for `dimensions`-sized vectors. When off,
    /// the model's native size must already match.
    pub fn request_dimensions(mut self, request: bool) -> Self {
        self.request_dimensions = request;
        self
    }

    pub fn from_config(config: &OpenAIConfig) -> Self {
        Self::new(
            config.api_key.clone(),
            config.api_base.clone(),
            config.embedding_model.clone(),
            config.embedding_dimensions,
            config.embedding_batch_size,
        )
        .request_dimensions(config.request_dimensions)
    }

    async fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut args = CreateEmbeddingRequestArgs::default();
        args.model(&self.model).input(batch.to_vec());
        if self.request_dimensions {
            args.dimensions(self.dimensions as u32);
        }
        let request = args
            .build()
            .map_err(|e| AppError::provider(self.provider_name(), e))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| AppError::provider(self.provider_name(), e))?;

        let mut data = response.data;
        if data.len() != batch.len() {
            return Err(AppError::provider(
                self.provider_name(),
                format!(
                    "expected {} embeddings, received {}",
                    batch.len(),
                    data.len()
                ),
            ));
        }
        data.sort_by_key(|e| e.index);

        let mut vectors = Vec::with_capacity(data.len());
        for (position, item) in data.into_iter().enumerate() {
            if item.index as usize != position {
                return Err(AppError::provider(
                    self.provider_name(),
                    format!("embedding response is missing index {}", position),
                ));
            }
            if item.embedding.len() != self.dimensions {
                return Err(AppError::provider(
                    self.provider_name(),
                    format!(
                        "expected {}-dimensional embeddings, received {}",
                        self.dimensions,
                        item.embedding.len()
                    ),
                ));
            }
            vectors.push(item.embedding);
        }

        Ok(vectors)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddings {
    fn provider_name(&self) -> &'static str {
        "openai-embeddings"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            vectors.extend(self.embed_batch(batch).await?);
        }

        tracing::debug!(
            model = %self.model,
            inputs = texts.len(),
            batches = texts.len().div_ceil(self.batch_size),
            "Embedded texts"
        );

        Ok(vectors)
    }
}
