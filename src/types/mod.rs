use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

// ============= API Request/Response Types =============

/// Model used when neither the request nor `CHAT_MODEL` names one.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4.1-mini";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatRequest {
    /// Instruction used for plain (non-augmented) chat.
    pub developer_message: String,
    pub user_message: String,
    /// Completion model; the server's configured chat model when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Filename of a previously uploaded PDF to ground the answer in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_filename: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WordCount {
    pub word: String,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub filename: String,
    pub message: String,
    pub analytics: Vec<WordCount>,
    pub uploaded_filenames: Vec<String>,
    pub chunks_indexed: usize,
    pub chunks_discarded: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DocumentListResponse {
    pub documents: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteDocumentResponse {
    pub filename: String,
    pub chunks_removed: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

// ============= RAG Types =============

/// A bounded slice of a document's text, the unit of embedding and retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    /// Character offset of the chunk within its page.
    pub source_offset: usize,
    /// Index of the page (extraction unit) the chunk was cut from.
    pub page: usize,
    pub document_id: String,
    /// Position of the chunk within the whole document.
    pub sequence_index: usize,
}

/// Payload stored next to every vector in an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryPayload {
    pub document_id: String,
    pub text: String,
    pub sequence_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: EntryPayload,
}

impl IndexEntry {
    /// Build an entry for `chunk` with a fresh unique id.
    pub fn from_chunk(chunk: &Chunk, vector: Vec<f32>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            vector,
            payload: EntryPayload {
                document_id: chunk.document_id.clone(),
                text: chunk.text.clone(),
                sequence_index: chunk.sequence_index,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RetrievedChunk {
    pub text: String,
    pub score: f32,
    pub sequence_index: usize,
}

/// Chunks of one document ranked by descending similarity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub document_id: String,
    pub chunks: Vec<RetrievedChunk>,
}

impl RetrievalResult {
    pub fn empty(document_id: &str) -> Self {
        Self {
            document_id: document_id.to_string(),
            chunks: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.chunks.iter().map(|c| c.text.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub document_id: String,
    pub chunks_indexed: usize,
    pub chunks_discarded: usize,
    pub max_chunk_len: usize,
    pub duration_ms: u64,
    pub indexed_at: DateTime<Utc>,
}

/// States of a single ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestState {
    Uploaded,
    Chunked,
    Embedded,
    Indexed,
    Ready,
    Failed,
}

impl fmt::Display for IngestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IngestState::Uploaded => "uploaded",
            IngestState::Chunked => "chunked",
            IngestState::Embedded => "embedded",
            IngestState::Indexed => "indexed",
            IngestState::Ready => "ready",
            IngestState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

// ============= Chat Types =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    Developer,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn developer(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Developer,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("{service} error: {message}")]
    Provider { service: String, message: String },

    #[error("Indexing failed before reaching '{stage}': {source}")]
    Indexing {
        stage: IngestState,
        #[source]
        source: Box<AppError>,
    },

    #[error("Could not extract text: {0}")]
    Extraction(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn provider(service: &str, message: impl fmt::Display) -> Self {
        AppError::Provider {
            service: service.to_string(),
            message: message.to_string(),
        }
    }

    /// Wrap `self` as an ingest failure at `stage`.
    pub fn at_stage(self, stage: IngestState) -> Self {
        AppError::Indexing {
            stage,
            source: Box::new(self),
        }
    }

    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;

        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Provider { .. } => StatusCode::BAD_GATEWAY,
            AppError::Indexing { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = serde_json::json!({
            "error": self.to_string()
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
