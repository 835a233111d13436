use crate::types::{AppError, Result, DEFAULT_CHAT_MODEL};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub openai: OpenAIConfig,
    pub rag: RAGConfig,
    pub vector: VectorConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub uploads_dir: PathBuf,
    pub max_upload_bytes: usize,
}

#[derive(Clone, Deserialize)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub api_base: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub embedding_dimensions: usize,
    /// Send `dimensions` with embedding requests. Only set when
    /// `EMBEDDING_DIMENSIONS` is given, since older models reject it.
    pub request_dimensions: bool,
    pub embedding_batch_size: usize,
}

// Keys never reach logs or error messages.
impl fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("chat_model", &self.chat_model)
            .field("embedding_model", &self.embedding_model)
            .field("embedding_dimensions", &self.embedding_dimensions)
            .field("request_dimensions", &self.request_dimensions)
            .field("embedding_batch_size", &self.embedding_batch_size)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RAGConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Chunks longer than this many bytes are never indexed.
    pub max_chunk_bytes: usize,
    pub top_k: usize,
    /// Capacity of the channel between the completion task and the HTTP body.
    pub stream_buffer: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackend {
    Memory,
    Qdrant,
}

impl FromStr for VectorBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "in-memory" | "inmemory" => Ok(Self::Memory),
            "qdrant" => Ok(Self::Qdrant),
            _ => Err(AppError::Configuration(format!(
                "Unknown vector store: {}. Use: memory, qdrant",
                s
            ))),
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct VectorConfig {
    pub backend: VectorBackend,
    pub qdrant_url: String,
    pub qdrant_api_key: Option<String>,
    pub collection: String,
}

impl fmt::Debug for VectorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorConfig")
            .field("backend", &self.backend)
            .field("qdrant_url", &self.qdrant_url)
            .field(
                "qdrant_api_key",
                &self.qdrant_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("collection", &self.collection)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

impl Config {
    /// Load configuration from the process environment, reading `.env` first.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let api_key = lookup("OPENAI_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                AppError::Configuration("OPENAI_API_KEY environment variable is not set".into())
            })?;

        let config = Config {
            server: ServerConfig {
                host: get("HOST", "0.0.0.0"),
                port: parse(&lookup, "PORT", 8000)?,
                uploads_dir: PathBuf::from(get("UPLOADS_DIR", "uploads")),
                max_upload_bytes: parse(&lookup, "MAX_UPLOAD_BYTES", 25 * 1024 * 1024)?,
            },
            openai: OpenAIConfig {
                api_key,
                api_base: get("OPENAI_API_BASE", "https://api.openai.com/v1"),
                chat_model: get("CHAT_MODEL", DEFAULT_CHAT_MODEL),
                embedding_model: get("EMBEDDING_MODEL", "text-embedding-3-small"),
                embedding_dimensions: parse(&lookup, "EMBEDDING_DIMENSIONS", 1536)?,
                request_dimensions: lookup("EMBEDDING_DIMENSIONS").is_some(),
                embedding_batch_size: parse(&lookup, "EMBEDDING_BATCH_SIZE", 256)?,
            },
            rag: RAGConfig {
                chunk_size: parse(&lookup, "CHUNK_SIZE", 500)?,
                chunk_overlap: parse(&lookup, "CHUNK_OVERLAP", 100)?,
                max_chunk_bytes: parse(&lookup, "MAX_CHUNK_BYTES", 4000)?,
                top_k: parse(&lookup, "RETRIEVAL_TOP_K", 3)?,
                stream_buffer: parse(&lookup, "STREAM_BUFFER", 32)?,
            },
            vector: VectorConfig {
                backend: get("VECTOR_STORE", "memory").parse()?,
                qdrant_url: get("QDRANT_URL", "http://localhost:6334"),
                qdrant_api_key: lookup("QDRANT_API_KEY").filter(|k| !k.is_empty()),
                collection: get("QDRANT_COLLECTION", "pdf_vectors"),
            },
            logging: LoggingConfig {
                format: match get("LOG_FORMAT", "pretty").to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    _ => LogFormat::Pretty,
                },
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let rag = &self.rag;
        if rag.chunk_size == 0 {
            return Err(AppError::Configuration("CHUNK_SIZE must be positive".into()));
        }
        if rag.chunk_overlap >= rag.chunk_size {
            return Err(AppError::Configuration(format!(
                "CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({})",
                rag.chunk_overlap, rag.chunk_size
            )));
        }
        if rag.top_k == 0 {
            return Err(AppError::Configuration("RETRIEVAL_TOP_K must be at least 1".into()));
        }
        if rag.stream_buffer == 0 {
            return Err(AppError::Configuration("STREAM_BUFFER must be at least 1".into()));
        }
        if self.openai.embedding_dimensions == 0 || self.openai.embedding_batch_size == 0 {
            return Err(AppError::Configuration(
                "EMBEDDING_DIMENSIONS and EMBEDDING_BATCH_SIZE must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Configuration(format!("Invalid value for {}: {}", key, e))),
        None => Ok(default),
    }
}
