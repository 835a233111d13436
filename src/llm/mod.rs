//! LLM Provider Clients and Abstractions
//!
//! - [`LLMClient`] - the trait the chat orchestrator streams completions through
//! - [`Provider`] - runtime selection of a concrete client
//! - [`OpenAIClient`] - OpenAI chat completions, or any compatible server
//!
//! # Example
//!
//! ```ignore
//! use pdfchat::llm::Provider;
//! use pdfchat::types::ChatMessage;
//!
//! let client = Provider::from_config(&config.openai).create_client();
//! let mut stream = client
//!     .stream_chat("gpt-4.1-mini", &[ChatMessage::user("Hello")])
//!     .await?;
//! ```

/// Core LLM client trait and streaming response types.
pub mod client;
pub mod openai;

pub use client::{CompletionDelta, CompletionStream, LLMClient, Provider};
pub use openai::OpenAIClient;
