//! API request handlers.
//!
//! This module contains all HTTP request handlers organized by functionality.

/// Streaming chat handler.
pub mod chat;
/// Document listing and removal handlers.
pub mod documents;
/// Health check handler.
pub mod health;
/// PDF upload and indexing handler.
pub mod upload;
