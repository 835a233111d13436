//! HTTP API Handlers and Routes
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # API Endpoints
//!
//! ## Documents
//! - `POST /api/upload_pdf` - Upload a PDF (multipart field `file`) and index it
//! - `GET /api/documents` - List indexed documents
//! - `DELETE /api/documents/{filename}` - Remove a document
//!
//! ## Chat
//! - `POST /api/chat` - Streamed plain-text answer, grounded in `pdf_filename` when given
//!
//! ## Health (`/api/health`)
//! - `GET /api/health` - Health check endpoint
//!
//! # OpenAPI Documentation
//!
//! The OpenAPI document is served at `/api/openapi.json`.

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

pub use routes::{build_app, create_router, ApiDoc};
