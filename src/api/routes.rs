use crate::api::handlers::{chat, documents, health, upload};
use crate::types::{
    ChatRequest, DeleteDocumentResponse, DocumentListResponse, HealthResponse, UploadResponse,
    WordCount,
};
use crate::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;

/// OpenAPI document for the HTTP API.
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        upload::upload_pdf,
        chat::chat,
        documents::list_documents,
        documents::delete_document,
    ),
    components(schemas(
        ChatRequest,
        UploadResponse,
        WordCount,
        DocumentListResponse,
        DeleteDocumentResponse,
        HealthResponse,
    )),
    tags(
        (name = "health", description = "Liveness"),
        (name = "documents", description = "PDF upload and index management"),
        (name = "chat", description = "Streamed, optionally grounded chat"),
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Routes under `/api`, without state or middleware.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/upload_pdf", post(upload::upload_pdf))
        .route("/chat", post(chat::chat))
        .route("/documents", get(documents::list_documents))
        .route("/documents/{filename}", delete(documents::delete_document))
        .route("/openapi.json", get(openapi_json))
}

/// The complete application: API routes, CORS, tracing and the upload size limit.
pub fn build_app(state: AppState) -> Router {
    let max_upload_bytes = state.config.server.max_upload_bytes;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", create_router())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
