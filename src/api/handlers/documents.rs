use crate::{
    api::handlers::upload::sanitize_filename,
    types::{AppError, DeleteDocumentResponse, DocumentListResponse, Result},
    AppState,
};
use axum::{
    extract::{Path, State},
    Json,
};

/// List indexed documents
#[utoipa::path(
    get,
    path = "/api/documents",
    responses(
        (status = 200, description = "Indexed documents", body = DocumentListResponse)
    ),
    tag = "documents"
)]
pub async fn list_documents(State(state): State<AppState>) -> Result<Json<DocumentListResponse>> {
    let documents = state.pipeline.documents().await?;
    Ok(Json(DocumentListResponse { documents }))
}

/// Remove a document from the index and delete its stored upload
#[utoipa::path(
    delete,
    path = "/api/documents/{filename}",
    params(("filename" = String, Path, description = "Uploaded PDF filename")),
    responses(
        (status = 200, description = "Document removed", body = DeleteDocumentResponse),
        (status = 404, description = "Document not found")
    ),
    tag = "documents"
)]
pub async fn delete_document(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<DeleteDocumentResponse>> {
    let filename = sanitize_filename(&filename)?;
    let chunks_removed = state.pipeline.remove(&filename).await?;

    let stored = state.config.server.uploads_dir.join(&filename);
    let file_removed = match tokio::fs::remove_file(&stored).await {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            tracing::warn!(filename = %filename, error = %e, "Failed to delete stored upload");
            false
        }
    };

    if chunks_removed == 0 && !file_removed {
        return Err(AppError::NotFound(format!("Document '{}'", filename)));
    }

    Ok(Json(DeleteDocumentResponse {
        filename,
        chunks_removed,
    }))
}
