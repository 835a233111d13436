//! PDF upload and indexing.

use crate::{
    rag::{
        analytics::{top_words, TOP_WORDS},
        PdfLoader,
    },
    types::{AppError, IngestReport, Result, UploadResponse, WordCount},
    AppState,
};
use axum::{
    extract::{Multipart, State},
    Json,
};
use std::path::{Path, PathBuf};
use uuid::Uuid;

const FILE_FIELD: &str = "file";

/// Reduce a client-supplied filename to its final path component.
///
/// Rejects names that are empty or that only navigate directories.
pub(crate) fn sanitize_filename(raw: &str) -> Result<String> {
    let name = raw
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .trim();

    if name.is_empty() || name == "." || name == ".." {
        return Err(AppError::Validation(format!("Invalid filename: '{}'", raw)));
    }
    Ok(name.to_string())
}

/// Temporary name an upload is written under until it has been indexed.
pub(crate) fn staging_path(uploads_dir: &Path, filename: &str) -> PathBuf {
    uploads_dir.join(format!(".{}.{}.part", filename, Uuid::new_v4().simple()))
}

pub(crate) fn is_pdf_filename(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Upload a PDF and index it for retrieval
///
/// Re-uploading a filename replaces the previously indexed content.
#[utoipa::path(
    post,
    path = "/api/upload_pdf",
    request_body(content_type = "multipart/form-data", description = "PDF file in the `file` field"),
    responses(
        (status = 200, description = "PDF uploaded and indexed", body = UploadResponse),
        (status = 400, description = "Missing file or not a PDF"),
        (status = 422, description = "PDF text could not be extracted"),
        (status = 500, description = "Indexing failed")
    ),
    tag = "documents"
)]
pub async fn upload_pdf(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("Uploaded file has no filename".into()))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {}", e)))?;
        upload = Some((filename, bytes));
        break;
    }

    let (raw_filename, bytes) = upload.ok_or_else(|| {
        AppError::Validation(format!("Missing multipart field '{}'", FILE_FIELD))
    })?;

    let filename = sanitize_filename(&raw_filename)?;
    if !is_pdf_filename(&filename) {
        return Err(AppError::Validation("Only PDF files are allowed.".into()));
    }

    let uploads_dir = &state.config.server.uploads_dir;
    tokio::fs::create_dir_all(uploads_dir)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create uploads directory: {}", e)))?;
    let staging = staging_path(uploads_dir, &filename);
    tokio::fs::write(&staging, &bytes)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to store upload: {}", e)))?;

    tracing::info!(filename = %filename, bytes = bytes.len(), "PDF uploaded");

    // The stored copy is only replaced once the new content is indexed.
    let (report, analytics) = match index_upload(&state, &filename, bytes.to_vec()).await {
        Ok(indexed) => indexed,
        Err(e) => {
            if let Err(cleanup) = tokio::fs::remove_file(&staging).await {
                tracing::warn!(filename = %filename, error = %cleanup, "Failed to remove staged upload");
            }
            return Err(e);
        }
    };
    tokio::fs::rename(&staging, uploads_dir.join(&filename))
        .await
        .map_err(|e| AppError::Internal(format!("Failed to store upload: {}", e)))?;

    let uploaded_filenames = state.pipeline.documents().await?;

    Ok(Json(UploadResponse {
        filename,
        message: "PDF uploaded and indexed successfully.".to_string(),
        analytics,
        uploaded_filenames,
        chunks_indexed: report.chunks_indexed,
        chunks_discarded: report.chunks_discarded,
    }))
}

async fn index_upload(
    state: &AppState,
    filename: &str,
    bytes: Vec<u8>,
) -> Result<(IngestReport, Vec<WordCount>)> {
    let pages = PdfLoader::load(bytes).await?;
    let report = state.pipeline.ingest(filename, &pages).await?;
    Ok((report, top_words(&pages, TOP_WORDS)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("report.pdf", "report.pdf")]
    #[case("../../etc/report.pdf", "report.pdf")]
    #[case("C:\\Users\\me\\report.PDF", "report.PDF")]
    #[case(" spaced.pdf ", "spaced.pdf")]
    fn test_sanitize_filename(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(sanitize_filename(raw).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("..")]
    #[case("dir/")]
    fn test_sanitize_filename_rejects(#[case] raw: &str) {
        assert!(sanitize_filename(raw).is_err());
    }

    #[test]
    fn test_staging_path_is_hidden_and_unique() {
        let dir = Path::new("uploads");
        let first = staging_path(dir, "report.pdf");
        let second = staging_path(dir, "report.pdf");

        assert_ne!(first, second);
        assert_eq!(first.parent(), Some(dir));
        let name = first.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with(".report.pdf."));
        assert!(!is_pdf_filename(name));
    }

    #[rstest]
    #[case("a.pdf", true)]
    #[case("a.PDF", true)]
    #[case("a.pdf.exe", false)]
    #[case("a.txt", false)]
    #[case("pdf", false)]
    fn test_is_pdf_filename(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_pdf_filename(name), expected);
    }
}
