use crate::{
    types::{ChatRequest, Result},
    AppState,
};
use axum::{
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};

/// Chat with the assistant, optionally grounded in an uploaded PDF
///
/// The answer is streamed back as plain text while it is generated.
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Streamed answer", body = String, content_type = "text/plain"),
        (status = 400, description = "Invalid input"),
        (status = 502, description = "Embedding or completion provider failed")
    ),
    tag = "chat"
)]
pub async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Response> {
    let stream = state.orchestrator.respond(&payload).await?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(stream),
    )
        .into_response())
}
