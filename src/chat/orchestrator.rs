use crate::chat::prompt;
use crate::llm::{CompletionStream, LLMClient};
use crate::rag::RetrievalPipeline;
use crate::types::{AppError, ChatMessage, ChatRequest, Result};
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Answers chat requests, grounding them in an uploaded document when one is named.
pub struct ChatOrchestrator {
    pipeline: Arc<RetrievalPipeline>,
    llm: Arc<dyn LLMClient>,
    default_model: String,
    top_k: usize,
    stream_buffer: usize,
}

impl ChatOrchestrator {
    pub fn new(
        pipeline: Arc<RetrievalPipeline>,
        llm: Arc<dyn LLMClient>,
        default_model: impl Into<String>,
        top_k: usize,
        stream_buffer: usize,
    ) -> Self {
        Self {
            pipeline,
            llm,
            default_model: default_model.into(),
            top_k: top_k.max(1),
            stream_buffer: stream_buffer.max(1),
        }
    }

    /// Messages to send upstream for `request`.
    ///
    /// Falls back to the plain developer/user exchange when no document is
    /// named or nothing could be retrieved from it.
    pub async fn build_prompt(&self, request: &ChatRequest) -> Result<Vec<ChatMessage>> {
        let document_id = request
            .pdf_filename
            .as_deref()
            .filter(|name| !name.trim().is_empty());

        let retrieval = match document_id {
            Some(document_id) => Some(
                self.pipeline
                    .retrieve(document_id, &request.user_message, self.top_k)
                    .await?,
            ),
            None => None,
        };

        let grounded = retrieval.as_ref().is_some_and(|r| !r.is_empty());
        tracing::info!(
            model = self.model_for(request),
            document_id = document_id.unwrap_or("-"),
            mode = if grounded { "rag" } else { "fallback" },
            context_chunks = retrieval.as_ref().map(|r| r.len()).unwrap_or(0),
            "Chat request"
        );

        Ok(prompt::build_messages(
            &request.developer_message,
            &request.user_message,
            retrieval.as_ref(),
        ))
    }

    /// The request's model, or the configured default.
    pub fn model_for<'a>(&'a self, request: &'a ChatRequest) -> &'a str {
        request.model.as_deref().unwrap_or(&self.default_model)
    }

    /// Open a streamed answer.
    ///
    /// The first upstream item is awaited before this returns, so provider
    /// failures (rejected key, rate limit, unreachable service) come back as
    /// an `Err` instead of a stream that breaks off.
    pub async fn respond(&self, request: &ChatRequest) -> Result<ChatStream> {
        if request.user_message.trim().is_empty() {
            return Err(AppError::Validation("user_message must not be empty".into()));
        }
        let model = self.model_for(request);
        if model.trim().is_empty() {
            return Err(AppError::Validation("model must not be empty".into()));
        }

        let messages = self.build_prompt(request).await?;
        let upstream = self.llm.stream_chat(model, &messages).await?;
        let upstream = first_item_checked(upstream).await?;

        Ok(ChatStream::spawn(upstream, self.stream_buffer))
    }
}

/// Wait for the first item of `upstream`, failing if it is an error.
///
/// The item is put back in front of the remaining stream.
async fn first_item_checked(mut upstream: CompletionStream) -> Result<CompletionStream> {
    match upstream.next().await {
        Some(Err(e)) => Err(e),
        Some(Ok(first)) => {
            let replayed = futures::stream::once(async move { Ok(first) });
            Ok(Box::pin(replayed.chain(upstream)))
        }
        None => Ok(upstream),
    }
}

/// Text increments of one answer.
///
/// Backed by a producer task that forwards upstream deltas over a bounded
/// channel. Dropping the stream stops the task and with it the upstream
/// subscription.
pub struct ChatStream {
    rx: mpsc::Receiver<Result<String>>,
    task: JoinHandle<()>,
}

impl ChatStream {
    fn spawn(mut upstream: CompletionStream, buffer: usize) -> Self {
        let (tx, rx) = mpsc::channel(buffer);

        let task = tokio::spawn(async move {
            let mut forwarded = 0usize;
            loop {
                tokio::select! {
                    _ = tx.closed() => {
                        tracing::debug!(forwarded, "Chat stream receiver dropped");
                        break;
                    }
                    item = upstream.next() => match item {
                        Some(Ok(delta)) => {
                            let Some(text) = delta.non_empty_text() else {
                                continue;
                            };
                            if tx.send(Ok(text)).await.is_err() {
                                break;
                            }
                            forwarded += 1;
                        }
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, forwarded, "Completion stream failed");
                            let _ = tx.send(Err(e)).await;
                            break;
                        }
                        None => {
                            tracing::debug!(forwarded, "Completion stream finished");
                            break;
                        }
                    }
                }
            }
        });

        Self { rx, task }
    }
}

impl Stream for ChatStream {
    type Item = Result<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for ChatStream {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::CompletionDelta;

    fn upstream(items: Vec<Result<CompletionDelta>>) -> CompletionStream {
        Box::pin(futures::stream::iter(items))
    }

    #[tokio::test]
    async fn test_skips_empty_deltas() {
        let stream = ChatStream::spawn(
            upstream(vec![
                Ok(CompletionDelta::text("Hel")),
                Ok(CompletionDelta::default()),
                Ok(CompletionDelta::text("")),
                Ok(CompletionDelta::text("lo")),
            ]),
            2,
        );

        let parts: Vec<String> = stream.map(|r| r.unwrap()).collect().await;
        assert_eq!(parts, vec!["Hel", "lo"]);
    }

    #[tokio::test]
    async fn test_first_item_error_is_returned() {
        let checked = first_item_checked(upstream(vec![
            Err(AppError::provider("openai", "401 Unauthorized")),
            Ok(CompletionDelta::text("never")),
        ]))
        .await;

        assert!(matches!(checked, Err(AppError::Provider { .. })));
    }

    #[tokio::test]
    async fn test_first_item_is_kept() {
        let checked = first_item_checked(upstream(vec![
            Ok(CompletionDelta::text("a")),
            Ok(CompletionDelta::text("b")),
        ]))
        .await
        .unwrap();

        let texts: Vec<String> = checked
            .map(|d| d.unwrap().content.unwrap_or_default())
            .collect()
            .await;
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_upstream_error_ends_stream() {
        let stream = ChatStream::spawn(
            upstream(vec![
                Ok(CompletionDelta::text("partial")),
                Err(AppError::provider("openai", "connection reset")),
                Ok(CompletionDelta::text("never")),
            ]),
            4,
        );

        let items: Vec<Result<String>> = stream.collect().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "partial");
        assert!(matches!(items[1], Err(AppError::Provider { .. })));
    }
}
