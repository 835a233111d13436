use crate::llm::client::{CompletionDelta, CompletionStream, LLMClient};
use crate::types::{AppError, ChatMessage, MessageRole, Result};
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestDeveloperMessageArgs,
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, FinishReason,
    },
    Client,
};
use async_trait::async_trait;
use futures::StreamExt;

pub struct OpenAIClient {
    client: Client<OpenAIConfig>,
}

impl OpenAIClient {
    pub fn new(api_key: String, api_base: String) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base);

        Self {
            client: Client::with_config(config),
        }
    }
}

fn build_error(e: impl std::fmt::Display) -> AppError {
    AppError::provider("openai", format!("Failed to build request: {}", e))
}

pub(crate) fn to_request_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
    let content = message.content.clone();
    let built: ChatCompletionRequestMessage = match message.role {
        MessageRole::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()
            .map_err(build_error)?
            .into(),
        MessageRole::Developer => ChatCompletionRequestDeveloperMessageArgs::default()
            .content(content)
            .build()
            .map_err(build_error)?
            .into(),
        MessageRole::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()
            .map_err(build_error)?
            .into(),
        MessageRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()
            .map_err(build_error)?
            .into(),
    };
    Ok(built)
}

fn finish_reason_name(reason: FinishReason) -> String {
    serde_json::to_value(reason)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("{:?}", reason).to_lowercase())
}

#[async_trait]
impl LLMClient for OpenAIClient {
    fn provider_name(&self) -> &'static str {
        "openai"
    }

    async fn stream_chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<CompletionStream> {
        let request_messages = messages
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(request_messages)
            .build()
            .map_err(build_error)?;

        let mut stream = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(|e| AppError::provider("openai", format!("OpenAI API error: {}", e)))?;

        tracing::debug!(model, messages = messages.len(), "Opened completion stream");

        let result_stream = async_stream::stream! {
            while let Some(result) = stream.next().await {
                match result {
                    Ok(response) => {
                        for choice in response.choices {
                            yield Ok(CompletionDelta {
                                content: choice.delta.content,
                                finish_reason: choice.finish_reason.map(finish_reason_name),
                            });
                        }
                    }
                    Err(e) => {
                        yield Err(AppError::provider("openai", format!("Stream error: {}", e)));
                        break;
                    }
                }
            }
        };

        Ok(Box::pin(result_stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_map_to_request_messages() {
        let messages = [
            ChatMessage::system("sys"),
            ChatMessage::developer("dev"),
            ChatMessage::user("usr"),
        ];
        let mapped: Vec<ChatCompletionRequestMessage> = messages
            .iter()
            .map(|m| to_request_message(m).unwrap())
            .collect();

        assert!(matches!(mapped[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(mapped[1], ChatCompletionRequestMessage::Developer(_)));
        assert!(matches!(mapped[2], ChatCompletionRequestMessage::User(_)));
    }

    #[test]
    fn test_finish_reason_uses_wire_name() {
        assert_eq!(finish_reason_name(FinishReason::Stop), "stop");
        assert_eq!(finish_reason_name(FinishReason::ToolCalls), "tool_calls");
    }
}
