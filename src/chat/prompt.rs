//! Prompt assembly.

use crate::types::{ChatMessage, RetrievalResult};

/// System message used when the answer is grounded in document context.
pub const RAG_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that answers questions using the provided PDF context.";

/// Instruction that opens the grounded user message.
pub const RAG_INSTRUCTION: &str = "You are an assistant with access to the following PDF context. \
Answer the user's question using only this context.";

/// Separator placed between retrieved chunks.
pub const CONTEXT_DELIMITER: &str = "\n---\n";

/// Join the retrieved chunk texts in ranked order.
pub fn build_context(result: &RetrievalResult) -> String {
    result.texts().collect::<Vec<_>>().join(CONTEXT_DELIMITER)
}

/// `[system, user]` with the context embedded in the user message.
pub fn rag_messages(context: &str, question: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(RAG_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "{}\n\nContext:\n{}\n\nUser question: {}",
            RAG_INSTRUCTION, context, question
        )),
    ]
}

/// `[developer, user]`, passed through unchanged.
pub fn fallback_messages(developer_message: &str, user_message: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::developer(developer_message),
        ChatMessage::user(user_message),
    ]
}

/// Grounded messages when `retrieval` has chunks, the plain exchange otherwise.
pub fn build_messages(
    developer_message: &str,
    user_message: &str,
    retrieval: Option<&RetrievalResult>,
) -> Vec<ChatMessage> {
    match retrieval {
        Some(result) if !result.is_empty() => rag_messages(&build_context(result), user_message),
        _ => fallback_messages(developer_message, user_message),
    }
}
