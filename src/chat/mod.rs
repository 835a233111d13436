//! Chat orchestration: prompt assembly and answer streaming.

pub mod orchestrator;
pub mod prompt;

pub use orchestrator::{ChatOrchestrator, ChatStream};
