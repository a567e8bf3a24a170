//! Conversation session core for a persona-driven chat bot.
//!
//! A [`Session`] owns the transcript, prepends the persona to every request
//! and asks a [`CompletionProvider`] for each assistant turn.

pub mod commands;
pub mod config;
pub mod error;
pub mod llm;
pub mod prompts;
pub mod session;
pub mod storage;
pub mod transcript;

pub use config::{Config, Credentials, ProviderKind, SessionConfig};
pub use error::{ConfigError, ProviderError, ProviderErrorKind, SessionError};
pub use llm::{
    CompletionProvider, CompletionRequest, LlmClient, LlmMessage, LoggingProvider, MessageRole,
};
pub use session::Session;
pub use transcript::{Role, Transcript, Turn};
