//! Error types for the conversation core

use thiserror::Error;

/// Errors reported by [`crate::session::Session::submit_user_turn`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The submitted text was empty or whitespace only. Nothing was sent.
    #[error("input is empty")]
    EmptyInput,

    /// The completion provider did not produce a reply.
    #[error("completion failed: {detail}")]
    CompletionFailed { detail: String },
}

impl SessionError {
    pub fn completion_failed(detail: impl Into<String>) -> Self {
        Self::CompletionFailed {
            detail: detail.into(),
        }
    }
}

/// Failure returned by a completion provider
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Network, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Auth, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::RateLimit, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::InvalidRequest, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::ServerError, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::MalformedResponse, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Unknown, message)
    }
}

/// Rough classification of a provider failure.
///
/// Only used for logging; the session reports every kind the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Timeouts, refused connections
    Network,
    /// 401 / 403
    Auth,
    /// 429
    RateLimit,
    /// Other 4xx
    InvalidRequest,
    /// 5xx
    ServerError,
    /// Body could not be decoded, or carried no reply text
    MalformedResponse,
    Unknown,
}

/// Configuration problems detected before a session exists
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("no API key configured; set `api_key` in the config file or {env_var}")]
    MissingCredentials { env_var: String },

    #[error("randomness must be within [0, 1], got {0}")]
    InvalidRandomness(f32),

    #[error("max_reply_length must be greater than zero")]
    InvalidReplyLength,

    #[error("persona must not be empty")]
    EmptyPersona,
}
