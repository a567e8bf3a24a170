use crate::config::SessionConfig;
use crate::error::{ConfigError, SessionError};
use crate::llm::{CompletionProvider, CompletionRequest, LlmMessage};
use crate::transcript::{Transcript, Turn};
use std::sync::Arc;
use uuid::Uuid;

/// One conversation: a transcript, a fixed persona and the provider that answers.
///
/// All mutation goes through [`Session::submit_user_turn`] and
/// [`Session::clear`]. Both take `&mut self`, so a session never has more
/// than one completion call outstanding.
pub struct Session {
    id: Uuid,
    config: SessionConfig,
    provider: Arc<dyn CompletionProvider>,
    transcript: Transcript,
}

impl Session {
    /// Create an empty session. Fails if `config` is not usable.
    pub fn new(
        config: SessionConfig,
        provider: Arc<dyn CompletionProvider>,
    ) -> Result<Self, ConfigError> {
        Self::with_transcript(config, provider, Transcript::new())
    }

    /// Create a session that continues from a previously saved transcript
    pub fn with_transcript(
        config: SessionConfig,
        provider: Arc<dyn CompletionProvider>,
        transcript: Transcript,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let id = Uuid::new_v4();
        tracing::debug!(
            session = %id,
            model = provider.model_id(),
            restored_turns = transcript.len(),
            "session created"
        );

        Ok(Self {
            id,
            config,
            provider,
            transcript,
        })
    }

    pub fn model_id(&self) -> &str {
        self.provider.model_id()
    }

    /// Read-only view for rendering
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Record `text` as a user turn and ask the provider for the reply.
    ///
    /// On success both turns are in the transcript and the assistant turn is
    /// returned. On failure the user turn stays and no assistant turn is added.
    /// Blank input is rejected before anything is recorded or sent.
    pub async fn submit_user_turn(&mut self, text: &str) -> Result<Turn, SessionError> {
        if text.trim().is_empty() {
            return Err(SessionError::EmptyInput);
        }

        self.transcript.push(Turn::user(text));
        let request = self.build_request();

        tracing::debug!(
            session = %self.id,
            turns = self.transcript.len(),
            request_messages = request.messages.len(),
            "requesting completion"
        );

        match self.provider.complete(&request).await {
            Ok(reply) if reply.trim().is_empty() => {
                tracing::warn!(
                    session = %self.id,
                    "provider returned an empty reply, user turn kept without reply"
                );
                Err(SessionError::completion_failed("Provider returned an empty reply"))
            }
            Ok(reply) => {
                let turn = Turn::assistant(reply);
                self.transcript.push(turn.clone());
                Ok(turn)
            }
            Err(e) => {
                tracing::warn!(
                    session = %self.id,
                    kind = ?e.kind,
                    error = %e,
                    "completion failed, user turn kept without reply"
                );
                Err(SessionError::completion_failed(e.to_string()))
            }
        }
    }

    /// Drop the whole transcript. Never contacts the provider.
    pub fn clear(&mut self) {
        tracing::debug!(session = %self.id, dropped = self.transcript.len(), "transcript cleared");
        self.transcript.clear();
    }

    /// Persona entry followed by every turn, in order. No truncation.
    pub fn build_request(&self) -> CompletionRequest {
        let mut messages = Vec::with_capacity(self.transcript.len() + 1);
        messages.push(LlmMessage::system(self.config.persona.as_str()));
        messages.extend(self.transcript.iter().map(LlmMessage::from));

        CompletionRequest {
            messages,
            max_tokens: self.config.max_reply_length,
            temperature: self.config.randomness,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use crate::error::ProviderError;
    use crate::llm::MessageRole;
    use async_trait::async_trait;

    struct Unreachable;

    #[async_trait]
    impl CompletionProvider for Unreachable {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String, ProviderError> {
            panic!("provider must not be called");
        }

        fn model_id(&self) -> &str {
            "unreachable"
        }
    }

    fn config() -> SessionConfig {
        SessionConfig::new("You are a concise assistant.", Credentials::new("test-key"))
            .with_max_reply_length(123)
            .with_randomness(0.25)
    }

    #[test]
    fn invalid_config_prevents_construction() {
        let bad = SessionConfig::new("persona", Credentials::new(""));
        assert!(matches!(
            Session::new(bad, Arc::new(Unreachable)),
            Err(ConfigError::MissingCredentials { .. })
        ));
    }

    #[test]
    fn request_carries_persona_options_and_history() {
        let transcript = Transcript::from(vec![Turn::user("A"), Turn::assistant("reply")]);
        let session =
            Session::with_transcript(config(), Arc::new(Unreachable), transcript).unwrap();

        let request = session.build_request();
        assert_eq!(request.max_tokens, 123);
        assert_eq!(request.temperature, 0.25);
        assert_eq!(request.messages.len(), 3);
        assert_eq!(request.messages[0].role, MessageRole::System);
        assert_eq!(request.messages[0].content, "You are a concise assistant.");
        assert_eq!(request.messages[1], LlmMessage::user("A"));
        assert_eq!(request.messages[2], LlmMessage::assistant("reply"));
    }

    #[tokio::test]
    async fn blank_input_never_reaches_provider() {
        let mut session = Session::new(config(), Arc::new(Unreachable)).unwrap();
        for blank in ["", "   ", "\n\t "] {
            assert_eq!(
                session.submit_user_turn(blank).await,
                Err(SessionError::EmptyInput)
            );
        }
        assert!(session.transcript().is_empty());
    }

    #[test]
    fn clear_does_not_touch_provider() {
        let transcript = Transcript::from(vec![Turn::user("A")]);
        let mut session =
            Session::with_transcript(config(), Arc::new(Unreachable), transcript).unwrap();
        session.clear();
        assert!(session.transcript().is_empty());
        assert_eq!(session.build_request().messages.len(), 1);
    }
}
