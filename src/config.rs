use crate::error::ConfigError;
use crate::llm::ApiDialect;
use crate::prompts;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use strum::{AsRefStr, Display, EnumString};

pub const DEFAULT_MAX_REPLY_LENGTH: u32 = 500;
pub const DEFAULT_RANDOMNESS: f32 = 0.7;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Application configuration, read from `~/.voicebot/config.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which hosted completion API to talk to
    pub provider: ProviderKind,

    /// Model name; provider default when unset
    pub model: Option<String>,

    /// Override the provider's API root
    pub base_url: Option<String>,

    /// API key; falls back to the provider's environment variable
    pub api_key: Option<Credentials>,

    /// Persona instruction; built-in interview persona when unset
    pub persona: Option<String>,

    /// Reply length cap sent with every request (tokens)
    pub max_reply_length: u32,

    /// Sampling temperature in [0, 1]
    pub randomness: f32,

    /// HTTP timeout for a single completion call
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            provider: ProviderKind::default(),
            model: None,
            base_url: None,
            api_key: None,
            persona: None,
            max_reply_length: DEFAULT_MAX_REPLY_LENGTH,
            randomness: DEFAULT_RANDOMNESS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Hosted completion APIs the HTTP client knows how to call
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAi,
    OpenRouter,
    Xai,
    Mistral,
    Anthropic,
    Google,
}

impl ProviderKind {
    pub fn display_name(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::OpenRouter => "OpenRouter",
            ProviderKind::Xai => "xAI",
            ProviderKind::Mistral => "Mistral",
            ProviderKind::Anthropic => "Anthropic",
            ProviderKind::Google => "Google",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "https://api.openai.com",
            ProviderKind::OpenRouter => "https://openrouter.ai/api",
            ProviderKind::Xai => "https://api.x.ai",
            ProviderKind::Mistral => "https://api.mistral.ai",
            ProviderKind::Anthropic => "https://api.anthropic.com",
            ProviderKind::Google => "https://generativelanguage.googleapis.com/v1beta",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-3.5-turbo",
            ProviderKind::OpenRouter => "openai/gpt-3.5-turbo",
            ProviderKind::Xai => "grok-2-latest",
            ProviderKind::Mistral => "mistral-small-latest",
            ProviderKind::Anthropic => "claude-3-haiku-20240307",
            ProviderKind::Google => "gemini-1.5-flash",
        }
    }

    pub fn api_key_env(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::OpenRouter => "OPENROUTER_API_KEY",
            ProviderKind::Xai => "XAI_API_KEY",
            ProviderKind::Mistral => "MISTRAL_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            ProviderKind::Google => "GEMINI_API_KEY",
        }
    }

    pub fn dialect(self) -> ApiDialect {
        match self {
            ProviderKind::OpenAi
            | ProviderKind::OpenRouter
            | ProviderKind::Xai
            | ProviderKind::Mistral => ApiDialect::ChatCompletions,
            ProviderKind::Anthropic => ApiDialect::Anthropic,
            ProviderKind::Google => ApiDialect::Gemini,
        }
    }
}

/// Opaque provider credentials. Never printed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials(String);

impl Credentials {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credentials(***)")
    }
}

/// Fixed settings a [`crate::session::Session`] is built from
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub persona: String,
    pub max_reply_length: u32,
    pub randomness: f32,
    pub provider_credentials: Credentials,
}

impl SessionConfig {
    pub fn new(persona: impl Into<String>, provider_credentials: Credentials) -> Self {
        Self {
            persona: persona.into(),
            max_reply_length: DEFAULT_MAX_REPLY_LENGTH,
            randomness: DEFAULT_RANDOMNESS,
            provider_credentials,
        }
    }

    pub fn with_max_reply_length(mut self, max_reply_length: u32) -> Self {
        self.max_reply_length = max_reply_length;
        self
    }

    pub fn with_randomness(mut self, randomness: f32) -> Self {
        self.randomness = randomness;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider_credentials.is_blank() {
            return Err(ConfigError::MissingCredentials {
                env_var: "an API key environment variable".to_string(),
            });
        }
        if self.persona.trim().is_empty() {
            return Err(ConfigError::EmptyPersona);
        }
        if self.max_reply_length == 0 {
            return Err(ConfigError::InvalidReplyLength);
        }
        if !(0.0..=1.0).contains(&self.randomness) {
            return Err(ConfigError::InvalidRandomness(self.randomness));
        }
        Ok(())
    }
}

impl Config {
    /// `~/.voicebot`
    pub fn home_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".voicebot"))
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join("config.toml"))
    }

    /// Load from `path`, or from the default location when `path` is `None`.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = Self::default_path()?;
                if !default.exists() {
                    tracing::debug!(path = %default.display(), "no config file, using defaults");
                    return Ok(Config::default());
                }
                default
            }
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file {}", config_path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config = toml::from_str(content)?;
        Ok(config)
    }

    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
            .trim_end_matches('/')
    }

    pub fn persona(&self) -> &str {
        self.persona.as_deref().unwrap_or(prompts::PERSONA)
    }

    /// Credentials from the config file, else from the provider's environment variable
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        self.credentials_with(|name| std::env::var(name).ok())
    }

    pub fn credentials_with<F>(&self, lookup: F) -> Result<Credentials, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_var = self.provider.api_key_env();
        self.api_key
            .clone()
            .filter(|key| !key.is_blank())
            .or_else(|| lookup(env_var).map(Credentials::new))
            .filter(|key| !key.is_blank())
            .ok_or_else(|| ConfigError::MissingCredentials {
                env_var: env_var.to_string(),
            })
    }

    pub fn session_config(&self) -> Result<SessionConfig, ConfigError> {
        self.session_config_with(|name| std::env::var(name).ok())
    }

    pub fn session_config_with<F>(&self, lookup: F) -> Result<SessionConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let session_config = SessionConfig::new(self.persona(), self.credentials_with(lookup)?)
            .with_max_reply_length(self.max_reply_length)
            .with_randomness(self.randomness);
        session_config.validate()?;
        Ok(session_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_match_interview_bot() {
        let config = Config::default();
        assert_eq!(config.provider, ProviderKind::OpenAi);
        assert_eq!(config.model(), "gpt-3.5-turbo");
        assert_eq!(config.max_reply_length, 500);
        assert_eq!(config.randomness, 0.7);
        assert_eq!(config.persona(), prompts::PERSONA);
        assert_eq!(config.base_url(), "https://api.openai.com");
    }

    #[test]
    fn parses_partial_toml() {
        let config = Config::from_toml_str(
            r#"
            provider = "anthropic"
            persona = "You are a concise assistant."
            randomness = 0.2
            base_url = "http://localhost:8080/"
            "#,
        )
        .unwrap();
        assert_eq!(config.provider, ProviderKind::Anthropic);
        assert_eq!(config.model(), "claude-3-haiku-20240307");
        assert_eq!(config.persona(), "You are a concise assistant.");
        assert_eq!(config.randomness, 0.2);
        assert_eq!(config.max_reply_length, DEFAULT_MAX_REPLY_LENGTH);
        assert_eq!(config.base_url(), "http://localhost:8080");
    }

    #[test]
    fn rejects_unknown_provider() {
        assert!(Config::from_toml_str(r#"provider = "carrier-pigeon""#).is_err());
    }

    #[test]
    fn file_key_wins_over_environment() {
        let config = Config {
            api_key: Some(Credentials::new("from-file")),
            ..Config::default()
        };
        let creds = config
            .credentials_with(|_| Some("from-env".to_string()))
            .unwrap();
        assert_eq!(creds.expose(), "from-file");
    }

    #[test]
    fn falls_back_to_provider_env_var() {
        let config = Config {
            provider: ProviderKind::Mistral,
            ..Config::default()
        };
        let creds = config
            .credentials_with(|name| (name == "MISTRAL_API_KEY").then(|| "m-key".to_string()))
            .unwrap();
        assert_eq!(creds.expose(), "m-key");
    }

    #[test]
    fn missing_credentials_prevent_session_config() {
        let err = Config::default().session_config_with(no_env).unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingCredentials {
                env_var: "OPENAI_API_KEY".to_string()
            }
        );
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let config = Config {
            api_key: Some(Credentials::new("   ")),
            ..Config::default()
        };
        assert!(matches!(
            config.credentials_with(no_env),
            Err(ConfigError::MissingCredentials { .. })
        ));
    }

    #[test]
    fn out_of_range_randomness_is_rejected() {
        let config = Config {
            api_key: Some(Credentials::new("k")),
            randomness: 1.5,
            ..Config::default()
        };
        assert_eq!(
            config.session_config_with(no_env).unwrap_err(),
            ConfigError::InvalidRandomness(1.5)
        );

        let nan = SessionConfig::new("p", Credentials::new("k")).with_randomness(f32::NAN);
        assert!(matches!(
            nan.validate(),
            Err(ConfigError::InvalidRandomness(_))
        ));
    }

    #[test]
    fn zero_reply_length_and_empty_persona_are_rejected() {
        let base = SessionConfig::new("persona", Credentials::new("k"));
        assert_eq!(
            base.clone().with_max_reply_length(0).validate(),
            Err(ConfigError::InvalidReplyLength)
        );
        assert_eq!(
            SessionConfig::new("  ", Credentials::new("k")).validate(),
            Err(ConfigError::EmptyPersona)
        );
        assert!(base.validate().is_ok());
    }

    #[test]
    fn credentials_debug_is_redacted() {
        let config = Config {
            api_key: Some(Credentials::new("sk-secret")),
            ..Config::default()
        };
        let printed = format!("{config:?}");
        assert!(!printed.contains("sk-secret"));
        assert!(printed.contains("Credentials(***)"));
    }

    #[test]
    fn provider_names_round_trip_through_strum() {
        assert_eq!("openrouter".parse::<ProviderKind>().unwrap(), ProviderKind::OpenRouter);
        assert_eq!(ProviderKind::Google.to_string(), "google");
        assert_eq!(ProviderKind::Xai.dialect(), ApiDialect::ChatCompletions);
    }
}
