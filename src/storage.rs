use crate::config::Config;
use crate::transcript::Transcript;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk transcript snapshot
#[derive(Debug, Serialize, Deserialize)]
pub struct SavedTranscript {
    pub saved_at: DateTime<Utc>,
    pub model: String,
    pub turns: Transcript,
}

/// Saves and restores transcripts so a host can resume a conversation.
pub struct TranscriptStore {
    transcripts_dir: PathBuf,
}

impl TranscriptStore {
    /// Store rooted at `~/.voicebot/transcripts`
    pub fn new() -> Result<Self> {
        Ok(Self::at(Config::home_dir()?.join("transcripts")))
    }

    pub fn at(transcripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            transcripts_dir: transcripts_dir.into(),
        }
    }

    pub fn transcripts_dir(&self) -> &Path {
        &self.transcripts_dir
    }

    /// `transcript-YYYYmmdd-HHMMSS.json` inside the store directory
    pub fn default_path(&self, now: DateTime<Utc>) -> PathBuf {
        self.transcripts_dir
            .join(format!("transcript-{}.json", now.format("%Y%m%d-%H%M%S")))
    }

    /// Write `transcript` to `path`, or to a timestamped file when `path` is `None`.
    /// Returns the path written.
    pub fn save(
        &self,
        path: Option<&Path>,
        transcript: &Transcript,
        model: &str,
    ) -> Result<PathBuf> {
        let now = Utc::now();
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => self.default_path(now),
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context("Failed to create transcript directory")?;
        }

        let saved = SavedTranscript {
            saved_at: now,
            model: model.to_string(),
            turns: transcript.clone(),
        };
        let content =
            serde_json::to_string_pretty(&saved).context("Failed to serialize transcript")?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write transcript {}", path.display()))?;

        tracing::debug!(path = %path.display(), turns = transcript.len(), "transcript saved");
        Ok(path)
    }

    pub fn load(&self, path: &Path) -> Result<SavedTranscript> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read transcript {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse transcript {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Turn;
    use chrono::TimeZone;

    #[test]
    fn save_then_load_restores_turn_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = TranscriptStore::at(dir.path().join("transcripts"));
        let transcript = Transcript::from(vec![
            Turn::user("A"),
            Turn::assistant("reply1"),
            Turn::user("B"),
        ]);

        let written = store.save(None, &transcript, "gpt-3.5-turbo").unwrap();
        assert!(written.starts_with(store.transcripts_dir()));

        let loaded = store.load(&written).unwrap();
        assert_eq!(loaded.model, "gpt-3.5-turbo");
        assert_eq!(loaded.turns, transcript);
    }

    #[test]
    fn explicit_path_is_used_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let store = TranscriptStore::at(dir.path());
        let target = dir.path().join("nested").join("chat.json");

        let written = store.save(Some(&target), &Transcript::new(), "m").unwrap();
        assert_eq!(written, target);

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&target).unwrap()).unwrap();
        assert_eq!(raw["turns"], serde_json::json!([]));
        assert!(raw["saved_at"].is_string());
    }

    #[test]
    fn default_file_name_is_timestamped() {
        let store = TranscriptStore::at("/tmp/t");
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            store.default_path(now),
            PathBuf::from("/tmp/t/transcript-20240309-140507.json")
        );
    }

    #[test]
    fn loading_garbage_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "not json").unwrap();

        let err = TranscriptStore::at(dir.path()).load(&path).unwrap_err();
        assert!(err.to_string().contains("bad.json"));
    }
}
