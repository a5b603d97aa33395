//! Transcript loading from caption files in asset storage.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use vidcycle_core::{defaults, AssetStore, Error, Result, TranscriptSource, Video};

/// Reads `{owner_id}/{video_id}/transcription.vtt` and strips it to plain text.
#[derive(Clone)]
pub struct StorageTranscriptSource {
    assets: Arc<dyn AssetStore>,
}

impl StorageTranscriptSource {
    pub fn new(assets: Arc<dyn AssetStore>) -> Self {
        Self { assets }
    }
}

#[async_trait]
impl TranscriptSource for StorageTranscriptSource {
    async fn fetch_transcript(&self, video: &Video) -> Result<String> {
        let key = format!("{}{}", video.storage_prefix(), defaults::TRANSCRIPT_FILE);
        let bytes = self.assets.read(&key).await.map_err(|e| match e {
            Error::NotFound(_) => Error::NotFound(format!("Transcript for video {}", video.id)),
            other => other,
        })?;
        let raw = String::from_utf8_lossy(&bytes);
        let text = strip_vtt(&raw);
        debug!(
            subsystem = "storage",
            component = "transcripts",
            video_id = %video.id,
            raw_len = raw.len(),
            text_len = text.len(),
            "Transcript loaded"
        );
        Ok(text)
    }
}

/// Reduce a WebVTT caption file to its spoken text.
///
/// Drops the `WEBVTT` header block, `NOTE`/`STYLE` blocks, numeric cue
/// identifiers, and `-->` timing lines; cue text lines are joined by spaces.
pub fn strip_vtt(raw: &str) -> String {
    let mut lines = Vec::new();
    let mut skipping_block = false;

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            skipping_block = false;
            continue;
        }
        if skipping_block {
            continue;
        }
        if line.starts_with("WEBVTT") || line.starts_with("NOTE") || line == "STYLE" {
            skipping_block = true;
            continue;
        }
        if line.contains("-->") || line.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        lines.push(line);
    }

    lines.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryAssetStore;
    use chrono::Utc;
    use uuid::Uuid;
    use vidcycle_core::RagStatus;

    const SAMPLE: &str = "WEBVTT\nKind: captions\n\n1\n00:00:00.000 --> 00:00:02.500\nHello team,\n\n2\n00:00:02.500 --> 00:00:05.000\nthe deploy failed again.\n\nNOTE reviewer comment\nignore me\n\n3\n00:00:05.000 --> 00:00:07.000\nLet's fix it.\n";

    fn video() -> Video {
        Video {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: "Deploy issue".to_string(),
            duration_seconds: None,
            ai_summary: None,
            transcription_status: None,
            rag_status: RagStatus::Pending,
            rag_status_updated_at: None,
            rag_status_updated_by: None,
            keep_permanently: false,
            expires_at: None,
            ai_suggested_labels: None,
            ai_classified_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_strip_vtt() {
        assert_eq!(
            strip_vtt(SAMPLE),
            "Hello team, the deploy failed again. Let's fix it."
        );
    }

    #[test]
    fn test_strip_vtt_plain_text_passthrough() {
        assert_eq!(strip_vtt("just words\nmore words"), "just words more words");
    }

    #[test]
    fn test_strip_vtt_header_only() {
        assert_eq!(strip_vtt("WEBVTT\n\n"), "");
    }

    #[tokio::test]
    async fn test_fetch_transcript_from_store() {
        let assets = Arc::new(MemoryAssetStore::new());
        let v = video();
        assets
            .put(format!("{}transcription.vtt", v.storage_prefix()), SAMPLE)
            .await;

        let source = StorageTranscriptSource::new(assets);
        let text = source.fetch_transcript(&v).await.unwrap();
        assert!(text.starts_with("Hello team"));
    }

    #[tokio::test]
    async fn test_missing_transcript_is_not_found() {
        let source = StorageTranscriptSource::new(Arc::new(MemoryAssetStore::new()));
        let err = source.fetch_transcript(&video()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
