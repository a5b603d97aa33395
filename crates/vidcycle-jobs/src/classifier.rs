//! Transcript classification through the text-completion oracle.
//!
//! The oracle is asked for a strict JSON verdict over the closed label
//! vocabulary. Replies are parsed defensively: code fences and surrounding
//! prose are stripped, and anything unusable becomes a structured failure
//! instead of an error, so callers can retry without cleaning up.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use vidcycle_core::{
    ClassificationWrite, EngineConfig, Error, GenerationBackend, LabelSuggestion,
    LabelVocabulary, RagStatus, Result, Video, VideoRepository,
};
use vidcycle_inference::parse_json_reply;

/// Context sent alongside the transcript.
#[derive(Debug, Clone, Default)]
pub struct ClassificationContext {
    pub title: Option<String>,
    pub duration_seconds: Option<f64>,
    pub ai_summary: Option<String>,
    pub shared_space_names: Vec<String>,
}

impl ClassificationContext {
    pub fn from_video(video: &Video) -> Self {
        Self {
            title: Some(video.name.clone()),
            duration_seconds: video.duration_seconds,
            ai_summary: video.ai_summary.clone(),
            shared_space_names: Vec::new(),
        }
    }

    pub fn with_shared_spaces(mut self, names: Vec<String>) -> Self {
        self.shared_space_names = names;
        self
    }
}

/// Why a classification produced no suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The oracle call itself failed.
    Upstream,
    /// The oracle replied with something that is not the expected JSON.
    Parse,
}

/// Structured failure carried in a [`ClassificationResult`].
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ClassificationFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// Outcome of one classification run.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ClassificationResult {
    pub video_id: Uuid,
    /// Primary content type, secondary content type, department, in that order.
    pub suggestions: Vec<LabelSuggestion>,
    pub rag_eligibility: RagStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<ClassificationFailure>,
}

impl ClassificationResult {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    fn failed(video_id: Uuid, kind: FailureKind, message: String) -> Self {
        Self {
            video_id,
            suggestions: Vec::new(),
            rag_eligibility: RagStatus::Pending,
            reasoning: None,
            failure: Some(ClassificationFailure { kind, message }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OracleVerdict {
    content_type: Option<ContentTypeVerdict>,
    #[serde(default)]
    department: Option<DepartmentVerdict>,
    #[serde(default)]
    rag_eligibility: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentTypeVerdict {
    primary: Option<String>,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    secondary: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DepartmentVerdict {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    confidence: f64,
}

fn label_name(raw: Option<String>) -> Option<String> {
    let name = raw?.trim().to_ascii_uppercase();
    match name.as_str() {
        "" | "NULL" | "NONE" | "N/A" => None,
        _ => Some(name),
    }
}

/// Turn an oracle reply into suggestions and an eligibility verdict.
pub fn parse_verdict(
    raw: &str,
    secondary_discount: f64,
) -> Result<(Vec<LabelSuggestion>, RagStatus, Option<String>)> {
    let verdict: OracleVerdict = parse_json_reply(raw)?;
    let content_type = verdict
        .content_type
        .ok_or_else(|| Error::Parse("Reply is missing content_type".to_string()))?;
    let primary = label_name(content_type.primary)
        .ok_or_else(|| Error::Parse("Reply is missing content_type.primary".to_string()))?;

    let primary_confidence = content_type.confidence.clamp(0.0, 1.0);
    let mut suggestions = vec![LabelSuggestion::new(primary.clone(), primary_confidence)];

    if let Some(secondary) = label_name(content_type.secondary) {
        if secondary != primary {
            suggestions.push(LabelSuggestion::new(
                secondary,
                primary_confidence * secondary_discount,
            ));
        }
    }

    if let Some(department) = verdict.department {
        if let Some(name) = label_name(department.label) {
            suggestions.push(LabelSuggestion::new(
                name,
                department.confidence.clamp(0.0, 1.0),
            ));
        }
    }

    let rag = verdict
        .rag_eligibility
        .as_deref()
        .map(RagStatus::parse_lenient)
        .unwrap_or_default();

    Ok((suggestions, rag, verdict.reasoning))
}

/// First `max_chars` characters of `text`, never splitting a character.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// System instruction listing the vocabulary and the reply shape.
pub fn build_system_prompt(vocabulary: &LabelVocabulary) -> String {
    let describe = |templates: &[vidcycle_core::LabelTemplate]| {
        templates
            .iter()
            .map(|t| match &t.description {
                Some(d) => format!("- {}: {}", t.name, d),
                None => format!("- {}", t.name),
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"You classify recorded workplace videos from their transcripts.

Choose exactly one primary content type from:
{content_types}

Optionally choose a secondary content type from the same list when the video clearly mixes two kinds.

Choose at most one department from:
{departments}

Decide whether the video belongs in the company knowledge base (rag_eligibility):
- "eligible" for reusable knowledge: tutorials, demos, training, troubleshooting walkthroughs
- "excluded" for personal, sensitive, or throwaway content
- "pending" when unsure

Heuristics (advice, not rules):
- Under 2 minutes with no structure usually means QUICK_NOTE
- Step-by-step instructions ("first", "click", "next") suggest TUTORIAL
- Several speakers discussing agenda items suggest MEETING
- Error messages, stack traces, or "it's broken" suggest TROUBLESHOOTING
- Mentions of code, deploys, or APIs suggest TECH; pricing or prospects suggest SALES

Respond with ONLY a JSON object, no prose and no code fences:
{{"content_type": {{"primary": "NAME", "confidence": 0.0, "secondary": "NAME or null"}}, "department": {{"label": "NAME or null", "confidence": 0.0}}, "rag_eligibility": "eligible|excluded|pending", "reasoning": "one sentence"}}

Confidence is a number between 0 and 1."#,
        content_types = describe(&vocabulary.content_types),
        departments = describe(&vocabulary.departments),
    )
}

/// User prompt carrying the context and the (already truncated) transcript.
pub fn build_user_prompt(context: &ClassificationContext, transcript: &str) -> String {
    let mut prompt = String::new();
    if let Some(title) = &context.title {
        prompt.push_str(&format!("Title: {}\n", title));
    }
    if let Some(duration) = context.duration_seconds {
        prompt.push_str(&format!("Duration: {:.0} seconds\n", duration));
    }
    if let Some(summary) = &context.ai_summary {
        prompt.push_str(&format!("Summary: {}\n", summary));
    }
    if !context.shared_space_names.is_empty() {
        prompt.push_str(&format!(
            "Shared in: {}\n",
            context.shared_space_names.join(", ")
        ));
    }
    prompt.push_str("\nTranscript:\n");
    prompt.push_str(transcript);
    prompt
}

/// Classifies transcripts and records the verdict on the video.
#[derive(Clone)]
pub struct Classifier {
    oracle: Option<Arc<dyn GenerationBackend>>,
    videos: Arc<dyn VideoRepository>,
    vocabulary: Arc<LabelVocabulary>,
    config: EngineConfig,
}

impl Classifier {
    pub fn new(
        oracle: Option<Arc<dyn GenerationBackend>>,
        videos: Arc<dyn VideoRepository>,
        vocabulary: Arc<LabelVocabulary>,
        config: EngineConfig,
    ) -> Self {
        Self {
            oracle,
            videos,
            vocabulary,
            config,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.oracle.is_some()
    }

    /// Classify a transcript and persist the verdict.
    ///
    /// Precondition: the video's transcription is complete. Fails with
    /// `Config` when no oracle is configured. Oracle and parse failures come
    /// back as a result with `failure` set and nothing written.
    pub async fn classify(
        &self,
        video_id: Uuid,
        transcript: &str,
        context: &ClassificationContext,
        actor_id: Uuid,
    ) -> Result<ClassificationResult> {
        let oracle = self.oracle.as_ref().ok_or_else(|| {
            Error::Config("No classification oracle configured".to_string())
        })?;

        let start = Instant::now();
        let transcript = truncate_chars(transcript, self.config.transcript_max_chars);
        let system = build_system_prompt(&self.vocabulary);
        let prompt = build_user_prompt(context, transcript);

        debug!(
            subsystem = "jobs",
            component = "classifier",
            %video_id,
            prompt_len = prompt.len(),
            model = oracle.model_name(),
            "Requesting classification"
        );

        let reply = match oracle.generate_with_system(&system, &prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(
                    subsystem = "jobs",
                    component = "classifier",
                    %video_id,
                    error = %e,
                    "Oracle call failed"
                );
                return Ok(ClassificationResult::failed(
                    video_id,
                    FailureKind::Upstream,
                    e.to_string(),
                ));
            }
        };

        let (suggestions, rag_eligibility, reasoning) =
            match parse_verdict(&reply, self.config.secondary_discount) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(
                        subsystem = "jobs",
                        component = "classifier",
                        %video_id,
                        response_len = reply.len(),
                        error = %e,
                        "Unusable oracle reply"
                    );
                    return Ok(ClassificationResult::failed(
                        video_id,
                        FailureKind::Parse,
                        e.to_string(),
                    ));
                }
            };

        self.videos
            .save_classification(
                video_id,
                ClassificationWrite {
                    suggestions: suggestions.clone(),
                    rag_status: rag_eligibility,
                    classified_at: Utc::now(),
                    actor_id,
                },
            )
            .await?;

        info!(
            subsystem = "jobs",
            component = "classifier",
            %video_id,
            result_count = suggestions.len(),
            rag = %rag_eligibility,
            duration_ms = start.elapsed().as_millis() as u64,
            "Video classified"
        );

        Ok(ClassificationResult {
            video_id,
            suggestions,
            rag_eligibility,
            reasoning,
            failure: None,
        })
    }
}
