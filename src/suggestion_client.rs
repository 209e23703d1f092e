//! Typed HTTP client for the note-understanding service.
//!
//! Speaks the `/api/ai/parse` and `/api/ai/analyze` JSON contract. Every
//! failure (transport, status, body) is reported as
//! [`NoteError::SuggestionUnavailable`] so the reconciler can fall back.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{Note, NoteError, Result, Suggestion, SuggestionAction, SuggestionSource};

/// Returned by `analyze` when there is nothing to look at.
pub const EMPTY_ANALYSIS: &str = "No data to analyze. Write something first.";
/// Returned by `analyze` when the service call fails.
pub const FAILED_ANALYSIS: &str = "SYSTEM ERROR. COULD NOT JUDGE YOU.";

pub struct HttpSuggestionSource {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

// ── Wire types ──────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseRequest<'a> {
    pub text: &'a str,
    pub existing_notes: Vec<NoteContext<'a>>,
    pub timezone: &'a str,
}

/// The slice of a note the service needs to resolve update targets.
#[derive(Debug, Serialize)]
pub struct NoteContext<'a> {
    pub id: &'a str,
    pub content: &'a str,
    pub schedule: String,
}

impl<'a> From<&'a Note> for NoteContext<'a> {
    fn from(note: &'a Note) -> Self {
        Self {
            id: &note.id,
            content: &note.content,
            schedule: note
                .schedule_date
                .map(|d| d.to_rfc3339())
                .unwrap_or_else(|| "none".to_string()),
        }
    }
}

/// Response body as sent by the service; every field may be missing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResponse {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub schedule_date: Option<String>,
    #[serde(default)]
    pub is_event: Option<bool>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub target_id: Option<String>,
}

impl ParseResponse {
    /// Fills gaps the way the service's own clients do: empty summary falls
    /// back to the raw text, unknown action means CREATE.
    pub fn into_suggestion(self, raw_text: &str) -> Suggestion {
        let summary = self
            .summary
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| raw_text.to_string());

        let mut tags: Vec<String> = Vec::new();
        for tag in self.tags.unwrap_or_default() {
            let tag = tag.trim().trim_start_matches('#');
            if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }

        let schedule_date = self.schedule_date.as_deref().and_then(parse_schedule_date);

        let action = match self.action.as_deref() {
            Some(a) if a.eq_ignore_ascii_case("UPDATE") => SuggestionAction::Update,
            _ => SuggestionAction::Create,
        };

        Suggestion {
            summary,
            tags,
            schedule_date,
            is_event: self.is_event.unwrap_or(false),
            action,
            target_id: self.target_id.filter(|id| !id.trim().is_empty()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest {
    notes_summary: String,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    #[serde(default)]
    text: Option<String>,
}

/// Parses an ISO-8601 date as sent by the service.
///
/// Offsets are honoured; a date without an offset is read as UTC.
pub fn parse_schedule_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("null") {
        return None;
    }
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    warn!("Ignoring unparseable schedule date from suggestion: {}", value);
    None
}

/// One line per note, in the shape the analysis prompt expects.
pub fn notes_summary(notes: &[Note]) -> String {
    notes
        .iter()
        .map(|n| {
            format!(
                "- [{}] {} ({})",
                n.tags.join(", "),
                n.content,
                if n.is_done { "COMPLETED" } else { "PENDING" }
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Client impl ─────────────────────────────────────

impl HttpSuggestionSource {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            timeout,
        }
    }

    async fn post_parse(&self, body: &ParseRequest<'_>) -> Result<ParseResponse> {
        let resp = self
            .client
            .post(format!("{}/api/ai/parse", self.base_url))
            .json(body)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NoteError::SuggestionUnavailable {
                message: format!("parse HTTP {}: {}", status.as_u16(), body),
            });
        }

        Ok(resp.json::<ParseResponse>().await?)
    }

    /// Asks the service for a short productivity read-out over the notes.
    ///
    /// Never fails; a broken call yields [`FAILED_ANALYSIS`].
    pub async fn analyze(&self, notes: &[Note]) -> String {
        if notes.is_empty() {
            return EMPTY_ANALYSIS.to_string();
        }

        let body = AnalyzeRequest {
            notes_summary: notes_summary(notes),
        };

        let result = async {
            let resp = self
                .client
                .post(format!("{}/api/ai/analyze", self.base_url))
                .json(&body)
                .timeout(self.timeout)
                .send()
                .await?
                .error_for_status()?;
            resp.json::<AnalyzeResponse>().await
        }
        .await;

        match result {
            Ok(AnalyzeResponse { text: Some(text) }) if !text.trim().is_empty() => text,
            Ok(_) => FAILED_ANALYSIS.to_string(),
            Err(e) => {
                warn!("Analysis request failed: {}", e);
                FAILED_ANALYSIS.to_string()
            }
        }
    }
}

#[async_trait]
impl SuggestionSource for HttpSuggestionSource {
    async fn suggest(&self, text: &str, existing: &[Note], timezone: &str) -> Result<Suggestion> {
        let body = ParseRequest {
            text,
            existing_notes: existing.iter().map(NoteContext::from).collect(),
            timezone,
        };

        debug!(
            "Requesting suggestion for {} chars with {} notes of context",
            text.len(),
            body.existing_notes.len()
        );

        let response = self.post_parse(&body).await.map_err(|e| match e {
            NoteError::SuggestionUnavailable { .. } => e,
            other => NoteError::SuggestionUnavailable {
                message: other.to_string(),
            },
        })?;

        Ok(response.into_suggestion(text))
    }
}
