//! Structured suggestions produced from raw note input.
//!
//! A [`Suggestion`] is what the text-understanding service returns for one
//! piece of user input. It is consumed once by the reconciler and never
//! stored. When the service cannot be reached the reconciler builds one
//! locally with [`fallback_suggestion`].
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Note, Result};

static HASHTAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#([A-Za-z0-9_]+)").expect("valid hashtag regex"));

/// Summary used for input that is only an attachment.
pub const IMAGE_SUMMARY: &str = "Image Attachment";
/// Tag given to input that is only an attachment.
pub const IMAGE_TAG: &str = "image";

/// Whether the input should become a new note or rewrite an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SuggestionAction {
    #[default]
    Create,
    Update,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub summary: String,
    /// Empty means "no opinion", never "clear the tags".
    pub tags: Vec<String>,
    pub schedule_date: Option<DateTime<Utc>>,
    pub is_event: bool,
    pub action: SuggestionAction,
    pub target_id: Option<String>,
}

impl Suggestion {
    /// A plain CREATE suggestion with no schedule.
    pub fn create(summary: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            summary: summary.into(),
            tags,
            schedule_date: None,
            is_event: false,
            action: SuggestionAction::Create,
            target_id: None,
        }
    }
}

/// Something that can turn raw text into a [`Suggestion`].
///
/// Implementations may fail for any reason; callers are expected to recover
/// with [`fallback_suggestion`].
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    async fn suggest(&self, text: &str, existing: &[Note], timezone: &str) -> Result<Suggestion>;
}

/// Deterministic local parse used when the suggestion service fails.
pub fn fallback_suggestion(raw_text: &str) -> Suggestion {
    Suggestion::create(raw_text, extract_hashtags(raw_text))
}

/// Suggestion for input that carries an image but no text.
pub fn image_suggestion() -> Suggestion {
    Suggestion::create(IMAGE_SUMMARY, vec![IMAGE_TAG.to_string()])
}

/// Collects `#token` markers from text, without the leading `#`.
///
/// Duplicates are dropped, first occurrence wins.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for cap in HASHTAG_RE.captures_iter(text) {
        let tag = &cap[1];
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_extracts_hashtags_and_creates() {
        let suggestion = fallback_suggestion("call #mom tomorrow");
        assert_eq!(suggestion.summary, "call #mom tomorrow");
        assert_eq!(suggestion.tags, vec!["mom".to_string()]);
        assert_eq!(suggestion.schedule_date, None);
        assert!(!suggestion.is_event);
        assert_eq!(suggestion.action, SuggestionAction::Create);
        assert_eq!(suggestion.target_id, None);
    }

    #[test]
    fn hashtags_stop_at_punctuation_and_dedupe() {
        let tags = extract_hashtags("#work, #work_stuff and #work! also # alone");
        assert_eq!(tags, vec!["work".to_string(), "work_stuff".to_string()]);
    }

    #[test]
    fn no_hashtags_gives_empty_tags() {
        assert!(extract_hashtags("plain text").is_empty());
    }

    #[test]
    fn image_suggestion_is_fixed() {
        let suggestion = image_suggestion();
        assert_eq!(suggestion.summary, "Image Attachment");
        assert_eq!(suggestion.tags, vec!["image".to_string()]);
        assert_eq!(suggestion.action, SuggestionAction::Create);
    }

    #[test]
    fn action_uses_uppercase_wire_names() {
        let action: SuggestionAction = serde_json::from_str("\"UPDATE\"").unwrap();
        assert_eq!(action, SuggestionAction::Update);
        assert_eq!(
            serde_json::to_string(&SuggestionAction::Create).unwrap(),
            "\"CREATE\""
        );
    }
}
