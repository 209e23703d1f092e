//! Core note record.
//!
//! A note is produced by the reconciler from free-text input and is the
//! unit the alert scheduler reads when it rebuilds its registry.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a single note in our system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier, assigned once
    pub id: String,
    /// Display summary
    pub content: String,
    /// Last raw user input that produced or updated the note
    pub raw_content: String,
    /// Tags for organization
    #[serde(default)]
    pub tags: Vec<String>,
    /// When the note was created
    pub created_at: DateTime<Utc>,
    /// Whether the note describes an event
    #[serde(default)]
    pub has_schedule: bool,
    /// Event start, only meaningful when `has_schedule` is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_date: Option<DateTime<Utc>>,
    /// Opaque attachment reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_done: bool,
}

impl Note {
    /// Creates a new, not-done note with a freshly generated id
    pub fn new(
        content: String,
        raw_content: String,
        tags: Vec<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Note {
            id: Uuid::new_v4().to_string(),
            content,
            raw_content,
            tags,
            created_at,
            has_schedule: false,
            schedule_date: None,
            image_url: None,
            is_done: false,
        }
    }

    /// Returns the schedule date only when the note is flagged as scheduled.
    ///
    /// A note may carry `has_schedule = true` without a date; such a note is
    /// treated as unscheduled for alerting.
    pub fn effective_schedule(&self) -> Option<DateTime<Utc>> {
        if self.has_schedule {
            self.schedule_date
        } else {
            None
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}
