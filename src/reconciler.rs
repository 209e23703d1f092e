//! Turns one piece of user input into a single create-or-update mutation.
//!
//! The reconciler never commits anything: it looks at the existing notes,
//! decides whether the input names one of them, and hands back a
//! [`Mutation`] for the caller to apply.
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use crate::{
    fallback_suggestion, image_suggestion, Note, NoteError, Result, Suggestion, SuggestionAction,
    SuggestionSource,
};

/// A create-or-update instruction against the note collection, not yet committed.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Create(Note),
    Update(Note),
}

impl Mutation {
    pub fn note(&self) -> &Note {
        match self {
            Mutation::Create(note) | Mutation::Update(note) => note,
        }
    }

    pub fn into_note(self) -> Note {
        match self {
            Mutation::Create(note) | Mutation::Update(note) => note,
        }
    }

    pub fn is_create(&self) -> bool {
        matches!(self, Mutation::Create(_))
    }
}

/// Result of processing one input.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub mutation: Mutation,
    /// Set when the suggestion service failed and the local parse was used.
    pub used_fallback: bool,
}

/// Builds the mutation for `raw_text` from an already obtained suggestion.
///
/// An UPDATE whose target is missing from `existing` degrades to a CREATE so
/// the input is never dropped.
pub fn reconcile(
    raw_text: &str,
    image: Option<&str>,
    suggestion: Suggestion,
    existing: &[Note],
    now: DateTime<Utc>,
) -> Mutation {
    if suggestion.action == SuggestionAction::Update {
        let target = suggestion
            .target_id
            .as_deref()
            .and_then(|id| existing.iter().find(|n| n.id == id));

        match target {
            Some(note) => return Mutation::Update(merge_into(note, raw_text, suggestion)),
            None => warn!(
                "Update target {:?} not found among {} notes, creating instead",
                suggestion.target_id,
                existing.len()
            ),
        }
    }

    Mutation::Create(new_note(raw_text, image, suggestion, now))
}

fn merge_into(existing: &Note, raw_text: &str, suggestion: Suggestion) -> Note {
    let mut note = existing.clone();
    note.content = suggestion.summary;
    // Empty suggestion tags carry no information; they never clear a note's tags.
    if !suggestion.tags.is_empty() {
        note.tags = suggestion.tags;
    }
    note.has_schedule = suggestion.is_event;
    note.schedule_date = if suggestion.is_event {
        suggestion.schedule_date
    } else {
        None
    };
    note.raw_content = raw_text.to_string();
    note
}

fn new_note(
    raw_text: &str,
    image: Option<&str>,
    suggestion: Suggestion,
    now: DateTime<Utc>,
) -> Note {
    let mut note = Note::new(
        suggestion.summary,
        raw_text.to_string(),
        suggestion.tags,
        now,
    );
    note.has_schedule = suggestion.is_event;
    if suggestion.is_event {
        note.schedule_date = suggestion.schedule_date;
    }
    note.image_url = image.map(str::to_string);
    note
}

/// Drives a [`SuggestionSource`] and recovers from its failures.
pub struct Reconciler {
    source: Option<Arc<dyn SuggestionSource>>,
    timezone: String,
}

impl Reconciler {
    pub fn new(source: Option<Arc<dyn SuggestionSource>>, timezone: impl Into<String>) -> Self {
        Self {
            source,
            timezone: timezone.into(),
        }
    }

    /// Produces the mutation for one input.
    ///
    /// Only empty input without an attachment is rejected; a failing
    /// suggestion source falls back to the local parse.
    pub async fn process(
        &self,
        raw_text: &str,
        image: Option<&str>,
        existing: &[Note],
        now: DateTime<Utc>,
    ) -> Result<Reconciliation> {
        let text_empty = raw_text.trim().is_empty();
        if text_empty && image.is_none() {
            return Err(NoteError::InvalidFormat {
                message: "Nothing to record: input is empty".to_string(),
            });
        }

        let (suggestion, used_fallback) = if text_empty {
            debug!("Image-only input, skipping suggestion service");
            (image_suggestion(), false)
        } else {
            self.suggest_or_fallback(raw_text, existing).await
        };

        let mutation = reconcile(raw_text, image, suggestion, existing, now);
        info!(
            "Reconciled input into {} of note {}",
            if mutation.is_create() { "create" } else { "update" },
            mutation.note().id
        );

        Ok(Reconciliation {
            mutation,
            used_fallback,
        })
    }

    async fn suggest_or_fallback(&self, raw_text: &str, existing: &[Note]) -> (Suggestion, bool) {
        let Some(source) = &self.source else {
            debug!("No suggestion source configured, using local parse");
            return (fallback_suggestion(raw_text), true);
        };

        match source.suggest(raw_text, existing, &self.timezone).await {
            Ok(suggestion) => (suggestion, false),
            Err(e) => {
                warn!("Suggestion service failed, using local parse: {}", e);
                (fallback_suggestion(raw_text), true)
            }
        }
    }
}
