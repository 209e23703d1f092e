use std::path::Path;

use chrono::{DateTime, Utc};
use log::trace;
use notify::EventKind;

use crate::{parse_schedule_date, NoteError, Result};

/// Whether a filesystem event means the notes file may have new contents.
pub fn touches_notes_file(event: &notify::Event, notes_file: &Path) -> bool {
    let relevant_kind = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    );
    if !relevant_kind {
        return false;
    }
    // Atomic saves rename a temp file over the target, so compare file names
    // rather than full paths.
    let hit = event
        .paths
        .iter()
        .any(|p| p == notes_file || p.file_name() == notes_file.file_name());
    trace!("fs event {:?} relevant: {}", event.kind, hit);
    hit
}

// Helper method for parsing tags
pub fn parse_tags(tags: Option<String>) -> Vec<String> {
    tags.map(|t| {
        t.split(',')
            .map(|s| s.trim().trim_start_matches('#').to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

/// Parses a user-supplied schedule date for manual edits.
pub fn parse_schedule_arg(value: &str) -> Result<DateTime<Utc>> {
    parse_schedule_date(value).ok_or_else(|| NoteError::InvalidFormat {
        message: format!("Not a valid date: '{}' (expected e.g. 2025-01-17T15:00:00Z)", value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind};
    use std::path::PathBuf;

    #[test]
    fn tags_are_split_and_trimmed() {
        assert_eq!(
            parse_tags(Some(" work, #home ,, ".into())),
            vec!["work".to_string(), "home".to_string()]
        );
        assert!(parse_tags(None).is_empty());
    }

    #[test]
    fn only_notes_file_events_count() {
        let notes = PathBuf::from("/data/notes.json");
        let hit = notify::Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(PathBuf::from("/data/notes.json"));
        let other = notify::Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/data/.tmpX1y2"));
        let access = notify::Event::new(EventKind::Access(notify::event::AccessKind::Any))
            .add_path(PathBuf::from("/data/notes.json"));

        assert!(touches_notes_file(&hit, &notes));
        assert!(!touches_notes_file(&other, &notes));
        assert!(!touches_notes_file(&access, &notes));
    }

    #[test]
    fn bad_schedule_argument_is_rejected() {
        assert!(parse_schedule_arg("2025-01-17T15:00:00Z").is_ok());
        assert!(matches!(
            parse_schedule_arg("tomorrow"),
            Err(NoteError::InvalidFormat { .. })
        ));
    }
}
