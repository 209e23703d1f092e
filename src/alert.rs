//! User-visible alerts for scheduled notes.
use std::sync::Mutex;

use console::{style, Term};
use log::{debug, warn};

use crate::Note;

/// Title shown on every alert.
pub const ALERT_TITLE: &str = "TIMELINE ALERT";

/// Whether the user allows alerts to be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Permission {
    Granted,
    Denied,
    /// Not asked yet.
    #[default]
    Default,
}

/// Displays a one-shot alert for a note.
///
/// `show` is fire-and-forget; the scheduler checks [`AlertSink::permission`]
/// before calling it.
pub trait AlertSink: Send + Sync {
    /// Asks for permission if it has not been decided yet and returns the outcome.
    fn request_permission(&self) -> Permission;

    fn permission(&self) -> Permission;

    fn show(&self, note: &Note);
}

/// Renders alerts on the controlling terminal.
pub struct ConsoleAlertSink {
    enabled: bool,
    permission: Mutex<Permission>,
}

impl ConsoleAlertSink {
    /// `enabled` is the user's `notifications` setting; it decides what a
    /// permission request resolves to.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            permission: Mutex::new(Permission::Default),
        }
    }

    fn render(note: &Note) -> String {
        let width = terminal_size::terminal_size()
            .map(|(w, _)| w.0 as usize)
            .unwrap_or(80)
            .min(60);
        let rule = "=".repeat(width);
        format!(
            "{}\n{}\n{}\n\n{}\n{}",
            rule,
            style(ALERT_TITLE).bold().red(),
            note.content,
            style("DO IT NOW.").bold(),
            rule
        )
    }
}

impl AlertSink for ConsoleAlertSink {
    fn request_permission(&self) -> Permission {
        match self.permission.lock() {
            Ok(mut permission) => {
                if *permission == Permission::Default {
                    *permission = if self.enabled {
                        Permission::Granted
                    } else {
                        Permission::Denied
                    };
                    debug!("Alert permission resolved to {:?}", *permission);
                }
                *permission
            }
            Err(e) => {
                warn!("Failed to acquire permission lock: {}", e);
                Permission::Denied
            }
        }
    }

    fn permission(&self) -> Permission {
        self.permission
            .lock()
            .map(|p| *p)
            .unwrap_or(Permission::Denied)
    }

    fn show(&self, note: &Note) {
        let term = Term::stderr();
        if let Err(e) = term.write_line(&Self::render(note)) {
            warn!("Failed to display alert for note {}: {}", note.id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn permission_resolves_once_from_setting() {
        let sink = ConsoleAlertSink::new(true);
        assert_eq!(sink.permission(), Permission::Default);
        assert_eq!(sink.request_permission(), Permission::Granted);
        assert_eq!(sink.permission(), Permission::Granted);

        let muted = ConsoleAlertSink::new(false);
        assert_eq!(muted.request_permission(), Permission::Denied);
        assert_eq!(muted.request_permission(), Permission::Denied);
    }

    #[test]
    fn rendered_alert_carries_content() {
        let note = Note::new("Dentist".into(), "dentist".into(), vec![], Utc::now());
        let text = ConsoleAlertSink::render(&note);
        assert!(text.contains("TIMELINE ALERT"));
        assert!(text.contains("Dentist"));
        assert!(text.contains("DO IT NOW."));
    }
}
