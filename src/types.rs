//! Shared result, view and command types.
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Subcommand;

use crate::{Note, NoteError};

/// A specialized Result type for timenotes operations.
pub type Result<T> = std::result::Result<T, NoteError>;

/// One line of the schedule view
#[derive(Debug, Clone)]
pub struct ScheduleEntry {
    pub note: Note,
    /// When the event starts
    pub date: DateTime<Utc>,
    /// Whether the date is already behind us
    pub is_past: bool,
    /// Whether an alert is currently armed for the note
    pub alert_armed: bool,
}

/// Counts over the whole collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteStats {
    pub total: usize,
    pub scheduled: usize,
    pub done: usize,
    pub active: usize,
    /// Most used tags with their counts, most frequent first
    pub top_tags: Vec<(String, usize)>,
}

/// Available subcommands for the timenotes application
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record a thought; it may create a new note or update an existing one
    Add {
        /// Free text, e.g. "dentist friday 3pm #health" or "move dentist to monday"
        text: Vec<String>,

        /// Attach an image reference (path or URL)
        #[clap(short, long)]
        image: Option<String>,
    },

    /// List notes, newest first
    List {
        /// Filter notes by tag
        #[clap(short, long)]
        tag: Option<String>,

        /// Limit the number of notes returned
        #[clap(short = 'n', long, default_value_t = 20)]
        limit: usize,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// List every tag in use
    Tags,

    /// Show scheduled notes in date order
    Schedule,

    /// Toggle a note between done and pending
    Done {
        /// ID of the note
        id: String,
    },

    /// Edit an existing note
    Edit {
        /// ID of the note to edit
        id: String,

        /// New content for the note
        #[clap(short, long)]
        content: Option<String>,

        /// Open content in editor before saving
        #[clap(short, long)]
        editor: bool,

        /// Replace tags (comma-separated)
        #[clap(short = 't', long)]
        tags: Option<String>,

        /// New schedule date (RFC 3339)
        #[clap(short, long, conflicts_with = "no_schedule")]
        schedule: Option<String>,

        /// Remove the schedule
        #[clap(long)]
        no_schedule: bool,

        /// Replace the attached image reference
        #[clap(short, long)]
        image: Option<String>,

        /// Path to a file containing the new content
        #[clap(short, long)]
        file: Option<PathBuf>,
    },

    /// Delete a note by ID
    Delete {
        /// ID of the note to delete
        id: String,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// Show counts and the most used tags
    Stats,

    /// Ask the note-understanding service for a read-out of your notes
    Analyze,

    /// Stay running and deliver alerts as they come due
    Watch,

    /// Configuration management
    Config {
        /// Show current configuration
        #[clap(short = 'S', long)]
        show: bool,

        /// Update a configuration setting (key=value)
        #[clap(short, long)]
        set: Option<String>,

        /// Reset configuration to defaults
        #[clap(short, long)]
        reset: bool,
    },
}
