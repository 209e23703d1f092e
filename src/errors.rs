//! Error types for the timenotes application.
//!
//! This module defines the error type shared by the note store, the
//! suggestion client, configuration handling and the CLI. The reconciliation
//! and alert scheduling core recovers from its own failures locally, so most
//! of these only surface from I/O at the edges.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for the timenotes application.
#[derive(Error, Debug)]
pub enum NoteError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Transport-level HTTP failures.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The text-understanding service could not produce a suggestion.
    #[error("Suggestion service unavailable: {message}")]
    SuggestionUnavailable { message: String },

    /// Note was not found when performing an operation.
    #[error("Note not found: {id}")]
    NoteNotFound { id: String },

    /// Invalid note format or content.
    #[error("Invalid note format: {message}")]
    InvalidFormat { message: String },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Directory creation or access failed.
    #[error("Failed to create or access directory: {path}")]
    DirectoryError { path: PathBuf },

    #[error("{message}")]
    EditorError { message: String },

    /// Generic application error with a custom message.
    #[error("{message}")]
    ApplicationError { message: String },
}
