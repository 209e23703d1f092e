//! Note capture with structured suggestions and one-shot alerts.
//!
//! This library turns free-text input into notes (creating new ones or
//! updating the note the input refers to) and keeps a registry of pending
//! alerts in step with the note collection.

mod alert;
mod alert_scheduler;
mod cli;
mod clock;
mod config;
mod errors;
mod helper;
mod note;
mod notebook;
mod reconciler;
mod storage;
mod suggestion;
mod suggestion_client;
mod types;

// Re-export key components
pub use alert::*;
pub use alert_scheduler::*;
pub use cli::*;
pub use clock::*;
pub use config::*;
pub use errors::*;
pub use helper::*;
pub use note::*;
pub use notebook::*;
pub use reconciler::*;
pub use storage::*;
pub use suggestion::*;
pub use suggestion_client::*;
pub use types::*;
