use std::{fs, path::{Path, PathBuf}};

use directories::ProjectDirs;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use which::which;

use crate::{NoteError, Result};

const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// JSON file holding the note collection
    pub notes_file: PathBuf,

    /// Base URL of the note-understanding service; the local parse is used when unset
    pub suggestion_endpoint: Option<String>,

    /// Timeout for a single suggestion request, in seconds
    pub request_timeout_secs: u64,

    /// Timezone name sent along with each suggestion request
    pub timezone: String,

    /// Whether alerts may be shown
    pub notifications: bool,

    /// Default editor command
    pub editor_command: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            notes_file: default_data_dir().join("notes.json"),
            suggestion_endpoint: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            timezone: std::env::var("TZ")
                .ok()
                .filter(|tz| !tz.trim().is_empty())
                .unwrap_or_else(|| "UTC".to_string()),
            notifications: true,
            editor_command: None,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "timenotes")
}

fn default_data_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

impl Config {
    /// Where the config file lives when `--config` is not given.
    pub fn default_path() -> PathBuf {
        project_dirs()
            .map(|dirs| dirs.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("timenotes.json"))
    }

    /// Reads the config file, or returns defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content).map_err(|e| NoteError::ConfigError {
            message: format!("{}: {}", path.display(), e),
        })?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|_| NoteError::DirectoryError {
                    path: parent.to_path_buf(),
                })?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Applies a single `key=value` setting.
    pub fn set(&mut self, assignment: &str) -> Result<()> {
        let (key, value) = assignment.split_once('=').ok_or_else(|| NoteError::ConfigError {
            message: format!("Expected key=value, got '{}'", assignment),
        })?;
        let (key, value) = (key.trim(), value.trim());
        let optional = |v: &str| (!v.is_empty()).then(|| v.to_string());

        match key {
            "notes_file" => self.notes_file = PathBuf::from(value),
            "suggestion_endpoint" => self.suggestion_endpoint = optional(value),
            "request_timeout_secs" => {
                self.request_timeout_secs = value.parse().map_err(|_| NoteError::ConfigError {
                    message: format!("request_timeout_secs must be a number, got '{}'", value),
                })?
            }
            "timezone" => self.timezone = value.to_string(),
            "notifications" => {
                self.notifications = value.parse().map_err(|_| NoteError::ConfigError {
                    message: format!("notifications must be true or false, got '{}'", value),
                })?
            }
            "editor_command" => self.editor_command = optional(value),
            other => {
                return Err(NoteError::ConfigError {
                    message: format!("Unknown setting '{}'", other),
                })
            }
        }
        Ok(())
    }

    // This method provides smart fallbacks when no editor is configured
    pub fn get_editor_command(&self) -> String {
        if let Some(editor) = &self.editor_command {
            return editor.clone();
        }

        if let Ok(editor) = std::env::var("EDITOR") {
            return editor;
        }

        if cfg!(windows) {
            "notepad".to_string()
        } else if cfg!(target_os = "macos") {
            "open -t".to_string()
        } else {
            for editor in &["nano", "vim", "vi", "emacs"] {
                if which(editor).is_ok() {
                    return editor.to_string();
                }
            }
            "nano".to_string()
        }
    }
}
