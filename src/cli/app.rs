//! CLI module for the timenotes application
//!
//! This module handles the command-line interface for interacting with the
//! notebook: capturing input, browsing notes and the schedule, and running
//! the long-lived `watch` loop that delivers alerts.
use std::{
    fs::{read_to_string, OpenOptions},
    io::{stdin, stdout, Write},
    path::{Path, PathBuf},
    process::Command,
    sync::Arc,
    time::Duration,
};

use console::style;
use log::{debug, info, warn};
use notify::{RecursiveMode, Watcher};
use shell_words::split;
use tempfile::Builder;
use tokio::sync::mpsc;

use crate::{
    parse_schedule_arg, parse_tags, touches_notes_file, AlertScheduler, AlertSink, Clock, Commands,
    Config, ConsoleAlertSink, HttpSuggestionSource, JsonNoteStore, Mutation, Note, NoteError,
    Notebook, Permission, Reconciler, Result, SuggestionSource, SystemClock,
};

/// Marker line in the editor template; it and everything above it is dropped.
const EDITOR_MARKER: &str = "<!-- Edit your note below this line -->";

/// CLI Application handler - processes CLI commands and interfaces with the Notebook
pub struct App {
    /// The note collection with its alert scheduler
    notebook: Notebook,

    /// Application configuration
    config: Config,

    /// Client for the note-understanding service, when one is configured
    client: Option<Arc<HttpSuggestionSource>>,

    /// Whether to display verbose output
    verbose: bool,
}

impl App {
    /// Wire up store, suggestion client, alert sink and scheduler from `config`.
    pub fn new(config: Config, verbose: bool) -> Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let sink = Arc::new(ConsoleAlertSink::new(config.notifications));
        if sink.request_permission() != Permission::Granted {
            info!("Alerts are disabled; scheduled notes will fire silently");
        }

        let client = config.suggestion_endpoint.as_deref().map(|endpoint| {
            Arc::new(HttpSuggestionSource::new(
                endpoint,
                Duration::from_secs(config.request_timeout_secs),
            ))
        });
        let source = client.clone().map(|c| c as Arc<dyn SuggestionSource>);

        let reconciler = Reconciler::new(source, config.timezone.clone());
        let scheduler = AlertScheduler::new(Arc::clone(&clock), sink as Arc<dyn AlertSink>);
        let store = Arc::new(JsonNoteStore::new(config.notes_file.clone()));
        let notebook = Notebook::open(store, reconciler, scheduler, clock)?;

        Ok(Self {
            notebook,
            config,
            client,
            verbose,
        })
    }

    /// Run the CLI application with the given command
    pub async fn run(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Add { text, image } => self.handle_add(text.join(" "), image).await?,

            Commands::List { tag, limit, json } => self.list_notes(tag, limit, json)?,

            Commands::Tags => {
                for tag in self.notebook.all_tags() {
                    println!("#{}", tag);
                }
            }

            Commands::Schedule => self.show_schedule(),

            Commands::Done { id } => {
                let done = self.notebook.toggle_done(&id)?;
                println!(
                    "Note {} is now {}",
                    id,
                    if done { "DONE" } else { "PENDING" }
                );
            }

            Commands::Edit {
                id,
                content,
                editor,
                tags,
                schedule,
                no_schedule,
                image,
                file,
            } => {
                self.handle_edit(id, content, editor, tags, schedule, no_schedule, image, file)?
            }

            Commands::Delete { id, force } => self.handle_delete(id, force)?,

            Commands::Stats => self.show_stats(),

            Commands::Analyze => self.handle_analyze().await,

            Commands::Watch => self.watch().await?,

            Commands::Config { .. } => {
                return Err(NoteError::ApplicationError {
                    message: "config is handled before the notebook is opened".to_string(),
                })
            }
        }

        Ok(())
    }

    async fn handle_add(&mut self, text: String, image: Option<String>) -> Result<()> {
        let outcome = self.notebook.submit(&text, image.as_deref()).await?;

        if outcome.used_fallback && self.client.is_some() {
            println!(
                "{}",
                style("Suggestion service unreachable; saved with a plain parse.").yellow()
            );
        }

        let (verb, note) = match &outcome.mutation {
            Mutation::Create(note) => ("CREATED", note),
            Mutation::Update(note) => ("UPDATED", note),
        };
        println!("{}: {} ({})", style(verb).bold(), note.content, note.id);

        if let Some(date) = note.effective_schedule() {
            if self.notebook.scheduler().is_pending(&note.id) {
                println!("Alert armed for {} (delivered while `watch` runs)", date.to_rfc3339());
            } else {
                println!("Scheduled for {} (no alert)", date.to_rfc3339());
            }
        }
        Ok(())
    }

    /// List notes according to provided filters and options
    fn list_notes(&self, tag: Option<String>, limit: usize, json: bool) -> Result<()> {
        let mut notes: Vec<&Note> = match &tag {
            Some(tag) => self.notebook.notes_with_tag(tag.trim_start_matches('#')),
            None => self.notebook.notes().iter().collect(),
        };
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notes.truncate(limit);

        if notes.is_empty() {
            println!("No notes found matching the criteria.");
            return Ok(());
        }

        if json {
            println!("{}", serde_json::to_string_pretty(&notes)?);
            return Ok(());
        }

        let term_width = terminal_size::terminal_size()
            .map(|(w, _)| w.0 as usize)
            .unwrap_or(80);

        for (i, note) in notes.iter().enumerate() {
            if i > 0 {
                println!("{}", "-".repeat(term_width.min(50)));
            }
            self.print_note(note);
        }

        println!(
            "\nFound {} note{}",
            notes.len(),
            if notes.len() == 1 { "" } else { "s" }
        );
        Ok(())
    }

    fn print_note(&self, note: &Note) {
        let marker = if note.is_done { "[x]" } else { "[ ]" };
        let content = if note.is_done {
            style(&note.content).strikethrough()
        } else {
            style(&note.content).bold()
        };
        println!("{} {}", marker, content);
        println!(
            "    ID: {} | Created: {}",
            note.id,
            note.created_at.format("%Y-%m-%d %H:%M")
        );
        if !note.tags.is_empty() {
            let tags: Vec<String> = note.tags.iter().map(|t| format!("#{}", t)).collect();
            println!("    {}", style(tags.join(" ")).cyan());
        }
        if let Some(date) = note.effective_schedule() {
            println!("    When: {}", date.format("%a %b %d %H:%M"));
        }
        if let Some(image) = &note.image_url {
            println!("    Image: {}", image);
        }
        if self.verbose && note.raw_content != note.content {
            println!("    Raw: {}", note.raw_content);
        }
    }

    fn show_schedule(&self) {
        let entries = self.notebook.schedule_view();
        if entries.is_empty() {
            println!("Nothing scheduled.");
            return;
        }

        for entry in entries {
            let when = entry.date.format("%a %b %d  %H:%M").to_string();
            let state = if entry.note.is_done {
                style("done").green()
            } else if entry.is_past {
                style("past").dim()
            } else if entry.alert_armed {
                style("alert").red()
            } else {
                style("no alert").yellow()
            };
            let content = if entry.note.is_done {
                style(entry.note.content.clone()).strikethrough()
            } else {
                style(entry.note.content.clone())
            };
            println!("{}  [{}]  {}  ({})", when, state, content, entry.note.id);
        }
    }

    fn show_stats(&self) {
        let stats = self.notebook.stats();
        println!("Total:     {}", stats.total);
        println!("Scheduled: {}", stats.scheduled);
        println!("Done:      {}", stats.done);
        println!("Active:    {}", stats.active);
        if !stats.top_tags.is_empty() {
            println!("\nTop tags:");
            let widest = stats.top_tags.iter().map(|(_, c)| *c).max().unwrap_or(1);
            for (tag, count) in &stats.top_tags {
                let bar = "#".repeat((count * 20).div_ceil(widest));
                println!("  {:<12} {:>3} {}", tag, count, bar);
            }
        }
    }

    async fn handle_analyze(&self) {
        match &self.client {
            Some(client) => println!("{}", client.analyze(self.notebook.notes()).await),
            None => println!("No suggestion_endpoint configured; nothing to ask."),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn handle_edit(
        &mut self,
        id: String,
        content: Option<String>,
        editor: bool,
        tags: Option<String>,
        schedule: Option<String>,
        no_schedule: bool,
        image: Option<String>,
        file: Option<PathBuf>,
    ) -> Result<()> {
        if [content.is_some(), file.is_some(), editor]
            .iter()
            .filter(|set| **set)
            .count()
            > 1
        {
            return Err(NoteError::ApplicationError {
                message: "Use only one of --content, --file and --editor".to_string(),
            });
        }

        let mut note = self
            .notebook
            .get(&id)
            .cloned()
            .ok_or_else(|| NoteError::NoteNotFound { id: id.clone() })?;

        if let Some(new_content) = content {
            note.content = new_content;
        } else if let Some(file_path) = file {
            note.content = read_to_string(&file_path)?.trim().to_string();
            println!("Content updated from file: {}", file_path.display());
        } else if editor {
            note.content = self.open_editor_with_content(&note.content)?;
            println!("Content updated from editor");
        }

        if tags.is_some() {
            note.tags = parse_tags(tags);
        }

        if let Some(schedule) = schedule {
            note.has_schedule = true;
            note.schedule_date = Some(parse_schedule_arg(&schedule)?);
        } else if no_schedule {
            note.has_schedule = false;
            note.schedule_date = None;
        }

        if let Some(image) = image {
            note.image_url = (!image.trim().is_empty()).then_some(image);
        }

        self.notebook.replace(note)?;
        println!("Note {} updated.", id);
        Ok(())
    }

    fn open_editor_with_content(&self, existing_content: &str) -> Result<String> {
        let temp_file = Builder::new().suffix(".md").tempfile()?;
        let temp_path = temp_file.path().to_path_buf();

        {
            let mut file = OpenOptions::new().write(true).open(&temp_path)?;
            writeln!(file, "{}", EDITOR_MARKER)?;
            writeln!(file, "{}", existing_content)?;
        }

        let editor_cmd = self.config.get_editor_command();
        info!("Opening editor to edit note content. Save and exit when done...");
        self.launch_editor(&editor_cmd, &temp_path)?;

        let content = read_to_string(&temp_path)?;
        Ok(strip_editor_template(&content))
    }

    fn launch_editor(&self, editor_cmd: &str, file_path: &Path) -> Result<()> {
        let args = split(editor_cmd).map_err(|e| NoteError::EditorError {
            message: format!("Failed to parse editor command: {}", e),
        })?;

        let Some((program, rest)) = args.split_first() else {
            return Err(NoteError::EditorError {
                message: "Empty editor command".to_string(),
            });
        };

        let status = Command::new(program)
            .args(rest)
            .arg(file_path.as_os_str())
            .status()?;

        if !status.success() {
            return Err(NoteError::EditorError {
                message: "Editor exited with non-zero status".to_string(),
            });
        }

        Ok(())
    }

    fn handle_delete(&mut self, id: String, force: bool) -> Result<()> {
        let note = self
            .notebook
            .get(&id)
            .cloned()
            .ok_or_else(|| NoteError::NoteNotFound { id: id.clone() })?;

        if !force {
            println!("You are about to delete the following note:");
            println!("ID:      {}", note.id);
            println!("Content: {}", note.content);
            println!("Tags:    {}", note.tags.join(", "));
            println!("Created: {}", note.created_at.format("%Y-%m-%d %H:%M:%S"));

            print!("\nPERMANENTLY DELETE THIS ENTRY? [y/N]: ");
            stdout().flush()?;

            let mut input = String::new();
            stdin().read_line(&mut input)?;

            let input = input.trim().to_lowercase();
            if input != "y" && input != "yes" {
                println!("Deletion cancelled.");
                return Ok(());
            }
        }

        self.notebook.delete(&id)?;
        println!("Note '{}' ({}) has been permanently deleted.", note.content, note.id);
        Ok(())
    }

    /// Keeps alerts armed until Ctrl-C, reloading when the notes file changes.
    async fn watch(&mut self) -> Result<()> {
        let notes_file = self.config.notes_file.clone();
        let watch_dir = match notes_file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&watch_dir).map_err(|_| NoteError::DirectoryError {
            path: watch_dir.clone(),
        })?;

        let (tx, mut rx) = mpsc::channel(64);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) => {
                    let _ = tx.blocking_send(event);
                }
                Err(e) => warn!("File watcher error: {}", e),
            }
        })
        .map_err(|e| NoteError::ApplicationError {
            message: format!("Failed to create file watcher: {}", e),
        })?;
        watcher
            .watch(&watch_dir, RecursiveMode::NonRecursive)
            .map_err(|e| NoteError::ApplicationError {
                message: format!("Failed to watch {}: {}", watch_dir.display(), e),
            })?;

        let status = self.notebook.scheduler_status();
        println!(
            "Watching {} with {} alert{} armed. Press Ctrl-C to stop.",
            notes_file.display(),
            status.pending,
            if status.pending == 1 { "" } else { "s" }
        );

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Stopping watch");
                    break;
                }
                Some(event) = rx.recv() => {
                    if !touches_notes_file(&event, &notes_file) {
                        continue;
                    }
                    match self.notebook.reload() {
                        Ok(count) => debug!("Notes file changed, {} notes loaded", count),
                        Err(e) => warn!("Could not reload notes after change: {}", e),
                    }
                }
            }
        }

        drop(watcher);
        let status = self.notebook.scheduler_status();
        println!(
            "Delivered {} alert{}, {} suppressed.",
            status.fired,
            if status.fired == 1 { "" } else { "s" },
            status.suppressed
        );
        Ok(())
    }
}

/// Drops the editor marker line and anything above it.
fn strip_editor_template(content: &str) -> String {
    let body = match content.find(EDITOR_MARKER) {
        Some(pos) => &content[pos + EDITOR_MARKER.len()..],
        None => content,
    };
    body.trim().to_string()
}
