#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use timenotes::{
    AlertScheduler, AlertSink, ManualClock, Note, NoteError, NoteStore, Notebook, Permission,
    Reconciler, Result, Suggestion, SuggestionSource,
};

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 8, 9, 0, 0).unwrap()
}

/// Alert sink that remembers which notes it was asked to show.
pub struct RecordingSink {
    permission: Mutex<Permission>,
    shown: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new(permission: Permission) -> Arc<Self> {
        Arc::new(Self {
            permission: Mutex::new(permission),
            shown: Mutex::new(Vec::new()),
        })
    }

    pub fn shown(&self) -> Vec<String> {
        self.shown.lock().unwrap().clone()
    }

    pub fn set_permission(&self, permission: Permission) {
        *self.permission.lock().unwrap() = permission;
    }
}

impl AlertSink for RecordingSink {
    fn request_permission(&self) -> Permission {
        *self.permission.lock().unwrap()
    }

    fn permission(&self) -> Permission {
        *self.permission.lock().unwrap()
    }

    fn show(&self, note: &Note) {
        self.shown.lock().unwrap().push(note.id.clone());
    }
}

/// Suggestion source that replays queued answers; an empty queue means the
/// service is down.
#[derive(Default)]
pub struct ScriptedSource {
    answers: Mutex<VecDeque<Suggestion>>,
    calls: Mutex<usize>,
}

impl ScriptedSource {
    pub fn new(answers: Vec<Suggestion>) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.into()),
            calls: Mutex::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl SuggestionSource for ScriptedSource {
    async fn suggest(&self, _text: &str, _existing: &[Note], _tz: &str) -> Result<Suggestion> {
        *self.calls.lock().unwrap() += 1;
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| NoteError::SuggestionUnavailable {
                message: "connection refused".into(),
            })
    }
}

/// Store that keeps the last saved collection in memory.
#[derive(Default)]
pub struct MemoryStore {
    notes: Mutex<Vec<Note>>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    pub fn with(notes: Vec<Note>) -> Arc<Self> {
        Arc::new(Self {
            notes: Mutex::new(notes),
            saves: Mutex::new(0),
        })
    }

    pub fn saved(&self) -> Vec<Note> {
        self.notes.lock().unwrap().clone()
    }

    pub fn saves(&self) -> usize {
        *self.saves.lock().unwrap()
    }

    pub fn replace(&self, notes: Vec<Note>) {
        *self.notes.lock().unwrap() = notes;
    }
}

impl NoteStore for MemoryStore {
    fn load(&self) -> Result<Vec<Note>> {
        Ok(self.notes.lock().unwrap().clone())
    }

    fn save(&self, notes: &[Note]) -> Result<()> {
        *self.notes.lock().unwrap() = notes.to_vec();
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}

pub struct Harness {
    pub notebook: Notebook,
    pub store: Arc<MemoryStore>,
    pub sink: Arc<RecordingSink>,
    pub source: Arc<ScriptedSource>,
    pub clock: ManualClock,
}

pub fn harness(existing: Vec<Note>, answers: Vec<Suggestion>) -> Harness {
    let clock = ManualClock::new(now());
    let store = MemoryStore::with(existing);
    let sink = RecordingSink::new(Permission::Granted);
    let source = ScriptedSource::new(answers);

    let reconciler = Reconciler::new(
        Some(Arc::clone(&source) as Arc<dyn SuggestionSource>),
        "UTC",
    );
    let scheduler = AlertScheduler::new(
        Arc::new(clock.clone()),
        Arc::clone(&sink) as Arc<dyn AlertSink>,
    );
    let notebook = Notebook::open(
        Arc::clone(&store) as Arc<dyn NoteStore>,
        reconciler,
        scheduler,
        Arc::new(clock.clone()),
    )
    .unwrap();

    Harness {
        notebook,
        store,
        sink,
        source,
        clock,
    }
}

pub fn scheduled_note(id: &str, content: &str, tags: &[&str], at: DateTime<Utc>) -> Note {
    let mut note = Note::new(
        content.to_string(),
        content.to_lowercase(),
        tags.iter().map(|t| t.to_string()).collect(),
        now() - chrono::Duration::days(1),
    );
    note.id = id.to_string();
    note.has_schedule = true;
    note.schedule_date = Some(at);
    note
}
