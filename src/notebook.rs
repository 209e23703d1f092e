//! The note collection together with everything that reacts to it.
//!
//! [`Notebook`] is the host around the reconciliation core: it commits the
//! reconciler's mutations, persists the collection, and resyncs the alert
//! scheduler after every change.
use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::{
    AlertScheduler, AlertSchedulerStatus, Clock, Mutation, Note, NoteError, NoteStats, NoteStore,
    Reconciliation, Reconciler, Result, ScheduleEntry,
};

/// Number of tags reported by [`Notebook::stats`].
pub const TOP_TAGS: usize = 5;
/// Bucket for notes without tags in [`Notebook::stats`].
pub const UNTAGGED: &str = "untagged";

pub struct Notebook {
    notes: Vec<Note>,
    store: Arc<dyn NoteStore>,
    reconciler: Reconciler,
    scheduler: AlertScheduler,
    clock: Arc<dyn Clock>,
}

impl Notebook {
    /// Loads the collection from `store` and arms its alerts.
    pub fn open(
        store: Arc<dyn NoteStore>,
        reconciler: Reconciler,
        mut scheduler: AlertScheduler,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let notes = store.load()?;
        info!("Opened notebook with {} notes", notes.len());
        scheduler.resync(&notes);
        Ok(Self {
            notes,
            store,
            reconciler,
            scheduler,
            clock,
        })
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn scheduler(&self) -> &AlertScheduler {
        &self.scheduler
    }

    pub fn scheduler_status(&self) -> AlertSchedulerStatus {
        self.scheduler.status()
    }

    /// Runs one input through the reconciler and commits the result.
    pub async fn submit(&mut self, raw_text: &str, image: Option<&str>) -> Result<Reconciliation> {
        let now = self.clock.now();
        let outcome = self
            .reconciler
            .process(raw_text, image, &self.notes, now)
            .await?;
        self.apply(outcome.mutation.clone());
        self.commit()?;
        Ok(outcome)
    }

    fn apply(&mut self, mutation: Mutation) {
        match mutation {
            Mutation::Create(note) => {
                debug!("Adding note {}", note.id);
                self.notes.push(note);
            }
            Mutation::Update(note) => match self.notes.iter_mut().find(|n| n.id == note.id) {
                Some(slot) => {
                    debug!("Replacing note {}", note.id);
                    *slot = note;
                }
                None => {
                    warn!("Update for unknown note {}, adding it", note.id);
                    self.notes.push(note);
                }
            },
        }
    }

    /// Saves the collection, then rebuilds the alert registry.
    ///
    /// The registry is rebuilt even when saving fails so alerts always match
    /// what is in memory.
    fn commit(&mut self) -> Result<()> {
        let saved = self.store.save(&self.notes);
        if let Err(e) = &saved {
            error!("Failed to save notes: {}", e);
        }
        self.scheduler.resync(&self.notes);
        saved
    }

    /// Flips the done flag and returns the new value.
    pub fn toggle_done(&mut self, id: &str) -> Result<bool> {
        let note = self
            .notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| NoteError::NoteNotFound { id: id.to_string() })?;
        note.is_done = !note.is_done;
        let done = note.is_done;
        info!("Note {} marked {}", id, if done { "done" } else { "pending" });
        self.commit()?;
        Ok(done)
    }

    pub fn delete(&mut self, id: &str) -> Result<Note> {
        let index = self
            .notes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| NoteError::NoteNotFound { id: id.to_string() })?;
        let removed = self.notes.remove(index);
        info!("Deleted note {}", id);
        self.commit()?;
        Ok(removed)
    }

    /// Replaces a note with a manually edited version.
    ///
    /// The id and creation time cannot change, and a schedule date is dropped
    /// when the note is no longer flagged as scheduled.
    pub fn replace(&mut self, mut updated: Note) -> Result<()> {
        let original = self
            .notes
            .iter_mut()
            .find(|n| n.id == updated.id)
            .ok_or_else(|| NoteError::NoteNotFound {
                id: updated.id.clone(),
            })?;

        if updated.created_at != original.created_at {
            let error_msg = "Cannot change note creation timestamp during update".to_string();
            error!("{}", error_msg);
            return Err(NoteError::ApplicationError { message: error_msg });
        }

        if !updated.has_schedule {
            updated.schedule_date = None;
        }
        *original = updated;
        self.commit()
    }

    /// Re-reads the collection from the store and resyncs.
    pub fn reload(&mut self) -> Result<usize> {
        self.notes = self.store.load()?;
        self.scheduler.resync(&self.notes);
        info!("Reloaded {} notes", self.notes.len());
        Ok(self.notes.len())
    }

    /// Scheduled notes, earliest first.
    pub fn schedule_view(&self) -> Vec<ScheduleEntry> {
        let now = self.clock.now();
        let mut entries: Vec<ScheduleEntry> = self
            .notes
            .iter()
            .filter_map(|note| {
                let date = note.effective_schedule()?;
                Some(ScheduleEntry {
                    note: note.clone(),
                    date,
                    is_past: date < now,
                    alert_armed: self.scheduler.is_pending(&note.id),
                })
            })
            .collect();
        entries.sort_by(|a, b| a.date.cmp(&b.date));
        entries
    }

    /// Every distinct tag, sorted.
    pub fn all_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.notes.iter().flat_map(|n| n.tags.clone()).collect();
        tags.sort();
        tags.dedup();
        tags
    }

    pub fn notes_with_tag(&self, tag: &str) -> Vec<&Note> {
        self.notes.iter().filter(|n| n.has_tag(tag)).collect()
    }

    pub fn stats(&self) -> NoteStats {
        let total = self.notes.len();
        let scheduled = self.notes.iter().filter(|n| n.has_schedule).count();
        let done = self.notes.iter().filter(|n| n.is_done).count();

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for note in &self.notes {
            if note.tags.is_empty() {
                *counts.entry(UNTAGGED).or_default() += 1;
            }
            for tag in &note.tags {
                *counts.entry(tag.as_str()).or_default() += 1;
            }
        }
        let mut top_tags: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(tag, count)| (tag.to_string(), count))
            .collect();
        top_tags.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_tags.truncate(TOP_TAGS);

        NoteStats {
            total,
            scheduled,
            done,
            active: total - done,
            top_tags,
        }
    }
}
