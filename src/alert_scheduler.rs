// src/alert_scheduler.rs - One-shot alert scheduler
//
// The scheduler owns every pending alert. It is never updated incrementally:
// each mutation of the note collection is followed by a full resync that
// cancels everything and registers the alerts the collection calls for.
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use log::{debug, error, info, trace};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration};

use crate::{AlertSink, Clock, Note, Permission};

/// Longest delay, in milliseconds, a one-shot alert can be armed for
/// (about 24.85 days). Notes further out get no alert.
pub const HORIZON_MS: i64 = 2_147_483_647;

#[derive(Debug, Clone, Default)]
pub struct AlertSchedulerStatus {
    /// Alerts currently armed
    pub pending: usize,
    /// Alerts that reached the sink
    pub fired: u64,
    /// Alerts that went off while permission was not granted
    pub suppressed: u64,
    /// When the registry was last rebuilt
    pub last_resync: Option<DateTime<Utc>>,
}

/// A pending alert for one note.
#[derive(Debug)]
pub struct ScheduledAlert {
    pub note_id: String,
    pub fire_at: DateTime<Utc>,
    generation: u64,
    handle: JoinHandle<()>,
}

impl ScheduledAlert {
    fn cancel(self) {
        trace!("Cancelling alert for note {}", self.note_id);
        self.handle.abort();
    }
}

#[derive(Debug, Default)]
struct Registry {
    alerts: HashMap<String, ScheduledAlert>,
    fired: u64,
    suppressed: u64,
}

/// Why a scheduled note did not get an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Done,
    NoDate,
    Elapsed,
    BeyondHorizon,
}

/// Decides whether `note` should be armed at `now`, and for how long.
pub fn alert_delay(note: &Note, now: DateTime<Utc>) -> Result<Duration, SkipReason> {
    if note.is_done {
        return Err(SkipReason::Done);
    }
    let fire_at = note.effective_schedule().ok_or(SkipReason::NoDate)?;
    let delay_ms = (fire_at - now).num_milliseconds();
    if delay_ms <= 0 {
        Err(SkipReason::Elapsed)
    } else if delay_ms >= HORIZON_MS {
        Err(SkipReason::BeyondHorizon)
    } else {
        Ok(Duration::from_millis(delay_ms as u64))
    }
}

pub struct AlertScheduler {
    /// Source of "now" for delay computation
    clock: Arc<dyn Clock>,

    /// Where alerts go when they fire
    sink: Arc<dyn AlertSink>,

    /// Pending alerts keyed by note id, shared with the timer tasks so they
    /// can remove themselves after firing
    registry: Arc<Mutex<Registry>>,

    next_generation: u64,

    last_resync: Option<DateTime<Utc>>,
}

impl AlertScheduler {
    pub fn new(clock: Arc<dyn Clock>, sink: Arc<dyn AlertSink>) -> Self {
        debug!("Initializing alert scheduler");
        Self {
            clock,
            sink,
            registry: Arc::new(Mutex::new(Registry::default())),
            next_generation: 0,
            last_resync: None,
        }
    }

    /// Rebuilds the registry from `notes` using the injected clock.
    pub fn resync(&mut self, notes: &[Note]) {
        let now = self.clock.now();
        self.resync_at(notes, now);
    }

    /// Cancels every pending alert, then arms one alert per eligible note.
    ///
    /// Must be called from within a tokio runtime.
    pub fn resync_at(&mut self, notes: &[Note], now: DateTime<Utc>) {
        let mut registry = lock(&self.registry);

        let cancelled = registry.alerts.len();
        for (_, alert) in registry.alerts.drain() {
            alert.cancel();
        }

        for note in notes {
            let delay = match alert_delay(note, now) {
                Ok(delay) => delay,
                Err(SkipReason::Elapsed) => {
                    debug!("Not scheduling note {}: schedule has passed", note.id);
                    continue;
                }
                Err(SkipReason::BeyondHorizon) => {
                    debug!(
                        "Not scheduling note {}: schedule is beyond the alert horizon",
                        note.id
                    );
                    continue;
                }
                Err(reason) => {
                    trace!("Note {} not eligible for an alert: {:?}", note.id, reason);
                    continue;
                }
            };

            // A collection should never hold the same id twice; if it does,
            // the last occurrence wins and the earlier timer is released.
            if let Some(previous) = registry.alerts.remove(&note.id) {
                error!("Duplicate note id {} in collection", note.id);
                previous.cancel();
            }

            self.next_generation += 1;
            let generation = self.next_generation;
            let fire_at = note.schedule_date.unwrap_or(now);
            let handle = self.spawn_timer(note.clone(), delay, generation);

            registry.alerts.insert(
                note.id.clone(),
                ScheduledAlert {
                    note_id: note.id.clone(),
                    fire_at,
                    generation,
                    handle,
                },
            );
        }

        self.last_resync = Some(now);
        info!(
            "Alert registry resynced: cancelled {}, armed {}",
            cancelled,
            registry.alerts.len()
        );
    }

    fn spawn_timer(&self, note: Note, delay: Duration, generation: u64) -> JoinHandle<()> {
        let sink = Arc::clone(&self.sink);
        let registry = Arc::clone(&self.registry);

        debug!("Arming alert for note {} in {:?}", note.id, delay);
        tokio::spawn(async move {
            time::sleep(delay).await;

            let granted = sink.permission() == Permission::Granted;

            // Claiming the registration is the moment the alert fires. A resync
            // that completed before the claim has already replaced or dropped
            // it, and then the sink is never reached.
            {
                let mut registry = lock(&registry);
                let ours = registry
                    .alerts
                    .get(&note.id)
                    .is_some_and(|alert| alert.generation == generation);
                if !ours {
                    debug!("Alert for note {} was cancelled before firing", note.id);
                    return;
                }
                registry.alerts.remove(&note.id);
                if granted {
                    registry.fired += 1;
                } else {
                    registry.suppressed += 1;
                }
            }

            if granted {
                info!("Alert firing for note {}", note.id);
                sink.show(&note);
            } else {
                debug!("Alert for note {} suppressed: permission not granted", note.id);
            }
        })
    }

    /// Cancels every pending alert without registering new ones.
    pub fn cancel_all(&mut self) {
        let mut registry = lock(&self.registry);
        let count = registry.alerts.len();
        for (_, alert) in registry.alerts.drain() {
            alert.cancel();
        }
        if count > 0 {
            info!("Cancelled {} pending alerts", count);
        }
    }

    /// Pending `(note id, fire time)` pairs, earliest first.
    pub fn pending(&self) -> Vec<(String, DateTime<Utc>)> {
        let registry = lock(&self.registry);
        let mut pending: Vec<_> = registry
            .alerts
            .values()
            .map(|alert| (alert.note_id.clone(), alert.fire_at))
            .collect();
        pending.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        pending
    }

    pub fn is_pending(&self, note_id: &str) -> bool {
        lock(&self.registry).alerts.contains_key(note_id)
    }

    /// Get the current status of the alert scheduler
    pub fn status(&self) -> AlertSchedulerStatus {
        let registry = lock(&self.registry);
        AlertSchedulerStatus {
            pending: registry.alerts.len(),
            fired: registry.fired,
            suppressed: registry.suppressed,
            last_resync: self.last_resync,
        }
    }
}

impl Drop for AlertScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    // A timer task cannot leave the registry half-updated, so a poisoned
    // lock still guards consistent data.
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
