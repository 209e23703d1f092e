mod common;

use std::sync::Arc;

use chrono::Duration as ChronoDuration;
use common::{now, scheduled_note, RecordingSink};
use tempfile::tempdir;
use timenotes::{
    AlertScheduler, AlertSink, JsonNoteStore, ManualClock, NoteStore, Notebook, Permission,
    Reconciler,
};

fn open(store: Arc<JsonNoteStore>) -> Notebook {
    let clock = ManualClock::new(now());
    let sink = RecordingSink::new(Permission::Granted);
    let scheduler = AlertScheduler::new(Arc::new(clock.clone()), sink as Arc<dyn AlertSink>);
    Notebook::open(
        store as Arc<dyn NoteStore>,
        Reconciler::new(None, "UTC"),
        scheduler,
        Arc::new(clock),
    )
    .unwrap()
}

#[tokio::test(start_paused = true)]
async fn notes_survive_a_restart_and_alerts_are_rearmed() {
    let dir = tempdir().unwrap();
    let store = Arc::new(JsonNoteStore::new(dir.path().join("notes.json")));
    store
        .save(&[scheduled_note(
            "n1",
            "Dentist",
            &["health"],
            now() + ChronoDuration::hours(3),
        )])
        .unwrap();

    let first_id = {
        let mut notebook = open(Arc::clone(&store));
        assert!(notebook.scheduler().is_pending("n1"));
        let outcome = notebook.submit("pick up #laundry", None).await.unwrap();
        assert!(outcome.used_fallback);
        outcome.mutation.into_note().id
    };

    let notebook = open(store);
    assert_eq!(notebook.notes().len(), 2);
    let laundry = notebook.get(&first_id).unwrap();
    assert_eq!(laundry.tags, vec!["laundry".to_string()]);
    assert_eq!(laundry.raw_content, "pick up #laundry");
    assert!(notebook.scheduler().is_pending("n1"));
    assert_eq!(notebook.scheduler().pending().len(), 1);
}
