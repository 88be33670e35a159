use std::time::Duration;

use docstream_core::{update, AppState, BatchId, Effect, Msg, SelectedFile, SessionConfig};
use serde_json::json;

fn small_state(capacity: usize) -> AppState {
    AppState::with_config(SessionConfig {
        max_files: 10,
        roster_capacity: capacity,
        success_message_ttl: Duration::from_secs(5),
    })
}

fn submit(state: AppState, names: &[&str]) -> (AppState, BatchId) {
    let files = names
        .iter()
        .map(|name| SelectedFile::new(*name, *name))
        .collect();
    let (state, effects) = update(state, Msg::FilesSelected { files, prompt: None });
    let batch_id = match &effects[..] {
        [Effect::SubmitBatch { batch_id, .. }] => *batch_id,
        other => panic!("unexpected effects {other:?}"),
    };
    let (state, _) = update(state, Msg::UploadAccepted { batch_id });
    (state, batch_id)
}

fn names(state: &AppState) -> Vec<String> {
    state.entries().map(|e| e.file_name.clone()).collect()
}

#[test]
fn oldest_settled_entries_are_evicted_over_capacity() {
    let (state, first) = submit(small_state(3), &["a", "b"]);
    let (state, _) = update(state, Msg::ProcessingComplete { batch_id: first });
    let (state, second) = submit(state, &["c", "d"]);

    assert_eq!(names(&state), vec!["b", "c", "d"]);
    assert!(state.batch_entries(second).all(|e| e.is_loading));
}

#[test]
fn in_flight_entries_are_never_evicted() {
    let (state, first) = submit(small_state(2), &["a", "b"]);
    let (state, second) = submit(state, &["c", "d"]);

    // Both batches are still streaming, so the roster grows past capacity.
    assert_eq!(names(&state), vec!["a", "b", "c", "d"]);

    // The newer batch settles first; the older one still streams, so nothing goes.
    let (state, _) = update(state, Msg::ProcessingComplete { batch_id: second });
    assert_eq!(names(&state), vec!["a", "b", "c", "d"]);

    let (state, _) = update(state, Msg::ProcessingComplete { batch_id: first });
    assert_eq!(names(&state), vec!["c", "d"]);
}

#[test]
fn newest_batch_survives_settling_behind_older_streams() {
    let batch_names = |prefix: &str| -> Vec<String> {
        (0..10).map(|index| format!("{prefix}{index}.pdf")).collect()
    };
    let (a, b, c) = (batch_names("a"), batch_names("b"), batch_names("c"));
    fn as_refs(names: &[String]) -> Vec<&str> {
        names.iter().map(String::as_str).collect()
    }

    let (state, _) = submit(small_state(20), &as_refs(&a));
    let (state, _) = submit(state, &as_refs(&b));
    let (state, third) = submit(state, &as_refs(&c));
    let (state, _) = update(
        state,
        Msg::FileResult {
            batch_id: third,
            result: docstream_core::FileResult {
                file_name: "c0.pdf".to_string(),
                data: Some(json!({"total": 1})),
                ..Default::default()
            },
        },
    );
    let selected = state.selected_file();
    assert!(selected.is_some());

    let (state, _) = update(state, Msg::ProcessingComplete { batch_id: third });

    assert_eq!(state.batch_entries(third).count(), 10);
    assert_eq!(state.selected_file(), selected);
    assert_eq!(state.entries().count(), 30);
}

#[test]
fn evicting_the_selected_entry_clears_selection() {
    let (state, first) = submit(small_state(1), &["a"]);
    let (state, _) = update(
        state,
        Msg::FileResult {
            batch_id: first,
            result: docstream_core::FileResult {
                file_name: "a".to_string(),
                data: Some(json!({"k": "v"})),
                ..Default::default()
            },
        },
    );
    assert!(state.selected_file().is_some());
    let (state, _) = update(state, Msg::ProcessingComplete { batch_id: first });

    let (state, _) = submit(state, &["b"]);

    assert_eq!(names(&state), vec!["b"]);
    assert_eq!(state.selected_file(), None);
    assert_eq!(state.batch_phase(first), None);
}
