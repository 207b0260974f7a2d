//! Persistence against the on-disk store
//!
//! Opens the same `sled` database twice to check that the client state
//! survives a restart.

use myai::models::{ChatMessage, GeneratedImage, Role};
use myai::persistence::{Persistence, CHAT_HISTORY_KEY, CHAT_SESSIONS_KEY};
use myai::state::AppState;
use myai::storage::{KeyValueStore, SledStore};

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

mod common;
use common::create_temp_store;

fn reopen(dir: &TempDir) -> AppState {
    let store = SledStore::new_with_path(dir.path().join("state.db")).expect("reopen store");
    AppState::restore(Persistence::new(Box::new(store)))
}

#[test]
fn test_state_survives_reopen() {
    let (store, dir) = create_temp_store();
    let session_id = {
        let mut state = AppState::restore(Persistence::new(Box::new(store)));
        let id = state.create_session();
        assert!(state.append_message(&id, Role::User, "Plan a trip to Lisbon"));
        assert!(state.append_message(&id, Role::Assistant, "Sure, for how many days?"));
        state.add_images(vec![GeneratedImage {
            id: "img-1".to_string(),
            prompt: "tram in Lisbon".to_string(),
            negative_prompt: None,
            image_url: "/static/generated/tram.png".to_string(),
            image_data: Some("aGVsbG8=".to_string()),
            size: "768x768".to_string(),
            style: "realistic".to_string(),
            timestamp: Utc::now(),
        }]);
        id
    };

    let state = reopen(&dir);
    let session = state.current_session().expect("current session restored");
    assert_eq!(session.id, session_id);
    assert_eq!(session.title, "Plan a trip to Lisbon");
    assert_eq!(session.messages.len(), 2);
    assert_eq!(state.images().len(), 1);
    assert_eq!(state.images().get(0).unwrap().image_data.as_deref(), Some("aGVsbG8="));
}

#[test]
fn test_sessions_are_stored_with_camel_case_keys() {
    let (store, dir) = create_temp_store();
    {
        let mut state = AppState::restore(Persistence::new(Box::new(store)));
        let id = state.create_session();
        state.append_message(&id, Role::User, "hi");
    }

    let store = SledStore::new_with_path(dir.path().join("state.db")).unwrap();
    let raw = store.get(CHAT_SESSIONS_KEY).unwrap().expect("sessions written");
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let session = &value[0];
    assert!(session.get("createdAt").is_some());
    assert!(session.get("lastUpdated").is_some());
    assert_eq!(session["messages"][0]["role"], "user");
}

#[test]
fn test_legacy_history_is_migrated_once() {
    let (store, dir) = create_temp_store();
    let t1 = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    let t2 = Utc.with_ymd_and_hms(2024, 3, 1, 9, 1, 0).unwrap();
    let legacy = vec![
        ChatMessage {
            role: Role::User,
            content: "hi".to_string(),
            timestamp: t1,
        },
        ChatMessage {
            role: Role::Assistant,
            content: "hey".to_string(),
            timestamp: t2,
        },
    ];
    store
        .set(CHAT_HISTORY_KEY, &serde_json::to_string(&legacy).unwrap())
        .unwrap();
    drop(store);

    let first = reopen(&dir);
    let migrated = first.current_session().expect("migrated session").clone();
    assert_eq!(migrated.title, "hi");
    assert_eq!(migrated.created_at, t1);
    assert_eq!(migrated.last_updated, t2);
    assert!(migrated.id.starts_with("session_migrated_"));
    drop(first);

    let second = reopen(&dir);
    assert_eq!(second.sessions().sessions().len(), 1);
    assert_eq!(second.current_session().unwrap().id, migrated.id);
}

#[test]
fn test_malformed_value_is_reported_not_fatal() {
    let (store, dir) = create_temp_store();
    store.set(CHAT_SESSIONS_KEY, "[{broken").unwrap();
    drop(store);

    let mut state = reopen(&dir);
    assert!(state.sessions().sessions().is_empty());
    let warnings = state.drain_warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains(CHAT_SESSIONS_KEY));
}
