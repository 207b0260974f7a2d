use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use myai::config::Config;
use myai::controller::{Region, Toast, UiState, View};
use myai::persistence::Persistence;
use myai::state::AppState;
use myai::storage::{MemoryStore, SledStore};

#[allow(dead_code)]
pub fn create_temp_store() -> (SledStore, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("state.db");
    let store = SledStore::new_with_path(db_path).expect("failed to open sled store with path");
    (store, tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// State over a fresh in-memory store, plus a handle on that store
#[allow(dead_code)]
pub fn memory_state() -> (AppState, MemoryStore) {
    let store = MemoryStore::new();
    let state = AppState::restore(Persistence::new(Box::new(store.clone())));
    (state, store)
}

/// Default config pointing at a mock server
#[allow(dead_code)]
pub fn config_for(base_url: &str) -> Config {
    let mut config = Config::default();
    config.api.base_url = base_url.to_string();
    config
}

/// View that records everything it is asked to do
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct RecordingView {
    pub regions: Vec<Region>,
    pub toasts: Vec<Toast>,
}

impl View for RecordingView {
    fn render(&mut self, region: Region, _state: &AppState, _ui: &UiState) {
        self.regions.push(region);
    }

    fn notify(&mut self, toast: Toast) {
        self.toasts.push(toast);
    }
}
