//! Shared helpers for the integration tests.

use std::path::Path;
use std::sync::Arc;

use urlcat::config::Config;
use urlcat::render::{Renderer, ScriptedRenderer};
use urlcat::server::AppState;

/// `https://<name>.test/` for each name.
pub fn urls(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| url(name)).collect()
}

/// `https://<name>.test/`.
pub fn url(name: &str) -> String {
    format!("https://{name}.test/")
}

/// Sorted file names in `dir`; empty if `dir` does not exist.
pub fn files_in(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut names: Vec<String> = entries
        .map(|entry| {
            entry
                .expect("dir entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}

/// Handler state rooted at `base_dir`, rendering with `renderer`.
pub fn app_state(base_dir: &Path, renderer: ScriptedRenderer) -> AppState {
    let config = Config {
        base_dir: base_dir.to_path_buf(),
        ..Config::default()
    };
    let renderer: Arc<dyn Renderer> = Arc::new(renderer);
    AppState::new(&config, renderer)
}
