//! Settings management
//!
//! All tool state lives in a single JSON settings file (default
//! `~/.marginalia/settings.json`): Capacities credentials, markdown format
//! toggles, auto-sync flags and the processed-item tracking blob.
//! `MARGINALIA_*` environment variables override the credential and library
//! fields for the running process without being written back.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Persisted settings, one flat key-value block
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Capacities API bearer token
    pub api_token: String,
    /// Target Capacities space
    pub space_id: String,
    /// Sync newly annotated items from the watch loop
    pub auto_sync: bool,
    /// Re-sync already processed items when they change
    pub sync_on_item_change: bool,
    pub include_page_numbers: bool,
    pub include_tags: bool,
    pub use_color_emoji: bool,
    /// Item keys already submitted, serialized as a JSON array string
    pub processed_items: String,
    /// Path to zotero.sqlite; defaults to ~/Zotero/zotero.sqlite
    pub library_path: Option<PathBuf>,
    /// Per-request timeout for Capacities calls
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api_token: String::new(),
            space_id: String::new(),
            auto_sync: false,
            sync_on_item_change: false,
            include_page_numbers: true,
            include_tags: true,
            use_color_emoji: true,
            processed_items: "[]".to_string(),
            library_path: None,
            request_timeout_secs: 30,
        }
    }
}

impl Settings {
    /// Both a token and a space id are required before any network call
    pub fn is_configured(&self) -> bool {
        !self.api_token.is_empty() && !self.space_id.is_empty()
    }

    /// Apply environment overrides for the current process
    pub fn apply_env(&mut self) {
        if let Ok(token) = env::var("MARGINALIA_API_TOKEN") {
            self.api_token = token;
        }
        if let Ok(space) = env::var("MARGINALIA_SPACE_ID") {
            self.space_id = space;
        }
        if let Ok(path) = env::var("MARGINALIA_LIBRARY") {
            self.library_path = Some(PathBuf::from(path));
        }
    }

    /// Resolved path to the Zotero database
    pub fn library_path(&self) -> PathBuf {
        self.library_path.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("Zotero")
                .join("zotero.sqlite")
        })
    }
}

pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".marginalia")
}

pub fn default_settings_path() -> PathBuf {
    default_config_dir().join("settings.json")
}

/// Shared handle to the settings file
///
/// All mutation goes through [`SettingsStore::update`], which holds the lock
/// across the read-modify-write and the save. The processed-item set is part
/// of the settings value, so sync attempts racing on it are serialized here.
pub struct SettingsStore {
    path: Option<PathBuf>,
    inner: Mutex<Settings>,
}

impl SettingsStore {
    /// Load settings from a file. A missing or corrupt file yields defaults.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let settings = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!("Ignoring corrupt settings file {}: {}", path.display(), e);
                    Settings::default()
                }
            },
            Err(_) => Settings::default(),
        };

        SettingsStore {
            path: Some(path),
            inner: Mutex::new(settings),
        }
    }

    pub fn open_default() -> Self {
        Self::load(default_settings_path())
    }

    /// A store with no backing file; used by tests and one-shot commands
    pub fn ephemeral(settings: Settings) -> Self {
        SettingsStore {
            path: None,
            inner: Mutex::new(settings),
        }
    }

    /// Snapshot of the current settings
    pub fn get(&self) -> Settings {
        self.inner.lock().expect("settings lock poisoned").clone()
    }

    /// Mutate settings in memory only; used for process-local overrides
    /// (environment variables, CLI flags) that must not be written back
    pub fn apply<F>(&self, f: F)
    where
        F: FnOnce(&mut Settings),
    {
        let mut guard = self.inner.lock().expect("settings lock poisoned");
        f(&mut guard);
    }

    /// Mutate settings and persist the new value
    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Settings),
    {
        let mut guard = self.inner.lock().expect("settings lock poisoned");
        f(&mut guard);
        self.save(&guard)
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        let Some(ref path) = self.path else {
            return Ok(());
        };

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        // Write-then-rename so a crash mid-write can't corrupt the file
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(settings)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}
