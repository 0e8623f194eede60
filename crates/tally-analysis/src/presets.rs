//! Saved filter presets.
//!
//! Presets are kept in a string key-value store under two keys:
//!
//! | Key | Payload |
//! |-----|---------|
//! | `da.filters.configs` | JSON array of [`FilterConfig`] |
//! | `da.filters.recent` | JSON [`RecentState`] |
//!
//! Payloads that fail to decode are logged and treated as empty, so a
//! damaged store never blocks filtering.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tracing::{debug, warn};

use crate::dates::DateRange;
use crate::error::{AnalysisError, Result};
use crate::filter::FilterOptions;

pub const CONFIGS_KEY: &str = "da.filters.configs";
pub const RECENT_KEY: &str = "da.filters.recent";

/// Abstraction over string storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory store for testing.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Store backed by one JSON object file mapping keys to string payloads.
///
/// The file is read on every access and rewritten on every change. A missing
/// or empty file is an empty store.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<serde_json::Map<String, Json>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Default::default()),
            Err(e) => return Err(e.into()),
        };
        if text.trim().is_empty() {
            return Ok(Default::default());
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn write_all(&self, entries: &serde_json::Map<String, Json>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.get(key).map(|v| match v {
            Json::String(s) => s.clone(),
            other => other.to_string(),
        }))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), Json::String(value.to_string()));
        self.write_all(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// A named set of filter criteria.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfig {
    pub name: String,
    #[serde(default)]
    pub search_text: String,
    #[serde(default)]
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
}

impl FilterConfig {
    /// The filter options this preset describes. Facets are not part of a
    /// preset.
    pub fn to_options(&self) -> FilterOptions {
        FilterOptions {
            search_text: self.search_text.clone(),
            query: self.query.clone(),
            date_range: self.date_range,
            ..FilterOptions::default()
        }
    }
}

/// The last-used search, query and preset selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecentState {
    pub search_text: String,
    pub query: String,
    pub selected_config_name: Option<String>,
}

/// Saved presets over a [`KeyValueStore`].
#[derive(Debug)]
pub struct PresetStore<S> {
    store: S,
    configs: Vec<FilterConfig>,
    recent: RecentState,
}

impl<S: KeyValueStore> PresetStore<S> {
    /// Loads presets and recent state from the store.
    pub fn open(store: S) -> Result<Self> {
        let configs = decode_or_default(&store, CONFIGS_KEY)?;
        let recent = decode_or_default(&store, RECENT_KEY)?;
        Ok(PresetStore {
            store,
            configs,
            recent,
        })
    }

    pub fn configs(&self) -> &[FilterConfig] {
        &self.configs
    }

    pub fn get(&self, name: &str) -> Option<&FilterConfig> {
        self.configs.iter().find(|c| c.name == name)
    }

    pub fn recent(&self) -> &RecentState {
        &self.recent
    }

    pub fn selected(&self) -> Option<&str> {
        self.recent.selected_config_name.as_deref()
    }

    /// Saves a preset, replacing one with the same name in place or appending
    /// it, and selects it.
    pub fn save(
        &mut self,
        name: &str,
        search_text: &str,
        query: &str,
        date_range: Option<DateRange>,
    ) -> Result<&FilterConfig> {
        let config = FilterConfig {
            name: name.to_string(),
            search_text: search_text.to_string(),
            query: query.to_string(),
            date_range,
        };
        let idx = match self.configs.iter().position(|c| c.name == name) {
            Some(idx) => {
                self.configs[idx] = config;
                idx
            }
            None => {
                self.configs.push(config);
                self.configs.len() - 1
            }
        };
        self.persist_configs()?;

        self.recent = RecentState {
            search_text: search_text.to_string(),
            query: query.to_string(),
            selected_config_name: Some(name.to_string()),
        };
        self.persist_recent()?;
        debug!(name, "saved filter preset");
        Ok(&self.configs[idx])
    }

    /// Selects a preset and makes its search and query the recent state.
    pub fn load(&mut self, name: &str) -> Result<FilterConfig> {
        let config = self
            .get(name)
            .cloned()
            .ok_or_else(|| AnalysisError::UnknownPreset(name.to_string()))?;
        self.recent = RecentState {
            search_text: config.search_text.clone(),
            query: config.query.clone(),
            selected_config_name: Some(config.name.clone()),
        };
        self.persist_recent()?;
        Ok(config)
    }

    /// Removes a preset, clearing the selection if it was selected. Returns
    /// whether a preset was removed.
    pub fn delete(&mut self, name: &str) -> Result<bool> {
        let before = self.configs.len();
        self.configs.retain(|c| c.name != name);
        let removed = self.configs.len() != before;
        self.persist_configs()?;

        if self.selected() == Some(name) {
            self.recent.selected_config_name = None;
            self.persist_recent()?;
        }
        Ok(removed)
    }

    /// Records the search and query in use, keeping the selection.
    pub fn set_recent(&mut self, search_text: &str, query: &str) -> Result<()> {
        self.recent.search_text = search_text.to_string();
        self.recent.query = query.to_string();
        self.persist_recent()
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    fn persist_configs(&mut self) -> Result<()> {
        let payload = serde_json::to_string(&self.configs)?;
        self.store.set(CONFIGS_KEY, &payload)
    }

    fn persist_recent(&mut self) -> Result<()> {
        let payload = serde_json::to_string(&self.recent)?;
        self.store.set(RECENT_KEY, &payload)
    }
}

fn decode_or_default<S, T>(store: &S, key: &str) -> Result<T>
where
    S: KeyValueStore,
    T: Default + for<'de> Deserialize<'de>,
{
    let Some(raw) = store.get(key)? else {
        return Ok(T::default());
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(err) => {
            warn!(key, error = %err, "ignoring unreadable stored payload");
            Ok(T::default())
        }
    }
}
