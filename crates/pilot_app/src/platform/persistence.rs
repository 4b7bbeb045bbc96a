use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use pilot_core::KeyValueStore;
use pilot_engine::AtomicFileWriter;
use pilot_logging::{pilot_error, pilot_info, pilot_warn};
use serde::{Deserialize, Serialize};

pub const SETTINGS_FILENAME: &str = "settings.ron";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedSettings {
    values: BTreeMap<String, String>,
}

/// Settings store backed by a ron file; every `set` is written through immediately.
#[derive(Debug)]
pub struct FileStore {
    writer: AtomicFileWriter,
    values: BTreeMap<String, String>,
}

impl FileStore {
    /// `<platform config dir>/pilot`, when the platform has one.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pilot"))
    }

    pub fn open(dir: PathBuf) -> Self {
        let values = load_values(&dir.join(SETTINGS_FILENAME));
        Self {
            writer: AtomicFileWriter::new(dir),
            values,
        }
    }

    pub fn path(&self) -> PathBuf {
        self.writer.dir().join(SETTINGS_FILENAME)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    fn save(&self) {
        let state = PersistedSettings {
            values: self.values.clone(),
        };
        let pretty = ron::ser::PrettyConfig::new();
        let content = match ron::ser::to_string_pretty(&state, pretty) {
            Ok(text) => text,
            Err(err) => {
                pilot_error!("Failed to serialize settings: {}", err);
                return;
            }
        };
        if let Err(err) = self.writer.write(SETTINGS_FILENAME, &content) {
            pilot_error!("Failed to write settings to {:?}: {}", self.path(), err);
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
        self.save();
    }

    fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}

fn load_values(path: &Path) -> BTreeMap<String, String> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return BTreeMap::new();
        }
        Err(err) => {
            pilot_warn!("Failed to read settings from {:?}: {}", path, err);
            return BTreeMap::new();
        }
    };

    match ron::from_str::<PersistedSettings>(&content) {
        Ok(state) => {
            pilot_info!("Loaded {} settings from {:?}", state.values.len(), path);
            state.values
        }
        Err(err) => {
            pilot_warn!("Failed to parse settings from {:?}: {}", path, err);
            BTreeMap::new()
        }
    }
}
