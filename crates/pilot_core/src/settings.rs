//! Persisted user preferences.
//!
//! Values live in a flat string key/value namespace. Flags are stored as
//! `"true"`/`"false"` and read back by equality with `"true"`. The selected
//! model is scoped per provider (`model_<provider>`); the unscoped legacy
//! `model` key is only ever read as a fallback.

use std::collections::BTreeMap;

use crate::i18n;

pub const KEY_THEME: &str = "theme";
pub const KEY_LANGUAGE: &str = "language";
pub const KEY_SEARCH_ENGINE: &str = "search_engine";
pub const KEY_PROVIDER: &str = "provider";
pub const KEY_SAFE_MODE: &str = "safe_mode";
pub const KEY_BROWSER_ONLY: &str = "browser_only";
pub const KEY_LEGACY_MODEL: &str = "model";

pub const DEFAULT_SEARCH_ENGINE: &str = "google";
pub const DEFAULT_PROVIDER: &str = "openai";

pub fn model_key(provider: &str) -> String {
    format!("model_{provider}")
}

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn keys(&self) -> Vec<String>;

    fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn get_flag(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(value) => value == "true",
            None => default,
        }
    }

    fn set_flag(&mut self, key: &str, value: bool) {
        self.set(key, flag_value(value));
    }
}

/// In-memory store, used by tests and as a fallback when no file store is available.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(raw: &str) -> Self {
        if raw == "dark" {
            Theme::Dark
        } else {
            Theme::Light
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingChange {
    Theme(Theme),
    Language(String),
    SearchEngine(String),
    Provider(String),
    Model(String),
    SafeMode(bool),
    BrowserOnly(bool),
}

/// Body of a task-creation request, sourced from settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRequest {
    pub prompt: String,
    pub browser_only: bool,
    pub search_engine: String,
    pub model: Option<String>,
    pub provider: Option<String>,
    pub safe_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub theme: Theme,
    pub language: String,
    pub search_engine: String,
    pub provider: String,
    pub models: BTreeMap<String, String>,
    pub legacy_model: Option<String>,
    pub safe_mode: bool,
    pub browser_only: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            language: i18n::DEFAULT_LANGUAGE.to_string(),
            search_engine: DEFAULT_SEARCH_ENGINE.to_string(),
            provider: DEFAULT_PROVIDER.to_string(),
            models: BTreeMap::new(),
            legacy_model: None,
            safe_mode: true,
            browser_only: true,
        }
    }
}

impl Settings {
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let defaults = Settings::default();
        let provider = non_blank(store.get(KEY_PROVIDER)).unwrap_or(defaults.provider);

        let mut models = BTreeMap::new();
        for key in store.keys() {
            let Some(name) = key.strip_prefix("model_").filter(|name| !name.is_empty()) else {
                continue;
            };
            if let Some(model) = non_blank(store.get(&key)) {
                models.insert(name.to_string(), model);
            }
        }

        Self {
            theme: store
                .get(KEY_THEME)
                .map(|raw| Theme::parse(&raw))
                .unwrap_or(defaults.theme),
            language: non_blank(store.get(KEY_LANGUAGE)).unwrap_or(defaults.language),
            search_engine: non_blank(store.get(KEY_SEARCH_ENGINE))
                .unwrap_or(defaults.search_engine),
            provider,
            models,
            legacy_model: non_blank(store.get(KEY_LEGACY_MODEL)),
            safe_mode: store.get_flag(KEY_SAFE_MODE, defaults.safe_mode),
            browser_only: store.get_flag(KEY_BROWSER_ONLY, defaults.browser_only),
        }
    }

    /// Model chosen for the current provider, falling back to the legacy key.
    pub fn selected_model(&self) -> Option<&str> {
        self.model_for(&self.provider)
    }

    pub fn model_for(&self, provider: &str) -> Option<&str> {
        self.models
            .get(provider)
            .map(String::as_str)
            .or(self.legacy_model.as_deref())
    }

    /// Applies a change and returns the `(key, value)` pair to persist.
    pub fn apply(&mut self, change: SettingChange) -> (String, String) {
        match change {
            SettingChange::Theme(theme) => {
                self.theme = theme;
                (KEY_THEME.to_string(), theme.as_str().to_string())
            }
            SettingChange::Language(language) => {
                self.language = language.clone();
                (KEY_LANGUAGE.to_string(), language)
            }
            SettingChange::SearchEngine(engine) => {
                self.search_engine = engine.clone();
                (KEY_SEARCH_ENGINE.to_string(), engine)
            }
            SettingChange::Provider(provider) => {
                self.provider = provider.clone();
                (KEY_PROVIDER.to_string(), provider)
            }
            SettingChange::Model(model) => {
                self.models.insert(self.provider.clone(), model.clone());
                (model_key(&self.provider), model)
            }
            SettingChange::SafeMode(enabled) => {
                self.safe_mode = enabled;
                (KEY_SAFE_MODE.to_string(), flag_value(enabled).to_string())
            }
            SettingChange::BrowserOnly(enabled) => {
                self.browser_only = enabled;
                (KEY_BROWSER_ONLY.to_string(), flag_value(enabled).to_string())
            }
        }
    }

    pub fn task_request(&self, prompt: impl Into<String>) -> TaskRequest {
        TaskRequest {
            prompt: prompt.into(),
            browser_only: self.browser_only,
            search_engine: self.search_engine.clone(),
            model: self.selected_model().map(ToOwned::to_owned),
            provider: Some(self.provider.clone()),
            safe_mode: self.safe_mode,
        }
    }
}

fn flag_value(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_an_empty_store() {
        let settings = Settings::load(&MemoryStore::new());
        assert_eq!(settings, Settings::default());
        assert!(settings.safe_mode);
        assert!(settings.browser_only);
        assert_eq!(settings.selected_model(), None);
    }

    #[test]
    fn flags_compare_by_equality_only() {
        let mut store = MemoryStore::new();
        store.set(KEY_SAFE_MODE, "TRUE");
        store.set(KEY_BROWSER_ONLY, "1");
        let settings = Settings::load(&store);
        assert!(!settings.safe_mode);
        assert!(!settings.browser_only);
    }

    #[test]
    fn legacy_model_is_a_read_fallback() {
        let mut store = MemoryStore::new();
        store.set(KEY_LEGACY_MODEL, "gpt-4o");
        store.set(&model_key("anthropic"), "claude-sonnet");
        store.set(KEY_PROVIDER, "gemini");

        let mut settings = Settings::load(&store);
        assert_eq!(settings.selected_model(), Some("gpt-4o"));
        assert_eq!(settings.model_for("anthropic"), Some("claude-sonnet"));

        let (key, value) = settings.apply(SettingChange::Model("gemini-2.0-flash".into()));
        assert_eq!(key, "model_gemini");
        assert_eq!(value, "gemini-2.0-flash");
        assert_eq!(settings.legacy_model.as_deref(), Some("gpt-4o"));
    }

    #[test]
    fn task_request_carries_settings() {
        let mut settings = Settings::default();
        settings.apply(SettingChange::BrowserOnly(false));
        settings.apply(SettingChange::SearchEngine("bing".into()));
        settings.apply(SettingChange::Model("gpt-4.1-mini".into()));

        let request = settings.task_request("find flights");
        assert_eq!(
            request,
            TaskRequest {
                prompt: "find flights".to_string(),
                browser_only: false,
                search_engine: "bing".to_string(),
                model: Some("gpt-4.1-mini".to_string()),
                provider: Some("openai".to_string()),
                safe_mode: true,
            }
        );
    }
}
