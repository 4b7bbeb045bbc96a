//! Pilot core: pure task-session state machine and view-model helpers.
mod effect;
mod event;
pub mod i18n;
mod log_line;
mod models;
mod msg;
mod settings;
mod state;
mod update;
mod view_model;

pub use effect::{Effect, PendingAction};
pub use event::{
    ConfirmationPayload, ErrorPayload, LogPayload, RemoteStatus, ResultPayload, StatusPayload,
    TaskEvent, UserInputPayload,
};
pub use log_line::{format_duration, format_step};
pub use models::{ApiKey, ModelLookup, ModelLookupStatus};
pub use msg::Msg;
pub use settings::{
    model_key, KeyValueStore, MemoryStore, SettingChange, Settings, TaskRequest, Theme,
    KEY_BROWSER_ONLY, KEY_LANGUAGE, KEY_LEGACY_MODEL, KEY_PROVIDER, KEY_SAFE_MODE,
    KEY_SEARCH_ENGINE, KEY_THEME,
};
pub use state::{
    Alert, AppState, Controls, LogEntry, LogLevel, SessionStatus, StartAttempt, SubscriptionId,
    TaskId, TaskSession,
};
pub use update::update;
pub use view_model::{AppViewModel, ModelListView};
