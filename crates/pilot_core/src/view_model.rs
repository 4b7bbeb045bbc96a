use crate::{
    i18n, Controls, LogEntry, ModelLookup, ModelLookupStatus, PendingAction, SessionStatus, TaskId,
    Theme,
};

/// Everything the rendering step needs; derived from `AppState::view`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppViewModel {
    pub language: String,
    pub theme: Theme,
    pub provider: String,
    pub model: Option<String>,
    pub status: SessionStatus,
    pub status_text: String,
    pub task_id: Option<TaskId>,
    pub controls: Controls,
    pub awaiting_reply: bool,
    pub pending_action: Option<PendingAction>,
    pub prompt_input: String,
    pub reply_input: String,
    pub log: Vec<LogEntry>,
    /// Bumped every time the log is cleared.
    pub log_generation: u64,
    pub alert: Option<String>,
    pub models: ModelListView,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModelListView {
    pub provider: Option<String>,
    pub loading: bool,
    pub models: Vec<String>,
    pub message: Option<String>,
}

impl ModelListView {
    pub(crate) fn project(lang: &str, lookup: &ModelLookup) -> Self {
        let text = |key: &str| Some(i18n::resolve(lang, key).to_string());
        let (loading, models, message) = match &lookup.status {
            ModelLookupStatus::Idle => (false, Vec::new(), None),
            ModelLookupStatus::MissingApiKey => (false, Vec::new(), text("alert.missing_api_key")),
            ModelLookupStatus::Loading => (true, Vec::new(), text("models.loading")),
            ModelLookupStatus::Loaded(models) => (false, models.clone(), None),
            ModelLookupStatus::Empty => (false, Vec::new(), text("models.none")),
            ModelLookupStatus::Failed(detail) => (false, Vec::new(), Some(detail.clone())),
        };
        Self {
            provider: lookup.provider.clone(),
            loading,
            models,
            message,
        }
    }
}
