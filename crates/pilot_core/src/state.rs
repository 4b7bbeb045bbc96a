use pilot_logging::{pilot_debug, pilot_info, pilot_warn};

use crate::event::{RemoteStatus, TaskEvent};
use crate::log_line::{format_step, labelled};
use crate::view_model::{AppViewModel, ModelListView};
use crate::{
    i18n, ApiKey, Effect, ModelLookup, ModelLookupStatus, PendingAction, SettingChange, Settings,
};

pub type TaskId = String;
pub type SubscriptionId = u64;
pub type StartAttempt = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Idle,
    Starting,
    Running,
    WaitingConfirmation,
    WaitingUserInput,
    Done,
    Stopped,
    Error,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionStatus::Done | SessionStatus::Stopped | SessionStatus::Error
        )
    }

    /// Status token used for the displayed label.
    pub fn token(self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Starting => "starting",
            SessionStatus::Running => "running",
            SessionStatus::WaitingConfirmation => "waiting_confirm",
            SessionStatus::WaitingUserInput => "waiting_user",
            SessionStatus::Done => "done",
            SessionStatus::Stopped => "stopped",
            SessionStatus::Error => "error",
        }
    }
}

/// One remote task attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskSession {
    pub id: Option<TaskId>,
    pub status: SessionStatus,
    pub pending_action: Option<PendingAction>,
    pub awaiting_reply: bool,
    /// Reply carried by the in-flight confirm, if any.
    submitted_reply: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub start: bool,
    pub confirm: bool,
    pub stop: bool,
    pub reply_visible: bool,
}

impl Default for Controls {
    fn default() -> Self {
        Self::idle()
    }
}

impl Controls {
    pub const fn idle() -> Self {
        Self {
            start: true,
            confirm: false,
            stop: false,
            reply_visible: false,
        }
    }

    const fn busy() -> Self {
        Self {
            start: false,
            confirm: false,
            stop: false,
            reply_visible: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    /// Needs the user's attention (confirmation or input gates, local validation).
    Attention,
    Result,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub seq: u64,
    pub level: LogLevel,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alert {
    EmptyPrompt,
    MissingReply,
    MissingApiKey,
}

impl Alert {
    pub fn key(self) -> &'static str {
        match self {
            Alert::EmptyPrompt => "alert.empty_prompt",
            Alert::MissingReply => "alert.missing_reply",
            Alert::MissingApiKey => "alert.missing_api_key",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    settings: Settings,
    prompt_input: String,
    reply_input: String,
    session: TaskSession,
    controls: Controls,
    status_token: Option<String>,
    log: Vec<LogEntry>,
    log_generation: u64,
    next_log_seq: u64,
    next_attempt: StartAttempt,
    current_attempt: Option<StartAttempt>,
    next_subscription: SubscriptionId,
    subscription: Option<SubscriptionId>,
    /// Subscription of the previous task, closed once the new start resolves.
    retiring: Option<SubscriptionId>,
    alert: Option<Alert>,
    models: ModelLookup,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn session(&self) -> &TaskSession {
        &self.session
    }

    pub fn controls(&self) -> Controls {
        self.controls
    }

    pub fn language(&self) -> &str {
        &self.settings.language
    }

    pub fn open_subscription(&self) -> Option<SubscriptionId> {
        self.subscription
    }

    pub fn view(&self) -> AppViewModel {
        let lang = self.language();
        let status_token = self
            .status_token
            .as_deref()
            .unwrap_or_else(|| self.session.status.token());
        AppViewModel {
            language: self.settings.language.clone(),
            theme: self.settings.theme,
            provider: self.settings.provider.clone(),
            model: self.settings.selected_model().map(ToOwned::to_owned),
            status: self.session.status,
            status_text: i18n::status_label(lang, status_token).to_string(),
            task_id: self.session.id.clone(),
            controls: self.controls,
            awaiting_reply: self.session.awaiting_reply,
            pending_action: self.session.pending_action,
            prompt_input: self.prompt_input.clone(),
            reply_input: self.reply_input.clone(),
            log: self.log.clone(),
            log_generation: self.log_generation,
            alert: self
                .alert
                .map(|alert| i18n::resolve(lang, alert.key()).to_string()),
            models: ModelListView::project(lang, &self.models),
            dirty: self.dirty,
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns whether anything changed since the last call and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn clear_alert(&mut self) {
        if self.alert.take().is_some() {
            self.mark_dirty();
        }
    }

    pub(crate) fn set_prompt(&mut self, prompt: String) {
        self.prompt_input = prompt;
        self.mark_dirty();
    }

    pub(crate) fn set_reply(&mut self, reply: String) {
        self.reply_input = reply;
        self.mark_dirty();
    }

    fn push_log(&mut self, level: LogLevel, text: String) {
        self.next_log_seq += 1;
        self.log.push(LogEntry {
            seq: self.next_log_seq,
            level,
            text,
        });
        self.mark_dirty();
    }

    fn set_status(&mut self, status: SessionStatus) {
        self.session.status = status;
        self.status_token = None;
    }

    fn close_subscription(&mut self, effects: &mut Vec<Effect>) {
        if let Some(subscription) = self.subscription.take() {
            effects.push(Effect::CloseStream { subscription });
        }
    }

    fn close_retiring(&mut self, effects: &mut Vec<Effect>) {
        if let Some(subscription) = self.retiring.take() {
            effects.push(Effect::CloseStream { subscription });
        }
    }

    pub(crate) fn start_task(&mut self) -> Vec<Effect> {
        let prompt = self.prompt_input.trim();
        if prompt.is_empty() {
            self.alert = Some(Alert::EmptyPrompt);
            self.mark_dirty();
            return Vec::new();
        }
        let request = self.settings.task_request(prompt);

        let mut effects = Vec::with_capacity(2);
        // The previous session is abandoned now; its stream is closed once
        // this start resolves.
        if let Some(previous) = self.subscription.take() {
            if let Some(older) = self.retiring.replace(previous) {
                pilot_warn!("closing subscription {} left over from an earlier start", older);
                effects.push(Effect::CloseStream {
                    subscription: older,
                });
            }
        }

        self.next_attempt += 1;
        let attempt = self.next_attempt;
        self.begin_start(attempt);
        pilot_info!("starting task attempt={} provider={}", attempt, self.settings.provider);
        effects.push(Effect::CreateTask { attempt, request });
        effects
    }

    fn begin_start(&mut self, attempt: StartAttempt) {
        self.log.clear();
        self.log_generation += 1;
        self.controls = Controls::busy();
        self.session = TaskSession {
            status: SessionStatus::Starting,
            ..TaskSession::default()
        };
        self.status_token = None;
        self.reply_input.clear();
        self.alert = None;
        self.current_attempt = Some(attempt);
        self.mark_dirty();
    }

    pub(crate) fn task_created(&mut self, attempt: StartAttempt, task_id: TaskId) -> Vec<Effect> {
        if self.current_attempt != Some(attempt) {
            pilot_warn!("ignoring task {} from superseded start attempt {}", task_id, attempt);
            return Vec::new();
        }
        self.current_attempt = None;

        let mut effects = Vec::with_capacity(2);
        self.close_retiring(&mut effects);
        self.close_subscription(&mut effects);

        self.next_subscription += 1;
        let subscription = self.next_subscription;
        self.subscription = Some(subscription);
        self.session.id = Some(task_id.clone());
        self.set_status(SessionStatus::Running);
        self.controls = Controls {
            stop: true,
            ..Controls::busy()
        };
        let line = labelled(self.language(), "log.task_started", Some(&task_id));
        self.push_log(LogLevel::Info, line);
        effects.push(Effect::OpenStream {
            subscription,
            task_id,
        });
        effects
    }

    pub(crate) fn task_rejected(&mut self, attempt: StartAttempt, detail: String) -> Vec<Effect> {
        if self.current_attempt != Some(attempt) {
            pilot_debug!("ignoring rejection for superseded start attempt {}", attempt);
            return Vec::new();
        }
        self.current_attempt = None;

        let mut effects = Vec::new();
        self.close_retiring(&mut effects);
        let line = labelled(self.language(), "log.start_failed", Some(&detail));
        self.push_log(LogLevel::Error, line);
        self.set_status(SessionStatus::Error);
        self.controls = Controls::idle();
        effects
    }

    fn is_current(&self, subscription: SubscriptionId) -> bool {
        self.subscription == Some(subscription)
    }

    pub(crate) fn apply_event(
        &mut self,
        subscription: SubscriptionId,
        event: TaskEvent,
    ) -> Vec<Effect> {
        if !self.is_current(subscription) {
            pilot_debug!(
                "dropping {} event from closed subscription {}",
                event.kind(),
                subscription
            );
            return Vec::new();
        }

        let lang = self.settings.language.clone();
        match event {
            TaskEvent::Log(payload) => {
                let failed = payload.status.as_deref() == Some("error") || payload.error.is_some();
                let level = if failed { LogLevel::Error } else { LogLevel::Info };
                self.push_log(level, format_step(&lang, &payload));
                Vec::new()
            }
            TaskEvent::NeedsConfirmation(payload) => {
                let detail = payload.summary.as_deref().or(payload.tool.as_deref());
                let line = labelled(&lang, "log.needs_confirmation", detail);
                self.push_log(LogLevel::Attention, line);
                self.open_gate(SessionStatus::WaitingConfirmation);
                Vec::new()
            }
            TaskEvent::NeedsUserInput(payload) => {
                let line = labelled(&lang, "log.needs_user_input", payload.question.as_deref());
                self.push_log(LogLevel::Attention, line);
                self.open_gate(SessionStatus::WaitingUserInput);
                Vec::new()
            }
            TaskEvent::Result(payload) => {
                self.push_log(LogLevel::Result, payload.result.unwrap_or_default());
                Vec::new()
            }
            TaskEvent::Error(payload) => {
                let line = labelled(&lang, "log.error", payload.error.as_deref());
                self.push_log(LogLevel::Error, line);
                Vec::new()
            }
            TaskEvent::Status(payload) => match payload.status {
                Some(raw) if !raw.trim().is_empty() => self.apply_remote_status(raw),
                _ => {
                    pilot_debug!("status event without a status value");
                    Vec::new()
                }
            },
            TaskEvent::Unknown { kind } => {
                pilot_debug!("ignoring unrecognized event kind {}", kind);
                Vec::new()
            }
        }
    }

    /// Confirmation and input gates both enable Continue and Stop; only the
    /// input gate expects a reply.
    fn open_gate(&mut self, status: SessionStatus) {
        let awaiting_reply = status == SessionStatus::WaitingUserInput;
        self.set_status(status);
        self.session.awaiting_reply = awaiting_reply;
        self.controls = Controls {
            start: false,
            confirm: true,
            stop: true,
            reply_visible: awaiting_reply,
        };
        self.mark_dirty();
    }

    fn apply_remote_status(&mut self, raw: String) -> Vec<Effect> {
        let remote = RemoteStatus::parse(&raw);
        let mut effects = Vec::new();
        match remote {
            RemoteStatus::Queued | RemoteStatus::Running => {
                self.session.status = SessionStatus::Running;
                self.session.awaiting_reply = false;
                self.controls = Controls {
                    stop: self.session.pending_action != Some(PendingAction::Stop),
                    ..Controls::busy()
                };
            }
            RemoteStatus::WaitingConfirm => self.open_gate(SessionStatus::WaitingConfirmation),
            RemoteStatus::WaitingUser => self.open_gate(SessionStatus::WaitingUserInput),
            RemoteStatus::Done | RemoteStatus::Stopped | RemoteStatus::Error => {
                let status = match remote {
                    RemoteStatus::Done => SessionStatus::Done,
                    RemoteStatus::Stopped => SessionStatus::Stopped,
                    _ => SessionStatus::Error,
                };
                self.finish_session(status, &mut effects);
            }
            RemoteStatus::Other(_) => {}
        }
        self.status_token = Some(raw);
        self.mark_dirty();
        effects
    }

    fn finish_session(&mut self, status: SessionStatus, effects: &mut Vec<Effect>) {
        pilot_info!("task finished with status {}", status.token());
        self.session.status = status;
        self.session.id = None;
        self.session.awaiting_reply = false;
        self.session.pending_action = None;
        self.session.submitted_reply = None;
        self.reply_input.clear();
        self.controls = Controls::idle();
        self.close_subscription(effects);
    }

    pub(crate) fn stream_interrupted(&mut self, subscription: SubscriptionId, reason: &str) {
        if !self.is_current(subscription) {
            return;
        }
        pilot_warn!("event stream {} interrupted: {}", subscription, reason);
        let line = i18n::resolve(self.language(), "log.stream_error").to_string();
        self.push_log(LogLevel::Error, line);
    }

    pub(crate) fn confirm(&mut self) -> Vec<Effect> {
        if !self.controls.confirm {
            return Vec::new();
        }
        let Some(task_id) = self.session.id.clone() else {
            return Vec::new();
        };

        let response = if self.session.awaiting_reply {
            let reply = self.reply_input.trim();
            if reply.is_empty() {
                self.alert = Some(Alert::MissingReply);
                let line = i18n::resolve(self.language(), "log.reply_required").to_string();
                self.push_log(LogLevel::Attention, line);
                return Vec::new();
            }
            Some(reply.to_string())
        } else {
            None
        };

        self.controls.confirm = false;
        self.status_token = Some("continuing".to_string());
        self.session.pending_action = Some(PendingAction::Confirm);
        self.session.submitted_reply = response.clone();
        self.mark_dirty();
        vec![Effect::SubmitConfirm { task_id, response }]
    }

    pub(crate) fn stop(&mut self) -> Vec<Effect> {
        if !self.controls.stop {
            return Vec::new();
        }
        let Some(task_id) = self.session.id.clone() else {
            return Vec::new();
        };
        self.controls.stop = false;
        self.status_token = Some("stopping".to_string());
        self.session.pending_action = Some(PendingAction::Stop);
        self.mark_dirty();
        vec![Effect::SubmitStop { task_id }]
    }

    pub(crate) fn action_completed(
        &mut self,
        action: PendingAction,
        task_id: TaskId,
        result: Result<(), String>,
    ) {
        if self.session.id.as_deref() != Some(task_id.as_str()) {
            pilot_debug!("ignoring {:?} completion for inactive task {}", action, task_id);
            return;
        }
        if self.session.pending_action == Some(action) {
            self.session.pending_action = None;
        }
        let submitted_reply = if action == PendingAction::Confirm {
            self.session.submitted_reply.take()
        } else {
            None
        };

        match result {
            Ok(()) => {
                if submitted_reply.is_some() {
                    self.reply_input.clear();
                }
            }
            Err(message) => {
                let key = match action {
                    PendingAction::Confirm => "log.confirm_failed",
                    PendingAction::Stop => "log.stop_failed",
                };
                let line = labelled(self.language(), key, Some(&message));
                self.push_log(LogLevel::Error, line);
                match action {
                    PendingAction::Confirm => {
                        self.controls.confirm = matches!(
                            self.session.status,
                            SessionStatus::WaitingConfirmation | SessionStatus::WaitingUserInput
                        );
                    }
                    PendingAction::Stop => {
                        self.controls.stop = !self.session.status.is_terminal();
                    }
                }
                self.status_token = None;
            }
        }
        self.mark_dirty();
    }

    pub(crate) fn apply_setting(&mut self, change: SettingChange) -> Vec<Effect> {
        let (key, value) = self.settings.apply(change);
        self.mark_dirty();
        vec![Effect::PersistSetting { key, value }]
    }

    pub(crate) fn request_models(
        &mut self,
        provider: String,
        api_key: ApiKey,
        base_url: Option<String>,
    ) -> Vec<Effect> {
        self.mark_dirty();
        if api_key.is_blank() {
            self.models = ModelLookup {
                provider: Some(provider),
                status: ModelLookupStatus::MissingApiKey,
            };
            self.alert = Some(Alert::MissingApiKey);
            return Vec::new();
        }
        self.models = ModelLookup {
            provider: Some(provider.clone()),
            status: ModelLookupStatus::Loading,
        };
        let base_url = base_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        vec![Effect::FetchModels {
            provider,
            api_key,
            base_url,
        }]
    }

    pub(crate) fn models_fetched(&mut self, provider: String, result: Result<Vec<String>, String>) {
        if self.models.provider.as_deref() != Some(provider.as_str())
            || self.models.status != ModelLookupStatus::Loading
        {
            pilot_debug!("ignoring stale model list for {}", provider);
            return;
        }
        self.models.status = match result {
            Ok(models) if models.is_empty() => ModelLookupStatus::Empty,
            Ok(models) => ModelLookupStatus::Loaded(models),
            Err(detail) => ModelLookupStatus::Failed(detail),
        };
        self.mark_dirty();
    }
}
