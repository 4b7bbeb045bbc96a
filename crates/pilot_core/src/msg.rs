use crate::{ApiKey, PendingAction, SettingChange, StartAttempt, SubscriptionId, TaskEvent, TaskId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the task prompt.
    PromptChanged(String),
    /// User submitted the prompt.
    StartClicked,
    /// User edited the reply box.
    ReplyChanged(String),
    /// User clicked Continue.
    ConfirmClicked,
    /// User clicked Stop.
    StopClicked,
    /// User changed a persisted preference.
    SettingChanged(SettingChange),
    /// User asked for the model list of a provider.
    ModelsRequested {
        provider: String,
        api_key: ApiKey,
        base_url: Option<String>,
    },
    /// Model lookup finished.
    ModelsFetched {
        provider: String,
        result: Result<Vec<String>, String>,
    },
    /// Backend accepted a task.
    TaskCreated { attempt: StartAttempt, task_id: TaskId },
    /// Backend refused a task (detail or transport status text).
    TaskRejected { attempt: StartAttempt, detail: String },
    /// One event arrived on a subscription.
    StreamEvent {
        subscription: SubscriptionId,
        event: TaskEvent,
    },
    /// The push channel failed at the transport level.
    StreamFailed {
        subscription: SubscriptionId,
        message: String,
    },
    /// The push channel was closed by the server or network.
    StreamEnded { subscription: SubscriptionId },
    /// A confirm/stop request finished sending.
    ActionCompleted {
        action: PendingAction,
        task_id: TaskId,
        result: Result<(), String>,
    },
}

impl Msg {
    pub(crate) fn is_user_action(&self) -> bool {
        matches!(
            self,
            Msg::PromptChanged(_)
                | Msg::StartClicked
                | Msg::ReplyChanged(_)
                | Msg::ConfirmClicked
                | Msg::StopClicked
                | Msg::SettingChanged(_)
                | Msg::ModelsRequested { .. }
        )
    }
}
