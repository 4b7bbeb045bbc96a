use crate::{ApiKey, StartAttempt, SubscriptionId, TaskId, TaskRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Issue `POST /tasks`; the reply comes back as `TaskCreated`/`TaskRejected`.
    CreateTask {
        attempt: StartAttempt,
        request: TaskRequest,
    },
    OpenStream {
        subscription: SubscriptionId,
        task_id: TaskId,
    },
    /// Closing an unknown or already-closed subscription is a no-op.
    CloseStream { subscription: SubscriptionId },
    SubmitConfirm {
        task_id: TaskId,
        response: Option<String>,
    },
    SubmitStop { task_id: TaskId },
    FetchModels {
        provider: String,
        api_key: ApiKey,
        base_url: Option<String>,
    },
    PersistSetting { key: String, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    Confirm,
    Stop,
}
