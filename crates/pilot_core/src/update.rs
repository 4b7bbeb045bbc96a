use crate::{AppState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    if msg.is_user_action() {
        state.clear_alert();
    }

    let effects = match msg {
        Msg::PromptChanged(prompt) => {
            state.set_prompt(prompt);
            Vec::new()
        }
        Msg::StartClicked => state.start_task(),
        Msg::ReplyChanged(reply) => {
            state.set_reply(reply);
            Vec::new()
        }
        Msg::ConfirmClicked => state.confirm(),
        Msg::StopClicked => state.stop(),
        Msg::SettingChanged(change) => state.apply_setting(change),
        Msg::ModelsRequested {
            provider,
            api_key,
            base_url,
        } => state.request_models(provider, api_key, base_url),
        Msg::ModelsFetched { provider, result } => {
            state.models_fetched(provider, result);
            Vec::new()
        }
        Msg::TaskCreated { attempt, task_id } => state.task_created(attempt, task_id),
        Msg::TaskRejected { attempt, detail } => state.task_rejected(attempt, detail),
        Msg::StreamEvent {
            subscription,
            event,
        } => state.apply_event(subscription, event),
        Msg::StreamFailed {
            subscription,
            message,
        } => {
            state.stream_interrupted(subscription, &message);
            Vec::new()
        }
        Msg::StreamEnded { subscription } => {
            state.stream_interrupted(subscription, "closed by server");
            Vec::new()
        }
        Msg::ActionCompleted {
            action,
            task_id,
            result,
        } => {
            state.action_completed(action, task_id, result);
            Vec::new()
        }
    };

    (state, effects)
}
