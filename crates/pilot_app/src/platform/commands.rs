use std::io::Write;
use std::sync::{mpsc, Arc};

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use pilot_core::{
    i18n, update, ApiKey, AppState, KeyValueStore, Msg, Settings, KEY_BROWSER_ONLY, KEY_LANGUAGE,
    KEY_PROVIDER, KEY_SAFE_MODE, KEY_SEARCH_ENGINE, KEY_THEME,
};
use pilot_engine::{ChannelEventSink, EngineEvent, EngineHandle, TaskApi, TaskSnapshot};

use super::cli::ConfigAction;
use super::effects::{EffectRunner, LoopInput};
use super::persistence::FileStore;

/// Runs a model lookup through the state machine and prints the result.
pub fn list_models(
    api: Arc<dyn TaskApi>,
    store: &mut FileStore,
    provider: String,
    api_key: String,
    base_url: Option<String>,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let settings = Settings::load(&*store);
    let stored = settings.model_for(&provider).map(ToOwned::to_owned);

    let (tx, rx) = mpsc::channel();
    let runner = EffectRunner::new(api, tx).context("starting engine")?;
    let (mut state, effects) = update(
        AppState::with_settings(settings),
        Msg::ModelsRequested {
            provider: provider.clone(),
            api_key: ApiKey::new(api_key),
            base_url,
        },
    );
    let waiting = !effects.is_empty();
    runner.run(effects, store);

    while waiting {
        let input = rx.recv().context("engine stopped before answering")?;
        if let LoopInput::Msg(msg @ Msg::ModelsFetched { .. }) = input {
            state = update(state, msg).0;
            break;
        }
    }

    let view = state.view().models;
    if view.models.is_empty() {
        bail!("{}", view.message.unwrap_or_default());
    }
    for model in &view.models {
        let marker = if stored.as_deref() == Some(model.as_str()) {
            "*"
        } else {
            " "
        };
        writeln!(out, "{marker} {model}")?;
    }
    Ok(())
}

pub fn show_task(
    api: Arc<dyn TaskApi>,
    language: &str,
    task_id: String,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let (tx, rx) = mpsc::channel();
    let engine =
        EngineHandle::new(api, Arc::new(ChannelEventSink::new(tx))).context("starting engine")?;
    engine.fetch_task(task_id);

    loop {
        match rx.recv().context("engine stopped before answering")? {
            EngineEvent::TaskFetched { result, .. } => {
                let snapshot = result?;
                return write_snapshot(&snapshot, language, out);
            }
            _ => continue,
        }
    }
}

fn write_snapshot(snapshot: &TaskSnapshot, language: &str, out: &mut dyn Write) -> anyhow::Result<()> {
    writeln!(out, "task:    {}", snapshot.task_id)?;
    writeln!(
        out,
        "status:  {} ({})",
        i18n::status_label(language, &snapshot.status),
        snapshot.status
    )?;
    writeln!(out, "prompt:  {}", snapshot.prompt)?;
    if let Some(result) = snapshot.result.as_deref().filter(|text| !text.is_empty()) {
        writeln!(out, "result:  {result}")?;
    }
    if let Some(updated) = snapshot.updated_at.and_then(format_timestamp) {
        writeln!(out, "updated: {updated}")?;
    }
    Ok(())
}

/// Seconds since the epoch as a UTC wall-clock time.
pub fn format_timestamp(seconds: f64) -> Option<String> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9).round().min(999_999_999.0) as u32;
    let time: DateTime<Utc> = DateTime::from_timestamp(whole as i64, nanos)?;
    Some(time.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}

pub fn config(store: &mut FileStore, action: ConfigAction, out: &mut dyn Write) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => match store.get(&key) {
            Some(value) => writeln!(out, "{value}")?,
            None => bail!("'{key}' is not set"),
        },
        ConfigAction::Set { key, value } => {
            validate_setting(&key, &value)?;
            store.set(&key, &value);
        }
        ConfigAction::List => {
            for (key, value) in store.entries() {
                writeln!(out, "{key} = {value}")?;
            }
        }
        ConfigAction::Path => writeln!(out, "{}", store.path().display())?,
    }
    Ok(())
}

fn validate_setting(key: &str, value: &str) -> anyhow::Result<()> {
    match key {
        KEY_SAFE_MODE | KEY_BROWSER_ONLY if value != "true" && value != "false" => {
            bail!("'{key}' takes true or false")
        }
        KEY_LANGUAGE if !i18n::is_supported(value) => {
            bail!(
                "unsupported language '{value}' (available: {})",
                i18n::LANGUAGES.join(", ")
            )
        }
        KEY_THEME if value != "light" && value != "dark" => bail!("'{key}' takes light or dark"),
        KEY_SAFE_MODE | KEY_BROWSER_ONLY | KEY_LANGUAGE | KEY_THEME | KEY_PROVIDER
        | KEY_SEARCH_ENGINE => Ok(()),
        _ if key.strip_prefix("model_").is_some_and(|provider| !provider.is_empty()) => Ok(()),
        _ => bail!("unknown setting '{key}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn timestamps_render_in_utc() {
        assert_eq!(
            format_timestamp(1_700_000_000.5).as_deref(),
            Some("2023-11-14 22:13:20 UTC")
        );
        assert_eq!(format_timestamp(f64::NAN), None);
    }

    #[test]
    fn snapshot_lines_use_localized_status() {
        let snapshot = TaskSnapshot {
            task_id: "abc".into(),
            prompt: "find flights".into(),
            status: "waiting_confirm".into(),
            result: None,
            updated_at: None,
        };
        let mut out = Vec::new();
        write_snapshot(&snapshot, "en", &mut out).expect("write");
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(
            text,
            "task:    abc\nstatus:  Waiting for confirmation (waiting_confirm)\nprompt:  find flights\n"
        );
    }

    #[test]
    fn config_set_validates_keys_and_values() {
        let root = tempfile::tempdir().expect("tempdir");
        let mut store = FileStore::open(root.path().to_path_buf());
        let mut out = Vec::new();

        let set = |key: &str, value: &str| ConfigAction::Set {
            key: key.into(),
            value: value.into(),
        };
        assert!(config(&mut store, set("safe_mode", "maybe"), &mut out).is_err());
        assert!(config(&mut store, set("language", "xx"), &mut out).is_err());
        assert!(config(&mut store, set("colour", "blue"), &mut out).is_err());
        assert!(config(&mut store, set("model_", "x"), &mut out).is_err());

        config(&mut store, set("model_gemini", "gemini-2.0-flash"), &mut out).expect("set");
        config(&mut store, set("safe_mode", "false"), &mut out).expect("set");
        config(&mut store, ConfigAction::List, &mut out).expect("list");
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "model_gemini = gemini-2.0-flash\nsafe_mode = false\n"
        );
    }
}
