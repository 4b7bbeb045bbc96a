use pilot_core::AppViewModel;

use super::constants::*;
use super::surface::UiCommand;

/// What has already been pushed to the surface.
#[derive(Debug, Default)]
pub struct RenderCursor {
    language: Option<String>,
    log_generation: Option<u64>,
    last_seq: Option<u64>,
}

pub fn render(view: &AppViewModel, cursor: &mut RenderCursor) -> Vec<UiCommand> {
    let mut cmds = Vec::new();

    if cursor.language.as_deref() != Some(view.language.as_str()) {
        cmds.push(UiCommand::Localize {
            language: view.language.clone(),
        });
        cursor.language = Some(view.language.clone());
    }

    cmds.push(UiCommand::SetText {
        control_id: LABEL_STATUS,
        text: view.status_text.clone(),
    });
    cmds.push(UiCommand::SetEnabled {
        control_id: BUTTON_START,
        enabled: view.controls.start,
    });
    cmds.push(UiCommand::SetEnabled {
        control_id: BUTTON_CONFIRM,
        enabled: view.controls.confirm,
    });
    cmds.push(UiCommand::SetEnabled {
        control_id: BUTTON_STOP,
        enabled: view.controls.stop,
    });
    cmds.push(UiCommand::SetVisible {
        control_id: INPUT_REPLY,
        visible: view.controls.reply_visible,
    });
    cmds.push(UiCommand::SetText {
        control_id: INPUT_PROMPT,
        text: view.prompt_input.clone(),
    });
    cmds.push(UiCommand::SetText {
        control_id: INPUT_REPLY,
        text: view.reply_input.clone(),
    });
    cmds.push(UiCommand::SetText {
        control_id: LABEL_ALERT,
        text: view.alert.clone().unwrap_or_default(),
    });

    if cursor.log_generation != Some(view.log_generation) {
        cmds.push(UiCommand::ClearLog {
            control_id: LIST_LOG,
        });
        cursor.log_generation = Some(view.log_generation);
        cursor.last_seq = None;
    }
    for entry in &view.log {
        if cursor.last_seq.is_some_and(|last| entry.seq <= last) {
            continue;
        }
        cmds.push(UiCommand::AppendLog {
            control_id: LIST_LOG,
            entry: entry.clone(),
        });
        cursor.last_seq = Some(entry.seq);
    }

    cmds
}
