use super::constants::*;
use super::surface::{ControlKind, UiCommand};

fn create(
    control_id: ControlId,
    kind: ControlKind,
    text_key: Option<&'static str>,
    placeholder_key: Option<&'static str>,
    tooltip_key: Option<&'static str>,
) -> UiCommand {
    UiCommand::CreateControl {
        control_id,
        kind,
        text_key,
        placeholder_key,
        tooltip_key,
    }
}

/// Controls of the console, tagged with the text keys localization resolves.
pub fn initial_commands(language: &str) -> Vec<UiCommand> {
    vec![
        create(LABEL_TITLE, ControlKind::Label, Some("ui.title"), None, None),
        create(
            INPUT_PROMPT,
            ControlKind::Input,
            None,
            Some("ui.prompt.placeholder"),
            None,
        ),
        create(
            BUTTON_START,
            ControlKind::Button,
            Some("ui.start"),
            None,
            Some("ui.start.tooltip"),
        ),
        create(
            BUTTON_CONFIRM,
            ControlKind::Button,
            Some("ui.confirm"),
            None,
            Some("ui.confirm.tooltip"),
        ),
        create(
            BUTTON_STOP,
            ControlKind::Button,
            Some("ui.stop"),
            None,
            Some("ui.stop.tooltip"),
        ),
        create(
            INPUT_REPLY,
            ControlKind::Input,
            None,
            Some("ui.reply.placeholder"),
            None,
        ),
        create(
            SELECT_LANGUAGE,
            ControlKind::Select,
            Some("ui.language"),
            None,
            Some("ui.language.tooltip"),
        ),
        create(
            LABEL_STATUS_CAPTION,
            ControlKind::Label,
            Some("ui.status"),
            None,
            None,
        ),
        create(LABEL_STATUS, ControlKind::Label, None, None, None),
        create(LABEL_LOG_CAPTION, ControlKind::Label, Some("ui.log"), None, None),
        create(LIST_LOG, ControlKind::LogList, None, None, None),
        create(LABEL_ALERT, ControlKind::Label, None, None, None),
        UiCommand::Localize {
            language: language.to_string(),
        },
    ]
}
