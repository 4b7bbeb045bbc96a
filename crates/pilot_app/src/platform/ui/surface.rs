//! Headless model of the console's controls.
//!
//! The render step drives it with `UiCommand`s. `apply` returns a line for
//! the terminal when a change is worth showing to the user.

use std::collections::BTreeMap;

use pilot_core::{i18n, LogEntry, LogLevel};

use super::constants::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Label,
    Input,
    Button,
    Select,
    LogList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    CreateControl {
        control_id: ControlId,
        kind: ControlKind,
        text_key: Option<&'static str>,
        placeholder_key: Option<&'static str>,
        tooltip_key: Option<&'static str>,
    },
    SetText {
        control_id: ControlId,
        text: String,
    },
    SetEnabled {
        control_id: ControlId,
        enabled: bool,
    },
    SetVisible {
        control_id: ControlId,
        visible: bool,
    },
    ClearLog {
        control_id: ControlId,
    },
    AppendLog {
        control_id: ControlId,
        entry: LogEntry,
    },
    /// Re-resolve every keyed text, placeholder and tooltip.
    Localize {
        language: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub kind: ControlKind,
    pub text: String,
    pub placeholder: Option<String>,
    pub tooltip: Option<String>,
    pub enabled: bool,
    pub visible: bool,
    text_key: Option<&'static str>,
    placeholder_key: Option<&'static str>,
    tooltip_key: Option<&'static str>,
}

#[derive(Debug, Default)]
pub struct Surface {
    elements: BTreeMap<ControlId, Element>,
    log: Vec<LogEntry>,
    language: String,
}

impl Surface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn element(&self, control_id: ControlId) -> Option<&Element> {
        self.elements.get(&control_id)
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn apply(&mut self, command: UiCommand) -> Option<String> {
        match command {
            UiCommand::CreateControl {
                control_id,
                kind,
                text_key,
                placeholder_key,
                tooltip_key,
            } => {
                self.elements.insert(
                    control_id,
                    Element {
                        kind,
                        text: String::new(),
                        placeholder: None,
                        tooltip: None,
                        enabled: true,
                        visible: true,
                        text_key,
                        placeholder_key,
                        tooltip_key,
                    },
                );
                None
            }
            UiCommand::SetText { control_id, text } => self.set_text(control_id, text),
            UiCommand::SetEnabled {
                control_id,
                enabled,
            } => {
                let element = self.elements.get_mut(&control_id)?;
                let armed = enabled && !element.enabled;
                element.enabled = enabled;
                if armed && control_id == BUTTON_CONFIRM {
                    let tooltip = element.tooltip.as_deref().unwrap_or_default();
                    return Some(format!("[{}] {}", element.text, tooltip));
                }
                None
            }
            UiCommand::SetVisible {
                control_id,
                visible,
            } => {
                let element = self.elements.get_mut(&control_id)?;
                let shown = visible && !element.visible;
                element.visible = visible;
                if shown && control_id == INPUT_REPLY {
                    return element
                        .placeholder
                        .as_ref()
                        .map(|placeholder| format!("> {placeholder}"));
                }
                None
            }
            UiCommand::ClearLog { .. } => {
                self.log.clear();
                None
            }
            UiCommand::AppendLog { entry, .. } => {
                let line = format_entry(&entry);
                self.log.push(entry);
                Some(line)
            }
            UiCommand::Localize { language } => {
                self.localize(&language);
                None
            }
        }
    }

    /// Applies the language to every keyed element. Repeating it changes nothing.
    pub fn localize(&mut self, language: &str) {
        for element in self.elements.values_mut() {
            if let Some(key) = element.text_key {
                element.text = i18n::resolve(language, key).to_string();
            }
            if let Some(key) = element.placeholder_key {
                element.placeholder = Some(i18n::resolve(language, key).to_string());
            }
            if let Some(key) = element.tooltip_key {
                element.tooltip = Some(i18n::resolve(language, key).to_string());
            }
        }
        self.language = language.to_string();
    }

    fn set_text(&mut self, control_id: ControlId, text: String) -> Option<String> {
        let element = self.elements.get_mut(&control_id)?;
        if element.text == text {
            return None;
        }
        element.text = text;
        match control_id {
            LABEL_STATUS => {
                let caption = self
                    .elements
                    .get(&LABEL_STATUS_CAPTION)
                    .map(|caption| caption.text.as_str())
                    .unwrap_or_default();
                let status = &self.elements.get(&LABEL_STATUS)?.text;
                Some(format!("{caption}: {status}"))
            }
            LABEL_ALERT if !self.elements.get(&LABEL_ALERT)?.text.is_empty() => {
                Some(format!("! {}", self.elements.get(&LABEL_ALERT)?.text))
            }
            _ => None,
        }
    }
}

fn format_entry(entry: &LogEntry) -> String {
    let marker = match entry.level {
        LogLevel::Info => "  ",
        LogLevel::Attention => "? ",
        LogLevel::Result => "= ",
        LogLevel::Error => "x ",
    };
    format!("{marker}{}", entry.text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::ui::layout::initial_commands;
    use pretty_assertions::assert_eq;

    fn surface(language: &str) -> Surface {
        let mut surface = Surface::new();
        for command in initial_commands(language) {
            surface.apply(command);
        }
        surface
    }

    fn keyed_texts(surface: &Surface) -> Vec<(String, Option<String>, Option<String>)> {
        [
            LABEL_TITLE,
            INPUT_PROMPT,
            BUTTON_START,
            BUTTON_CONFIRM,
            BUTTON_STOP,
            INPUT_REPLY,
            SELECT_LANGUAGE,
            LABEL_STATUS_CAPTION,
            LABEL_LOG_CAPTION,
        ]
        .iter()
        .map(|id| {
            let element = surface.element(*id).expect("created");
            (
                element.text.clone(),
                element.placeholder.clone(),
                element.tooltip.clone(),
            )
        })
        .collect()
    }

    #[test]
    fn language_toggle_updates_every_tagged_element() {
        let mut surface = surface("en");
        let english = keyed_texts(&surface);
        assert_eq!(surface.element(BUTTON_START).map(|e| e.text.as_str()), Some("Start"));
        assert_eq!(
            surface
                .element(INPUT_PROMPT)
                .and_then(|e| e.placeholder.as_deref()),
            Some("Describe the task for the agent")
        );

        surface.localize("ru");
        let russian = keyed_texts(&surface);
        for (en, ru) in english.iter().zip(&russian) {
            assert_ne!(en, ru);
        }
        assert_eq!(
            surface.element(BUTTON_START).map(|e| e.text.as_str()),
            Some(i18n::resolve("ru", "ui.start"))
        );

        surface.localize("ru");
        assert_eq!(keyed_texts(&surface), russian);

        surface.localize("en");
        assert_eq!(keyed_texts(&surface), english);
        assert_eq!(surface.language(), "en");
    }

    #[test]
    fn unkeyed_elements_keep_their_text() {
        let mut surface = surface("en");
        surface.apply(UiCommand::SetText {
            control_id: LABEL_STATUS,
            text: "Running".into(),
        });
        surface.localize("ru");
        assert_eq!(
            surface.element(LABEL_STATUS).map(|e| e.text.as_str()),
            Some("Running")
        );
    }

    #[test]
    fn echo_lines_follow_visible_changes() {
        let mut surface = surface("en");
        surface.apply(UiCommand::SetEnabled {
            control_id: BUTTON_CONFIRM,
            enabled: false,
        });

        let status = surface.apply(UiCommand::SetText {
            control_id: LABEL_STATUS,
            text: "Running".into(),
        });
        assert_eq!(status.as_deref(), Some("Status: Running"));
        let repeated = surface.apply(UiCommand::SetText {
            control_id: LABEL_STATUS,
            text: "Running".into(),
        });
        assert_eq!(repeated, None);

        let armed = surface.apply(UiCommand::SetEnabled {
            control_id: BUTTON_CONFIRM,
            enabled: true,
        });
        assert_eq!(
            armed.as_deref(),
            Some("[Continue] Approve the pending action and continue")
        );

        let line = surface.apply(UiCommand::AppendLog {
            control_id: LIST_LOG,
            entry: LogEntry {
                seq: 0,
                level: LogLevel::Error,
                text: "Event stream error".into(),
            },
        });
        assert_eq!(line.as_deref(), Some("x Event stream error"));
        assert_eq!(surface.log().len(), 1);

        surface.apply(UiCommand::ClearLog {
            control_id: LIST_LOG,
        });
        assert!(surface.log().is_empty());
    }
}
