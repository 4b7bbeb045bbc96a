use std::io::{self, BufRead, Write};
use std::sync::{mpsc, Arc};
use std::thread;

use anyhow::Context;
use pilot_core::{i18n, update, AppState, Msg, SessionStatus, SettingChange, Settings};
use pilot_engine::TaskApi;
use pilot_logging::{pilot_info, pilot_warn, set_task_context};

use super::effects::{EffectRunner, LoopInput};
use super::persistence::FileStore;
use super::ui;
use super::ui::render::RenderCursor;
use super::ui::surface::Surface;

const HELP: &str = "commands: y | confirm [reply] | stop | lang <en|ru> | quit";

/// One typed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Confirm(Option<String>),
    Stop,
    Language(String),
    Quit,
    Help,
    /// Free text; becomes the reply when the agent is waiting for one.
    Text(String),
}

pub fn parse_command(line: &str) -> Option<ConsoleCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };
    let command = match head.to_ascii_lowercase().as_str() {
        "y" | "yes" if rest.is_empty() => ConsoleCommand::Confirm(None),
        "confirm" | "continue" if rest.is_empty() => ConsoleCommand::Confirm(None),
        "confirm" | "continue" => ConsoleCommand::Confirm(Some(rest.to_string())),
        "stop" if rest.is_empty() => ConsoleCommand::Stop,
        "lang" | "language" if !rest.is_empty() => ConsoleCommand::Language(rest.to_string()),
        "quit" | "exit" | "q" if rest.is_empty() => ConsoleCommand::Quit,
        "help" | "?" => ConsoleCommand::Help,
        _ => ConsoleCommand::Text(line.to_string()),
    };
    Some(command)
}

/// Owns the state machine and applies one message at a time.
struct Console<W: Write> {
    state: AppState,
    store: FileStore,
    runner: EffectRunner,
    surface: Surface,
    cursor: RenderCursor,
    out: W,
}

impl<W: Write> Console<W> {
    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        self.runner.run(effects, &mut self.store);
        if state.consume_dirty() {
            let view = state.view();
            set_task_context(view.task_id.as_deref());
            for command in ui::render::render(&view, &mut self.cursor) {
                if let Some(line) = self.surface.apply(command) {
                    self.print(&line);
                }
            }
        }
        self.state = state;
    }

    fn print(&mut self, line: &str) {
        let _ = writeln!(self.out, "{line}");
        let _ = self.out.flush();
    }

    /// Returns false when the user asked to leave.
    fn handle_line(&mut self, line: &str) -> bool {
        let Some(command) = parse_command(line) else {
            return true;
        };
        match command {
            ConsoleCommand::Confirm(reply) => {
                if let Some(reply) = reply {
                    self.dispatch(Msg::ReplyChanged(reply));
                }
                self.dispatch(Msg::ConfirmClicked);
            }
            ConsoleCommand::Stop => self.dispatch(Msg::StopClicked),
            ConsoleCommand::Language(language) if i18n::is_supported(&language) => {
                self.dispatch(Msg::SettingChanged(SettingChange::Language(language)));
            }
            ConsoleCommand::Language(language) => {
                self.print(&format!(
                    "unsupported language '{language}' (available: {})",
                    i18n::LANGUAGES.join(", ")
                ));
            }
            ConsoleCommand::Quit => return false,
            ConsoleCommand::Help => self.print(HELP),
            ConsoleCommand::Text(text) if self.state.session().awaiting_reply => {
                self.dispatch(Msg::ReplyChanged(text));
                self.dispatch(Msg::ConfirmClicked);
            }
            ConsoleCommand::Text(_) => self.print(HELP),
        }
        true
    }

    fn finished(&self) -> bool {
        self.state.session().status.is_terminal()
    }
}

/// Starts a task and follows it until it reaches a terminal status or the user quits.
pub fn run_task(api: Arc<dyn TaskApi>, store: FileStore, prompt: String) -> anyhow::Result<()> {
    let settings = Settings::load(&store);
    pilot_info!(
        "Session start provider={} language={}",
        settings.provider,
        settings.language
    );

    let (tx, rx) = mpsc::channel::<LoopInput>();
    let runner = EffectRunner::new(api, tx.clone()).context("starting engine")?;

    let mut surface = Surface::new();
    for command in ui::layout::initial_commands(&settings.language) {
        surface.apply(command);
    }

    let mut console = Console {
        state: AppState::with_settings(settings),
        store,
        runner,
        surface,
        cursor: RenderCursor::default(),
        out: io::stdout(),
    };

    spawn_stdin_reader(tx);

    console.dispatch(Msg::PromptChanged(prompt));
    console.dispatch(Msg::StartClicked);
    if console.state.session().status == SessionStatus::Idle {
        let reason = console.state.view().alert.unwrap_or_default();
        anyhow::bail!("task not started: {reason}");
    }

    while !console.finished() {
        let Ok(input) = rx.recv() else {
            pilot_warn!("Message queue closed; leaving");
            break;
        };
        match input {
            LoopInput::Msg(msg) => console.dispatch(msg),
            LoopInput::Line(line) => {
                if !console.handle_line(&line) {
                    break;
                }
            }
            LoopInput::InputClosed => pilot_info!("stdin closed; following the task to the end"),
        }
    }

    set_task_context(None);
    Ok(())
}

fn spawn_stdin_reader(tx: mpsc::Sender<LoopInput>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(LoopInput::Line(line)).is_err() {
                return;
            }
        }
        let _ = tx.send(LoopInput::InputClosed);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn console_commands() {
        assert_eq!(parse_command("  "), None);
        assert_eq!(parse_command("y"), Some(ConsoleCommand::Confirm(None)));
        assert_eq!(parse_command("Confirm"), Some(ConsoleCommand::Confirm(None)));
        assert_eq!(
            parse_command("confirm  Friday 19:00 "),
            Some(ConsoleCommand::Confirm(Some("Friday 19:00".into())))
        );
        assert_eq!(parse_command("stop"), Some(ConsoleCommand::Stop));
        assert_eq!(
            parse_command("lang ru"),
            Some(ConsoleCommand::Language("ru".into()))
        );
        assert_eq!(parse_command("quit"), Some(ConsoleCommand::Quit));
        assert_eq!(
            parse_command("yes please, pay"),
            Some(ConsoleCommand::Text("yes please, pay".into()))
        );
        assert_eq!(
            parse_command("stop after checkout"),
            Some(ConsoleCommand::Text("stop after checkout".into()))
        );
    }
}
