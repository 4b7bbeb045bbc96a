use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:8000";

/// Pilot - drive browser-agent tasks from the terminal
#[derive(Parser, Debug)]
#[command(name = "pilot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the task backend
    #[arg(long, global = true, default_value = DEFAULT_SERVER)]
    pub server: String,

    /// Also write info-level logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Directory holding settings.ron (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a task and follow it until it finishes
    Run {
        /// Task description; words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },
    /// List the models a provider offers for an API key
    Models {
        /// Provider name (openai, anthropic, gemini, ollama)
        provider: String,

        /// API key for the provider; used for this lookup only
        #[arg(long)]
        api_key: String,

        /// Custom endpoint for the provider
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Show the server's view of a task
    Task {
        /// Task id returned when the task was started
        id: String,
    },
    /// Read or change persisted preferences
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print one value
    Get { key: String },
    /// Store one value
    Set { key: String, value: String },
    /// Print every stored value
    List,
    /// Print the settings file location
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_joins_prompt_words_and_keeps_global_flags() {
        let cli = Cli::try_parse_from([
            "pilot",
            "run",
            "--server",
            "http://agent:9000",
            "find",
            "cheap",
            "flights",
        ])
        .expect("parse");
        assert_eq!(cli.server, "http://agent:9000");
        match cli.command {
            Command::Run { prompt } => assert_eq!(prompt.join(" "), "find cheap flights"),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn models_requires_api_key() {
        assert!(Cli::try_parse_from(["pilot", "models", "openai"]).is_err());
        let cli = Cli::try_parse_from(["pilot", "models", "ollama", "--api-key", "x"])
            .expect("parse");
        assert_eq!(cli.server, DEFAULT_SERVER);
        assert!(matches!(
            cli.command,
            Command::Models { base_url: None, .. }
        ));
    }
}
