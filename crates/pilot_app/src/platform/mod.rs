mod app;
mod cli;
mod commands;
mod effects;
mod logging;
mod persistence;
mod ui;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use pilot_core::Settings;
use pilot_engine::{ApiSettings, ReqwestTaskApi, TaskApi};
use pilot_logging::pilot_info;

pub use cli::{Cli, Command};
use persistence::FileStore;

pub fn run(cli: Cli) -> anyhow::Result<()> {
    logging::initialize(cli.log_file.as_deref());

    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => FileStore::default_dir().unwrap_or_else(|| PathBuf::from(".pilot")),
    };
    let mut store = FileStore::open(config_dir);
    pilot_info!("Settings file {:?}", store.path());

    let connect = || -> anyhow::Result<Arc<dyn TaskApi>> {
        let settings = ApiSettings::new(&cli.server)
            .with_context(|| format!("invalid --server '{}'", cli.server))?;
        let api: Arc<dyn TaskApi> = Arc::new(ReqwestTaskApi::new(settings)?);
        Ok(api)
    };

    let mut out = io::stdout();
    match cli.command {
        Command::Run { prompt } => app::run_task(connect()?, store, prompt.join(" ")),
        Command::Models {
            provider,
            api_key,
            base_url,
        } => commands::list_models(connect()?, &mut store, provider, api_key, base_url, &mut out),
        Command::Task { id } => {
            let language = Settings::load(&store).language;
            commands::show_task(connect()?, &language, id, &mut out)
        }
        Command::Config { action } => commands::config(&mut store, action, &mut out),
    }
}
