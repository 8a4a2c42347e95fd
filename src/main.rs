use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use purpleglass_core::{ChatMode, Config, FileStore, KeyValueStore, MemoryStore};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "purpleglass")]
#[command(about = "A glossy terminal chat widget with canned replies", version)]
struct Cli {
    /// Composer and replies only: no themes, settings or sign-in
    #[arg(long)]
    classic: bool,
    /// Keep preferences in memory for this run only
    #[arg(long, conflicts_with = "storage")]
    ephemeral: bool,
    /// Preference storage file
    #[arg(long, value_name = "PATH")]
    storage: Option<PathBuf>,
    /// Config file (defaults to the user config directory)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn init_logging() -> tracing_appender::non_blocking::WorkerGuard {
    let log_dir = std::env::var("PURPLEGLASS_LOG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| std::env::temp_dir());
    let file_appender = tracing_appender::rolling::never(&log_dir, "purpleglass.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("PURPLEGLASS_LOG")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| "purpleglass=debug,purpleglass_core=debug,warn".into()),
        )
        // The terminal belongs to the UI, so only the file gets logs
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    info!("logging to {}", log_dir.join("purpleglass.log").display());
    guard
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::load().context("failed to load config")?,
    };

    if cli.classic {
        config.mode = ChatMode::Classic;
    }
    if let Some(path) = &cli.storage {
        config.storage_path = Some(path.clone());
    }
    Ok(config)
}

fn open_store(cli: &Cli, config: &Config) -> Result<Box<dyn KeyValueStore>> {
    if cli.ephemeral {
        return Ok(Box::new(MemoryStore::new()));
    }
    let store = match &config.storage_path {
        Some(path) => FileStore::open(path),
        None => FileStore::open_default().context("failed to locate preference storage")?,
    };
    info!(path = %store.path().display(), "using preference storage");
    Ok(Box::new(store))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging();

    let config = load_config(&cli)?;
    let store = open_store(&cli, &config)?;

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut events = EventHandler::new(Duration::from_millis(config.tick_ms));
    let mut app = App::new(&config, store, events.reply_sender());

    let result = run(&mut terminal, &mut app, &mut events).await;

    app.chat.shutdown();
    tui::restore()?;
    info!("bye");
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }
    }
    Ok(())
}
