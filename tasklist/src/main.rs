//! `Tasklist`: terminal task tracker with local persistence.
//!
//! Launches the TUI, or runs a single subcommand and exits. Configuration
//! via CLI flags, environment variables, or config file
//! (`~/.config/tasklist/config.toml`).
//!
//! ```bash
//! # Interactive UI
//! cargo run --bin tasklist
//!
//! # One-shot commands
//! cargo run --bin tasklist -- add "Write report" --priority high
//! cargo run --bin tasklist -- list --filter active
//!
//! # Keep data somewhere else
//! TASKLIST_DATA_DIR=/tmp/tasks cargo run --bin tasklist
//! ```

use std::io;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing_appender::non_blocking::WorkerGuard;

use tasklist::app::App;
use tasklist::cli::run_command;
use tasklist::config::{CliArgs, TasklistConfig};
use tasklist::storage::FileStore;
use tasklist::tasks::{TaskPersistence, TaskStore};
use tasklist::ui;

fn main() -> io::Result<ExitCode> {
    let mut cli = CliArgs::parse();

    // Load and resolve configuration (CLI args > env > config file > defaults).
    // A broken config file is skipped; CLI args and env vars still apply.
    let (config, config_error) = TasklistConfig::load_or_cli_only(&cli);
    if let Some(e) = &config_error {
        eprintln!("Warning: failed to load config file: {e}");
    }

    // Initialize logging before terminal setup (logs go to file, not stdout).
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!(data_dir = %config.data_dir.display(), "tasklist starting");
    if let Some(e) = &config_error {
        tracing::warn!(error = %e, "config file ignored");
    }

    let mut store = TaskStore::load(TaskPersistence::new(config.file_store()));

    if let Some(command) = cli.command.take() {
        let succeeded = run_command(
            &mut store,
            command,
            &config.timestamp_format,
            &mut io::stdout().lock(),
            &mut io::stderr().lock(),
        )?;
        tracing::info!(succeeded, "tasklist command finished");
        return Ok(if succeeded {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    // Restore the terminal if anything panics while it is in raw mode.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        tracing::error!(panic = %info, "tasklist panicked");
        default_hook(info);
    }));

    // Set up terminal.
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app.
    let result = run_app(&mut terminal, store, &config);

    // Restore terminal.
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    tracing::info!("tasklist exiting");
    result.map(|()| ExitCode::SUCCESS)
}

/// Initialize file-based logging.
///
/// Logs are written to a file (never stdout, since ratatui owns the terminal).
/// Returns a [`WorkerGuard`] that must be held until shutdown to ensure all
/// buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("tasklist.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Main application loop.
fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    store: TaskStore<FileStore>,
    config: &TasklistConfig,
) -> io::Result<()> {
    let mut app = App::new(store)
        .with_notice_ticks(config.notice_ticks)
        .with_max_text_len(config.max_text_len)
        .with_timestamp_format(config.timestamp_format.clone());

    loop {
        terminal.draw(|frame| ui::draw(frame, &app))?;

        app.tick();

        if event::poll(config.poll_timeout)?
            && let Event::Key(key) = event::read()?
        {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            app.handle_key_event(key);
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
