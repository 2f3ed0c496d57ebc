use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use quizr::{
    app::{App, AppSettings, Flow},
    app_dirs::AppDirs,
    bank::QuestionBank,
    config::{Config, ConfigStore, FileConfigStore, Overrides},
    export::ExportFormat,
    logging,
    runtime::{spawn_bank_loader, CrosstermEventSource, FixedTicker, Runner},
    ui::screen,
};

/// terminal multiple-choice quiz runner
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Run a timed multiple-choice quiz in the terminal, see an explanation after every answer, then redo or export the questions you missed."
)]
pub struct Cli {
    /// question bank file (JSON)
    bank: Option<PathBuf>,

    /// use one of the bundled question banks instead of a file
    #[clap(short = 'b', long = "bundled", conflicts_with = "bank")]
    bundled: Option<String>,

    /// list the bundled question banks and exit
    #[clap(long)]
    list_banks: bool,

    /// shuffle the question order
    #[clap(short = 's', long)]
    shuffle: bool,

    /// format used when exporting mistakes
    #[clap(short = 'e', long, value_enum)]
    export_format: Option<ExportFormat>,

    /// directory exported mistakes are written to
    #[clap(short = 'o', long)]
    export_dir: Option<PathBuf>,

    /// clock refresh interval in milliseconds
    #[clap(long = "tick-ms")]
    tick_ms: Option<u64>,

    /// log level for the log file (RUST_LOG wins when set)
    #[clap(long)]
    log_level: Option<String>,

    /// directory for log files
    #[clap(long)]
    log_dir: Option<PathBuf>,

    /// persist the effective settings as the new defaults
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            bank: self.bank.clone(),
            bundled_bank: self.bundled.clone(),
            shuffle: self.shuffle,
            export_format: self.export_format,
            export_dir: self.export_dir.clone(),
            tick_rate_ms: self.tick_ms,
            log_level: self.log_level.clone(),
        }
    }
}

fn settings(config: &Config) -> AppSettings {
    AppSettings {
        shuffle: config.shuffle,
        export_format: config.export_format,
        export_dir: config.resolved_export_dir(),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if cli.list_banks {
        for name in QuestionBank::bundled_names() {
            println!("{name}");
        }
        return Ok(());
    }

    let store = FileConfigStore::new();
    let config = store.load().with_overrides(&cli.overrides());
    if cli.save_config {
        store.save(&config)?;
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let log_dir = cli.log_dir.clone().unwrap_or_else(AppDirs::log_dir);
    let _log_guard = logging::init(&log_dir, &config.log_level)?;
    tracing::info!(source = %config.bank_source(), "starting quizr");

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &config);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        tracing::error!("quizr exited with an error: {e}");
    }
    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, config: &Config) -> Result<(), Box<dyn Error>> {
    let events = CrosstermEventSource::new();
    spawn_bank_loader(config.bank_source(), events.sender());

    let ticker = FixedTicker::new(Duration::from_millis(config.tick_rate_ms()));
    let runner = Runner::new(events, ticker);
    let mut app = App::new(settings(config));

    loop {
        terminal.draw(|f| screen::draw(&app, f))?;

        if app.handle_event(runner.step()) == Flow::Quit {
            tracing::info!("quit requested");
            break;
        }
    }

    Ok(())
}
