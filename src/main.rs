#![cfg_attr(test, allow(dead_code))]

mod app;
mod config;
mod constants;
mod error;
mod event;
mod game;
mod session;
mod ui;
mod worker;

use clap::Parser;
use std::path::PathBuf;

use crate::config::EngineConfig;
use crate::game::evaluation::Evaluator;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable the Text-based User Interface (TUI)
    #[arg(long)]
    tui: bool,

    /// JSON engine configuration; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start (and restart) from this position instead of the initial layout
    #[arg(long)]
    fen: Option<String>,

    #[arg(long)]
    white_depth: Option<u8>,

    #[arg(long)]
    black_depth: Option<u8>,

    #[arg(long, value_enum)]
    white_eval: Option<Evaluator>,

    #[arg(long, value_enum)]
    black_eval: Option<Evaluator>,

    /// Let the engine play White in the TUI
    #[arg(long)]
    white_ai: bool,

    /// Delay before each AI move, in milliseconds
    #[arg(long)]
    pacing_ms: Option<u64>,

    /// Headless mode stops after this many half-moves
    #[arg(long, default_value_t = 300)]
    max_plies: usize,

    /// Write the effective engine configuration to this file and exit
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Log file used in TUI mode
    #[arg(long, default_value = "minimax-chess.log")]
    log_file: PathBuf,
}

impl Args {
    fn engine_config(&self) -> Result<EngineConfig, error::ConfigError> {
        let mut config = match &self.config {
            Some(path) => config::load(path)?,
            None => EngineConfig::default(),
        };
        if let Some(depth) = self.white_depth {
            config.white.search_depth = config::validate_depth(depth)?;
        }
        if let Some(depth) = self.black_depth {
            config.black.search_depth = config::validate_depth(depth)?;
        }
        if let Some(evaluator) = self.white_eval {
            config.white.evaluator = evaluator;
        }
        if let Some(evaluator) = self.black_eval {
            config.black.evaluator = evaluator;
        }
        if let Some(pacing_ms) = self.pacing_ms {
            config.pacing_ms = pacing_ms;
        }
        // Headless play has no human seat.
        config.white_ai_enabled |= self.white_ai || !self.tui;
        Ok(config)
    }
}

fn init_tracing(log_file: Option<&PathBuf>) -> std::io::Result<()> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn restore_terminal() -> std::io::Result<()> {
    use crossterm::{
        event::DisableMouseCapture,
        execute,
        terminal::{disable_raw_mode, LeaveAlternateScreen},
    };

    disable_raw_mode()?;
    execute!(std::io::stdout(), LeaveAlternateScreen, DisableMouseCapture)
}

#[cfg(not(test))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use crate::app::App;
    use crate::game::Game;
    use crate::session::Session;
    use crossterm::{
        execute,
        terminal::{enable_raw_mode, EnterAlternateScreen},
    };
    use ratatui::{prelude::CrosstermBackend, Terminal};
    use std::panic;
    use std::process;

    let args = Args::parse();
    init_tracing(args.tui.then_some(&args.log_file))?;

    let tui = args.tui;
    let previous_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        if tui {
            let _ = restore_terminal();
        }
        tracing_panic::panic_hook(info);
        previous_hook(info);
    }));

    let engine_config = args.engine_config()?;
    if let Some(path) = &args.save_config {
        config::save(path, &engine_config)?;
        println!("Configuration written to {}", path.display());
        return Ok(());
    }
    let game = match &args.fen {
        Some(fen) => Game::from_fen(fen)?,
        None => Game::new(),
    };
    tracing::info!(?engine_config, fen = %game.fen(), tui, "starting session");
    let mut session = Session::with_game(game, &engine_config)?;

    if tui {
        enable_raw_mode()?;
        execute!(std::io::stdout(), EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(std::io::stdout()))?;
        let mut app = App::new(session);
        let res = app.run(&mut terminal);

        restore_terminal()?;
        terminal.show_cursor()?;

        if let Err(err) = res {
            println!("{err:?}");
            process::exit(1);
        }
    } else {
        println!("Running in headless mode. Use --tui to show the interface.");
        app::run_headless(&mut session, args.max_plies)?;
    }

    Ok(())
}
