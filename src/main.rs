//! tessel - side-by-side framed panes in a character-cell terminal

mod browser;
mod chrome;
mod config;
mod dialog;
mod document;
mod error;
mod legend;
mod list;
mod projects;
mod provider;
mod shell;
mod surface;
mod viewer;
mod window;

use anyhow::{Context, Result};
use browser::Browser;
use clap::Parser;
use config::Settings;
use crossterm::{
    cursor::{Hide, Show},
    event::{self, Event, KeyEventKind},
    execute,
    style::ResetColor,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen, SetTitle},
};
use projects::ProjectMenu;
use shell::Shell;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use viewer::Viewer;

#[derive(Parser, Debug)]
#[command(name = "tessel")]
#[command(about = "Browse and view files in framed side-by-side panes", long_about = None)]
struct Args {
    /// Files to open in viewers
    paths: Vec<PathBuf>,

    /// Config file (default: <config dir>/tessel/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Open the project menu at startup
    #[arg(short, long)]
    projects: bool,

    /// Write logs here instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;

    let result = run(args);

    // Cleanup
    let _ = terminal::disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, ResetColor, Show);

    if let Err(e) = &result {
        log::error!("{:#}", e);
    }
    result
}

fn init_logging(log_file: Option<&std::path::Path>) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(path) = log_file {
        let file = File::create(path).with_context(|| format!("Failed to create log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let settings = Settings::load(args.config.as_deref()).context("Failed to load config")?;
    let (width, height) = terminal::size().context("Failed to get terminal size")?;
    log::info!("Starting on {}x{} with {:?}", width, height, settings);

    let mut shell = Shell::new(width, height, settings.clone())?;

    // Initial windows
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    shell.open(Box::new(Browser::new(cwd)))?;
    for path in &args.paths {
        let viewer = Viewer::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        shell.open(Box::new(viewer))?;
    }
    if args.projects {
        let entries = settings
            .projects_root()
            .map(|root| projects::discover(&root))
            .unwrap_or_default();
        shell.open(Box::new(ProjectMenu::new(entries)))?;
    }

    // Set up terminal
    terminal::enable_raw_mode().context("Failed to enable raw mode")?;
    execute!(io::stdout(), EnterAlternateScreen, SetTitle(config::APP_NAME), Hide)?;

    let mut stdout = io::stdout().lock();
    shell.render(&mut stdout)?;

    // Idle ticks run at most this often
    let tick = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    while shell.is_running() {
        let timeout = tick.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    shell.process(key)?;
                }
                Event::Resize(w, h) => shell.resize(w, h)?,
                _ => {}
            }
        }
        if last_tick.elapsed() >= tick {
            shell.poll()?;
            last_tick = Instant::now();
        }
        if shell.is_running() {
            shell.render(&mut stdout)?;
        }
    }

    stdout.flush()?;
    log::info!("Exiting");
    Ok(())
}
