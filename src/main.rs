//! MidiKeys - MIDI channel router and keystroke mapper

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use midikeys::app::{App, Flow};
use midikeys::backend::{self, BackendKind};
use midikeys::cli::{self, Command};
use midikeys::config::{AppConfig, ConfigWatcher};
use midikeys::demo;
use midikeys::paths::AppPaths;
use midikeys::view;

/// MidiKeys - route MIDI channels and turn notes into keystrokes
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: detected per install mode)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// List available MIDI devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Run a scripted session through a loopback cable and exit
    #[arg(long)]
    demo: bool,

    /// No interactive prompt, only the routing loop
    #[arg(long)]
    headless: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let paths = match &args.config {
        Some(path) => AppPaths::with_config(path),
        None => AppPaths::detect(),
    };
    paths.ensure_directories()?;

    let _log_guard = init_logging(&args.log_level, &paths.logs_dir)?;

    info!("Starting MidiKeys v{}...", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {} ({} mode)", paths.config.display(), paths.mode);

    if args.list_devices {
        list_devices();
        return Ok(());
    }

    if args.demo {
        let router = demo::run();
        print!("{}", view::render_status(&router));
        return Ok(());
    }

    let config = AppConfig::load(&paths.config).await?;
    let watcher = match ConfigWatcher::new(&paths.config) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            warn!("Hot reload disabled: {:#}", e);
            None
        }
    };

    let mut app = App::new(config, paths);
    app.setup();

    let (tx, rx) = mpsc::channel(32);
    if args.headless {
        drop(tx);
    } else {
        println!("{}", "Type 'help' for commands.".dimmed());
        // readline blocks; a plain thread keeps it from holding up runtime shutdown
        std::thread::spawn(move || {
            if let Err(e) = cli::run_repl(tx) {
                error!("REPL failed: {}", e);
            }
        });
    }

    run_app(&mut app, watcher, rx, shutdown_signal()).await;

    app.shutdown();
    info!("MidiKeys shutdown complete");
    Ok(())
}

async fn run_app(
    app: &mut App,
    mut watcher: Option<ConfigWatcher>,
    mut commands: mpsc::Receiver<Command>,
    shutdown: impl std::future::Future<Output = ()>,
) {
    let mut period = app.tick_period();
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tokio::pin!(shutdown);

    info!("Routing (tick {:?})", period);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                app.tick();
            }

            Some(command) = commands.recv() => {
                match app.handle(command).await {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Quit) => break,
                    Err(e) => eprintln!("{} {:#}", "✗".red(), e),
                }
            }

            Some(new_config) = next_config(&mut watcher) => {
                info!("📝 Configuration file changed, applying...");
                app.apply_config(new_config);
            }

            _ = &mut shutdown => {
                break;
            }
        }

        if app.tick_period() != period {
            period = app.tick_period();
            ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!("Tick period now {:?}", period);
        }
    }
}

async fn next_config(watcher: &mut Option<ConfigWatcher>) -> Option<AppConfig> {
    match watcher {
        Some(watcher) => watcher.next_config().await,
        None => std::future::pending().await,
    }
}

fn list_devices() {
    for kind in BackendKind::all() {
        println!("{}", format!("[{}]", kind).bold());
        for (title, devices) in [
            ("in ", backend::list_input_devices(*kind)),
            ("out", backend::list_output_devices(*kind)),
        ] {
            if devices.is_empty() {
                println!("  {} {}", title, "(none)".dimmed());
            }
            for device in devices {
                println!("  {} {:>2}: {}", title, device.index, device.name);
            }
        }
    }
}

fn init_logging(level: &str, logs_dir: &Path) -> Result<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let file_appender = tracing_appender::rolling::daily(logs_dir, "midikeys.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
    info!("Shutdown signal received");
}
