//! shipform - terminal client for the shipping extraction server
//!
//! Reads pasted order markup from a file, sends it for extraction, lets the
//! user page through the extracted addresses while entering package
//! dimensions, and posts the finished form to get the label CSV back.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use shipform_common::config::{ClientConfig, LoggingConfig};
use shipform_common::events::{EventBus, SessionEvent};
use shipform_session::{Direction, HttpBackend, SessionController, SessionError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::Command;

/// Command-line arguments for shipform
#[derive(Parser, Debug)]
#[command(name = "shipform")]
#[command(about = "Extract shipping addresses from order markup and build label submissions")]
#[command(version)]
struct Args {
    /// Extraction server base URL (overrides SHIPFORM_SERVER_URL and the config file)
    #[arg(short, long)]
    server: Option<String>,

    /// Path to the TOML config file
    #[arg(short, long, env = "SHIPFORM_CONFIG")]
    config: Option<PathBuf>,

    /// Markup file to extract immediately on startup
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Directory for submitted CSV files (overrides the config file)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ClientConfig::load(args.server.as_deref(), args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }

    init_tracing(&config.logging)?;
    info!(
        "Starting shipform v{} against {}",
        env!("CARGO_PKG_VERSION"),
        config.server_url
    );

    let backend = HttpBackend::new(&config).context("Failed to build HTTP client")?;
    let events = EventBus::new(config.event_capacity);
    spawn_event_logger(&events);

    let mut controller = SessionController::new(backend, events);

    if let Some(path) = args.input {
        run_extract(&mut controller, &path).await;
    }
    print!("{}", cli::render(&controller));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let command = match cli::parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::Help => println!("{}", cli::HELP),
            Command::Show => print!("{}", cli::render(&controller)),
            Command::Extract(path) => {
                run_extract(&mut controller, &path).await;
                print!("{}", cli::render(&controller));
            }
            Command::Next => run_navigate(&mut controller, Direction::Next),
            Command::Prev => run_navigate(&mut controller, Direction::Previous),
            Command::Select(index) => {
                if controller.select(index).is_none() {
                    println!("No address number {}", index + 1);
                }
                print!("{}", cli::render(&controller));
            }
            Command::Set(field, value) => controller.set_field(field, value),
            Command::Merge(enabled) => controller.set_merge_orders(enabled),
            Command::SameDims(enabled) => controller.set_same_dimensions(enabled),
            Command::Submit => run_submit(&mut controller, &config.output_dir).await,
            Command::Reset => {
                controller.reset();
                print!("{}", cli::render(&controller));
            }
        }
    }

    info!("shipform exiting");
    Ok(())
}

/// Read markup from `path` and run one extraction cycle
async fn run_extract(controller: &mut SessionController<HttpBackend>, path: &Path) {
    let markup = match tokio::fs::read_to_string(path).await {
        Ok(markup) => markup,
        Err(e) => {
            error!("Failed to read {}: {}", path.display(), e);
            println!("Could not read {}: {}", path.display(), e);
            return;
        }
    };

    match controller.extract(&markup).await {
        Ok(count) => debug!(count, "Extraction complete"),
        Err(SessionError::WrongPhase(_)) => {
            println!("Reset the current session before extracting again")
        }
        Err(e) => debug!(error = %e, "Extraction did not complete"),
    }
}

fn run_navigate(controller: &mut SessionController<HttpBackend>, direction: Direction) {
    if controller.navigate(direction).is_none() {
        println!("Nothing to page through");
    }
    print!("{}", cli::render(controller));
}

/// Post the form and save the returned CSV under `output_dir`
async fn run_submit(controller: &mut SessionController<HttpBackend>, output_dir: &Path) {
    match controller.submit().await {
        Ok(receipt) => {
            let path = output_dir.join(receipt.filename_or_default());
            match tokio::fs::write(&path, &receipt.content).await {
                Ok(()) => {
                    info!("Saved {}", path.display());
                    println!("Saved {}", path.display());
                }
                Err(e) => {
                    error!("Failed to write {}: {}", path.display(), e);
                    println!("Could not write {}: {}", path.display(), e);
                }
            }
        }
        Err(e @ SessionError::Validation { .. }) => {
            println!("{}", e);
            print!("{}", cli::render(controller));
        }
        Err(e) => {
            error!("Submission failed: {}", e);
            println!("{}", e);
        }
    }
}

/// Install the tracing subscriber
///
/// `RUST_LOG` wins over the configured level. Logs go to stderr, or to the
/// configured file when one is set.
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "shipform={level},shipform_session={level},shipform_common={level}",
            level = logging.level
        )
        .into()
    });

    let (stderr_layer, file_layer) = match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            (None, Some(layer))
        }
        None => (
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
            None,
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(())
}

/// Log every session event at debug level
fn spawn_event_logger(events: &EventBus) {
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "Event logger lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });
}

fn log_event(event: &SessionEvent) {
    match serde_json::to_string(event) {
        Ok(json) => debug!(event = %json, "Session event"),
        Err(e) => debug!(error = %e, "Unserializable session event"),
    }
}
