use std::{io::Write, path::PathBuf, sync::Arc, time::Instant};

use anyhow::Context;
use clap::Parser;
use mirror_core::{
    property_channel, ticker::spawn_widget_ticker, GestureController, GestureOutcome,
    PluginRegistry, TouchEvent,
};
use shared::{
    geometry::{Point, Size},
    protocol::SurfaceInput,
};
use storage::{LayoutStore, SqliteLayoutStore};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, prepare_database_url};

/// Headless mirror runtime: reads surface input as JSON lines on stdin and writes gesture
/// outcomes as JSON lines on stdout.
#[derive(Parser, Debug)]
struct Args {
    /// Config file; defaults to ./mirror.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    database_url: Option<String>,
    #[arg(long)]
    width: Option<f64>,
    #[arg(long)]
    height: Option<f64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(url) = args.database_url {
        settings.database_url = url;
    }
    if let Some(width) = args.width {
        settings.surface.width = width;
    }
    if let Some(height) = args.height {
        settings.surface.height = height;
    }
    settings.validate().context("invalid command-line overrides")?;

    let database_url = prepare_database_url(&settings.database_url);
    let store: Arc<dyn LayoutStore> = match SqliteLayoutStore::new(&database_url).await {
        Ok(store) => Arc::new(store),
        Err(err) => {
            error!(
                %database_url,
                error = %err,
                "failed to open layout database; verify the parent directory is writable"
            );
            return Err(err.into());
        }
    };

    let catalog = Arc::new(plugins::builtin_catalog().context("invalid built-in plugin catalog")?);
    let (sink, writes) = property_channel();
    let registry = PluginRegistry::bootstrap(&catalog, Arc::clone(&store), sink)
        .await
        .context("failed to restore widget layout")?;

    let flusher = tokio::spawn(writes.run(Arc::clone(&store)));
    let ticker = spawn_widget_ticker(
        registry.live_widgets(),
        settings.interaction.update_interval,
    );

    let mut controller =
        GestureController::new(&settings.interaction, catalog, registry, settings.surface);
    info!(
        %database_url,
        width = settings.surface.width,
        height = settings.surface.height,
        hold_delay_ms = settings.interaction.hold_delay.as_millis() as u64,
        "mirror ready"
    );

    let result = run(&mut controller).await;

    ticker.abort();
    if let Err(err) = ticker.await {
        if err.is_panic() {
            error!(error = %err, "widget ticker panicked");
        }
    }
    // Plugins own the remaining property writers; dropping them lets the flusher drain and stop.
    drop(controller);
    flusher.await.context("property flusher panicked")?;
    info!("mirror stopped");
    result
}

async fn run(controller: &mut GestureController) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let deadline = controller.hold_deadline();
        let outcomes = tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read input")? else {
                    return Ok(());
                };
                dispatch(controller, &line).await
            }
            _ = hold_elapsed(deadline) => controller.tick(Instant::now()),
        };
        emit(&outcomes)?;
    }
}

async fn dispatch(controller: &mut GestureController, line: &str) -> Vec<GestureOutcome> {
    let line = line.trim();
    if line.is_empty() {
        return Vec::new();
    }
    let input: SurfaceInput = match serde_json::from_str(line) {
        Ok(input) => input,
        Err(err) => {
            warn!(error = %err, "skipping malformed input line");
            return Vec::new();
        }
    };

    match input {
        SurfaceInput::Touch { phase, x, y } => {
            let event = TouchEvent {
                phase,
                point: Point::new(x, y),
                at: Instant::now(),
            };
            controller.handle(event).await
        }
        SurfaceInput::SurfaceSize { width, height } => {
            controller.set_surface(Size::new(width, height));
            Vec::new()
        }
        SurfaceInput::Confirm => controller.confirm().await,
        SurfaceInput::Cancel => controller.cancel(),
        SurfaceInput::Remove => controller.remove().await,
        SurfaceInput::ResizeWidget { grow } => controller.resize(grow),
    }
}

async fn hold_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
        None => std::future::pending().await,
    }
}

fn emit(outcomes: &[GestureOutcome]) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    for outcome in outcomes {
        serde_json::to_writer(&mut stdout, outcome).context("failed to encode outcome")?;
        stdout.write_all(b"\n")?;
    }
    stdout.flush()?;
    Ok(())
}
