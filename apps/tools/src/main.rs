use std::collections::BTreeMap;

use anyhow::Result;
use clap::{Parser, Subcommand};
use shared::geometry::Point;
use storage::{LayoutStore, SqliteLayoutStore};

/// Maintenance commands for the mirror's widget layout database.
#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/mirror.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every stored widget row with its properties as JSON.
    Dump,
    Enable {
        id: String,
    },
    Disable {
        id: String,
    },
    Move {
        id: String,
        x: f64,
        y: f64,
    },
    SetProperty {
        id: String,
        key: String,
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let store = SqliteLayoutStore::new(&cli.database_url).await?;
    println!("{}", execute(&store, cli.command).await?);
    Ok(())
}

async fn execute(store: &dyn LayoutStore, command: Command) -> Result<String> {
    let message = match command {
        Command::Dump => {
            let rows: BTreeMap<_, _> = store.load_all_widget_state().await?.into_iter().collect();
            serde_json::to_string_pretty(&rows)?
        }
        Command::Enable { id } => set_enabled(store, &id, true).await?,
        Command::Disable { id } => set_enabled(store, &id, false).await?,
        Command::Move { id, x, y } => {
            let state = store.widget_state(&id).await?;
            store
                .upsert_widget_state(&id, state.enabled, Point::new(x, y))
                .await?;
            format!("moved {id} to ({x}, {y})")
        }
        Command::SetProperty { id, key, value } => {
            store.set_property(&id, &key, &value).await?;
            format!("set {id}.{key}={value}")
        }
    };
    Ok(message)
}

async fn set_enabled(store: &dyn LayoutStore, id: &str, enabled: bool) -> Result<String> {
    let state = store.widget_state(id).await?;
    store.upsert_widget_state(id, enabled, state.position).await?;
    let verb = if enabled { "enabled" } else { "disabled" };
    Ok(format!("{verb} {id}"))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
