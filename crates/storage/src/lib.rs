//! Persistence of widget layout and per-plugin properties.
//!
//! Two tables back every store:
//! `widget_layout(id TEXT PRIMARY KEY, enabled BOOL, x FLOAT, y FLOAT)` and
//! `widget_properties(id TEXT, key TEXT, value TEXT, PRIMARY KEY(id, key))`.
//! Writes are insert-or-update; reads of unknown ids yield defaults.

use std::{collections::HashMap, path::PathBuf};

use async_trait::async_trait;
use shared::{
    domain::{PersistedState, Properties},
    geometry::Point,
};
use thiserror::Error;

mod memory;
mod sqlite;

pub use memory::MemoryLayoutStore;
pub use sqlite::SqliteLayoutStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to create parent directory '{path}' for layout database: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to open layout database '{url}': {source}")]
    Open {
        url: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("failed to ensure table {table} exists: {source}")]
    Schema {
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },
    #[error("{operation} failed: {source}")]
    Query {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Handle injected into the registry and the gesture controller.
///
/// Implementations serialise each call on their own; there are no cross-call transactions.
#[async_trait]
pub trait LayoutStore: Send + Sync {
    /// Every stored widget row, with its properties attached.
    async fn load_all_widget_state(&self) -> Result<HashMap<String, PersistedState>>;

    async fn upsert_widget_state(&self, id: &str, enabled: bool, position: Point) -> Result<()>;

    async fn get_properties(&self, id: &str) -> Result<Properties>;

    async fn set_property(&self, id: &str, key: &str, value: &str) -> Result<()>;

    /// Stored state for `id`, or the defaults when the id has never been written.
    async fn widget_state(&self, id: &str) -> Result<PersistedState> {
        let mut all = self.load_all_widget_state().await?;
        match all.remove(id) {
            Some(state) => Ok(state),
            None => Ok(PersistedState {
                properties: self.get_properties(id).await?,
                ..PersistedState::default()
            }),
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
