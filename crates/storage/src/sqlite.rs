use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use async_trait::async_trait;
use shared::{
    domain::{PersistedState, Properties},
    geometry::Point,
};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use tracing::debug;

use crate::{LayoutStore, Result, StorageError};

const TABLE_LAYOUT: &str = "widget_layout";
const TABLE_PROPERTIES: &str = "widget_properties";

#[derive(Clone)]
pub struct SqliteLayoutStore {
    pool: Pool<Sqlite>,
}

impl SqliteLayoutStore {
    /// Opens (creating if missing) the database at `database_url` and ensures both tables exist.
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let open_err = |source| StorageError::Open {
            url: database_url.to_string(),
            source,
        };
        let connect_options = SqliteConnectOptions::from_str(database_url)
            .map_err(open_err)?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await
            .map_err(open_err)?;

        let store = Self { pool };
        store.ensure_tables().await?;
        Ok(store)
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    async fn ensure_tables(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS widget_layout (
                id      TEXT PRIMARY KEY,
                enabled BOOLEAN NOT NULL,
                x       FLOAT NOT NULL,
                y       FLOAT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|source| StorageError::Schema {
            table: TABLE_LAYOUT,
            source,
        })?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS widget_properties (
                id    TEXT NOT NULL,
                key   TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (id, key)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|source| StorageError::Schema {
            table: TABLE_PROPERTIES,
            source,
        })?;

        Ok(())
    }
}

#[async_trait]
impl LayoutStore for SqliteLayoutStore {
    async fn load_all_widget_state(&self) -> Result<HashMap<String, PersistedState>> {
        let query_err = |source| StorageError::Query {
            operation: "load widget layout",
            source,
        };

        let rows = sqlx::query("SELECT id, enabled, x, y FROM widget_layout")
            .fetch_all(&self.pool)
            .await
            .map_err(query_err)?;

        let mut states = HashMap::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("id").map_err(query_err)?;
            let enabled: bool = row.try_get("enabled").map_err(query_err)?;
            let x: f64 = row.try_get("x").map_err(query_err)?;
            let y: f64 = row.try_get("y").map_err(query_err)?;
            states.insert(
                id,
                PersistedState {
                    enabled,
                    position: Point::new(x, y),
                    properties: Properties::new(),
                },
            );
        }

        let property_rows = sqlx::query("SELECT id, key, value FROM widget_properties")
            .fetch_all(&self.pool)
            .await
            .map_err(query_err)?;
        for row in property_rows {
            let id: String = row.try_get("id").map_err(query_err)?;
            let Some(state) = states.get_mut(&id) else {
                continue;
            };
            let key: String = row.try_get("key").map_err(query_err)?;
            let value: String = row.try_get("value").map_err(query_err)?;
            state.properties.insert(key, value);
        }

        Ok(states)
    }

    async fn upsert_widget_state(&self, id: &str, enabled: bool, position: Point) -> Result<()> {
        sqlx::query(
            "INSERT INTO widget_layout (id, enabled, x, y) VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET enabled = excluded.enabled, x = excluded.x, y = excluded.y",
        )
        .bind(id)
        .bind(enabled)
        .bind(position.x)
        .bind(position.y)
        .execute(&self.pool)
        .await
        .map_err(|source| StorageError::Query {
            operation: "upsert widget layout",
            source,
        })?;
        debug!(plugin = id, enabled, x = position.x, y = position.y, "stored widget layout");
        Ok(())
    }

    async fn get_properties(&self, id: &str) -> Result<Properties> {
        let query_err = |source| StorageError::Query {
            operation: "select widget properties",
            source,
        };
        let rows = sqlx::query("SELECT key, value FROM widget_properties WHERE id = ?")
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(query_err)?;

        rows.iter()
            .map(|row| {
                let key: String = row.try_get("key").map_err(query_err)?;
                let value: String = row.try_get("value").map_err(query_err)?;
                Ok((key, value))
            })
            .collect()
    }

    async fn set_property(&self, id: &str, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO widget_properties (id, key, value) VALUES (?, ?, ?)
             ON CONFLICT(id, key) DO UPDATE SET value = excluded.value",
        )
        .bind(id)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|source| StorageError::Query {
            operation: "upsert widget property",
            source,
        })?;
        Ok(())
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).map_err(|source| StorageError::Directory {
        path: parent.to_path_buf(),
        source,
    })
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}
