use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use shared::{
    domain::{PersistedState, Properties},
    geometry::Point,
};

use crate::{LayoutStore, Result};

#[derive(Default)]
struct Tables {
    layout: HashMap<String, (bool, Point)>,
    properties: HashMap<(String, String), String>,
}

/// Process-local store, used when no database is configured and by tests.
#[derive(Default)]
pub struct MemoryLayoutStore {
    tables: Mutex<Tables>,
}

impl MemoryLayoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of rows in the widget layout table.
    pub fn layout_rows(&self) -> usize {
        self.tables().layout.len()
    }
}

#[async_trait]
impl LayoutStore for MemoryLayoutStore {
    async fn load_all_widget_state(&self) -> Result<HashMap<String, PersistedState>> {
        let tables = self.tables();
        let mut states: HashMap<String, PersistedState> = tables
            .layout
            .iter()
            .map(|(id, (enabled, position))| {
                (
                    id.clone(),
                    PersistedState {
                        enabled: *enabled,
                        position: *position,
                        properties: Properties::new(),
                    },
                )
            })
            .collect();
        for ((id, key), value) in &tables.properties {
            if let Some(state) = states.get_mut(id) {
                state.properties.insert(key.clone(), value.clone());
            }
        }
        Ok(states)
    }

    async fn upsert_widget_state(&self, id: &str, enabled: bool, position: Point) -> Result<()> {
        self.tables()
            .layout
            .insert(id.to_string(), (enabled, position));
        Ok(())
    }

    async fn get_properties(&self, id: &str) -> Result<Properties> {
        Ok(self
            .tables()
            .properties
            .iter()
            .filter(|((owner, _), _)| owner == id)
            .map(|((_, key), value)| (key.clone(), value.clone()))
            .collect())
    }

    async fn set_property(&self, id: &str, key: &str, value: &str) -> Result<()> {
        self.tables()
            .properties
            .insert((id.to_string(), key.to_string()), value.to_string());
        Ok(())
    }
}
