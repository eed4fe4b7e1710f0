//! Owns the live plugin population: enabled widgets restored at startup and apps launched since.

use std::{
    collections::HashSet,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use shared::{
    domain::{PersistedState, PluginCategory, PluginId},
    geometry::{Point, Rect},
};
use storage::LayoutStore;
use tracing::{debug, info, warn};

use crate::{
    catalog::PluginCatalog,
    error::MirrorError,
    plugin::{PluginContext, PluginInstance, PropertySink},
};

/// Widget list shared with the update ticker.
pub type LiveWidgets = Arc<RwLock<Vec<Arc<PluginInstance>>>>;

pub struct PluginRegistry {
    widgets: LiveWidgets,
    apps: Vec<Arc<PluginInstance>>,
    store: Arc<dyn LayoutStore>,
    sink: PropertySink,
}

impl PluginRegistry {
    /// Restores every widget kind from the store.
    ///
    /// Each kind's state (or the defaults) is written straight back so the store holds a row
    /// for every known widget afterwards. Only enabled widgets are instantiated, in catalog order.
    pub async fn bootstrap(
        catalog: &PluginCatalog,
        store: Arc<dyn LayoutStore>,
        sink: PropertySink,
    ) -> Result<Self, MirrorError> {
        let saved = store.load_all_widget_state().await?;
        let mut widgets = Vec::new();

        for kind in catalog.list_widget_kinds() {
            let id = kind.id();
            let state = match saved.get(id.as_str()) {
                Some(state) => state.clone(),
                None => PersistedState {
                    properties: store.get_properties(id.as_str()).await?,
                    ..PersistedState::default()
                },
            };
            store
                .upsert_widget_state(id.as_str(), state.enabled, state.position)
                .await?;

            if !state.enabled {
                debug!(plugin = %id, "widget disabled; not instantiating");
                continue;
            }

            let mut plugin = kind.instantiate(PluginContext {
                id: id.clone(),
                enabled: true,
                position: state.position,
                properties: sink.writer(id.clone()),
            });
            plugin.accept_properties(&state.properties);
            widgets.push(PluginInstance::new(
                id.clone(),
                PluginCategory::Widget,
                state.position,
                plugin,
            ));
        }

        info!(widgets = widgets.len(), "restored widget layout");
        Ok(Self {
            widgets: Arc::new(RwLock::new(widgets)),
            apps: Vec::new(),
            store,
            sink,
        })
    }

    pub fn store(&self) -> &Arc<dyn LayoutStore> {
        &self.store
    }

    pub fn sink(&self) -> &PropertySink {
        &self.sink
    }

    pub fn live_widgets(&self) -> LiveWidgets {
        Arc::clone(&self.widgets)
    }

    /// Snapshot of the live widgets in catalog order.
    pub fn widgets(&self) -> Vec<Arc<PluginInstance>> {
        self.read_widgets().clone()
    }

    pub fn apps(&self) -> &[Arc<PluginInstance>] {
        &self.apps
    }

    pub fn widget(&self, id: &str) -> Option<Arc<PluginInstance>> {
        self.read_widgets()
            .iter()
            .find(|instance| instance.id().as_str() == id)
            .cloned()
    }

    pub fn widget_at(&self, point: Point) -> Option<Arc<PluginInstance>> {
        self.read_widgets()
            .iter()
            .find(|instance| instance.bounds().contains(point))
            .cloned()
    }

    pub fn app_at(&self, point: Point) -> Option<Arc<PluginInstance>> {
        self.apps
            .iter()
            .find(|instance| instance.bounds().contains(point))
            .cloned()
    }

    /// Bounds of every live widget except `id`, in catalog order.
    pub fn obstacles_for(&self, id: &str) -> Vec<(PluginId, Rect)> {
        self.read_widgets()
            .iter()
            .filter(|instance| instance.id().as_str() != id)
            .map(|instance| (instance.id().clone(), instance.bounds()))
            .collect()
    }

    pub fn running_app_instance_for(&self, kind_id: &str) -> Option<Arc<PluginInstance>> {
        self.apps
            .iter()
            .find(|instance| instance.id().as_str() == kind_id)
            .cloned()
    }

    pub fn running_app_ids(&self) -> HashSet<PluginId> {
        self.apps
            .iter()
            .map(|instance| instance.id().clone())
            .collect()
    }

    pub fn register_app_instance(&mut self, instance: Arc<PluginInstance>) -> Result<(), MirrorError> {
        if self.running_app_instance_for(instance.id().as_str()).is_some() {
            return Err(MirrorError::DuplicateApp(instance.id().clone()));
        }
        info!(plugin = %instance.id(), "app opened");
        self.apps.push(instance);
        Ok(())
    }

    /// Detaches a closed app so its kind can be launched again.
    pub fn remove_app_instance(&mut self, kind_id: &str) -> Option<Arc<PluginInstance>> {
        let index = self
            .apps
            .iter()
            .position(|instance| instance.id().as_str() == kind_id)?;
        info!(plugin = kind_id, "app closed");
        Some(self.apps.remove(index))
    }

    /// Detaches a widget and records it as disabled at its last position.
    pub async fn remove_widget_instance(&mut self, id: &str) -> Result<Option<Point>, MirrorError> {
        let removed = {
            let mut widgets = self.write_widgets();
            widgets
                .iter()
                .position(|instance| instance.id().as_str() == id)
                .map(|index| widgets.remove(index))
        };
        let Some(instance) = removed else {
            warn!(plugin = id, "remove requested for a widget that is not live");
            return Ok(None);
        };

        let last_position = instance.position();
        self.store
            .upsert_widget_state(id, false, last_position)
            .await?;
        info!(plugin = id, x = last_position.x, y = last_position.y, "widget removed");
        Ok(Some(last_position))
    }

    fn read_widgets(&self) -> RwLockReadGuard<'_, Vec<Arc<PluginInstance>>> {
        self.widgets.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_widgets(&self) -> RwLockWriteGuard<'_, Vec<Arc<PluginInstance>>> {
        self.widgets.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
