//! The contract every widget and app kind implements, and the live instance wrapper the core holds.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

use shared::{
    domain::{PluginCategory, PluginId, Properties},
    geometry::{Point, Rect, Size},
};
use storage::LayoutStore;
use tokio::sync::mpsc;
use tracing::warn;

/// What a plugin last drew: its extent plus a textual rendition for headless front-ends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Surface {
    pub size: Size,
    pub text: String,
}

impl Surface {
    pub fn new(size: Size, text: impl Into<String>) -> Self {
        Self {
            size,
            text: text.into(),
        }
    }
}

/// Capability set of a plugin. Every method is optional.
///
/// `update` is called from the ticker task and must return promptly; slow work is the
/// plugin's to hand off.
pub trait Plugin: Send {
    fn render(&self) -> Surface {
        Surface::default()
    }

    /// Extent used for hit testing and snapping.
    fn size(&self) -> Size {
        self.render().size
    }

    fn accept_properties(&mut self, _properties: &Properties) {}

    fn update(&mut self) {}

    fn on_tap(&mut self) {}

    fn on_resize(&mut self, _grow: bool) {}

    fn confirm_edit(&mut self) {}

    fn cancel_edit(&mut self) {}
}

/// Everything a factory receives when the core asks it for a new instance.
#[derive(Clone)]
pub struct PluginContext {
    pub id: PluginId,
    pub enabled: bool,
    pub position: Point,
    pub properties: PropertyWriter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyWrite {
    pub id: PluginId,
    pub key: String,
    pub value: String,
}

/// Non-blocking handle a plugin uses to persist its own properties.
#[derive(Clone)]
pub struct PropertyWriter {
    id: PluginId,
    tx: mpsc::UnboundedSender<PropertyWrite>,
}

impl PropertyWriter {
    pub fn set(&self, key: impl Into<String>, value: impl ToString) {
        let write = PropertyWrite {
            id: self.id.clone(),
            key: key.into(),
            value: value.to_string(),
        };
        if self.tx.send(write).is_err() {
            warn!(plugin = %self.id, "property channel closed; dropping write");
        }
    }
}

/// Sending half of the property channel; hands out per-plugin writers.
#[derive(Clone)]
pub struct PropertySink {
    tx: mpsc::UnboundedSender<PropertyWrite>,
}

impl PropertySink {
    pub fn writer(&self, id: PluginId) -> PropertyWriter {
        PropertyWriter {
            id,
            tx: self.tx.clone(),
        }
    }
}

/// Receiving half of the property channel.
pub struct PropertyWrites {
    rx: mpsc::UnboundedReceiver<PropertyWrite>,
}

pub fn property_channel() -> (PropertySink, PropertyWrites) {
    let (tx, rx) = mpsc::unbounded_channel();
    (PropertySink { tx }, PropertyWrites { rx })
}

impl PropertyWrites {
    /// Applies writes until every writer has been dropped. Store failures are logged, not fatal.
    pub async fn run(mut self, store: Arc<dyn LayoutStore>) {
        while let Some(write) = self.rx.recv().await {
            apply(store.as_ref(), write).await;
        }
    }

    /// Applies whatever is queued right now and returns how many writes were taken.
    pub async fn flush(&mut self, store: &dyn LayoutStore) -> usize {
        let mut applied = 0;
        while let Ok(write) = self.rx.try_recv() {
            apply(store, write).await;
            applied += 1;
        }
        applied
    }
}

async fn apply(store: &dyn LayoutStore, write: PropertyWrite) {
    if let Err(err) = store
        .set_property(write.id.as_str(), &write.key, &write.value)
        .await
    {
        warn!(plugin = %write.id, key = %write.key, error = %err, "failed to persist plugin property");
    }
}

/// A live plugin plus the geometry the core tracks for it.
pub struct PluginInstance {
    id: PluginId,
    category: PluginCategory,
    origin: Mutex<Point>,
    plugin: Mutex<Box<dyn Plugin>>,
}

impl PluginInstance {
    pub fn new(
        id: PluginId,
        category: PluginCategory,
        origin: Point,
        plugin: Box<dyn Plugin>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id,
            category,
            origin: Mutex::new(origin),
            plugin: Mutex::new(plugin),
        })
    }

    pub fn id(&self) -> &PluginId {
        &self.id
    }

    pub fn category(&self) -> PluginCategory {
        self.category
    }

    pub fn position(&self) -> Point {
        *lock(&self.origin)
    }

    pub fn set_position(&self, origin: Point) {
        *lock(&self.origin) = origin;
    }

    pub fn bounds(&self) -> Rect {
        let size = self.plugin().size();
        Rect::from_origin_size(self.position(), size)
    }

    /// Exclusive access to the plugin for a capability call.
    pub fn plugin(&self) -> MutexGuard<'_, Box<dyn Plugin>> {
        lock(&self.plugin)
    }

    /// Runs `update` unless another task holds the plugin. Returns whether it ran.
    pub fn try_update(&self) -> bool {
        match self.plugin.try_lock() {
            Ok(mut plugin) => {
                plugin.update();
                true
            }
            Err(TryLockError::Poisoned(poisoned)) => {
                poisoned.into_inner().update();
                true
            }
            Err(TryLockError::WouldBlock) => false,
        }
    }
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "tests/plugin_tests.rs"]
mod tests;
