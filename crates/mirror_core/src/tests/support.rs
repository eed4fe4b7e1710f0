use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use shared::{domain::Properties, geometry::Size};

use crate::{
    catalog::{PluginKind, PluginKindBuilder},
    plugin::{Plugin, Surface},
};

/// Counts every capability call a [`StubPlugin`] receives.
#[derive(Default)]
pub(crate) struct Calls {
    pub taps: AtomicUsize,
    pub grows: AtomicUsize,
    pub shrinks: AtomicUsize,
    pub confirms: AtomicUsize,
    pub cancels: AtomicUsize,
    pub updates: AtomicUsize,
    pub instances: AtomicUsize,
    pub properties: Mutex<Option<Properties>>,
}

impl Calls {
    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn accepted(&self) -> Option<Properties> {
        self.properties.lock().unwrap().clone()
    }
}

pub(crate) struct StubPlugin {
    size: Size,
    calls: Arc<Calls>,
}

impl Plugin for StubPlugin {
    fn render(&self) -> Surface {
        Surface::new(self.size, "stub")
    }

    fn accept_properties(&mut self, properties: &Properties) {
        *self.calls.properties.lock().unwrap() = Some(properties.clone());
    }

    fn update(&mut self) {
        self.calls.updates.fetch_add(1, Ordering::SeqCst);
    }

    fn on_tap(&mut self) {
        self.calls.taps.fetch_add(1, Ordering::SeqCst);
    }

    fn on_resize(&mut self, grow: bool) {
        let counter = if grow {
            &self.calls.grows
        } else {
            &self.calls.shrinks
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    fn confirm_edit(&mut self) {
        self.calls.confirms.fetch_add(1, Ordering::SeqCst);
    }

    fn cancel_edit(&mut self) {
        self.calls.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

pub(crate) fn stub(size: Size, calls: &Arc<Calls>) -> Box<dyn Plugin> {
    Box::new(StubPlugin {
        size,
        calls: Arc::clone(calls),
    })
}

pub(crate) fn widget_kind(id: &str, size: Size, calls: &Arc<Calls>) -> PluginKindBuilder {
    let calls = Arc::clone(calls);
    PluginKind::widget(id, id).factory(move |_| {
        calls.instances.fetch_add(1, Ordering::SeqCst);
        stub(size, &calls)
    })
}

pub(crate) fn app_kind(id: &str, size: Size, calls: &Arc<Calls>) -> PluginKindBuilder {
    let calls = Arc::clone(calls);
    PluginKind::app(id, id).factory(move |_| {
        calls.instances.fetch_add(1, Ordering::SeqCst);
        stub(size, &calls)
    })
}
