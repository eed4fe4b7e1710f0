//! Periodic `update` of every live widget, independent of the gesture loop.

use std::{
    sync::{Arc, PoisonError},
    time::Duration,
};

use tokio::{
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::trace;

use crate::registry::LiveWidgets;

/// Updates each widget once. A widget busy with a gesture call is skipped this round.
pub fn update_all(widgets: &LiveWidgets) -> usize {
    let snapshot: Vec<_> = widgets
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .map(Arc::clone)
        .collect();

    let mut updated = 0;
    for instance in snapshot {
        if instance.try_update() {
            updated += 1;
        } else {
            trace!(plugin = %instance.id(), "widget busy; update skipped");
        }
    }
    updated
}

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// `interval` is raised to 1 ms; tokio refuses a zero period.
pub fn spawn_widget_ticker(widgets: LiveWidgets, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval.max(MIN_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            update_all(&widgets);
        }
    })
}

#[cfg(test)]
#[path = "tests/ticker_tests.rs"]
mod tests;
