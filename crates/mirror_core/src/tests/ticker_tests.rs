use std::{sync::RwLock, time::Duration};

use shared::{
    domain::{PluginCategory, PluginId},
    geometry::{Point, Size},
};

use super::*;
use crate::{
    plugin::PluginInstance,
    test_support::{stub, Calls},
};

fn live(calls: &[Arc<Calls>]) -> LiveWidgets {
    let instances = calls
        .iter()
        .enumerate()
        .map(|(index, calls)| {
            PluginInstance::new(
                PluginId::new(format!("widget-{index}")),
                PluginCategory::Widget,
                Point::ZERO,
                stub(Size::new(10.0, 10.0), calls),
            )
        })
        .collect();
    Arc::new(RwLock::new(instances))
}

#[test]
fn every_idle_widget_is_updated() {
    let calls = [Arc::new(Calls::default()), Arc::new(Calls::default())];
    let widgets = live(&calls);
    assert_eq!(update_all(&widgets), 2);
    assert!(calls.iter().all(|c| Calls::count(&c.updates) == 1));
}

#[test]
fn busy_widget_is_skipped_not_waited_on() {
    let calls = [Arc::new(Calls::default()), Arc::new(Calls::default())];
    let widgets = live(&calls);
    let busy = Arc::clone(&widgets.read().unwrap()[0]);

    let _held = busy.plugin();
    assert_eq!(update_all(&widgets), 1);
    assert_eq!(Calls::count(&calls[0].updates), 0);
    assert_eq!(Calls::count(&calls[1].updates), 1);
}

#[tokio::test]
async fn spawned_ticker_keeps_updating() {
    let calls = [Arc::new(Calls::default())];
    let handle = spawn_widget_ticker(live(&calls), Duration::from_millis(10));
    tokio::time::sleep(Duration::from_millis(80)).await;
    handle.abort();
    assert!(Calls::count(&calls[0].updates) >= 2);
}

#[tokio::test]
async fn zero_interval_still_ticks() {
    let calls = [Arc::new(Calls::default())];
    let handle = spawn_widget_ticker(live(&calls), Duration::ZERO);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!handle.is_finished());
    handle.abort();
    assert!(Calls::count(&calls[0].updates) >= 1);
}
