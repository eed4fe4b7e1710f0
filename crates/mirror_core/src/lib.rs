//! Plugin lifecycle and touch interaction engine for the mirror surface.
//!
//! Widgets are always-on plugins restored from the layout store at startup;
//! apps are launched on demand from the picker, one live instance per kind.
//! [`GestureController`] turns raw touches into edits of that population.

pub mod catalog;
pub mod config;
pub mod error;
pub mod gesture;
pub mod picker;
pub mod plugin;
pub mod registry;
pub mod snap;
pub mod ticker;

pub use catalog::{PluginCatalog, PluginKind};
pub use config::InteractionConfig;
pub use error::MirrorError;
pub use gesture::{Control, EditOverlay, GestureController, GestureOutcome, GestureSession, Mode, TouchEvent};
pub use picker::{AppPicker, PickerEntry};
pub use plugin::{
    property_channel, Plugin, PluginContext, PluginInstance, PropertySink, PropertyWriter,
    PropertyWrites, Surface,
};
pub use registry::PluginRegistry;
pub use snap::{Edge, Placement, Snap, SnapEngine};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
