//! Touch state machine deciding between taps, widget edits, app drags and the app picker.
//!
//! A press arms a hold action that fires once the hold delay has elapsed with the finger
//! still down; releasing earlier makes the gesture a tap. Timestamps come from the events
//! themselves, and [`GestureController::tick`] lets a driver fire a due hold between events.

mod overlay;
mod session;

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use serde::Serialize;
use shared::{
    domain::{PluginCategory, PluginId, Properties},
    error::{ErrorCode, Notice},
    geometry::{Point, Rect, Size},
    protocol::TouchPhase,
};
use tracing::{debug, error, info, warn};

pub use overlay::{Control, EditOverlay, CORNER_CONTROL_SIZE};
pub use session::{GestureSession, Mode};

use session::GestureState;

use crate::{
    catalog::PluginCatalog,
    config::InteractionConfig,
    error::MirrorError,
    picker::{AppPicker, PickerEntry},
    plugin::{PluginContext, PluginInstance},
    registry::PluginRegistry,
    snap::{Placement, SnapEngine},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchEvent {
    pub phase: TouchPhase,
    pub point: Point,
    pub at: Instant,
}

impl TouchEvent {
    pub fn press(point: Point, at: Instant) -> Self {
        Self {
            phase: TouchPhase::Press,
            point,
            at,
        }
    }

    pub fn moved(point: Point, at: Instant) -> Self {
        Self {
            phase: TouchPhase::Move,
            point,
            at,
        }
    }

    pub fn release(point: Point, at: Instant) -> Self {
        Self {
            phase: TouchPhase::Release,
            point,
            at,
        }
    }
}

/// Side effects of one input, for the front-end to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GestureOutcome {
    Tapped {
        plugin: PluginId,
    },
    EditOpened {
        plugin: PluginId,
        overlay: EditOverlay,
    },
    WidgetMoved {
        plugin: PluginId,
        placement: Placement,
        overlay: EditOverlay,
    },
    Resized {
        plugin: PluginId,
        bounds: Rect,
    },
    EditConfirmed {
        plugin: PluginId,
        position: Point,
    },
    EditCancelled {
        plugin: PluginId,
        position: Point,
    },
    WidgetRemoved {
        plugin: PluginId,
        position: Point,
    },
    AppDragStarted {
        plugin: PluginId,
    },
    AppMoved {
        plugin: PluginId,
        position: Point,
    },
    AppDragEnded {
        plugin: PluginId,
    },
    PickerOpened {
        entries: Vec<PickerEntry>,
    },
    PickerDismissed,
    AppLaunched {
        plugin: PluginId,
        bounds: Rect,
    },
    Notice(Notice),
}

#[derive(Debug, Clone, PartialEq)]
enum HoldAction {
    EditWidget(PluginId),
    DragApp(PluginId),
    OpenPicker,
}

/// Deferred action armed by a press; dropped by release or by the next press.
struct ArmedHold {
    action: Option<HoldAction>,
    start: Point,
    deadline: Instant,
    tap_target: Option<Arc<PluginInstance>>,
}

pub struct GestureController {
    snap: SnapEngine,
    hold_delay: Duration,
    catalog: Arc<PluginCatalog>,
    registry: PluginRegistry,
    surface: Size,
    state: GestureState,
    armed: Option<ArmedHold>,
}

impl GestureController {
    pub fn new(
        config: &InteractionConfig,
        catalog: Arc<PluginCatalog>,
        registry: PluginRegistry,
        surface: Size,
    ) -> Self {
        Self {
            snap: SnapEngine::new(config.snap_threshold),
            hold_delay: config.hold_delay,
            catalog,
            registry,
            surface,
            state: GestureState::Idle,
            armed: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.state.mode()
    }

    pub fn session(&self) -> Option<&GestureSession> {
        self.state.session()
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut PluginRegistry {
        &mut self.registry
    }

    pub fn surface(&self) -> Size {
        self.surface
    }

    /// The canvas was resized; later snaps and layouts use the new bounds.
    pub fn set_surface(&mut self, surface: Size) {
        debug!(width = surface.width, height = surface.height, "surface resized");
        self.surface = surface;
    }

    /// When the armed hold action fires, if one is pending.
    pub fn hold_deadline(&self) -> Option<Instant> {
        self.armed
            .as_ref()
            .filter(|armed| armed.action.is_some())
            .map(|armed| armed.deadline)
    }

    /// Current edit controls, while a widget is being edited.
    pub fn overlay(&self) -> Option<EditOverlay> {
        match &self.state {
            GestureState::WidgetEdit(session) => self.overlay_for(session),
            _ => None,
        }
    }

    pub fn picker_entries(&self) -> Option<&[PickerEntry]> {
        match &self.state {
            GestureState::AppPicker { entries, .. } => Some(entries),
            _ => None,
        }
    }

    pub async fn handle(&mut self, event: TouchEvent) -> Vec<GestureOutcome> {
        let mut outcomes = self.tick(event.at);
        let more = match event.phase {
            TouchPhase::Press => self.on_press(event.point, event.at),
            TouchPhase::Move => self.on_move(event.point),
            TouchPhase::Release => self.on_release(event.point).await,
        };
        outcomes.extend(more);
        outcomes
    }

    /// Fires the armed hold action if its deadline has passed by `now`.
    ///
    /// A press with no hold action stays a tap candidate however long it lasts.
    pub fn tick(&mut self, now: Instant) -> Vec<GestureOutcome> {
        if !self.hold_deadline().is_some_and(|deadline| now >= deadline) {
            return Vec::new();
        }
        match self.armed.take() {
            Some(armed) => self.fire_hold(armed),
            None => Vec::new(),
        }
    }

    pub async fn confirm(&mut self) -> Vec<GestureOutcome> {
        let Some((_, instance)) = self.take_edit_session() else {
            return Vec::new();
        };
        instance.plugin().confirm_edit();

        let plugin = instance.id().clone();
        let position = instance.position();
        let mut outcomes = vec![GestureOutcome::EditConfirmed {
            plugin: plugin.clone(),
            position,
        }];
        match self
            .registry
            .store()
            .upsert_widget_state(plugin.as_str(), true, position)
            .await
        {
            Ok(()) => info!(plugin = %plugin, x = position.x, y = position.y, "widget edit confirmed"),
            Err(err) => outcomes.push(notice_for(&MirrorError::from(err))),
        }
        outcomes
    }

    pub fn cancel(&mut self) -> Vec<GestureOutcome> {
        let Some((session, instance)) = self.take_edit_session() else {
            return Vec::new();
        };
        instance.set_position(session.original_position);
        instance.plugin().cancel_edit();
        info!(plugin = %instance.id(), "widget edit cancelled");
        vec![GestureOutcome::EditCancelled {
            plugin: instance.id().clone(),
            position: session.original_position,
        }]
    }

    pub async fn remove(&mut self) -> Vec<GestureOutcome> {
        let Some((_, instance)) = self.take_edit_session() else {
            return Vec::new();
        };
        let plugin = instance.id().clone();
        match self.registry.remove_widget_instance(plugin.as_str()).await {
            Ok(Some(position)) => vec![GestureOutcome::WidgetRemoved { plugin, position }],
            Ok(None) => Vec::new(),
            Err(err) => vec![notice_for(&err)],
        }
    }

    pub fn resize(&mut self, grow: bool) -> Vec<GestureOutcome> {
        let GestureState::WidgetEdit(session) = &self.state else {
            debug!(mode = ?self.mode(), "resize outside widget edit ignored");
            return Vec::new();
        };
        let Some(instance) = self.edit_target(session) else {
            return Vec::new();
        };
        instance.plugin().on_resize(grow);
        vec![GestureOutcome::Resized {
            plugin: instance.id().clone(),
            bounds: instance.bounds(),
        }]
    }

    /// Instantiates `kind_id` unless an instance of it is already running.
    pub async fn launch_app(&mut self, kind_id: &str) -> Vec<GestureOutcome> {
        if self.registry.running_app_instance_for(kind_id).is_some() {
            info!(plugin = kind_id, "app already open");
            return vec![GestureOutcome::Notice(Notice::already_open())];
        }
        let Some((factory, display_name)) = self
            .catalog
            .find_by_id(kind_id)
            .filter(|kind| kind.category() == PluginCategory::App)
            .map(|kind| (kind.factory(), kind.display_name().to_string()))
        else {
            return vec![notice_for(&MirrorError::UnknownKind(PluginId::new(kind_id)))];
        };

        let id = PluginId::new(kind_id);
        let properties = match self.registry.store().get_properties(kind_id).await {
            Ok(properties) => properties,
            Err(err) => {
                warn!(plugin = kind_id, error = %err, "app properties unavailable; starting with defaults");
                Properties::new()
            }
        };
        let context = PluginContext {
            id: id.clone(),
            enabled: true,
            position: Point::ZERO,
            properties: self.registry.sink().writer(id.clone()),
        };

        let started = tokio::task::spawn_blocking(move || {
            let mut plugin = factory(context);
            plugin.accept_properties(&properties);
            plugin
        })
        .await;
        let plugin = match started {
            Ok(plugin) => plugin,
            Err(err) => {
                error!(plugin = %id, error = %err, "app failed to start");
                return vec![GestureOutcome::Notice(Notice::new(
                    ErrorCode::Internal,
                    format!("{display_name} failed to start"),
                ))];
            }
        };

        let instance = PluginInstance::new(id.clone(), PluginCategory::App, Point::ZERO, plugin);
        let bounds = instance.bounds();
        match self.registry.register_app_instance(instance) {
            Ok(()) => vec![GestureOutcome::AppLaunched { plugin: id, bounds }],
            Err(err) => vec![notice_for(&err)],
        }
    }

    fn on_press(&mut self, point: Point, at: Instant) -> Vec<GestureOutcome> {
        let (next, outcomes) = match std::mem::take(&mut self.state) {
            GestureState::Idle => {
                self.arm(point, at);
                (GestureState::Idle, Vec::new())
            }
            GestureState::WidgetEdit(mut session) => {
                if !session.pointer_down {
                    session.pressed_control = self
                        .overlay_for(&session)
                        .and_then(|overlay| overlay.control_at(point));
                    if session.pressed_control.is_none() {
                        debug!("press outside edit controls ignored");
                    }
                }
                (GestureState::WidgetEdit(session), Vec::new())
            }
            GestureState::AppDrag(session) => (GestureState::AppDrag(session), Vec::new()),
            GestureState::AppPicker {
                session,
                entries,
                selected,
            } => {
                if session.pointer_down {
                    (
                        GestureState::AppPicker {
                            session,
                            entries,
                            selected,
                        },
                        Vec::new(),
                    )
                } else {
                    match AppPicker::entry_at(&entries, point).map(|entry| entry.id.clone()) {
                        Some(id) => (
                            GestureState::AppPicker {
                                session,
                                entries,
                                selected: Some(id),
                            },
                            Vec::new(),
                        ),
                        None => {
                            debug!("press outside thumbnails dismissed the picker");
                            (GestureState::Idle, vec![GestureOutcome::PickerDismissed])
                        }
                    }
                }
            }
        };
        self.state = next;
        outcomes
    }

    fn on_move(&self, point: Point) -> Vec<GestureOutcome> {
        match &self.state {
            GestureState::WidgetEdit(session) if session.pointer_down => {
                self.drag_widget(session, point)
            }
            GestureState::AppDrag(session) => self.drag_app(session, point),
            _ => Vec::new(),
        }
    }

    async fn on_release(&mut self, point: Point) -> Vec<GestureOutcome> {
        match std::mem::take(&mut self.state) {
            GestureState::Idle => self.release_armed(point),
            GestureState::WidgetEdit(mut session) => {
                let ended_drag = std::mem::replace(&mut session.pointer_down, false);
                let pressed = session.pressed_control.take();
                let hit = self
                    .overlay_for(&session)
                    .and_then(|overlay| overlay.control_at(point));
                self.state = GestureState::WidgetEdit(session);
                match hit {
                    // The opening drag drags the corner controls along, so only the
                    // footer may fire on its release.
                    Some(control)
                        if (ended_drag && !control.follows_target())
                            || pressed == Some(control) =>
                    {
                        self.apply_control(control).await
                    }
                    _ => Vec::new(),
                }
            }
            GestureState::AppDrag(session) => match session.target {
                Some(plugin) => vec![GestureOutcome::AppDragEnded { plugin }],
                None => Vec::new(),
            },
            GestureState::AppPicker {
                mut session,
                entries,
                selected,
            } => {
                if session.pointer_down {
                    session.pointer_down = false;
                    self.state = GestureState::AppPicker {
                        session,
                        entries,
                        selected,
                    };
                    return Vec::new();
                }
                match selected {
                    Some(kind_id) => self.launch_app(kind_id.as_str()).await,
                    None => {
                        self.state = GestureState::AppPicker {
                            session,
                            entries,
                            selected: None,
                        };
                        Vec::new()
                    }
                }
            }
        }
    }

    async fn apply_control(&mut self, control: Control) -> Vec<GestureOutcome> {
        match control {
            Control::Confirm => self.confirm().await,
            Control::Cancel => self.cancel(),
            Control::Remove => self.remove().await,
            Control::Grow => self.resize(true),
            Control::Shrink => self.resize(false),
        }
    }

    fn arm(&mut self, point: Point, at: Instant) {
        if self.armed.take().is_some() {
            debug!("new press cancelled a pending hold action");
        }

        let widget = self.registry.widget_at(point);
        let app = self.registry.app_at(point);
        let action = match (&widget, &app) {
            (None, None) => Some(HoldAction::OpenPicker),
            (Some(widget), None) => Some(HoldAction::EditWidget(widget.id().clone())),
            (None, Some(app)) => Some(HoldAction::DragApp(app.id().clone())),
            (Some(_), Some(_)) => None,
        };

        self.armed = Some(ArmedHold {
            action,
            start: point,
            deadline: at + self.hold_delay,
            tap_target: app.or(widget),
        });
    }

    fn release_armed(&mut self, point: Point) -> Vec<GestureOutcome> {
        let Some(armed) = self.armed.take() else {
            return Vec::new();
        };
        if point != armed.start {
            debug!("released away from the press point; not a tap");
            return Vec::new();
        }
        let Some(target) = armed.tap_target else {
            return Vec::new();
        };
        target.plugin().on_tap();
        vec![GestureOutcome::Tapped {
            plugin: target.id().clone(),
        }]
    }

    fn fire_hold(&mut self, armed: ArmedHold) -> Vec<GestureOutcome> {
        let Some(action) = armed.action else {
            return Vec::new();
        };
        match action {
            HoldAction::EditWidget(id) => {
                let Some(instance) = self.registry.widget(id.as_str()) else {
                    error!(plugin = %id, "hold target is no longer live");
                    return Vec::new();
                };
                let overlay = EditOverlay::layout(self.surface, instance.bounds());
                self.state = GestureState::WidgetEdit(GestureSession::new(
                    Mode::WidgetEdit,
                    armed.start,
                    Some(id.clone()),
                    instance.position(),
                ));
                info!(plugin = %id, "widget edit opened");
                vec![GestureOutcome::EditOpened {
                    plugin: id,
                    overlay,
                }]
            }
            HoldAction::DragApp(id) => {
                let Some(instance) = self.registry.running_app_instance_for(id.as_str()) else {
                    error!(plugin = %id, "hold target is no longer live");
                    return Vec::new();
                };
                self.state = GestureState::AppDrag(GestureSession::new(
                    Mode::AppDrag,
                    armed.start,
                    Some(id.clone()),
                    instance.position(),
                ));
                vec![GestureOutcome::AppDragStarted { plugin: id }]
            }
            HoldAction::OpenPicker => {
                let mut entries = AppPicker::open(&self.catalog, &self.registry.running_app_ids());
                AppPicker::lay_out(&mut entries, self.surface);
                self.state = GestureState::AppPicker {
                    session: GestureSession::new(Mode::AppPicker, armed.start, None, Point::ZERO),
                    entries: entries.clone(),
                    selected: None,
                };
                info!(apps = entries.len(), "app picker opened");
                vec![GestureOutcome::PickerOpened { entries }]
            }
        }
    }

    fn drag_widget(&self, session: &GestureSession, point: Point) -> Vec<GestureOutcome> {
        let Some(instance) = self.edit_target(session) else {
            return Vec::new();
        };
        let moving = Rect::from_origin_size(session.dragged_origin(point), instance.bounds().size());
        let obstacles = self.registry.obstacles_for(instance.id().as_str());
        let placement = self.snap.place(moving, self.surface, &obstacles);
        instance.set_position(placement.origin());

        vec![GestureOutcome::WidgetMoved {
            plugin: instance.id().clone(),
            placement,
            overlay: EditOverlay::layout(self.surface, instance.bounds()),
        }]
    }

    fn drag_app(&self, session: &GestureSession, point: Point) -> Vec<GestureOutcome> {
        let Some(instance) = session
            .target
            .as_ref()
            .and_then(|id| self.registry.running_app_instance_for(id.as_str()))
        else {
            error!(target = ?session.target, "dragged app is no longer running");
            return Vec::new();
        };
        let moving = Rect::from_origin_size(session.dragged_origin(point), instance.bounds().size());
        let position = SnapEngine::clamp_to_surface(moving, self.surface);
        instance.set_position(position);
        vec![GestureOutcome::AppMoved {
            plugin: instance.id().clone(),
            position,
        }]
    }

    fn edit_target(&self, session: &GestureSession) -> Option<Arc<PluginInstance>> {
        let instance = session
            .target
            .as_ref()
            .and_then(|id| self.registry.widget(id.as_str()));
        if instance.is_none() {
            error!(target = ?session.target, "edit target is no longer live");
        }
        instance
    }

    fn overlay_for(&self, session: &GestureSession) -> Option<EditOverlay> {
        let instance = self.edit_target(session)?;
        Some(EditOverlay::layout(self.surface, instance.bounds()))
    }

    /// Ends the edit session, returning it with its live target.
    fn take_edit_session(&mut self) -> Option<(GestureSession, Arc<PluginInstance>)> {
        if !matches!(self.state, GestureState::WidgetEdit(_)) {
            debug!(mode = ?self.mode(), "edit control outside widget edit ignored");
            return None;
        }
        let GestureState::WidgetEdit(session) = std::mem::take(&mut self.state) else {
            return None;
        };
        let instance = self.edit_target(&session)?;
        Some((session, instance))
    }
}

/// Converts a run-time failure into the notice shown to the user.
fn notice_for(err: &MirrorError) -> GestureOutcome {
    if err.is_recoverable() {
        warn!(error = %err, "gesture failed");
    } else {
        error!(error = %err, "gesture failed");
    }
    let notice = match err {
        MirrorError::DuplicateApp(_) => Notice::already_open(),
        MirrorError::UnknownKind(_) => Notice::new(ErrorCode::NotFound, err.to_string()),
        MirrorError::Storage(_) => {
            Notice::new(ErrorCode::Storage, format!("Could not save the layout: {err}"))
        }
        _ => Notice::new(ErrorCode::Internal, err.to_string()),
    };
    GestureOutcome::Notice(notice)
}

#[cfg(test)]
#[path = "../tests/gesture_tests.rs"]
mod tests;
