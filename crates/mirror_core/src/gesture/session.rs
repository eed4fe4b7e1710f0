use serde::Serialize;
use shared::{domain::PluginId, geometry::Point};

use super::overlay::Control;
use crate::picker::PickerEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Idle,
    WidgetEdit,
    AppDrag,
    AppPicker,
}

/// Per-gesture facts threaded through the state machine, never stored elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureSession {
    pub start_point: Point,
    pub mode: Mode,
    pub target: Option<PluginId>,
    /// Target position when the hold fired; restored on cancel.
    pub original_position: Point,
    /// The press that opened the session has not been released yet.
    pub pointer_down: bool,
    /// Edit control under the latest press, if any.
    pub pressed_control: Option<Control>,
}

impl GestureSession {
    pub fn new(mode: Mode, start_point: Point, target: Option<PluginId>, original_position: Point) -> Self {
        Self {
            start_point,
            mode,
            target,
            original_position,
            pointer_down: true,
            pressed_control: None,
        }
    }

    /// Where the target goes when the touch is at `point`: the original position shifted by the drag.
    pub fn dragged_origin(&self, point: Point) -> Point {
        let (dx, dy) = point.delta_from(self.start_point);
        self.original_position.offset(dx, dy)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) enum GestureState {
    #[default]
    Idle,
    WidgetEdit(GestureSession),
    AppDrag(GestureSession),
    AppPicker {
        session: GestureSession,
        entries: Vec<PickerEntry>,
        selected: Option<PluginId>,
    },
}

impl GestureState {
    pub(crate) fn mode(&self) -> Mode {
        match self {
            GestureState::Idle => Mode::Idle,
            GestureState::WidgetEdit(_) => Mode::WidgetEdit,
            GestureState::AppDrag(_) => Mode::AppDrag,
            GestureState::AppPicker { .. } => Mode::AppPicker,
        }
    }

    pub(crate) fn session(&self) -> Option<&GestureSession> {
        match self {
            GestureState::Idle => None,
            GestureState::WidgetEdit(session) | GestureState::AppDrag(session) => Some(session),
            GestureState::AppPicker { session, .. } => Some(session),
        }
    }
}
