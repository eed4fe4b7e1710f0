//! Geometry of the edit controls shown while a widget is being edited.

use serde::Serialize;
use shared::geometry::{Point, Rect, Size};

/// Side of the controls pinned to the target's corners.
pub const CORNER_CONTROL_SIZE: f64 = 48.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    Remove,
    Grow,
    Shrink,
    Confirm,
    Cancel,
}

impl Control {
    /// Corner controls move with the target; the footer stays put.
    pub fn follows_target(self) -> bool {
        matches!(self, Control::Remove | Control::Grow | Control::Shrink)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditOverlay {
    controls: Vec<(Control, Rect)>,
}

impl EditOverlay {
    /// Remove, grow and shrink ride the target's top-right, bottom-right and bottom-left
    /// corners; confirm and cancel sit at fixed fractions of the surface.
    pub fn layout(surface: Size, target: Rect) -> Self {
        let footer_side = surface.width / 16.0;
        let footer_y = surface.height * 3.0 / 4.0;

        let controls = vec![
            (
                Control::Remove,
                Rect::centered_square(
                    Point::new(target.right(), target.top()),
                    CORNER_CONTROL_SIZE,
                ),
            ),
            (
                Control::Grow,
                Rect::centered_square(
                    Point::new(target.right(), target.bottom()),
                    CORNER_CONTROL_SIZE,
                ),
            ),
            (
                Control::Shrink,
                Rect::centered_square(
                    Point::new(target.left(), target.bottom()),
                    CORNER_CONTROL_SIZE,
                ),
            ),
            (
                Control::Confirm,
                Rect::centered_square(
                    Point::new(surface.width * 2.0 / 3.0, footer_y),
                    footer_side,
                ),
            ),
            (
                Control::Cancel,
                Rect::centered_square(Point::new(surface.width / 3.0, footer_y), footer_side),
            ),
        ];

        Self { controls }
    }

    pub fn controls(&self) -> &[(Control, Rect)] {
        &self.controls
    }

    pub fn rect_of(&self, control: Control) -> Option<Rect> {
        self.controls
            .iter()
            .find(|(candidate, _)| *candidate == control)
            .map(|(_, rect)| *rect)
    }

    /// First control under `point`, in layout order.
    pub fn control_at(&self, point: Point) -> Option<Control> {
        self.controls
            .iter()
            .find(|(_, rect)| rect.contains(point))
            .map(|(control, _)| *control)
    }
}
