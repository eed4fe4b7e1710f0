//! Edge and neighbour snapping for dragged widgets. Pure geometry.

use serde::Serialize;
use shared::{
    domain::PluginId,
    geometry::{Point, Rect, Size},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

/// A snap decision: which edge of the moving rectangle latched, and its new origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Snap {
    pub edge: Edge,
    pub origin: Point,
}

/// Where a dragged rectangle ends up for one move event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Placement {
    /// Follows the touch point; nothing within reach.
    Free { origin: Point },
    /// Entirely off the surface; snapping skipped for this frame.
    OffSurface { origin: Point },
    Surface { snap: Snap },
    Neighbour { snap: Snap, obstacle: PluginId },
}

impl Placement {
    pub fn origin(&self) -> Point {
        match self {
            Placement::Free { origin } | Placement::OffSurface { origin } => *origin,
            Placement::Surface { snap } | Placement::Neighbour { snap, .. } => snap.origin,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapEngine {
    threshold: f64,
}

impl SnapEngine {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// A gap is snap-worthy when `0 < |gap| <= threshold`. Already-flush edges are left alone.
    fn within_reach(&self, gap: f64) -> bool {
        let gap = gap.abs();
        gap > 0.0 && gap <= self.threshold
    }

    /// False only when `moving` lies entirely beyond one of the surface edges.
    pub fn is_valid_location(moving: Rect, surface: Size) -> bool {
        moving.right() >= 0.0
            && moving.bottom() >= 0.0
            && moving.left() <= surface.width
            && moving.top() <= surface.height
    }

    /// Latches one edge of `moving` to the matching surface edge. Checked top, right, bottom, left.
    pub fn compute_edge_snap(&self, moving: Rect, surface: Size) -> Option<Snap> {
        let origin = moving.origin();
        let candidates = [
            (Edge::Top, moving.top(), Point::new(origin.x, 0.0)),
            (
                Edge::Right,
                moving.right() - surface.width,
                Point::new(surface.width - moving.width, origin.y),
            ),
            (
                Edge::Bottom,
                moving.bottom() - surface.height,
                Point::new(origin.x, surface.height - moving.height),
            ),
            (Edge::Left, moving.left(), Point::new(0.0, origin.y)),
        ];

        candidates
            .into_iter()
            .find(|(_, gap, _)| self.within_reach(*gap))
            .map(|(edge, _, origin)| Snap { edge, origin })
    }

    /// Latches `moving` flush against the first obstacle it is adjacent to.
    ///
    /// Top and bottom snaps need the horizontal ranges to intersect, left and right snaps the
    /// vertical ones, so diagonal neighbours never attract each other. Only one snap is applied.
    pub fn compute_widget_snap(
        &self,
        moving: Rect,
        obstacles: &[(PluginId, Rect)],
    ) -> Option<(Snap, PluginId)> {
        obstacles.iter().find_map(|(id, obstacle)| {
            self.snap_against(moving, obstacle)
                .map(|snap| (snap, id.clone()))
        })
    }

    fn snap_against(&self, moving: Rect, obstacle: &Rect) -> Option<Snap> {
        let origin = moving.origin();
        let horizontal = moving.overlaps_horizontally(obstacle);
        let vertical = moving.overlaps_vertically(obstacle);

        let candidates = [
            (
                Edge::Top,
                moving.top() - obstacle.bottom(),
                horizontal,
                Point::new(origin.x, obstacle.bottom()),
            ),
            (
                Edge::Right,
                moving.right() - obstacle.left(),
                vertical,
                Point::new(obstacle.left() - moving.width, origin.y),
            ),
            (
                Edge::Bottom,
                moving.bottom() - obstacle.top(),
                horizontal,
                Point::new(origin.x, obstacle.top() - moving.height),
            ),
            (
                Edge::Left,
                moving.left() - obstacle.right(),
                vertical,
                Point::new(obstacle.right(), origin.y),
            ),
        ];

        candidates
            .into_iter()
            .find(|(_, gap, overlaps, _)| *overlaps && self.within_reach(*gap))
            .map(|(edge, _, _, origin)| Snap { edge, origin })
    }

    /// Full per-move resolution: surface edges first, then neighbours, else the raw position.
    pub fn place(&self, moving: Rect, surface: Size, obstacles: &[(PluginId, Rect)]) -> Placement {
        if !Self::is_valid_location(moving, surface) {
            return Placement::OffSurface {
                origin: moving.origin(),
            };
        }
        if let Some(snap) = self.compute_edge_snap(moving, surface) {
            return Placement::Surface { snap };
        }
        if let Some((snap, obstacle)) = self.compute_widget_snap(moving, obstacles) {
            return Placement::Neighbour { snap, obstacle };
        }
        Placement::Free {
            origin: moving.origin(),
        }
    }

    /// Keeps `moving` fully inside the surface. Used for app drags, which never snap.
    pub fn clamp_to_surface(moving: Rect, surface: Size) -> Point {
        let max_x = (surface.width - moving.width).max(0.0);
        let max_y = (surface.height - moving.height).max(0.0);
        Point::new(moving.x.clamp(0.0, max_x), moving.y.clamp(0.0, max_y))
    }
}

#[cfg(test)]
#[path = "tests/snap_tests.rs"]
mod tests;
