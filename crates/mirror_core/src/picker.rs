//! App selection overlay: one entry per app kind, tiled as thumbnails.

use std::collections::HashSet;

use serde::Serialize;
use shared::{
    domain::PluginId,
    geometry::{Point, Rect, Size},
};

use crate::catalog::PluginCatalog;

const REGION_WIDTH_RATIO: f64 = 0.8;
const REGION_HEIGHT_RATIO: f64 = 0.9;
const THUMBNAIL_HEIGHT_RATIO: f64 = 1.0 / 6.0;
const H_GAP: f64 = 60.0;
const V_GAP: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PickerEntry {
    pub id: PluginId,
    pub display_name: String,
    /// Informational only; the registry rejects a second instance.
    pub already_running: bool,
    pub thumbnail: Rect,
}

pub struct AppPicker;

impl AppPicker {
    pub fn open(catalog: &PluginCatalog, already_running: &HashSet<PluginId>) -> Vec<PickerEntry> {
        catalog
            .list_app_kinds()
            .map(|kind| PickerEntry {
                id: kind.id().clone(),
                display_name: kind.display_name().to_string(),
                already_running: already_running.contains(kind.id()),
                thumbnail: Rect::default(),
            })
            .collect()
    }

    /// Flows square thumbnails left to right in centred rows inside the middle of the surface.
    pub fn lay_out(entries: &mut [PickerEntry], surface: Size) {
        if entries.is_empty() {
            return;
        }

        let side = surface.height * THUMBNAIL_HEIGHT_RATIO;
        let region = Rect::new(
            surface.width * (1.0 - REGION_WIDTH_RATIO) / 2.0,
            surface.height * (1.0 - REGION_HEIGHT_RATIO) / 2.0,
            surface.width * REGION_WIDTH_RATIO,
            surface.height * REGION_HEIGHT_RATIO,
        );

        let per_row = (((region.width + H_GAP) / (side + H_GAP)).floor() as usize).max(1);
        let rows = entries.len().div_ceil(per_row);
        let block_height = rows as f64 * side + (rows as f64 - 1.0) * V_GAP;
        let top = region.y + (region.height - block_height) / 2.0;

        for (row, chunk) in entries.chunks_mut(per_row).enumerate() {
            let count = chunk.len() as f64;
            let row_width = count * side + (count - 1.0) * H_GAP;
            let left = region.x + (region.width - row_width) / 2.0;
            let y = top + row as f64 * (side + V_GAP);
            for (column, entry) in chunk.iter_mut().enumerate() {
                let x = left + column as f64 * (side + H_GAP);
                entry.thumbnail = Rect::new(x, y, side, side);
            }
        }
    }

    pub fn entry_at(entries: &[PickerEntry], point: Point) -> Option<&PickerEntry> {
        entries.iter().find(|entry| entry.thumbnail.contains(point))
    }
}

#[cfg(test)]
#[path = "tests/picker_tests.rs"]
mod tests;
