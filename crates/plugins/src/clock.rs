//! Digital clock widget. Tapping cycles the time format; resizing changes the font size.

use chrono::{Local, NaiveTime};
use mirror_core::{Plugin, PropertyWriter, Surface};
use shared::domain::Properties;
use tracing::debug;

use crate::text;

pub const ID: &str = "clock";

pub const FORMAT_KEY: &str = "dateFormatSelection";
pub const FONT_SIZE_KEY: &str = "timeLabelFontSize";

pub const DEFAULT_FONT_SIZE: f64 = 46.0;
pub const FONT_STEP: f64 = 4.0;
const MIN_FONT_SIZE: f64 = 8.0;

/// 12-hour with seconds, 24-hour with seconds, 12-hour, 12-hour without meridiem, 24-hour.
const FORMATS: [&str; 5] = ["%I:%M:%S %p", "%H:%M:%S", "%I:%M %p", "%I:%M", "%H:%M"];

pub struct Clock {
    format: usize,
    font_size: f64,
    saved_font_size: f64,
    label: String,
    properties: PropertyWriter,
}

impl Clock {
    pub fn new(properties: PropertyWriter) -> Self {
        let mut clock = Self {
            format: 0,
            font_size: DEFAULT_FONT_SIZE,
            saved_font_size: DEFAULT_FONT_SIZE,
            label: String::new(),
            properties,
        };
        clock.refresh();
        clock
    }

    pub fn format(&self) -> usize {
        self.format
    }

    pub fn font_size(&self) -> f64 {
        self.font_size
    }

    pub fn label_at(&self, time: NaiveTime) -> String {
        time.format(FORMATS[self.format]).to_string()
    }

    fn refresh(&mut self) {
        self.label = self.label_at(Local::now().time());
    }
}

impl Plugin for Clock {
    fn render(&self) -> Surface {
        Surface::new(text::extent(&self.label, self.font_size), self.label.clone())
    }

    fn accept_properties(&mut self, properties: &Properties) {
        let format = text::parse_or(properties.get(FORMAT_KEY), 0);
        self.format = if format < FORMATS.len() { format } else { 0 };
        self.font_size = text::parse_or(properties.get(FONT_SIZE_KEY), DEFAULT_FONT_SIZE);
        self.saved_font_size = self.font_size;
        self.refresh();
    }

    fn update(&mut self) {
        self.refresh();
    }

    fn on_tap(&mut self) {
        self.format = (self.format + 1) % FORMATS.len();
        self.refresh();
        debug!(format = self.format, "clock format changed");
        self.properties.set(FORMAT_KEY, self.format);
    }

    fn on_resize(&mut self, grow: bool) {
        self.font_size = if grow {
            self.font_size + FONT_STEP
        } else {
            (self.font_size - FONT_STEP).max(MIN_FONT_SIZE)
        };
    }

    fn confirm_edit(&mut self) {
        self.saved_font_size = self.font_size;
        self.properties.set(FONT_SIZE_KEY, self.font_size);
    }

    fn cancel_edit(&mut self) {
        self.font_size = self.saved_font_size;
    }
}

#[cfg(test)]
#[path = "tests/clock_tests.rs"]
mod tests;
