//! Day-of-week and date widget. Tapping cycles the label alignment.

use chrono::{Local, NaiveDate};
use mirror_core::{Plugin, PropertyWriter, Surface};
use shared::domain::Properties;

use crate::text;

pub const ID: &str = "date";

pub const ALIGNMENT_KEY: &str = "labelAlignment";
pub const FONT_SIZE_KEY: &str = "labelFontSize";

pub const DEFAULT_FONT_SIZE: f64 = 22.0;
pub const FONT_STEP: f64 = 4.0;
const MIN_FONT_SIZE: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    const ALL: [Alignment; 4] = [
        Alignment::Left,
        Alignment::Center,
        Alignment::Right,
        Alignment::Justify,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn from_index(index: usize) -> Self {
        Self::ALL.get(index).copied().unwrap_or(Alignment::Left)
    }

    fn next(self) -> Self {
        Self::from_index((self.index() + 1) % Self::ALL.len())
    }
}

pub struct DateLabel {
    alignment: Alignment,
    font_size: f64,
    saved_font_size: f64,
    label: String,
    properties: PropertyWriter,
}

impl DateLabel {
    pub fn new(properties: PropertyWriter) -> Self {
        let mut date = Self {
            alignment: Alignment::Left,
            font_size: DEFAULT_FONT_SIZE,
            saved_font_size: DEFAULT_FONT_SIZE,
            label: String::new(),
            properties,
        };
        date.refresh();
        date
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    pub fn font_size(&self) -> f64 {
        self.font_size
    }

    /// Weekday over month and day, each line padded to the current alignment.
    pub fn label_on(&self, date: NaiveDate) -> String {
        let raw = date.format("%A\n%B %-d").to_string();
        let width = raw.lines().map(|line| line.chars().count()).max().unwrap_or(0);
        raw.lines()
            .map(|line| match self.alignment {
                Alignment::Left | Alignment::Justify => format!("{line:<width$}"),
                Alignment::Center => format!("{line:^width$}"),
                Alignment::Right => format!("{line:>width$}"),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn refresh(&mut self) {
        self.label = self.label_on(Local::now().date_naive());
    }
}

impl Plugin for DateLabel {
    fn render(&self) -> Surface {
        Surface::new(text::extent(&self.label, self.font_size), self.label.clone())
    }

    fn accept_properties(&mut self, properties: &Properties) {
        self.alignment = Alignment::from_index(text::parse_or(properties.get(ALIGNMENT_KEY), 0));
        self.font_size = text::parse_or(properties.get(FONT_SIZE_KEY), DEFAULT_FONT_SIZE);
        self.saved_font_size = self.font_size;
        self.refresh();
    }

    fn update(&mut self) {
        self.refresh();
    }

    fn on_tap(&mut self) {
        self.alignment = self.alignment.next();
        self.refresh();
        self.properties.set(ALIGNMENT_KEY, self.alignment.index());
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
#[path = "tests/date_tests.rs"]
mod tests;
