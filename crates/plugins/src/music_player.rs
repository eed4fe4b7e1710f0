//! Local music player app. Plays files from a library directory in name order.
//!
//! The player is headless here: tapping toggles play and pause. Starting playback records
//! the track position so a relaunch resumes on the same track.

use std::{
    fs,
    path::{Path, PathBuf},
};

use mirror_core::{Plugin, PropertyWriter, Surface};
use shared::{domain::Properties, geometry::Size};
use tracing::{info, warn};

use crate::text;

pub const ID: &str = "music-player";

pub const LIBRARY_KEY: &str = "library";
pub const TRACK_KEY: &str = "trackIndex";

const EXTENSIONS: [&str; 2] = ["mp3", "wav"];
const PANEL: Size = Size::new(400.0, 320.0);

pub struct MusicPlayer {
    library: Option<PathBuf>,
    tracks: Vec<PathBuf>,
    cursor: usize,
    playing: bool,
    properties: PropertyWriter,
}

impl MusicPlayer {
    pub fn new(properties: PropertyWriter) -> Self {
        Self {
            library: None,
            tracks: Vec::new(),
            cursor: 0,
            playing: false,
            properties,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn tracks(&self) -> &[PathBuf] {
        &self.tracks
    }

    pub fn current_track(&self) -> Option<&Path> {
        self.tracks.get(self.cursor).map(PathBuf::as_path)
    }

    fn load_library(&mut self, library: PathBuf) {
        match scan(&library) {
            Ok(tracks) => {
                info!(library = %library.display(), tracks = tracks.len(), "music library loaded");
                self.tracks = tracks;
            }
            Err(err) => {
                warn!(library = %library.display(), error = %err, "music library unreadable");
                self.tracks.clear();
            }
        }
        self.library = Some(library);
    }
}

impl Plugin for MusicPlayer {
    fn render(&self) -> Surface {
        let status = if self.playing { "Playing" } else { "Paused" };
        let title = match (self.current_track(), &self.library) {
            (Some(track), _) => track
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default(),
            (None, Some(_)) => "Library is empty".to_string(),
            (None, None) => "No music library".to_string(),
        };
        let body = format!("{status}\n{title}");
        let extent = text::extent(&body, 18.0);
        Surface::new(
            Size::new(extent.width.max(PANEL.width), extent.height.max(PANEL.height)),
            body,
        )
    }

    /// Scans the library directory; runs on the blocking pool together with the factory.
    fn accept_properties(&mut self, properties: &Properties) {
        if let Some(library) = properties.get(LIBRARY_KEY) {
            self.load_library(PathBuf::from(library));
        }
        let cursor = text::parse_or(properties.get(TRACK_KEY), 0usize);
        self.cursor = if cursor < self.tracks.len() { cursor } else { 0 };
    }

    fn on_tap(&mut self) {
        if self.tracks.is_empty() {
            return;
        }
        self.playing = !self.playing;
        if self.playing {
            self.properties.set(TRACK_KEY, self.cursor);
        }
        info!(
            playing = self.playing,
            track = ?self.current_track(),
            "music player toggled"
        );
    }
}

fn scan(library: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut tracks = Vec::new();
    for entry in fs::read_dir(library)? {
        let path = entry?.path();
        let playable = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)));
        if playable && path.is_file() {
            tracks.push(path);
        }
    }
    tracks.sort();
    Ok(tracks)
}

#[cfg(test)]
#[path = "tests/music_player_tests.rs"]
mod tests;
