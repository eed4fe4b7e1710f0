//! Plugin kinds that ship with the mirror.

pub mod clock;
pub mod date;
pub mod music_player;
mod text;

use mirror_core::{MirrorError, Plugin, PluginCatalog, PluginKind};

pub use clock::Clock;
pub use date::DateLabel;
pub use music_player::MusicPlayer;

/// Catalog of every built-in kind: the `clock` and `date` widgets and the music player app.
pub fn builtin_catalog() -> Result<PluginCatalog, MirrorError> {
    PluginCatalog::new([
        PluginKind::widget(clock::ID, "Clock")
            .factory(|context| -> Box<dyn Plugin> { Box::new(Clock::new(context.properties)) }),
        PluginKind::widget(date::ID, "Date")
            .factory(|context| -> Box<dyn Plugin> { Box::new(DateLabel::new(context.properties)) }),
        PluginKind::app(music_player::ID, "Music Player").factory(|context| -> Box<dyn Plugin> {
            Box::new(MusicPlayer::new(context.properties))
        }),
    ])
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
