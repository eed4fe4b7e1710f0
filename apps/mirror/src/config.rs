use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use mirror_core::InteractionConfig;
use serde::Deserialize;
use shared::geometry::Size;
use tracing::{debug, warn};

pub const DEFAULT_CONFIG_FILE: &str = "mirror.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub database_url: String,
    pub surface: Size,
    pub interaction: InteractionConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./data/mirror.db".into(),
            surface: Size::new(1400.0, 700.0),
            interaction: InteractionConfig::default(),
        }
    }
}

impl Settings {
    /// Rejects values the runtime cannot work with. Run again after command-line overrides.
    pub fn validate(&self) -> anyhow::Result<()> {
        let interaction = &self.interaction;
        anyhow::ensure!(
            !interaction.update_interval.is_zero(),
            "update interval must be at least 1 ms"
        );
        anyhow::ensure!(
            !interaction.hold_delay.is_zero(),
            "hold delay must be at least 1 ms"
        );
        anyhow::ensure!(
            interaction.snap_threshold.is_finite() && interaction.snap_threshold > 0.0,
            "snap threshold must be a positive number, got {}",
            interaction.snap_threshold
        );
        anyhow::ensure!(
            positive(self.surface.width) && positive(self.surface.height),
            "surface size must be positive, got {}x{}",
            self.surface.width,
            self.surface.height
        );
        Ok(())
    }
}

fn positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

/// Keys accepted in `mirror.toml`. Anything left out keeps its default.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    database_url: Option<String>,
    hold_delay_ms: Option<u64>,
    snap_threshold: Option<f64>,
    update_interval_ms: Option<u64>,
    surface_width: Option<f64>,
    surface_height: Option<f64>,
}

/// Defaults, then the config file, then environment variables.
///
/// An explicitly requested file must exist; the default `mirror.toml` is optional.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (path, required) = match config_path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    match fs::read_to_string(&path) {
        Ok(raw) => {
            let file: FileSettings = toml::from_str(&raw)
                .with_context(|| format!("invalid config file '{}'", path.display()))?;
            apply_file(&mut settings, file);
            debug!(path = %path.display(), "loaded config file");
        }
        Err(err) if required => {
            return Err(err).with_context(|| format!("failed to read config file '{}'", path.display()));
        }
        Err(_) => {}
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings.validate().context("invalid settings")?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, file: FileSettings) {
    if let Some(v) = file.database_url {
        settings.database_url = v;
    }
    if let Some(v) = file.hold_delay_ms {
        settings.interaction.hold_delay = Duration::from_millis(v);
    }
    if let Some(v) = file.snap_threshold {
        settings.interaction.snap_threshold = v;
    }
    if let Some(v) = file.update_interval_ms {
        settings.interaction.update_interval = Duration::from_millis(v);
    }
    if let Some(v) = file.surface_width {
        settings.surface.width = v;
    }
    if let Some(v) = file.surface_height {
        settings.surface.height = v;
    }
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("MIRROR_DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = var("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = parsed(&var, "APP__HOLD_DELAY_MS") {
        settings.interaction.hold_delay = Duration::from_millis(v);
    }
    if let Some(v) = parsed(&var, "APP__SNAP_THRESHOLD") {
        settings.interaction.snap_threshold = v;
    }
    if let Some(v) = parsed(&var, "APP__UPDATE_INTERVAL_MS") {
        settings.interaction.update_interval = Duration::from_millis(v);
    }
    if let Some(v) = parsed(&var, "APP__SURFACE_WIDTH") {
        settings.surface.width = v;
    }
    if let Some(v) = parsed(&var, "APP__SURFACE_HEIGHT") {
        settings.surface.height = v;
    }
}

fn parsed<T: std::str::FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = var(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparsable environment override");
            None
        }
    }
}

/// Turns bare file paths into `sqlite://` URLs; other URLs pass through.
pub fn prepare_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:") || raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        return format!("sqlite://{}", path.replace('\\', "/"));
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
