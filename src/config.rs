//! Application settings
//!
//! Settings are stored as JSON in the user's config directory:
//! - Linux: ~/.config/swipe-cull/settings.json
//! - macOS: ~/Library/Application Support/swipe-cull/settings.json
//! - Windows: %APPDATA%\swipe-cull\settings.json
//!
//! A missing file yields the defaults, and every field has a default so a
//! partial file still loads.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::state::data::{MediaKind, SortOrder};

/// Environment variable that overrides the configured log level
pub const LOG_ENV: &str = "SWIPE_CULL_LOG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub deck: DeckConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Gesture and animation tuning for the swipe deck
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    /// Fraction of the viewport width a drag must exceed to commit
    pub threshold_ratio: f32,
    /// Distance of the off-screen target, as a fraction of the viewport width
    pub eject_ratio: f32,
    /// Maximum card tilt in degrees
    pub rotation_max_deg: f32,
    pub commit_duration_ms: u64,
    pub spring_stiffness: f32,
    pub spring_damping: f32,
    /// Scale of the next card while the current one sits at rest
    pub next_card_rest_scale: f32,
    /// Scale of the next card once the current one is fully dragged away
    pub next_card_focus_scale: f32,
    /// Initial viewport width; replaced by the live canvas width
    pub viewport_width: f32,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            threshold_ratio: 0.25,
            eject_ratio: 1.2,
            rotation_max_deg: 12.0,
            commit_duration_ms: 200,
            spring_stiffness: 180.0,
            spring_damping: 22.0,
            next_card_rest_scale: 0.96,
            next_card_focus_scale: 1.0,
            viewport_width: 800.0,
        }
    }
}

impl DeckConfig {
    pub fn commit_duration(&self) -> Duration {
        Duration::from_millis(self.commit_duration_ms)
    }
}

/// Pagination and prefetch settings for the asset feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub page_size: usize,
    pub kinds: Vec<MediaKind>,
    pub sort: SortOrder,
    /// Window in which prefetch triggers collapse into one fetch
    pub load_more_cooldown_ms: u64,
    /// Prefetch once the cursor is within this many items of the end
    pub prefetch_margin: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: 200,
            kinds: vec![MediaKind::Photo],
            sort: SortOrder::NewestFirst,
            load_more_cooldown_ms: 300,
            prefetch_margin: 40,
        }
    }
}

impl FeedConfig {
    pub fn load_more_cooldown(&self) -> Duration {
        Duration::from_millis(self.load_more_cooldown_ms)
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level or filter directive: trace, debug, info, warn, error, off
    pub level: String,
    /// Output format: text or json
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl Settings {
    /// Get the path where the settings file lives
    pub fn default_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir().or_else(dirs::home_dir)?;
        path.push("swipe-cull");
        path.push("settings.json");
        Some(path)
    }

    /// Load settings from a file, falling back to defaults if it is missing
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load settings from the default location
    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write settings, creating the parent directory if needed
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings = Settings::from_json(r#"{ "feed": { "page_size": 50 } }"#).unwrap();

        assert_eq!(settings.feed.page_size, 50);
        assert_eq!(settings.feed.load_more_cooldown_ms, 300);
        assert_eq!(settings.feed.kinds, vec![MediaKind::Photo]);
        assert_eq!(settings.deck, DeckConfig::default());
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = Settings::default();
        settings.deck.threshold_ratio = 0.3;
        settings.feed.sort = SortOrder::OldestFirst;
        settings.save_to(&path).unwrap();

        let restored = Settings::load_from(&path).unwrap();
        assert_eq!(restored, settings);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        assert!(matches!(
            Settings::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
