//! Configuration for the now-playing session
//!
//! Read from the `[now_playing]` table of the receiver's TOML config file.
//! Every field is optional; a missing table yields the defaults.
//!
//! ```toml
//! [now_playing]
//! [now_playing.placeholders]
//! artist = "Unknown Artist"
//!
//! [now_playing.controls]
//! stop = false
//! ```

use crate::platform::ControlSurface;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_TITLE: &str = "Unknown";
pub const DEFAULT_ARTIST: &str = "Unknown Artist";
pub const DEFAULT_ALBUM: &str = "Unknown Album";

/// Text shown by the system UI when a metadata field is empty
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Placeholders {
    pub title: String,
    pub artist: String,
    pub album: String,
}

impl Default for Placeholders {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            artist: DEFAULT_ARTIST.to_string(),
            album: DEFAULT_ALBUM.to_string(),
        }
    }
}

impl Placeholders {
    /// Replace blank placeholders with the built-in ones so nothing published is empty
    fn normalized(mut self) -> Self {
        if self.title.trim().is_empty() {
            self.title = DEFAULT_TITLE.to_string();
        }
        if self.artist.trim().is_empty() {
            self.artist = DEFAULT_ARTIST.to_string();
        }
        if self.album.trim().is_empty() {
            self.album = DEFAULT_ALBUM.to_string();
        }
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub placeholders: Placeholders,
    pub controls: ControlSurface,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    now_playing: SessionConfig,
}

impl SessionConfig {
    /// Parse the `[now_playing]` table out of a full config document
    pub fn from_toml_str(data: &str) -> Result<Self> {
        let doc: ConfigDocument =
            toml::from_str(data).context("Failed to parse now_playing config")?;
        Ok(doc.now_playing.normalized())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&data)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    pub fn normalized(mut self) -> Self {
        self.placeholders = self.placeholders.normalized();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = SessionConfig::from_toml_str("").unwrap();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.placeholders.title, "Unknown");
        assert_eq!(config.placeholders.artist, "Unknown Artist");
        assert_eq!(config.placeholders.album, "Unknown Album");
    }

    #[test]
    fn test_partial_override() {
        let config = SessionConfig::from_toml_str(
            r#"
            [other_section]
            key = 1

            [now_playing.placeholders]
            artist = "Various"

            [now_playing.controls]
            stop = false
            "#,
        )
        .unwrap();

        assert_eq!(config.placeholders.artist, "Various");
        assert_eq!(config.placeholders.title, "Unknown");
        assert!(!config.controls.stop);
        assert!(config.controls.play);
        assert!(!config.controls.next);
    }

    #[test]
    fn test_blank_placeholder_falls_back() {
        let config = SessionConfig::from_toml_str(
            r#"
            [now_playing.placeholders]
            title = "  "
            album = ""
            "#,
        )
        .unwrap();

        assert_eq!(config.placeholders.title, "Unknown");
        assert_eq!(config.placeholders.album, "Unknown Album");
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(SessionConfig::from_toml_str("[now_playing\nbroken").is_err());
        assert!(SessionConfig::from_toml_str("[now_playing.controls]\nplay = \"yes\"").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = SessionConfig::load("/nonexistent/nowplay/config.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
