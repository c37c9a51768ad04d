use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Transport state of the receiver as reported by the playback engine
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Closed,
    Opening,
    Playing,
    Paused,
    Stopped,
}

impl PlaybackState {
    /// Map a raw state code from the playback engine (0..=4 in declaration order).
    ///
    /// Unknown codes map to `Closed` so a stale "playing" indicator is never shown.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => PlaybackState::Opening,
            2 => PlaybackState::Playing,
            3 => PlaybackState::Paused,
            4 => PlaybackState::Stopped,
            _ => PlaybackState::Closed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackState::Closed => "closed",
            PlaybackState::Opening => "opening",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::Stopped => "stopped",
        }
    }
}

/// Error type for invalid playback state strings
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid playback state: {0}")]
pub struct ParsePlaybackStateError(pub String);

impl FromStr for PlaybackState {
    type Err = ParsePlaybackStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "closed" => Ok(PlaybackState::Closed),
            "opening" => Ok(PlaybackState::Opening),
            "playing" => Ok(PlaybackState::Playing),
            "paused" => Ok(PlaybackState::Paused),
            "stopped" => Ok(PlaybackState::Stopped),
            other => Err(ParsePlaybackStateError(other.to_string())),
        }
    }
}

/// Snapshot of the current track, built fresh by the caller for every update
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Track length in whole seconds, 0 when unknown (live streams)
    #[serde(default)]
    pub duration_secs: u32,
    /// Current position in whole seconds
    #[serde(default)]
    pub position_secs: u32,
}

impl MediaMetadata {
    pub fn new(title: impl Into<String>, artist: impl Into<String>, album: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            album: album.into(),
            duration_secs: 0,
            position_secs: 0,
        }
    }

    pub fn with_timeline(mut self, duration_secs: u32, position_secs: u32) -> Self {
        self.duration_secs = duration_secs;
        self.position_secs = position_secs;
        self
    }

    /// A timeline is only meaningful when the length is known
    pub fn has_timeline(&self) -> bool {
        self.duration_secs > 0
    }
}

/// Borrowed album art image: the caller keeps ownership of the buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AlbumArt<'a> {
    pub bytes: &'a [u8],
    /// Declared MIME type (e.g. "image/jpeg"), a hint only
    pub mime_type: &'a str,
}

impl<'a> AlbumArt<'a> {
    pub fn new(bytes: &'a [u8], mime_type: &'a str) -> Self {
        Self { bytes, mime_type }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}

/// Commands relayed back from the system transport controls
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportCommand {
    Play,
    Pause,
    Stop,
}

impl TransportCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportCommand::Play => "play",
            TransportCommand::Pause => "pause",
            TransportCommand::Stop => "stop",
        }
    }
}
