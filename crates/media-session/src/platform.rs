//! Seam between the session manager and a host media session service
//!
//! The manager only talks to these traits, so the Windows backend, the
//! unsupported-host backend and the test fake are interchangeable.

use crate::error;
use anyhow::Result;
use nowplay_core::{AlbumArt, PlaybackState, TransportCommand};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// Platform timeline resolution: 100-nanosecond ticks
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Convert whole seconds to platform ticks
pub fn secs_to_ticks(secs: u32) -> i64 {
    i64::from(secs) * TICKS_PER_SECOND
}

/// Playback progress within a track, in platform ticks
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timeline {
    pub position_ticks: i64,
    pub max_seek_ticks: i64,
}

impl Timeline {
    pub fn from_secs(duration_secs: u32, position_secs: u32) -> Self {
        Self {
            position_ticks: secs_to_ticks(position_secs),
            max_seek_ticks: secs_to_ticks(duration_secs),
        }
    }
}

/// Display text as it will be shown by the system UI (never empty)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MusicProperties {
    pub title: String,
    pub artist: String,
    pub album: String,
}

/// Which transport buttons the system UI offers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ControlSurface {
    pub play: bool,
    pub pause: bool,
    pub stop: bool,
    pub next: bool,
    pub previous: bool,
}

impl Default for ControlSurface {
    /// The receiver cannot navigate tracks, so next/previous stay off
    fn default() -> Self {
        Self {
            play: true,
            pause: true,
            stop: true,
            next: false,
            previous: false,
        }
    }
}

/// Callback invoked when the user presses a system transport button
pub type CommandHandler = Arc<dyn Fn(TransportCommand) + Send + Sync>;

/// A host media session service
pub trait MediaPlatform: Send + Sync {
    type Session: PlatformSession;

    /// Short name used in log lines
    fn name(&self) -> &'static str;

    /// Obtain a fresh session handle together with its display-data sub-object
    fn acquire(&self) -> error::Result<Self::Session>;

    /// Presence test: acquire a handle and release it right away
    fn probe(&self) -> bool {
        match self.acquire() {
            Ok(session) => {
                drop(session);
                true
            }
            Err(e) => {
                debug!("{} availability check failed: {}", self.name(), e);
                false
            }
        }
    }
}

/// An acquired session handle. Dropping it releases the platform resource.
pub trait PlatformSession: Send {
    /// Platform-specific thumbnail reference
    type Thumbnail: Clone;

    fn set_enabled(&mut self, enabled: bool) -> Result<()>;

    fn set_controls(&mut self, controls: ControlSurface) -> Result<()>;

    fn set_playback_state(&mut self, state: PlaybackState) -> Result<()>;

    /// Empty every display field and mark the content as music. Takes effect on the next commit.
    fn reset_display(&mut self) -> Result<()>;

    /// Whether the display-data sub-object is currently reachable
    fn has_display(&self) -> bool;

    fn set_music_properties(&mut self, properties: &MusicProperties) -> Result<()>;

    fn set_timeline(&mut self, timeline: Timeline) -> Result<()>;

    /// Wrap the art bytes in a thumbnail reference without re-encoding them
    fn create_thumbnail(&self, art: AlbumArt<'_>) -> Result<Self::Thumbnail>;

    /// `None` removes the current thumbnail
    fn set_thumbnail(&mut self, thumbnail: Option<Self::Thumbnail>) -> Result<()>;

    /// Publish all pending display changes in one refresh
    fn commit(&mut self) -> Result<()>;

    fn set_command_handler(&mut self, handler: CommandHandler) -> Result<()>;
}
