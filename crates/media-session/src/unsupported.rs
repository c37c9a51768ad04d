//! Fallback for hosts without a system media session service
//!
//! Acquisition always fails, so the session never initializes and every
//! publish call is a no-op.

use crate::error::{Result, SessionError};
use crate::platform::{
    CommandHandler, ControlSurface, MediaPlatform, MusicProperties, PlatformSession, Timeline,
};
use nowplay_core::{AlbumArt, PlaybackState};

#[derive(Clone, Copy, Debug, Default)]
pub struct UnsupportedPlatform;

/// Never constructed: exists so the platform has a session type
pub enum UnsupportedSession {}

impl MediaPlatform for UnsupportedPlatform {
    type Session = UnsupportedSession;

    fn name(&self) -> &'static str {
        "unsupported"
    }

    fn acquire(&self) -> Result<UnsupportedSession> {
        Err(SessionError::PlatformUnavailable)
    }
}

impl PlatformSession for UnsupportedSession {
    type Thumbnail = ();

    fn set_enabled(&mut self, _enabled: bool) -> anyhow::Result<()> {
        match *self {}
    }

    fn set_controls(&mut self, _controls: ControlSurface) -> anyhow::Result<()> {
        match *self {}
    }

    fn set_playback_state(&mut self, _state: PlaybackState) -> anyhow::Result<()> {
        match *self {}
    }

    fn reset_display(&mut self) -> anyhow::Result<()> {
        match *self {}
    }

    fn has_display(&self) -> bool {
        match *self {}
    }

    fn set_music_properties(&mut self, _properties: &MusicProperties) -> anyhow::Result<()> {
        match *self {}
    }

    fn set_timeline(&mut self, _timeline: Timeline) -> anyhow::Result<()> {
        match *self {}
    }

    fn create_thumbnail(&self, _art: AlbumArt<'_>) -> anyhow::Result<()> {
        match *self {}
    }

    fn set_thumbnail(&mut self, _thumbnail: Option<()>) -> anyhow::Result<()> {
        match *self {}
    }

    fn commit(&mut self) -> anyhow::Result<()> {
        match *self {}
    }

    fn set_command_handler(&mut self, _handler: CommandHandler) -> anyhow::Result<()> {
        match *self {}
    }
}
