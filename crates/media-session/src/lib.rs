//! Now-playing integration with the host's system media session
//!
//! This crate publishes the receiver's playback state, track metadata and
//! album art to the operating system's media session service so that the
//! lock screen, taskbar flyout and hardware media keys reflect what the
//! receiver is playing:
//! - Windows: System Media Transport Controls (SMTC)
//! - Other hosts: no session service, the integration stays inactive
//!
//! Failures never reach the caller. They are logged and the system UI simply
//! does not appear or does not update; playback is unaffected.

pub mod config;
pub mod error;
pub mod platform;
pub mod session;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod thumbnail;

// Platform-specific modules
#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(not(target_os = "windows"))]
pub mod unsupported;

pub use config::{Placeholders, SessionConfig};
pub use error::SessionError;
pub use nowplay_core::{AlbumArt, MediaMetadata, PlaybackState, TransportCommand};
pub use platform::{ControlSurface, MediaPlatform, MusicProperties, PlatformSession, Timeline, TICKS_PER_SECOND};
pub use session::NowPlayingSession;

/// Media session service of the host this crate is built for
#[cfg(target_os = "windows")]
pub type SystemPlatform = windows::SmtcPlatform;

#[cfg(not(target_os = "windows"))]
pub type SystemPlatform = unsupported::UnsupportedPlatform;

/// Check whether the host exposes a media session service
pub fn is_available() -> bool {
    NowPlayingSession::<SystemPlatform>::is_available()
}
