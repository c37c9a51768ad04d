//! Now-playing session lifecycle and publishing
//!
//! [`NowPlayingSession`] owns the platform session handle behind a single
//! mutex. Every public method is safe to call from any thread and never
//! propagates a platform error or panic; failures end up in the log and the
//! session is left as it was before the call.

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::platform::{CommandHandler, MediaPlatform, MusicProperties, PlatformSession, Timeline};
use crate::thumbnail;
use crate::SystemPlatform;
use nowplay_core::{AlbumArt, MediaMetadata, PlaybackState, TransportCommand};
use std::any::Any;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

struct Inner<S: PlatformSession> {
    /// Present exactly while the session is initialized
    session: Option<S>,
    /// Display fields as of the last successful commit
    committed: Committed<S::Thumbnail>,
    command_handler: Option<CommandHandler>,
}

type ThumbnailOf<P> = <<P as MediaPlatform>::Session as PlatformSession>::Thumbnail;

struct Committed<T> {
    music: Option<MusicProperties>,
    timeline: Option<Timeline>,
    thumbnail: Option<T>,
}

impl<T> Default for Committed<T> {
    fn default() -> Self {
        Self {
            music: None,
            timeline: None,
            thumbnail: None,
        }
    }
}

pub struct NowPlayingSession<P: MediaPlatform = SystemPlatform> {
    platform: P,
    config: SessionConfig,
    inner: Mutex<Inner<P::Session>>,
}

impl NowPlayingSession<SystemPlatform> {
    /// Session backed by the host's media session service
    pub fn new() -> Self {
        if !Self::is_available() {
            warn!("System media transport controls not available on this system");
        }
        Self::with_platform(SystemPlatform::default(), SessionConfig::default())
    }

    pub fn with_config(config: SessionConfig) -> Self {
        Self::with_platform(SystemPlatform::default(), config)
    }

    /// Check whether the host exposes a media session service at all.
    ///
    /// Independent of any instance, usable before `initialize`.
    pub fn is_available() -> bool {
        SystemPlatform::default().probe()
    }
}

impl Default for NowPlayingSession<SystemPlatform> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: MediaPlatform> NowPlayingSession<P> {
    pub fn with_platform(platform: P, config: SessionConfig) -> Self {
        Self {
            platform,
            config: config.normalized(),
            inner: Mutex::new(Inner {
                session: None,
                committed: Committed::default(),
                command_handler: None,
            }),
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Acquire the platform session and arm the transport controls.
    ///
    /// Returns `true` immediately when already initialized. On any failure
    /// the handle is released again and the session stays uninitialized.
    pub fn initialize(&self) -> bool {
        let mut inner = self.lock();

        if inner.session.is_some() {
            return true;
        }

        let mut session = match guarded("Acquiring media session", || self.platform.acquire()) {
            Some(session) => session,
            None => return false,
        };

        if !session.has_display() {
            error!("Failed to get display updater from {}", self.platform.name());
            return false;
        }

        let controls = self.config.controls;
        let armed = guarded("Arming media session controls", || {
            session.set_enabled(true)?;
            session.set_controls(controls)?;
            session.reset_display()
        });
        if armed.is_none() {
            guarded("Disabling media session", || session.set_enabled(false));
            return false;
        }

        if let Some(handler) = inner.command_handler.clone() {
            if guarded("Registering transport command handler", || {
                session.set_command_handler(handler)
            })
            .is_none()
            {
                warn!("Transport buttons will not reach the receiver");
            }
        }

        inner.session = Some(session);
        inner.committed = Committed::default();
        info!("{} media session initialized successfully", self.platform.name());
        true
    }

    /// Disable and release the platform session. Idempotent.
    pub fn shutdown(&self) {
        let mut inner = self.lock();

        if let Some(mut session) = inner.session.take() {
            inner.committed = Committed::default();
            guarded("Disabling media session", || session.set_enabled(false));
            // Dropping the handle releases it even if disabling failed
            drop(session);
            info!("{} media session shut down", self.platform.name());
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.lock().session.is_some()
    }

    /// Publish the receiver's transport state
    pub fn set_playback_state(&self, state: PlaybackState) {
        let mut inner = self.lock();
        if let Some(session) = inner.session.as_mut() {
            guarded("Setting playback state", || {
                session
                    .set_playback_state(state)
                    .map_err(SessionError::publish)
            });
        }
    }

    /// Publish title/artist/album and, for tracks of known length, the timeline
    pub fn update_metadata(&self, metadata: &MediaMetadata) {
        let properties = self.music_properties(metadata);
        let timeline = metadata
            .has_timeline()
            .then(|| Timeline::from_secs(metadata.duration_secs, metadata.position_secs));

        self.with_session("Updating metadata", |session, committed| {
            if !session.has_display() {
                return Ok(());
            }

            session.set_music_properties(&properties)?;
            if let Some(timeline) = timeline {
                session.set_timeline(timeline)?;
            }
            session.commit()?;

            committed.music = Some(properties.clone());
            if timeline.is_some() {
                committed.timeline = timeline;
            }

            debug!(
                "Metadata updated - Title: {}, Artist: {}, Album: {}",
                properties.title, properties.artist, properties.album
            );
            Ok(())
        });
    }

    /// Replace the thumbnail with `bytes`. Empty buffers are ignored.
    ///
    /// If the thumbnail cannot be built the previous one stays in place.
    pub fn set_album_art(&self, bytes: &[u8], mime_type: &str) {
        let art = AlbumArt::new(bytes, mime_type);
        if art.is_empty() {
            return;
        }

        self.with_session("Setting album art", |session, committed| {
            if !session.has_display() {
                return Ok(());
            }

            let Some(thumbnail) = thumbnail::create_thumbnail(&*session, art) else {
                return Ok(());
            };

            session.set_thumbnail(Some(thumbnail.clone()))?;
            session.commit()?;
            committed.thumbnail = Some(thumbnail);

            debug!("Album art updated - Size: {} bytes, Type: {}", art.len(), art.mime_type);
            Ok(())
        });
    }

    /// Remove the thumbnail so stale art is not left on screen
    pub fn clear_album_art(&self) {
        self.with_session("Clearing album art", |session, committed| {
            if !session.has_display() {
                return Ok(());
            }

            session.set_thumbnail(None)?;
            session.commit()?;
            committed.thumbnail = None;

            debug!("Album art cleared");
            Ok(())
        });
    }

    /// Set the art when the source has some, clear it otherwise
    pub fn update_album_art(&self, art: Option<AlbumArt<'_>>) {
        match art {
            Some(art) => self.set_album_art(art.bytes, art.mime_type),
            None => self.clear_album_art(),
        }
    }

    /// Route play/pause/stop presses from the system UI to `handler`.
    ///
    /// The handler survives shutdown and is re-registered on every initialize.
    pub fn set_command_handler<F>(&self, handler: F)
    where
        F: Fn(TransportCommand) + Send + Sync + 'static,
    {
        let handler: CommandHandler = Arc::new(handler);
        let mut inner = self.lock();
        inner.command_handler = Some(handler.clone());

        if let Some(session) = inner.session.as_mut() {
            guarded("Registering transport command handler", || {
                session.set_command_handler(handler)
            });
        }
    }

    fn music_properties(&self, metadata: &MediaMetadata) -> MusicProperties {
        let placeholders = &self.config.placeholders;
        MusicProperties {
            title: or_placeholder(&metadata.title, &placeholders.title),
            artist: or_placeholder(&metadata.artist, &placeholders.artist),
            album: or_placeholder(&metadata.album, &placeholders.album),
        }
    }

    /// Run a display update against the live session, or do nothing when uninitialized.
    ///
    /// When `f` fails, the uncommitted display fields are put back to the
    /// last committed values so a later commit cannot publish them.
    fn with_session<F>(&self, what: &str, f: F)
    where
        F: FnOnce(&mut P::Session, &mut Committed<ThumbnailOf<P>>) -> anyhow::Result<()>,
    {
        let mut inner = self.lock();
        let Inner {
            session, committed, ..
        } = &mut *inner;
        let Some(session) = session.as_mut() else {
            return;
        };

        if guarded(what, || f(session, committed).map_err(SessionError::publish)).is_none() {
            guarded("Restoring committed display state", || {
                restore_display(session, committed)
            });
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<P::Session>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<P: MediaPlatform> Drop for NowPlayingSession<P> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn restore_display<S: PlatformSession>(
    session: &mut S,
    committed: &Committed<S::Thumbnail>,
) -> anyhow::Result<()> {
    session.reset_display()?;
    if let Some(music) = &committed.music {
        session.set_music_properties(music)?;
    }
    if let Some(timeline) = committed.timeline {
        session.set_timeline(timeline)?;
    }
    if committed.thumbnail.is_some() {
        session.set_thumbnail(committed.thumbnail.clone())?;
    }
    Ok(())
}

fn or_placeholder(value: &str, placeholder: &str) -> String {
    if value.is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    }
}

/// Run a platform call, turning both errors and panics into `None` plus a log line
fn guarded<T, E, F>(what: &str, f: F) -> Option<T>
where
    E: Display,
    F: FnOnce() -> Result<T, E>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            error!("{} failed: {}", what, e);
            None
        }
        Err(payload) => {
            error!("{} panicked: {}", what, panic_message(payload.as_ref()));
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_placeholder() {
        assert_eq!(or_placeholder("", "Unknown"), "Unknown");
        assert_eq!(or_placeholder("Time", "Unknown"), "Time");
        // Whitespace is real content from the producer
        assert_eq!(or_placeholder(" ", "Unknown"), " ");
    }

    #[test]
    fn test_guarded_converts_errors_and_panics() {
        assert_eq!(guarded("ok", || Ok::<_, anyhow::Error>(7)), Some(7));
        assert_eq!(guarded("err", || Err::<u8, _>(anyhow::anyhow!("boom"))), None);
        assert_eq!(
            guarded("panic", || -> anyhow::Result<u8> { panic!("platform exploded") }),
            None
        );
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(payload.as_ref()), "static message");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(payload.as_ref()), "owned message");

        let payload: Box<dyn Any + Send> = Box::new(42u32);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
