//! In-memory media platform for tests
//!
//! [`FakePlatform`] records every call made on its session handles and keeps
//! a model of what the system UI would currently display. Clones share the
//! same state, so a test can keep one clone while the session owns another.

use crate::error::{Result, SessionError};
use crate::platform::{
    CommandHandler, ControlSurface, MediaPlatform, MusicProperties, PlatformSession, Timeline,
};
use anyhow::{anyhow, bail};
use nowplay_core::{AlbumArt, PlaybackState, TransportCommand};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

/// Thumbnail as held by the fake: an owned copy of the art
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FakeThumbnail {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Acquire(u64),
    Release(u64),
    SetEnabled(bool),
    SetControls(ControlSurface),
    SetPlaybackState(PlaybackState),
    ResetDisplay,
    SetMusicProperties(MusicProperties),
    SetTimeline(Timeline),
    CreateThumbnail { len: usize, mime_type: String },
    SetThumbnail(Option<FakeThumbnail>),
    Commit,
    SetCommandHandler,
}

/// Display fields as they appear after the last commit
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisplayState {
    pub music: Option<MusicProperties>,
    pub timeline: Option<Timeline>,
    pub thumbnail: Option<FakeThumbnail>,
}

/// Injected failures
#[derive(Clone, Copy, Debug, Default)]
pub struct Faults {
    pub fail_acquire: bool,
    pub display_unavailable: bool,
    pub fail_thumbnail: bool,
    pub fail_enable: bool,
    pub fail_controls: bool,
    pub fail_publish: bool,
    /// Only the timeline setter fails
    pub fail_timeline: bool,
    /// Field setters succeed, the refresh fails
    pub fail_commit: bool,
    pub panic_on_publish: bool,
}

#[derive(Default)]
struct FakeState {
    calls: Vec<Call>,
    faults: Faults,
    next_handle: u64,
    live_handles: usize,
    enabled: bool,
    controls: Option<ControlSurface>,
    playback_state: Option<PlaybackState>,
    pending: DisplayState,
    published: DisplayState,
    commits: usize,
    /// Handler registered by the handle with this id
    handler: Option<(u64, CommandHandler)>,
    active_calls: usize,
    max_active_calls: usize,
}

#[derive(Clone, Default)]
pub struct FakePlatform {
    state: Arc<Mutex<FakeState>>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        lock_state(&self.state)
    }

    pub fn set_faults(&self, faults: Faults) {
        self.lock().faults = faults;
    }

    pub fn update_faults(&self, f: impl FnOnce(&mut Faults)) {
        f(&mut self.lock().faults);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Committed display fields
    pub fn published(&self) -> DisplayState {
        self.lock().published.clone()
    }

    pub fn commits(&self) -> usize {
        self.lock().commits
    }

    pub fn playback_state(&self) -> Option<PlaybackState> {
        self.lock().playback_state
    }

    pub fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    pub fn controls(&self) -> Option<ControlSurface> {
        self.lock().controls
    }

    /// Handles acquired and not yet released
    pub fn live_handles(&self) -> usize {
        self.lock().live_handles
    }

    /// Highest number of handle calls observed running at the same time
    pub fn max_concurrent_calls(&self) -> usize {
        self.lock().max_active_calls
    }

    /// Simulate a transport button press. Returns false when no handler is registered.
    pub fn press(&self, command: TransportCommand) -> bool {
        let handler = self.lock().handler.clone();
        match handler {
            Some((_, handler)) => {
                handler(command);
                true
            }
            None => false,
        }
    }
}

impl MediaPlatform for FakePlatform {
    type Session = FakeSession;

    fn name(&self) -> &'static str {
        "fake"
    }

    fn acquire(&self) -> Result<FakeSession> {
        let mut state = self.lock();
        if state.faults.fail_acquire {
            return Err(SessionError::PlatformUnavailable);
        }

        state.next_handle += 1;
        let id = state.next_handle;
        state.live_handles += 1;
        state.calls.push(Call::Acquire(id));

        Ok(FakeSession {
            id,
            state: self.state.clone(),
        })
    }
}

pub struct FakeSession {
    id: u64,
    state: Arc<Mutex<FakeState>>,
}

impl FakeSession {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Record a call and track how many run at once
    fn enter(&self, call: Call) -> CallGuard<'_> {
        let mut state = lock_state(&self.state);
        state.calls.push(call);
        state.active_calls += 1;
        state.max_active_calls = state.max_active_calls.max(state.active_calls);
        CallGuard { state: &self.state }
    }

    fn check_publish(&self) -> anyhow::Result<()> {
        let faults = lock_state(&self.state).faults;
        if faults.panic_on_publish {
            panic!("fake platform panicked while publishing");
        }
        if faults.fail_publish {
            bail!("fake platform rejected the update");
        }
        if faults.display_unavailable {
            bail!("display updater unavailable");
        }
        Ok(())
    }
}

struct CallGuard<'a> {
    state: &'a Arc<Mutex<FakeState>>,
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        lock_state(self.state).active_calls -= 1;
    }
}

impl PlatformSession for FakeSession {
    type Thumbnail = FakeThumbnail;

    fn set_enabled(&mut self, enabled: bool) -> anyhow::Result<()> {
        let _guard = self.enter(Call::SetEnabled(enabled));
        let mut state = lock_state(&self.state);
        if state.faults.fail_enable {
            bail!("fake platform refused to change enabled state");
        }
        state.enabled = enabled;
        Ok(())
    }

    fn set_controls(&mut self, controls: ControlSurface) -> anyhow::Result<()> {
        let _guard = self.enter(Call::SetControls(controls));
        let mut state = lock_state(&self.state);
        if state.faults.fail_controls {
            bail!("fake platform rejected the button flags");
        }
        state.controls = Some(controls);
        Ok(())
    }

    fn set_playback_state(&mut self, state: PlaybackState) -> anyhow::Result<()> {
        let _guard = self.enter(Call::SetPlaybackState(state));
        self.check_publish()?;
        thread::yield_now();
        lock_state(&self.state).playback_state = Some(state);
        Ok(())
    }

    fn reset_display(&mut self) -> anyhow::Result<()> {
        let _guard = self.enter(Call::ResetDisplay);
        lock_state(&self.state).pending = DisplayState::default();
        Ok(())
    }

    fn has_display(&self) -> bool {
        !lock_state(&self.state).faults.display_unavailable
    }

    fn set_music_properties(&mut self, properties: &MusicProperties) -> anyhow::Result<()> {
        let _guard = self.enter(Call::SetMusicProperties(properties.clone()));
        self.check_publish()?;

        // Field by field, letting other threads run in between
        {
            let mut state = lock_state(&self.state);
            let music = state.pending.music.get_or_insert_with(|| properties.clone());
            music.title = properties.title.clone();
        }
        thread::yield_now();
        {
            let mut state = lock_state(&self.state);
            if let Some(music) = state.pending.music.as_mut() {
                music.artist = properties.artist.clone();
            }
        }
        thread::yield_now();
        {
            let mut state = lock_state(&self.state);
            if let Some(music) = state.pending.music.as_mut() {
                music.album = properties.album.clone();
            }
        }
        Ok(())
    }

    fn set_timeline(&mut self, timeline: Timeline) -> anyhow::Result<()> {
        let _guard = self.enter(Call::SetTimeline(timeline));
        self.check_publish()?;
        if lock_state(&self.state).faults.fail_timeline {
            bail!("fake platform rejected the timeline");
        }
        lock_state(&self.state).pending.timeline = Some(timeline);
        Ok(())
    }

    fn create_thumbnail(&self, art: AlbumArt<'_>) -> anyhow::Result<FakeThumbnail> {
        let _guard = self.enter(Call::CreateThumbnail {
            len: art.len(),
            mime_type: art.mime_type.to_string(),
        });
        if lock_state(&self.state).faults.fail_thumbnail {
            return Err(anyhow!("fake stream write failed"));
        }
        Ok(FakeThumbnail {
            bytes: art.bytes.to_vec(),
            mime_type: art.mime_type.to_string(),
        })
    }

    fn set_thumbnail(&mut self, thumbnail: Option<FakeThumbnail>) -> anyhow::Result<()> {
        let _guard = self.enter(Call::SetThumbnail(thumbnail.clone()));
        self.check_publish()?;
        lock_state(&self.state).pending.thumbnail = thumbnail;
        Ok(())
    }

    fn commit(&mut self) -> anyhow::Result<()> {
        let _guard = self.enter(Call::Commit);
        self.check_publish()?;
        let mut state = lock_state(&self.state);
        if state.faults.fail_commit {
            bail!("fake platform failed to refresh the display");
        }
        state.published = state.pending.clone();
        state.commits += 1;
        Ok(())
    }

    fn set_command_handler(&mut self, handler: CommandHandler) -> anyhow::Result<()> {
        let _guard = self.enter(Call::SetCommandHandler);
        lock_state(&self.state).handler = Some((self.id, handler));
        Ok(())
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        let mut state = lock_state(&self.state);
        state.live_handles -= 1;
        if matches!(state.handler, Some((id, _)) if id == self.id) {
            state.handler = None;
        }
        state.calls.push(Call::Release(self.id));
    }
}

fn lock_state(state: &Mutex<FakeState>) -> MutexGuard<'_, FakeState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
