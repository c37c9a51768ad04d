//! Windows backend publishing through System Media Transport Controls (SMTC)
//!
//! Requires Windows 10 or later. The receiver appears in the lock screen and
//! taskbar media flyout, and hardware media keys are routed back to it.

use crate::error::{Result, SessionError};
use crate::platform::{
    CommandHandler, ControlSurface, MediaPlatform, MusicProperties, PlatformSession, Timeline,
};
use anyhow::anyhow;
use nowplay_core::{AlbumArt, PlaybackState, TransportCommand};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use windows::{
    core::{Interface, HSTRING},
    Foundation::{AsyncStatus, EventRegistrationToken, IAsyncOperation, TimeSpan, TypedEventHandler},
    Media::{
        Playback::MediaPlayer,
        MediaPlaybackStatus, MediaPlaybackType, SystemMediaTransportControls,
        SystemMediaTransportControlsButton, SystemMediaTransportControlsButtonPressedEventArgs,
        SystemMediaTransportControlsDisplayUpdater, SystemMediaTransportControlsTimelineProperties,
    },
    Storage::Streams::{DataWriter, InMemoryRandomAccessStream, RandomAccessStreamReference},
};

/// Upper bound for flushing album art into its in-memory stream
const STORE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Clone, Copy, Debug, Default)]
pub struct SmtcPlatform;

impl MediaPlatform for SmtcPlatform {
    type Session = SmtcSession;

    fn name(&self) -> &'static str {
        "Windows SMTC"
    }

    /// Desktop processes have no CoreWindow, so the controls come from a
    /// private `MediaPlayer` instead of `GetForCurrentView`
    fn acquire(&self) -> Result<SmtcSession> {
        let player = MediaPlayer::new()
            .map_err(|e| SessionError::acquisition(format!("MediaPlayer: {}", e)))?;

        // The player never plays anything; buttons are driven by the receiver
        player
            .CommandManager()
            .and_then(|manager| manager.SetIsEnabled(false))
            .map_err(|e| SessionError::acquisition(format!("MediaPlaybackCommandManager: {}", e)))?;

        let controls = player
            .SystemMediaTransportControls()
            .map_err(|e| SessionError::acquisition(format!("SystemMediaTransportControls: {}", e)))?;

        controls
            .DisplayUpdater()
            .map_err(|e| SessionError::acquisition(format!("DisplayUpdater: {}", e)))?;

        Ok(SmtcSession {
            _player: player,
            controls,
            button_token: None,
        })
    }
}

pub struct SmtcSession {
    /// Owns the controls; dropping it releases them
    _player: MediaPlayer,
    controls: SystemMediaTransportControls,
    button_token: Option<EventRegistrationToken>,
}

impl SmtcSession {
    fn display(&self) -> anyhow::Result<SystemMediaTransportControlsDisplayUpdater> {
        self.controls
            .DisplayUpdater()
            .map_err(|e| anyhow!("Failed to get DisplayUpdater: {}", e))
    }

    fn remove_button_handler(&mut self) {
        if let Some(token) = self.button_token.take() {
            if let Err(e) = self.controls.RemoveButtonPressed(token) {
                warn!("Failed to remove SMTC button handler: {}", e);
            }
        }
    }
}

impl PlatformSession for SmtcSession {
    type Thumbnail = RandomAccessStreamReference;

    fn set_enabled(&mut self, enabled: bool) -> anyhow::Result<()> {
        self.controls.SetIsEnabled(enabled)?;
        Ok(())
    }

    fn set_controls(&mut self, controls: ControlSurface) -> anyhow::Result<()> {
        self.controls.SetIsPlayEnabled(controls.play)?;
        self.controls.SetIsPauseEnabled(controls.pause)?;
        self.controls.SetIsStopEnabled(controls.stop)?;
        self.controls.SetIsNextEnabled(controls.next)?;
        self.controls.SetIsPreviousEnabled(controls.previous)?;
        Ok(())
    }

    fn set_playback_state(&mut self, state: PlaybackState) -> anyhow::Result<()> {
        self.controls.SetPlaybackStatus(to_media_status(state))?;
        Ok(())
    }

    fn reset_display(&mut self) -> anyhow::Result<()> {
        let updater = self.display()?;
        updater.ClearAll()?;
        updater.SetType(MediaPlaybackType::Music)?;
        self.controls
            .UpdateTimelineProperties(&SystemMediaTransportControlsTimelineProperties::new()?)?;
        Ok(())
    }

    fn has_display(&self) -> bool {
        self.display().is_ok()
    }

    fn set_music_properties(&mut self, properties: &MusicProperties) -> anyhow::Result<()> {
        let music = self.display()?.MusicProperties()?;
        music.SetTitle(&HSTRING::from(properties.title.as_str()))?;
        music.SetArtist(&HSTRING::from(properties.artist.as_str()))?;
        music.SetAlbumTitle(&HSTRING::from(properties.album.as_str()))?;
        Ok(())
    }

    fn set_timeline(&mut self, timeline: Timeline) -> anyhow::Result<()> {
        let end = TimeSpan {
            Duration: timeline.max_seek_ticks,
        };
        let props = SystemMediaTransportControlsTimelineProperties::new()?;
        props.SetStartTime(TimeSpan::default())?;
        props.SetMinSeekTime(TimeSpan::default())?;
        props.SetEndTime(end)?;
        props.SetMaxSeekTime(end)?;
        props.SetPosition(TimeSpan {
            Duration: timeline.position_ticks,
        })?;
        self.controls.UpdateTimelineProperties(&props)?;
        Ok(())
    }

    fn create_thumbnail(&self, art: AlbumArt<'_>) -> anyhow::Result<RandomAccessStreamReference> {
        let stream = InMemoryRandomAccessStream::new()?;
        let writer = DataWriter::CreateDataWriter(&stream)?;
        writer.WriteBytes(art.bytes)?;

        let store: IAsyncOperation<u32> = writer.StoreAsync()?.cast()?;
        let stored = block_on_async_operation(store, STORE_TIMEOUT)?;
        if stored as usize != art.len() {
            return Err(anyhow!("Stored {} of {} album art bytes", stored, art.len()));
        }

        // Keep the stream open after the writer goes away
        writer.DetachStream()?;
        stream.Seek(0)?;

        Ok(RandomAccessStreamReference::CreateFromStream(&stream)?)
    }

    fn set_thumbnail(&mut self, thumbnail: Option<RandomAccessStreamReference>) -> anyhow::Result<()> {
        let updater = self.display()?;
        match thumbnail {
            Some(thumbnail) => updater.SetThumbnail(&thumbnail)?,
            None => updater.SetThumbnail(None::<&RandomAccessStreamReference>)?,
        }
        Ok(())
    }

    fn commit(&mut self) -> anyhow::Result<()> {
        self.display()?.Update()?;
        Ok(())
    }

    fn set_command_handler(&mut self, handler: CommandHandler) -> anyhow::Result<()> {
        self.remove_button_handler();

        let pressed = TypedEventHandler::<
            SystemMediaTransportControls,
            SystemMediaTransportControlsButtonPressedEventArgs,
        >::new(move |_sender, args| {
            if let Some(args) = args.as_ref() {
                if let Some(command) = to_transport_command(args.Button()?) {
                    debug!("SMTC button pressed: {}", command.as_str());
                    handler(command);
                }
            }
            Ok(())
        });

        self.button_token = Some(self.controls.ButtonPressed(&pressed)?);
        Ok(())
    }
}

impl Drop for SmtcSession {
    fn drop(&mut self) {
        self.remove_button_handler();
    }
}

fn to_media_status(state: PlaybackState) -> MediaPlaybackStatus {
    match state {
        PlaybackState::Closed => MediaPlaybackStatus::Closed,
        PlaybackState::Opening => MediaPlaybackStatus::Changing,
        PlaybackState::Playing => MediaPlaybackStatus::Playing,
        PlaybackState::Paused => MediaPlaybackStatus::Paused,
        PlaybackState::Stopped => MediaPlaybackStatus::Stopped,
    }
}

/// Only the buttons the receiver enables are forwarded
fn to_transport_command(button: SystemMediaTransportControlsButton) -> Option<TransportCommand> {
    match button {
        SystemMediaTransportControlsButton::Play => Some(TransportCommand::Play),
        SystemMediaTransportControlsButton::Pause => Some(TransportCommand::Pause),
        SystemMediaTransportControlsButton::Stop => Some(TransportCommand::Stop),
        _ => None,
    }
}

/// Block on an async Windows operation, giving up after `timeout`
fn block_on_async_operation<T>(operation: IAsyncOperation<T>, timeout: Duration) -> anyhow::Result<T>
where
    T: windows::core::RuntimeType + 'static,
{
    let start = Instant::now();

    loop {
        let status = operation
            .Status()
            .map_err(|e| anyhow!("Failed to get operation status: {}", e))?;

        match status {
            AsyncStatus::Completed => {
                return operation
                    .GetResults()
                    .map_err(|e| anyhow!("Failed to get operation results: {}", e));
            }
            AsyncStatus::Error => return Err(anyhow!("Async operation failed with error")),
            AsyncStatus::Canceled => return Err(anyhow!("Async operation was canceled")),
            AsyncStatus::Started => {
                if start.elapsed() > timeout {
                    let _ = operation.Cancel();
                    return Err(anyhow!("Async operation timed out"));
                }
                std::thread::sleep(Duration::from_millis(5));
            }
            _ => return Err(anyhow!("Unknown async status")),
        }
    }
}
