//! Publish a short, fake now-playing sequence to the system media session.
//!
//! Usage: cargo run -p nowplay-media-session --example publish_now_playing [config.toml]
//!
//! On hosts without a media session service the sequence is sent to the
//! in-memory fake instead, and the resulting display state is printed.

use anyhow::Result;
use nowplay_media_session::testing::FakePlatform;
use nowplay_media_session::*;
use std::thread;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const COVER: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,nowplay_media_session=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };

    if is_available() {
        let session = NowPlayingSession::with_config(config);
        run(&session);
    } else {
        tracing::warn!("No system media session on this host, using the in-memory fake");
        let platform = FakePlatform::new();
        let session = NowPlayingSession::with_platform(platform.clone(), config);
        run(&session);
        println!("Final display state: {:#?}", platform.published());
        println!("Final playback state: {:?}", platform.playback_state());
    }

    Ok(())
}

fn run<P: MediaPlatform>(session: &NowPlayingSession<P>) {
    if !session.initialize() {
        tracing::error!("Failed to initialize now-playing session");
        return;
    }

    session.set_command_handler(|command| {
        tracing::info!("Transport button pressed: {}", command.as_str());
    });

    session.set_playback_state(PlaybackState::Opening);
    session.update_metadata(
        &MediaMetadata::new("Time", "Pink Floyd", "The Dark Side of the Moon").with_timeline(413, 0),
    );
    session.set_album_art(COVER, "image/jpeg");
    session.set_playback_state(PlaybackState::Playing);

    for position in 1..=3 {
        thread::sleep(Duration::from_secs(1));
        session.update_metadata(
            &MediaMetadata::new("Time", "Pink Floyd", "The Dark Side of the Moon")
                .with_timeline(413, position),
        );
    }

    session.set_playback_state(PlaybackState::Paused);

    // Live stream: no artwork, no timeline
    session.clear_album_art();
    session.update_metadata(&MediaMetadata::new("Radio Paradise", "", ""));
    session.set_playback_state(PlaybackState::Playing);
    thread::sleep(Duration::from_secs(1));

    session.set_playback_state(PlaybackState::Stopped);
    session.shutdown();
}
