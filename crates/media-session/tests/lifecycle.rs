use nowplay_media_session::testing::{Call, FakePlatform, Faults};
use nowplay_media_session::*;
use std::sync::{Arc, Mutex};

fn fake_session() -> (FakePlatform, NowPlayingSession<FakePlatform>) {
    let platform = FakePlatform::new();
    let session = NowPlayingSession::with_platform(platform.clone(), SessionConfig::default());
    (platform, session)
}

#[test]
fn test_initialize_arms_controls() {
    let (platform, session) = fake_session();

    assert!(!session.is_initialized());
    assert!(session.initialize());
    assert!(session.is_initialized());

    assert!(platform.is_enabled());
    assert_eq!(platform.controls(), Some(ControlSurface::default()));
    assert_eq!(platform.live_handles(), 1);

    let controls = platform.controls().unwrap();
    assert!(controls.play && controls.pause && controls.stop);
    assert!(!controls.next && !controls.previous);
}

#[test]
fn test_initialize_is_idempotent() {
    let (platform, session) = fake_session();

    assert!(session.initialize());
    assert!(session.initialize());
    assert!(session.is_initialized());

    let acquisitions = platform
        .calls()
        .iter()
        .filter(|call| matches!(call, Call::Acquire(_)))
        .count();
    assert_eq!(acquisitions, 1);
    assert_eq!(platform.live_handles(), 1);
}

#[test]
fn test_shutdown_is_idempotent() {
    let (platform, session) = fake_session();

    session.shutdown();
    assert!(!session.is_initialized());
    assert!(platform.calls().is_empty());

    assert!(session.initialize());
    session.shutdown();
    session.shutdown();

    assert!(!session.is_initialized());
    assert!(!platform.is_enabled());
    assert_eq!(platform.live_handles(), 0);

    let calls = platform.calls();
    assert_eq!(calls.iter().filter(|c| matches!(c, Call::Release(_))).count(), 1);
    assert_eq!(calls.iter().filter(|c| **c == Call::SetEnabled(false)).count(), 1);
}

#[test]
fn test_reinitialize_acquires_fresh_handle() {
    let (platform, session) = fake_session();

    assert!(session.initialize());
    session.shutdown();
    assert!(session.initialize());

    let calls = platform.calls();
    assert!(calls.contains(&Call::Acquire(1)));
    assert!(calls.contains(&Call::Release(1)));
    assert!(calls.contains(&Call::Acquire(2)));
    assert!(!calls.contains(&Call::Release(2)));
    assert_eq!(platform.live_handles(), 1);
}

#[test]
fn test_initialized_tracks_last_lifecycle_call() {
    let (platform, session) = fake_session();

    // (operation, acquisition fails) and the expected state afterwards
    let steps = [
        ("init", false, true),
        ("init", false, true),
        ("shutdown", false, false),
        ("init", true, false),
        ("shutdown", false, false),
        ("shutdown", false, false),
        ("init", false, true),
        ("shutdown", false, false),
    ];

    for (op, fail, expected) in steps {
        platform.update_faults(|f| f.fail_acquire = fail);
        match op {
            "init" => {
                assert_eq!(session.initialize(), expected);
            }
            _ => session.shutdown(),
        }
        assert_eq!(session.is_initialized(), expected, "after {} (fail={})", op, fail);
        assert_eq!(platform.live_handles(), usize::from(expected));
    }
}

#[test]
fn test_acquisition_failure_leaves_no_state() {
    let (platform, session) = fake_session();
    platform.set_faults(Faults {
        fail_acquire: true,
        ..Faults::default()
    });

    assert!(!session.initialize());
    assert!(!session.is_initialized());
    assert_eq!(platform.live_handles(), 0);
    assert!(!platform.is_enabled());
}

#[test]
fn test_missing_display_updater_fails_initialize() {
    let (platform, session) = fake_session();
    platform.set_faults(Faults {
        display_unavailable: true,
        ..Faults::default()
    });

    assert!(!session.initialize());
    assert!(!session.is_initialized());
    // The handle was released again
    assert_eq!(platform.live_handles(), 0);
    assert!(platform.calls().contains(&Call::Release(1)));
}

#[test]
fn test_enable_failure_fails_initialize() {
    let (platform, session) = fake_session();
    platform.set_faults(Faults {
        fail_enable: true,
        ..Faults::default()
    });

    assert!(!session.initialize());
    assert!(!session.is_initialized());
    assert_eq!(platform.live_handles(), 0);

    platform.set_faults(Faults::default());
    assert!(session.initialize());
}

#[test]
fn test_controls_failure_disables_again() {
    let (platform, session) = fake_session();
    platform.set_faults(Faults {
        fail_controls: true,
        ..Faults::default()
    });

    assert!(!session.initialize());
    assert!(!session.is_initialized());
    assert!(!platform.is_enabled());
    assert_eq!(platform.live_handles(), 0);

    let calls = platform.calls();
    let enabled = calls.iter().position(|c| *c == Call::SetEnabled(true)).unwrap();
    let disabled = calls.iter().position(|c| *c == Call::SetEnabled(false)).unwrap();
    assert!(enabled < disabled);
    assert_eq!(calls.last(), Some(&Call::Release(1)));
}

#[test]
fn test_display_is_reset_when_armed() {
    let (platform, session) = fake_session();

    // Acquiring alone configures nothing on the display
    assert!(platform.probe());
    assert!(!platform.calls().contains(&Call::ResetDisplay));

    assert!(session.initialize());
    let calls = platform.calls();
    let controls = calls.iter().position(|c| matches!(c, Call::SetControls(_))).unwrap();
    let reset = calls.iter().position(|c| *c == Call::ResetDisplay).unwrap();
    assert!(controls < reset);
}

#[test]
fn test_shutdown_releases_even_if_disable_fails() {
    let (platform, session) = fake_session();
    assert!(session.initialize());

    platform.update_faults(|f| f.fail_enable = true);
    session.shutdown();

    assert!(!session.is_initialized());
    assert_eq!(platform.live_handles(), 0);
}

#[test]
fn test_drop_shuts_down() {
    let platform = FakePlatform::new();
    {
        let session = NowPlayingSession::with_platform(platform.clone(), SessionConfig::default());
        assert!(session.initialize());
        assert_eq!(platform.live_handles(), 1);
    }

    assert_eq!(platform.live_handles(), 0);
    assert!(!platform.is_enabled());
}

#[test]
fn test_availability_check_does_not_touch_session() {
    let (platform, session) = fake_session();

    // Safe before any initialize
    assert!(platform.probe());
    assert!(!session.is_initialized());
    assert_eq!(platform.live_handles(), 0);

    assert!(session.initialize());
    platform.clear_calls();

    assert!(platform.probe());
    assert!(session.is_initialized());
    assert_eq!(platform.live_handles(), 1);
    // Only an acquire/release pair, nothing on the live handle
    assert_eq!(platform.calls(), vec![Call::Acquire(3), Call::Release(3)]);

    platform.update_faults(|f| f.fail_acquire = true);
    assert!(!platform.probe());
    assert!(session.is_initialized());
}

#[test]
fn test_command_handler_registered_on_initialize() {
    let (platform, session) = fake_session();
    let received = Arc::new(Mutex::new(Vec::new()));

    let sink = received.clone();
    session.set_command_handler(move |command| sink.lock().unwrap().push(command));

    // Nothing to press before the session exists
    assert!(!platform.press(TransportCommand::Play));

    assert!(session.initialize());
    assert!(platform.press(TransportCommand::Play));
    assert!(platform.press(TransportCommand::Pause));

    session.shutdown();
    assert!(!platform.press(TransportCommand::Stop));

    // Re-registered on the fresh handle
    assert!(session.initialize());
    assert!(platform.press(TransportCommand::Stop));

    assert_eq!(
        *received.lock().unwrap(),
        vec![TransportCommand::Play, TransportCommand::Pause, TransportCommand::Stop]
    );
}

#[test]
fn test_command_handler_set_while_initialized() {
    let (platform, session) = fake_session();
    let received = Arc::new(Mutex::new(Vec::new()));

    assert!(session.initialize());
    assert!(!platform.press(TransportCommand::Play));

    let sink = received.clone();
    session.set_command_handler(move |command| sink.lock().unwrap().push(command));
    assert!(platform.press(TransportCommand::Play));

    assert_eq!(*received.lock().unwrap(), vec![TransportCommand::Play]);
}

#[test]
fn test_config_controls_are_applied() {
    let platform = FakePlatform::new();
    let config = SessionConfig::from_toml_str(
        r#"
        [now_playing.controls]
        stop = false
        "#,
    )
    .unwrap();
    let session = NowPlayingSession::with_platform(platform.clone(), config);

    assert!(session.initialize());
    let controls = platform.controls().unwrap();
    assert!(controls.play);
    assert!(!controls.stop);
}
