use crate::{App, AppCommand, FilePreferenceStore, SurfaceState, app::Flow};

use camlight_core::{
    AUTO_SEND_PERIOD, Color, DeviceConstraint, KeyValueStore, MemoryStore, NotificationKind,
    Notifier, Preferences, SAMPLE_PERIOD, StreamState,
    testing::{CountingSink, FakeCameraBackend},
};

use std::{sync::Arc, time::Duration};

use tokio::sync::mpsc;

type TestApp<P> = App<FakeCameraBackend, CountingSink, P>;

fn cameras() -> FakeCameraBackend {
    FakeCameraBackend::with_cameras(&[("cam-a", "Front"), ("cam-b", "Rear")])
}

fn app_with<P: KeyValueStore>(
    backend: &FakeCameraBackend,
    sink: &Arc<CountingSink>,
    store: P,
) -> TestApp<P> {
    let (_tx, rx) = mpsc::channel(8);
    App::new(backend.clone(), Arc::clone(sink), store, Notifier::new(), rx)
}

/// WHAT: A saved auto flag turns auto mode on at the next start
/// WHY: Preferences must survive restarts without user interaction
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_auto_saved_when_restarting_then_auto_loop_active() {
    // Given: A first run that enables auto mode, persisted to disk
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preferences.toml");
    let sink = Arc::new(CountingSink::responding(200, None));
    let backend = cameras();
    {
        let mut first = app_with(&backend, &sink, FilePreferenceStore::open(path.clone()));
        first.startup();
        first.handle(AppCommand::SetAuto { enabled: true }).await;
        first.shutdown();
    }
    let calls_before = sink.calls();

    // When: A fresh app starts from the same file
    let mut second = app_with(&backend, &sink, FilePreferenceStore::open(path));
    let prefs = second.startup();

    // Then: The toggle restores checked and the loop runs on its own
    assert!(prefs.auto_enabled);
    assert!(second.dispatcher.is_auto_running());
    tokio::time::sleep(AUTO_SEND_PERIOD + Duration::from_millis(10)).await;
    assert_eq!(sink.calls(), calls_before + 1);
}

/// WHAT: No saved preferences means default camera and auto off
/// WHY: Absent keys fall back to defaults
#[tokio::test]
async fn given_empty_store_when_starting_then_defaults_applied() {
    let backend = cameras();
    let sink = Arc::new(CountingSink::responding(200, None));
    let mut app = app_with(&backend, &sink, MemoryStore::default());

    let prefs = app.startup();

    assert_eq!(prefs, Preferences::default());
    assert!(!app.dispatcher.is_auto_running());
    assert!(app.sampler.is_running());
    assert_eq!(backend.opened(), vec![DeviceConstraint::Default]);
}

/// WHAT: Becoming visible with no session restarts the saved camera once
/// WHY: Visibility recovery is the only automatic re-acquisition path
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_hidden_without_session_when_visible_then_single_restart_with_saved_device() {
    // Given: A saved device, a started app whose camera was then released
    let backend = cameras();
    let sink = Arc::new(CountingSink::responding(200, None));
    let mut store = MemoryStore::default();
    Preferences::save_device(&mut store, "cam-b").unwrap();
    let mut app = app_with(&backend, &sink, store);
    app.startup();
    app.handle(AppCommand::StopCamera).await;
    assert!(!app.sampler.is_running());

    // When: Hidden then visible
    app.handle(AppCommand::VisibilityChanged(SurfaceState::Hidden)).await;
    app.handle(AppCommand::VisibilityChanged(SurfaceState::Visible)).await;

    // Then: Exactly one new start with that device, then sampling resumes
    let exact_b = DeviceConstraint::Exact("cam-b".to_string());
    assert_eq!(backend.opened(), vec![exact_b.clone(), exact_b]);
    assert!(matches!(app.streams.state(), StreamState::Active { .. }));
    assert!(app.sampler.is_running());
}

/// WHAT: Visibility changes with a live session do nothing
/// WHY: Recovery only applies when no session is active
#[tokio::test]
async fn given_active_session_when_visible_again_then_no_restart() {
    let backend = cameras();
    let sink = Arc::new(CountingSink::responding(200, None));
    let mut app = app_with(&backend, &sink, MemoryStore::default());
    app.startup();

    app.handle(AppCommand::VisibilityChanged(SurfaceState::Hidden)).await;
    app.handle(AppCommand::VisibilityChanged(SurfaceState::Visible)).await;
    app.handle(AppCommand::VisibilityChanged(SurfaceState::Visible)).await;

    assert_eq!(backend.opened().len(), 1);
}

/// WHAT: Selecting by list position persists the id and switches camera
/// WHY: Device choice is remembered across sessions
#[tokio::test]
async fn given_listed_devices_when_selecting_by_number_then_saved_and_started() {
    let backend = cameras();
    let sink = Arc::new(CountingSink::responding(200, None));
    let store = MemoryStore::default();
    let mut app = app_with(&backend, &sink, store.clone());
    app.startup();

    let report = app.handle(AppCommand::ListDevices).await;
    app.handle(AppCommand::SelectDevice {
        device: "2".to_string(),
    })
    .await;

    assert!(matches!(report, Flow::Continue(Some(ref r)) if r.contains("Front [cam-a] *")));
    assert_eq!(
        Preferences::load(&store).selected_device_id.as_deref(),
        Some("cam-b")
    );
    assert_eq!(backend.session_live_tracks()[0], 0);
    assert_eq!(app.streams.selected_device_id(), Some("cam-b"));
}

/// WHAT: Send uses the sampled color and reports success
/// WHY: The dispatcher reads the state the sampler writes
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_sampled_frame_when_sending_then_sampled_color_delivered() {
    let backend = cameras();
    backend.set_solid_frame((320, 240), (250, 128, 0));
    let sink = Arc::new(CountingSink::responding(200, None));
    let mut app = app_with(&backend, &sink, MemoryStore::default());
    app.startup();
    let mut feed = app.notifier.subscribe();

    tokio::time::sleep(SAMPLE_PERIOD + Duration::from_millis(10)).await;
    app.handle(AppCommand::SendNow).await;
    let reported = feed.recv().await.unwrap();

    assert_eq!(sink.colors(), vec![Color::from_rgb(250, 128, 0)]);
    assert_eq!(reported.kind, NotificationKind::Ok);
    assert_eq!(reported.text, "Sent color rgbw(250,128,0,0)");
}

/// WHAT: A send that never gets a response does not hold up later commands
/// WHY: The outbound call has no timeout, so it must not run on the event loop
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_hung_send_when_quitting_then_event_loop_exits() {
    // Given: A running app whose color service never answers
    let backend = cameras();
    let sink = Arc::new(CountingSink::hanging());
    let (tx, rx) = mpsc::channel(8);
    let app = App::new(
        backend.clone(),
        Arc::clone(&sink),
        MemoryStore::default(),
        Notifier::new(),
        rx,
    );

    // When: Sending, then asking for status and quitting right after
    tx.send(AppCommand::SendNow).await.unwrap();
    tx.send(AppCommand::Status).await.unwrap();
    tx.send(AppCommand::Shutdown).await.unwrap();
    let finished = tokio::time::timeout(Duration::from_secs(2), app.run()).await;

    // Then: The loop processed the quit and released the camera
    assert!(matches!(finished, Ok(Ok(()))));
    assert_eq!(backend.session_live_tracks(), vec![0]);
}

/// WHAT: Turning auto off persists false and stops the loop
/// WHY: The toggle state is saved on every change
#[tokio::test]
async fn given_auto_on_when_turned_off_then_saved_and_stopped() {
    let backend = cameras();
    let sink = Arc::new(CountingSink::responding(200, None));
    let store = MemoryStore::default();
    let mut app = app_with(&backend, &sink, store.clone());
    app.startup();

    app.handle(AppCommand::SetAuto { enabled: true }).await;
    app.handle(AppCommand::SetAuto { enabled: false }).await;

    assert!(!app.dispatcher.is_auto_running());
    assert!(!Preferences::load(&store).auto_enabled);
}

/// WHAT: Shutdown command exits and releases everything
/// WHY: No camera or timer may outlive the app
#[tokio::test]
async fn given_running_app_when_shutdown_then_exit_and_released() {
    let backend = cameras();
    let sink = Arc::new(CountingSink::responding(200, None));
    let mut app = app_with(&backend, &sink, MemoryStore::default());
    app.startup();
    app.handle(AppCommand::SetAuto { enabled: true }).await;

    let flow = app.handle(AppCommand::Shutdown).await;
    app.shutdown();

    assert_eq!(flow, Flow::Exit);
    assert_eq!(backend.session_live_tracks(), vec![0]);
    assert!(!app.dispatcher.is_auto_running());
    assert!(!app.sampler.is_running());
}
