use crate::{AppCommand, AppResult, SurfaceState};

use camlight_core::{
    CameraBackend, Color, ColorSink, Dispatcher, KeyValueStore, NotificationKind, Notifier,
    Preferences, Sampler, StreamManager, StreamState,
};

use std::{fmt::Write as _, sync::Arc};

use tokio::sync::{mpsc, watch};
use tracing::{error, info, instrument};

/// What the event loop does after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    /// Keep running, optionally printing a report.
    Continue(Option<String>),
    /// Leave the event loop.
    Exit,
}

/// Main application state.
///
/// Owns every pipeline component. The current color lives in a watch
/// channel written by the sampler and read by the dispatcher.
pub struct App<B: CameraBackend, S: ColorSink, P: KeyValueStore> {
    pub(crate) streams: StreamManager<B>,
    pub(crate) sampler: Sampler,
    pub(crate) dispatcher: Dispatcher<S>,
    pub(crate) store: P,
    pub(crate) notifier: Notifier,
    pub(crate) surface: SurfaceState,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
}

impl<B: CameraBackend, S: ColorSink, P: KeyValueStore> App<B, S, P> {
    /// Wire the pipeline. Nothing is started until [`App::startup`].
    pub fn new(
        backend: B,
        sink: Arc<S>,
        store: P,
        notifier: Notifier,
        command_rx: mpsc::Receiver<AppCommand>,
    ) -> Self {
        let (color_tx, color_rx) = watch::channel(Color::default());
        let streams = StreamManager::new(backend, notifier.clone());
        let sampler = Sampler::new(streams.slot(), Arc::new(color_tx));
        let dispatcher = Dispatcher::new(sink, color_rx, notifier.clone());

        Self {
            streams,
            sampler,
            dispatcher,
            store,
            notifier,
            surface: SurfaceState::Visible,
            command_rx,
        }
    }

    /// Apply saved preferences: auto mode first, then the saved camera,
    /// then sampling.
    #[instrument(skip(self))]
    pub fn startup(&mut self) -> Preferences {
        let prefs = Preferences::load(&self.store);

        if prefs.auto_enabled {
            self.dispatcher.start_auto();
        }

        self.streams.start(prefs.selected_device_id.as_deref());
        self.sampler.start();

        info!(
            device_id = ?prefs.selected_device_id,
            auto_enabled = prefs.auto_enabled,
            "Preferences restored"
        );

        prefs
    }

    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub async fn run(mut self) -> AppResult<()> {
        info!("CamLight starting");

        // Subscribe before startup so its notifications are printed.
        let mut feed = self.notifier.subscribe();
        self.startup();

        loop {
            tokio::select! {
                Some(cmd) = self.command_rx.recv() => {
                    match self.handle(cmd).await {
                        Flow::Continue(Some(report)) => println!("{}", report),
                        Flow::Continue(None) => {}
                        Flow::Exit => break,
                    }
                }

                Ok(notification) = feed.recv() => {
                    println!("[{}] {}", notification.kind, notification.text);
                }

                else => {
                    info!("All channels closed, shutting down");
                    break;
                }
            }
        }

        self.shutdown();
        info!("CamLight shut down successfully");

        Ok(())
    }

    /// Apply one command.
    #[instrument(skip(self))]
    pub async fn handle(&mut self, cmd: AppCommand) -> Flow {
        match cmd {
            AppCommand::ListDevices => {
                self.streams.refresh_devices();
                return Flow::Continue(Some(self.device_report()));
            }
            AppCommand::SelectDevice { device } => self.select_device(&device),
            AppCommand::SendNow => {
                let _detached = self.dispatcher.spawn_send();
            }
            AppCommand::SetAuto { enabled } => self.set_auto(enabled),
            AppCommand::StopCamera => {
                self.sampler.stop();
                self.streams.stop();
            }
            AppCommand::VisibilityChanged(state) => self.visibility_changed(state),
            AppCommand::Status => return Flow::Continue(Some(self.status_report())),
            AppCommand::Shutdown => {
                info!("Shutdown requested");
                return Flow::Exit;
            }
        }

        Flow::Continue(None)
    }

    /// Stop every periodic task and release the camera.
    pub fn shutdown(&mut self) {
        self.dispatcher.stop_auto();
        self.sampler.stop();
        self.streams.stop();
    }

    fn select_device(&mut self, device: &str) {
        let device_id = self.resolve_device(device);

        if let Err(e) = Preferences::save_device(&mut self.store, &device_id) {
            error!(error = ?e, "Failed to persist selected device");
        }

        self.streams.start(Some(&device_id));
    }

    /// Exact ids win; otherwise a 1-based position in the last listing.
    fn resolve_device(&self, device: &str) -> String {
        let devices = self.streams.devices();

        if devices.iter().any(|d| d.id == device) {
            return device.to_string();
        }

        device
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| devices.get(i))
            .map_or_else(|| device.to_string(), |d| d.id.clone())
    }

    fn set_auto(&mut self, enabled: bool) {
        if let Err(e) = Preferences::save_auto(&mut self.store, enabled) {
            error!(error = ?e, "Failed to persist auto mode");
        }

        if enabled {
            self.dispatcher.start_auto();
            self.notifier.notify("Auto send on", NotificationKind::Info);
        } else {
            self.dispatcher.stop_auto();
            self.notifier.notify("Auto send off", NotificationKind::Info);
        }
    }

    /// Re-acquire the camera when the surface comes back with no session.
    fn visibility_changed(&mut self, state: SurfaceState) {
        let previous = self.surface;
        self.surface = state;

        if previous != SurfaceState::Hidden || state != SurfaceState::Visible {
            return;
        }

        if matches!(self.streams.state(), StreamState::Active { .. }) {
            return;
        }

        let device_id = self
            .streams
            .selected_device_id()
            .map(str::to_string)
            .or_else(|| Preferences::load(&self.store).selected_device_id);

        info!(device_id = ?device_id, "Surface visible without a session, restarting");

        self.streams.start(device_id.as_deref());
        self.sampler.start();
    }

    fn device_report(&self) -> String {
        let devices = self.streams.devices();
        if devices.is_empty() {
            return "No cameras found".to_string();
        }

        let selected = self.streams.selected_device_id();
        let mut report = String::new();
        for (i, device) in devices.iter().enumerate() {
            let marker = if selected == Some(device.id.as_str()) { " *" } else { "" };
            let _ = writeln!(
                report,
                "{:>3}. {} [{}]{}",
                i + 1,
                device.display_label(i),
                device.id,
                marker
            );
        }
        report.trim_end().to_string()
    }

    fn status_report(&self) -> String {
        let color = self.dispatcher.current_color();
        let camera = match self.streams.state() {
            StreamState::Idle => "idle".to_string(),
            StreamState::Active {
                session_id,
                device_id,
            } => format!("active on {} (session {})", device_id, session_id),
        };

        let mut report = String::new();
        let _ = writeln!(report, "camera: {}", camera);
        let _ = writeln!(
            report,
            "color:  {} \x1b[48;2;{};{};{}m      \x1b[0m",
            color, color.r, color.g, color.b
        );
        let _ = writeln!(
            report,
            "auto:   {}",
            if self.dispatcher.is_auto_running() { "on" } else { "off" }
        );
        let _ = write!(report, "notices: {}", self.notifier.active().len());
        report
    }
}
