//! CamLight: relays the average color of a live camera feed to a lighting service.

mod app;
mod app_command;
mod atomic_file;
mod config;
mod console_input;
mod error;
mod preference_file;
mod surface_state;
#[cfg(test)]
mod tests;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    error::{AppError, Result as AppResult},
    preference_file::FilePreferenceStore,
    surface_state::SurfaceState,
};

use crate::{
    config::{Config, DEFAULT_LOG_FILTER},
    console_input::{USAGE, spawn_console},
};

use std::{sync::Arc, time::Duration};

use camlight_core::{HttpColorSink, Notifier};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// How long shutdown waits for blocking tasks such as the console reader.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Application entry point.
fn main() {
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {:?}", e);
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.filter))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {:?}", e);
            std::process::exit(1);
        }
    };

    let result = rt.block_on(run(config));

    rt.shutdown_timeout(SHUTDOWN_TIMEOUT);

    if let Err(e) = result {
        error!(error = ?e, "App error");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> AppResult<()> {
    let sink = Arc::new(HttpColorSink::new(&config.service.base_url)?);
    info!(endpoint = sink.endpoint(), "Color service configured");

    let store = FilePreferenceStore::open(config.preferences_path()?);
    info!(path = ?store.path(), "Preference store opened");

    #[cfg(feature = "webcam")]
    let backend = camlight_core::WebcamBackend::new();
    #[cfg(not(feature = "webcam"))]
    let backend = camlight_core::UnsupportedBackend;

    let (command_tx, command_rx) = mpsc::channel(32);
    let _console = spawn_console(command_tx);
    println!("{}", USAGE);

    let app = App::new(backend, sink, store, Notifier::new(), command_rx);
    app.run().await
}
