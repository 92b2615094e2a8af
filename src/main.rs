pub mod interaction;
pub mod layout;
pub mod message;
pub mod mqtt;
pub mod persistence;
pub mod source;
pub mod ui;

use crate::mqtt::MqttTransportHandle;
use crate::persistence::{ConfigStore, PanelConfig};
use crate::source::gamepad::GamepadSourceHandle;
use crate::ui::JoyPanelApp;
use color_eyre::Result;
use eframe::egui;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let (store, config) = setup_config().await;
    let (config_tx, config_rx) = watch::channel(config.clone());

    if let Some(store) = store {
        // Mirror live settings changes back to disk every 30 seconds.
        store.start_autosave_task(config_rx.clone(), 30);
    }

    let cancel = CancellationToken::new();

    let (snapshot_tx, snapshot_rx) = mpsc::channel(100);
    match GamepadSourceHandle::spawn(None, snapshot_tx, cancel.clone()) {
        Ok(_handle) => info!("Gamepad source running"),
        Err(e) => warn!("Continuing without gamepad source: {}", e),
    }

    let (publish_tx, publish_rx) = mpsc::channel(100);
    let (relay_tx, relay_rx) = mpsc::channel(100);
    let transport = MqttTransportHandle::spawn(config_rx.clone(), publish_rx, relay_tx);

    info!("Starting panel UI");
    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport = egui::ViewportBuilder::default().with_inner_size([760.0, 560.0]);

    let result = eframe::run_native(
        "JoyPanel",
        native_options,
        Box::new(move |cc| {
            Ok(Box::new(JoyPanelApp::new(
                cc,
                config,
                config_tx,
                snapshot_rx,
                relay_rx,
                publish_tx,
            )))
        }),
    );

    if let Err(e) = result {
        error!("UI terminated with error: {}", e);
    }

    cancel.cancel();
    transport.abort();
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}

/// Loads the persisted config, falling back to defaults if the store is unusable
async fn setup_config() -> (Option<ConfigStore>, PanelConfig) {
    let store = match ConfigStore::at_default_location() {
        Ok(store) => store,
        Err(e) => {
            warn!("No config store available ({}), using defaults", e);
            return (None, PanelConfig::default());
        }
    };

    if let Err(e) = store.ensure_default().await {
        warn!("Failed to write default config: {}", e);
    }

    let config = match store.load().await {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load config ({}), using defaults", e);
            PanelConfig::default()
        }
    };

    (Some(store), config)
}
