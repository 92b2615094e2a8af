//! Panel application
//!
//! `JoyPanelApp` is the hub where the producers meet: it drains gamepad
//! snapshots and relayed messages, feeds keyboard events through the key
//! state table, runs the interactive canvas, and publishes the result when
//! publish mode is on. Exactly one producer is live at a time, selected by
//! the configured data source; messages from the others are discarded at the
//! gate instead of being merged.
//!
//! Configuration edits flow out through a watch channel so the transport and
//! the autosave task see the same state the UI does.

pub mod panel_view;

use eframe::egui;
use tokio::sync::{mpsc, watch};
use tokio::time::Duration;
use tracing::{debug, info, warn};

use crate::layout::resolver::{self, MessageDimensions};
use crate::layout::{self, LayoutSchema, BUILTIN_LAYOUT_NAMES};
use crate::interaction::InteractionTracker;
use crate::message::{self, JoyMessage};
use crate::persistence::{DisplayMode, PanelConfig};
use crate::source::gamepad::DeviceSnapshot;
use crate::source::keyboard::KeyStateTable;
use crate::source::DataSource;

const REPAINT_INTERVAL: Duration = Duration::from_millis(33);

pub struct JoyPanelApp {
    config: PanelConfig,
    config_tx: watch::Sender<PanelConfig>,

    schema: LayoutSchema,
    dims: MessageDimensions,
    tracker: InteractionTracker,
    /// Present only while the keyboard source is selected
    key_table: Option<KeyStateTable>,
    latest: Option<JoyMessage>,

    snapshot_rx: mpsc::Receiver<(usize, DeviceSnapshot)>,
    relay_rx: mpsc::Receiver<JoyMessage>,
    publish_tx: mpsc::Sender<JoyMessage>,
}

impl JoyPanelApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: PanelConfig,
        config_tx: watch::Sender<PanelConfig>,
        snapshot_rx: mpsc::Receiver<(usize, DeviceSnapshot)>,
        relay_rx: mpsc::Receiver<JoyMessage>,
        publish_tx: mpsc::Sender<JoyMessage>,
    ) -> Self {
        let schema = load_schema(&config.layout_name);
        let dims = resolver::resolve_dimensions(&schema);
        info!(
            "Panel started with layout '{}' ({} axes, {} buttons)",
            schema.name(),
            dims.num_axes,
            dims.num_buttons
        );

        Self {
            config,
            config_tx,
            schema,
            dims,
            tracker: InteractionTracker::new(),
            key_table: None,
            latest: None,
            snapshot_rx,
            relay_rx,
            publish_tx,
        }
    }

    /// Pulls everything the background producers queued since the last frame
    ///
    /// Messages from sources other than the selected one are dropped here, as
    /// are snapshots from gamepads other than the configured one.
    fn drain_producers(&mut self) {
        while let Ok((device_id, snapshot)) = self.snapshot_rx.try_recv() {
            if self.config.data_source == DataSource::Gamepad
                && device_id == self.config.gamepad_id
            {
                self.latest = Some(message::from_snapshot(&snapshot, &self.config.frame_id));
            }
        }

        while let Ok(upstream) = self.relay_rx.try_recv() {
            if self.config.data_source == DataSource::SubTopic {
                self.latest = Some(message::adopt_relayed(upstream, &self.config.frame_id));
            }
        }
    }

    /// Runs the keyboard producer while the keyboard source is selected
    fn process_keyboard(&mut self, ctx: &egui::Context) {
        if self.config.data_source != DataSource::Keyboard {
            self.key_table = None;
            return;
        }

        let table = self
            .key_table
            .get_or_insert_with(KeyStateTable::with_default_bindings);

        if self.config.kb_enabled {
            let events = ctx.input(|input| input.events.clone());
            for event in events {
                if let egui::Event::Key {
                    key,
                    pressed,
                    repeat: false,
                    ..
                } = event
                {
                    if pressed {
                        table.key_down(key);
                    } else {
                        table.key_up(key);
                    }
                }
            }
        }

        self.latest = Some(message::from_key_states(table, &self.config.frame_id));
    }

    /// Commits an edited configuration and resets state the edit invalidated
    fn apply_config(&mut self, new_config: PanelConfig) {
        if new_config.data_source != self.config.data_source {
            debug!(
                "Data source changed to {}, discarding producer state",
                new_config.data_source
            );
            self.tracker.clear();
            self.key_table = None;
            self.latest = None;
        }

        if new_config.layout_name != self.config.layout_name {
            self.schema = load_schema(&new_config.layout_name);
            self.dims = resolver::resolve_dimensions(&self.schema);
            self.tracker.clear();
            info!(
                "Switched to layout '{}' ({} axes, {} buttons)",
                self.schema.name(),
                self.dims.num_axes,
                self.dims.num_buttons
            );
        }

        if !new_config.kb_enabled && self.config.kb_enabled {
            if let Some(table) = &mut self.key_table {
                table.release_all();
            }
        }

        self.config = new_config.clone();
        if self.config_tx.send(new_config).is_err() {
            warn!("Config channel closed, settings no longer reach the transport");
        }
    }

    fn settings_strip(&mut self, ui: &mut egui::Ui) {
        let mut draft = self.config.clone();

        ui.horizontal_wrapped(|ui| {
            egui::ComboBox::from_label("Data Source")
                .selected_text(draft.data_source.label())
                .show_ui(ui, |ui| {
                    for source in DataSource::ALL {
                        ui.selectable_value(&mut draft.data_source, source, source.label());
                    }
                });

            match draft.data_source {
                DataSource::SubTopic => {
                    ui.label("Subscribe Topic");
                    ui.add(
                        egui::TextEdit::singleline(&mut draft.sub_topic).desired_width(120.0),
                    );
                }
                DataSource::Gamepad => {
                    egui::ComboBox::from_label("Gamepad ID")
                        .selected_text(draft.gamepad_id.to_string())
                        .show_ui(ui, |ui| {
                            for id in 0..4 {
                                ui.selectable_value(&mut draft.gamepad_id, id, id.to_string());
                            }
                        });
                }
                DataSource::Keyboard => {
                    ui.checkbox(&mut draft.kb_enabled, "Enable Keyboard");
                }
                DataSource::Interactive => {}
            }

            ui.separator();

            egui::ComboBox::from_label("Display Mode")
                .selected_text(draft.display_mode.label())
                .show_ui(ui, |ui| {
                    for mode in DisplayMode::ALL {
                        ui.selectable_value(&mut draft.display_mode, mode, mode.label());
                    }
                });

            let custom_active = draft.display_mode == DisplayMode::Custom
                || draft.data_source == DataSource::Interactive;
            ui.add_enabled_ui(custom_active, |ui| {
                egui::ComboBox::from_label("Layout")
                    .selected_text(draft.layout_name.clone())
                    .show_ui(ui, |ui| {
                        for name in BUILTIN_LAYOUT_NAMES {
                            ui.selectable_value(
                                &mut draft.layout_name,
                                name.to_string(),
                                name,
                            );
                        }
                    });
            });

            ui.separator();

            ui.checkbox(&mut draft.publish_mode, "Publish Mode");
            ui.add_enabled_ui(draft.publish_mode, |ui| {
                ui.label("Publish Topic");
                ui.add(egui::TextEdit::singleline(&mut draft.pub_topic).desired_width(120.0));
                ui.label("Frame ID");
                ui.add(egui::TextEdit::singleline(&mut draft.frame_id).desired_width(100.0));
            });
        });

        if draft != self.config {
            self.apply_config(draft);
        }
    }

    fn publish_if_enabled(&self) {
        if !self.config.publish_mode {
            return;
        }

        if let Some(message) = &self.latest {
            if self.publish_tx.try_send(message.clone()).is_err() {
                debug!("Publish channel full or closed, dropping message");
            }
        }
    }
}

impl eframe::App for JoyPanelApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_producers();
        self.process_keyboard(ctx);

        egui::TopBottomPanel::top("settings").show(ctx, |ui| {
            self.settings_strip(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let interactive = self.config.data_source == DataSource::Interactive;

            if interactive || self.config.display_mode == DisplayMode::Custom {
                let produced = panel_view::custom_view(
                    ui,
                    &self.schema,
                    self.dims,
                    &mut self.tracker,
                    self.latest.as_ref(),
                    &self.config.frame_id,
                    interactive,
                );
                if let Some(message) = produced {
                    self.latest = Some(message);
                }
            } else {
                panel_view::simple_view(ui, self.latest.as_ref());
            }
        });

        self.publish_if_enabled();

        ctx.request_repaint_after(REPAINT_INTERVAL);
    }
}

fn load_schema(layout_name: &str) -> LayoutSchema {
    layout::builtin_layout(layout_name).unwrap_or_else(|| {
        warn!("Unknown layout '{}', starting with an empty one", layout_name);
        LayoutSchema::new(layout_name.to_string(), Vec::new())
    })
}
