//! Hardware gamepad source backed by gilrs
//!
//! Maintains one [`DeviceSnapshot`] per connected device, updated from gilrs
//! events, and emits the snapshots once per poll tick. The loop stays dormant
//! while no gamepad is connected: nothing is emitted until a connect event
//! arrives, and emission stops again when the last device disconnects.

use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs};
use statum::{machine, state};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Flat per-device state, read atomically once per tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceSnapshot {
    pub axes: Vec<f32>,
    pub buttons: Vec<bool>,
}

impl DeviceSnapshot {
    /// Writes an axis slot, growing the array as needed
    pub fn set_axis(&mut self, slot: usize, value: f32) {
        if self.axes.len() <= slot {
            self.axes.resize(slot + 1, 0.0);
        }
        self.axes[slot] = value;
    }

    /// Writes a button slot, growing the array as needed
    pub fn set_button(&mut self, slot: usize, pressed: bool) {
        if self.buttons.len() <= slot {
            self.buttons.resize(slot + 1, false);
        }
        self.buttons[slot] = pressed;
    }
}

/// Poll loop settings
#[derive(Clone, Debug)]
pub struct PollSettings {
    /// Snapshot emission interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 16, // animation-frame cadence
        }
    }
}

/// Gamepad source errors
#[derive(Debug, thiserror::Error)]
pub enum GamepadSourceError {
    #[error("Failed to initialize gamepad source: {0}")]
    InitializationError(String),

    #[error("Failed to send snapshot: {0}")]
    SnapshotSendError(String),
}

#[state]
#[derive(Debug, Clone)]
pub enum PollState {
    Initializing,
    Polling,
}

#[machine]
#[derive(Debug)]
pub struct GamepadSource<S: PollState> {
    // Gilrs context
    gilrs: Gilrs,

    // Latest state per connected device, keyed by device index
    snapshots: HashMap<usize, DeviceSnapshot>,

    // Poll settings
    settings: PollSettings,

    // Channel for emitting (device index, snapshot) pairs
    snapshot_sender: mpsc::Sender<(usize, DeviceSnapshot)>,
}

impl GamepadSource<Initializing> {
    pub fn create(
        settings: Option<PollSettings>,
        snapshot_sender: mpsc::Sender<(usize, DeviceSnapshot)>,
    ) -> Result<Self, GamepadSourceError> {
        let settings = settings.unwrap_or_default();
        debug!("Creating gamepad source with settings: {:?}", settings);

        info!("Initializing gilrs gamepad interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(GamepadSourceError::InitializationError(e.to_string()));
            }
        };

        Ok(Self::new(gilrs, HashMap::new(), settings, snapshot_sender))
    }

    /// Registers already-connected devices and transitions to Polling
    pub fn initialize(mut self) -> GamepadSource<Polling> {
        let gamepads: Vec<(GamepadId, Gamepad<'_>)> = self.gilrs.gamepads().collect();

        if gamepads.is_empty() {
            info!("No gamepad connected, polling stays dormant until one appears");
        } else {
            info!("Found {} gamepads:", gamepads.len());
            for (id, gamepad) in &gamepads {
                info!(
                    "  [{}] Name: {}, UUID: {:?}",
                    id,
                    gamepad.name(),
                    gamepad.uuid()
                );
            }
        }

        let indices: Vec<usize> = gamepads.iter().map(|(id, _)| usize::from(*id)).collect();
        for index in indices {
            self.snapshots.insert(index, DeviceSnapshot::default());
        }

        info!("Gamepad source initialized, transitioning to Polling state");
        self.transition()
    }
}

impl GamepadSource<Polling> {
    /// Runs the poll loop until the cancellation token fires
    pub async fn run_poll_loop(
        &mut self,
        cancel: CancellationToken,
    ) -> Result<(), GamepadSourceError> {
        info!(
            "Starting gamepad poll loop ({}ms interval)",
            self.settings.poll_interval_ms
        );

        let mut ticker = tokio::time::interval(Duration::from_millis(self.settings.poll_interval_ms));

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Gamepad poll loop cancelled");
                    return Ok(());
                }

                _ = ticker.tick() => {
                    self.drain_events();
                    self.emit_snapshots()?;
                }
            }
        }
    }

    /// Applies all queued gilrs events to the per-device snapshots
    fn drain_events(&mut self) {
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            let index = usize::from(id);

            match event {
                EventType::Connected => {
                    info!("Gamepad {} connected", index);
                    self.snapshots.insert(index, DeviceSnapshot::default());
                }
                EventType::Disconnected => {
                    warn!("Gamepad {} disconnected", index);
                    self.snapshots.remove(&index);
                }
                EventType::AxisChanged(axis, value, _) => {
                    if let Some(slot) = axis_slot(axis) {
                        self.snapshot_mut(index).set_axis(slot, value);
                    } else {
                        debug!("Ignoring unmapped axis: {:?}", axis);
                    }
                }
                EventType::ButtonChanged(button, value, _) => {
                    // Analog triggers report here rather than as axes.
                    if let Some(slot) = trigger_axis_slot(button) {
                        self.snapshot_mut(index).set_axis(slot, value);
                    }
                }
                EventType::ButtonPressed(button, _) => {
                    if let Some(slot) = button_slot(button) {
                        self.snapshot_mut(index).set_button(slot, true);
                    } else {
                        debug!("Ignoring unmapped button: {:?}", button);
                    }
                }
                EventType::ButtonReleased(button, _) => {
                    if let Some(slot) = button_slot(button) {
                        self.snapshot_mut(index).set_button(slot, false);
                    }
                }
                _ => {
                    debug!("Unhandled gilrs event: {:?}", event);
                }
            }
        }
    }

    fn snapshot_mut(&mut self, index: usize) -> &mut DeviceSnapshot {
        self.snapshots.entry(index).or_default()
    }

    /// Emits every connected device's snapshot; dormant when none are connected
    fn emit_snapshots(&mut self) -> Result<(), GamepadSourceError> {
        for (&index, snapshot) in &self.snapshots {
            match self.snapshot_sender.try_send((index, snapshot.clone())) {
                Ok(_) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    // Consumer is behind; the next tick carries fresher state anyway.
                    debug!("Snapshot channel full, dropping tick for gamepad {}", index);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    error!("Snapshot channel closed");
                    return Err(GamepadSourceError::SnapshotSendError(
                        "snapshot channel closed".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Public interface for spawning the gamepad source task
pub struct GamepadSourceHandle {
    snapshot_sender: mpsc::Sender<(usize, DeviceSnapshot)>,
}

impl GamepadSourceHandle {
    /// Creates the source and spawns its poll loop as a tokio task
    pub fn spawn(
        settings: Option<PollSettings>,
        snapshot_sender: mpsc::Sender<(usize, DeviceSnapshot)>,
        cancel: CancellationToken,
    ) -> Result<Self, GamepadSourceError> {
        info!("Spawning gamepad source with settings: {:?}", settings);

        let sender_clone = snapshot_sender.clone();
        let source = GamepadSource::create(settings, snapshot_sender)?;

        tokio::spawn(async move {
            let mut polling = source.initialize();
            if let Err(e) = polling.run_poll_loop(cancel).await {
                error!("Gamepad poll loop terminated with error: {}", e);
            }
        });

        info!("Gamepad source successfully started");
        Ok(Self {
            snapshot_sender: sender_clone,
        })
    }

    pub fn snapshot_sender(&self) -> mpsc::Sender<(usize, DeviceSnapshot)> {
        self.snapshot_sender.clone()
    }
}

/// Maps a gilrs axis to its output slot
fn axis_slot(axis: Axis) -> Option<usize> {
    match axis {
        Axis::LeftStickX => Some(0),
        Axis::LeftStickY => Some(1),
        Axis::LeftZ => Some(2),
        Axis::RightStickX => Some(3),
        Axis::RightStickY => Some(4),
        Axis::RightZ => Some(5),
        Axis::DPadX => Some(6),
        Axis::DPadY => Some(7),
        _ => None,
    }
}

/// Maps analog trigger buttons to the trigger axis slots
fn trigger_axis_slot(button: Button) -> Option<usize> {
    match button {
        Button::LeftTrigger2 => Some(2),
        Button::RightTrigger2 => Some(5),
        _ => None,
    }
}

/// Maps a gilrs button to its output slot
fn button_slot(button: Button) -> Option<usize> {
    match button {
        Button::South => Some(0),
        Button::East => Some(1),
        Button::North => Some(2),
        Button::West => Some(3),
        Button::LeftTrigger => Some(4),
        Button::RightTrigger => Some(5),
        Button::LeftTrigger2 => Some(6),
        Button::RightTrigger2 => Some(7),
        Button::Select => Some(8),
        Button::Start => Some(9),
        Button::Mode => Some(10),
        Button::LeftThumb => Some(11),
        Button::RightThumb => Some(12),
        Button::DPadUp => Some(13),
        Button::DPadDown => Some(14),
        Button::DPadLeft => Some(15),
        Button::DPadRight => Some(16),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_arrays_grow_on_demand() {
        let mut snapshot = DeviceSnapshot::default();

        snapshot.set_axis(3, -0.5);
        assert_eq!(snapshot.axes, vec![0.0, 0.0, 0.0, -0.5]);

        snapshot.set_button(1, true);
        assert_eq!(snapshot.buttons, vec![false, true]);

        snapshot.set_axis(0, 1.0);
        assert_eq!(snapshot.axes.len(), 4);
        assert!((snapshot.axes[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn stick_axes_map_to_distinct_slots() {
        let slots: Vec<usize> = [
            Axis::LeftStickX,
            Axis::LeftStickY,
            Axis::RightStickX,
            Axis::RightStickY,
        ]
        .into_iter()
        .filter_map(axis_slot)
        .collect();

        assert_eq!(slots.len(), 4);
        let mut deduped = slots.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(deduped.len(), 4);
    }

    #[test]
    fn analog_triggers_share_the_trigger_axis_slots() {
        assert_eq!(trigger_axis_slot(Button::LeftTrigger2), axis_slot(Axis::LeftZ));
        assert_eq!(trigger_axis_slot(Button::RightTrigger2), axis_slot(Axis::RightZ));
        assert_eq!(trigger_axis_slot(Button::South), None);
    }

    #[test]
    fn face_buttons_occupy_the_low_slots() {
        assert_eq!(button_slot(Button::South), Some(0));
        assert_eq!(button_slot(Button::East), Some(1));
        assert_eq!(button_slot(Button::Unknown), None);
    }
}
