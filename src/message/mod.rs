//! Joy message type and synthesis
//!
//! One [`JoyMessage`] is produced per update tick, merging whichever producer
//! currently feeds the panel: the interaction set, a hardware device snapshot,
//! the keyboard key-state table, or a relayed upstream message. Synthesis
//! always starts from zero-filled arrays and returns a fresh, fully populated
//! value; the previous tick's message is never patched in place.
//!
//! Merge policies differ per producer and are deliberate:
//!
//! - Interactions merge in capture order, last write wins on a shared slot.
//! - Hardware axes are sign-inverted (pushing a stick forward reads negative
//!   on the wire but must come out positive here); buttons are a plain
//!   pressed test.
//! - Keyboard axes ACCUMULATE `direction × held`, so opposite keys on one
//!   axis cancel by summation instead of overwriting each other.
//! - Relayed messages keep their upstream timestamp; only the frame id is
//!   replaced.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::interaction::{ContactBinding, InteractionTracker};
use crate::layout::resolver::MessageDimensions;
use crate::source::gamepad::DeviceSnapshot;
use crate::source::keyboard::{KeyStateTable, KeyTarget};

/// Standardized control message: axes in `[-1, 1]`, buttons in `{0, 1}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoyMessage {
    pub timestamp: DateTime<Local>,
    pub frame_id: String,
    pub axes: Vec<f32>,
    pub buttons: Vec<i32>,
}

impl JoyMessage {
    /// All-zero message of the given size, stamped now
    pub fn zeroed(dims: MessageDimensions, frame_id: &str) -> Self {
        Self {
            timestamp: Local::now(),
            frame_id: frame_id.to_string(),
            axes: vec![0.0; dims.num_axes],
            buttons: vec![0; dims.num_buttons],
        }
    }
}

/// Merges the live interaction set into one message
///
/// Arrays are sized by the resolver, not by the interactions: a stale
/// interaction left over from a layout swap may reference slots beyond the
/// current arrays, and those writes are dropped silently.
pub fn from_interactions(
    dims: MessageDimensions,
    tracker: &InteractionTracker,
    frame_id: &str,
) -> JoyMessage {
    let mut message = JoyMessage::zeroed(dims, frame_id);

    for interaction in tracker.interactions() {
        match interaction.binding() {
            ContactBinding::Button { index } => {
                if let Some(slot) = message.buttons.get_mut(*index) {
                    *slot = 1;
                }
            }
            ContactBinding::AxisPair {
                axis_x,
                axis_y,
                x,
                y,
                ..
            } => {
                if let Some(slot) = message.axes.get_mut(*axis_x) {
                    *slot = *x;
                }
                if let Some(slot) = message.axes.get_mut(*axis_y) {
                    *slot = *y;
                }
            }
        }
    }

    message
}

/// Converts a hardware device snapshot into a message
pub fn from_snapshot(snapshot: &DeviceSnapshot, frame_id: &str) -> JoyMessage {
    JoyMessage {
        timestamp: Local::now(),
        frame_id: frame_id.to_string(),
        axes: snapshot.axes.iter().map(|axis| -axis).collect(),
        buttons: snapshot
            .buttons
            .iter()
            .map(|pressed| if *pressed { 1 } else { 0 })
            .collect(),
    }
}

/// Converts the keyboard key-state table into a message
///
/// Arrays grow to fit the highest referenced index. Button targets write their
/// held state directly; axis targets sum into their slot.
pub fn from_key_states(table: &KeyStateTable, frame_id: &str) -> JoyMessage {
    let mut axes: Vec<f32> = Vec::new();
    let mut buttons: Vec<i32> = Vec::new();

    for binding in table.bindings() {
        match binding.target {
            KeyTarget::Button(index) => {
                if buttons.len() <= index {
                    buttons.resize(index + 1, 0);
                }
                buttons[index] = if binding.held { 1 } else { 0 };
            }
            KeyTarget::Axis { index, direction } => {
                if axes.len() <= index {
                    axes.resize(index + 1, 0.0);
                }
                if binding.held {
                    axes[index] += direction;
                }
            }
        }
    }

    JoyMessage {
        timestamp: Local::now(),
        frame_id: frame_id.to_string(),
        axes,
        buttons,
    }
}

/// Adopts a relayed upstream message
///
/// Axes, buttons and the upstream timestamp are taken verbatim; only the
/// frame id is replaced with our own.
pub fn adopt_relayed(upstream: JoyMessage, frame_id: &str) -> JoyMessage {
    JoyMessage {
        timestamp: upstream.timestamp,
        frame_id: frame_id.to_string(),
        axes: upstream.axes,
        buttons: upstream.buttons,
    }
}
