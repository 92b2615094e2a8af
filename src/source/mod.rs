//! Data sources feeding the panel
//!
//! The panel synthesizes its message from exactly one producer at a time:
//!
//! 1. [`gamepad`] - Hardware snapshots polled from gilrs
//! 2. [`keyboard`] - Held-key table driven by UI key events
//! 3. The interaction tracker (virtual controller, lives in [`crate::interaction`])
//! 4. A relayed upstream message (lives in [`crate::mqtt`])
//!
//! Producers keep running when deselected; the panel hub filters their output
//! by the active [`DataSource`] and discards in-flight interaction and
//! key-state when the selection changes.

pub mod gamepad;
pub mod keyboard;

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Which producer feeds the message synthesizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DataSource {
    /// Relay the subscribed joy topic
    #[default]
    #[serde(rename = "sub-joy-topic")]
    SubTopic,

    /// Poll a hardware gamepad
    #[serde(rename = "gamepad")]
    Gamepad,

    /// On-screen virtual controller
    #[serde(rename = "interactive")]
    Interactive,

    /// Keyboard chord mapping
    #[serde(rename = "keyboard")]
    Keyboard,
}

impl DataSource {
    pub const ALL: [DataSource; 4] = [
        DataSource::SubTopic,
        DataSource::Gamepad,
        DataSource::Interactive,
        DataSource::Keyboard,
    ];

    /// Human-readable selector label
    pub fn label(&self) -> &'static str {
        match self {
            DataSource::SubTopic => "Subscribed Joy Topic",
            DataSource::Gamepad => "Gamepad",
            DataSource::Interactive => "Interactive",
            DataSource::Keyboard => "Keyboard",
        }
    }
}

impl Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_spellings_round_trip() {
        for (source, spelling) in [
            (DataSource::SubTopic, "\"sub-joy-topic\""),
            (DataSource::Gamepad, "\"gamepad\""),
            (DataSource::Interactive, "\"interactive\""),
            (DataSource::Keyboard, "\"keyboard\""),
        ] {
            assert_eq!(serde_json::to_string(&source).unwrap(), spelling);
            let decoded: DataSource = serde_json::from_str(spelling).unwrap();
            assert_eq!(decoded, source);
        }
    }
}
