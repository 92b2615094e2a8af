//! Declarative controller layout schemas
//!
//! A layout schema describes the controls of a physical or virtual controller
//! (buttons, bars, sticks, directional pads) together with their on-screen
//! geometry. Schemas are pure configuration data: they are built whole, never
//! mutated, and carry no behavior of their own. The [`resolver`] module derives
//! the output message size from a schema; the interaction tracker and the UI
//! consume the declarations directly.

pub mod resolver;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Screen position of a control, in layout units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlPosition {
    pub x: f32,
    pub y: f32,
}

impl ControlPosition {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One declared control of a layout
///
/// Each variant carries only the fields meaningful for its kind, so invalid
/// combinations (a bar with a button index, a d-pad with a label) cannot be
/// represented.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlDeclaration {
    /// Momentary button writing into one button slot
    Button {
        button: usize,
        label: String,
        pos: ControlPosition,
    },

    /// Single-axis display bar with a rotation in degrees
    Bar {
        axis: usize,
        pos: ControlPosition,
        rot: f32,
    },

    /// Two-axis thumbstick with a click button
    Stick {
        axis_x: usize,
        axis_y: usize,
        button: usize,
        pos: ControlPosition,
    },

    /// Two-axis directional pad (display-only, no click button)
    Dpad {
        axis_x: usize,
        axis_y: usize,
        pos: ControlPosition,
    },
}

impl ControlDeclaration {
    pub fn pos(&self) -> ControlPosition {
        match self {
            ControlDeclaration::Button { pos, .. }
            | ControlDeclaration::Bar { pos, .. }
            | ControlDeclaration::Stick { pos, .. }
            | ControlDeclaration::Dpad { pos, .. } => *pos,
        }
    }
}

/// Layout parsing errors
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Failed to parse layout: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Control of type '{kind}' is missing field '{field}'")]
    MissingField { kind: String, field: &'static str },
}

/// Raw on-disk control record per the layout file format
///
/// All kind-specific fields are optional here; `into_declaration` checks the
/// ones the declared `type` actually needs.
#[derive(Debug, Deserialize)]
struct RawControlRecord {
    #[serde(rename = "type")]
    kind: String,
    x: f32,
    y: f32,
    #[serde(default)]
    rot: f32,
    button: Option<usize>,
    axis: Option<usize>,
    #[serde(rename = "axisX")]
    axis_x: Option<usize>,
    #[serde(rename = "axisY")]
    axis_y: Option<usize>,
    text: Option<String>,
}

impl RawControlRecord {
    fn require(value: Option<usize>, kind: &str, field: &'static str) -> Result<usize, LayoutError> {
        value.ok_or_else(|| LayoutError::MissingField {
            kind: kind.to_string(),
            field,
        })
    }

    /// Converts the record into a typed declaration
    ///
    /// Unknown `type` values yield `Ok(None)` so newer layout files keep
    /// loading on older builds.
    fn into_declaration(self) -> Result<Option<ControlDeclaration>, LayoutError> {
        let pos = ControlPosition::new(self.x, self.y);

        let declaration = match self.kind.as_str() {
            "button" => ControlDeclaration::Button {
                button: Self::require(self.button, &self.kind, "button")?,
                label: self.text.unwrap_or_default(),
                pos,
            },
            "bar" => ControlDeclaration::Bar {
                axis: Self::require(self.axis, &self.kind, "axis")?,
                pos,
                rot: self.rot,
            },
            "stick" => ControlDeclaration::Stick {
                axis_x: Self::require(self.axis_x, &self.kind, "axisX")?,
                axis_y: Self::require(self.axis_y, &self.kind, "axisY")?,
                button: Self::require(self.button, &self.kind, "button")?,
                pos,
            },
            "d-pad" => ControlDeclaration::Dpad {
                axis_x: Self::require(self.axis_x, &self.kind, "axisX")?,
                axis_y: Self::require(self.axis_y, &self.kind, "axisY")?,
                pos,
            },
            other => {
                warn!("Ignoring control with unknown type '{}'", other);
                return Ok(None);
            }
        };

        Ok(Some(declaration))
    }
}

/// Named, ordered sequence of control declarations
///
/// Immutable once built; swapping layouts means replacing the whole schema.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutSchema {
    name: String,
    controls: Vec<ControlDeclaration>,
}

impl LayoutSchema {
    pub fn new(name: impl Into<String>, controls: Vec<ControlDeclaration>) -> Self {
        Self {
            name: name.into(),
            controls,
        }
    }

    /// Parses a layout from its JSON record sequence
    pub fn from_json(name: impl Into<String>, json: &str) -> Result<Self, LayoutError> {
        let records: Vec<RawControlRecord> = serde_json::from_str(json)?;
        let mut controls = Vec::with_capacity(records.len());

        for record in records {
            if let Some(declaration) = record.into_declaration()? {
                controls.push(declaration);
            }
        }

        debug!("Parsed layout with {} controls", controls.len());
        Ok(Self::new(name, controls))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn controls(&self) -> &[ControlDeclaration] {
        &self.controls
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }
}

fn btn(button: usize, label: &str, x: f32, y: f32) -> ControlDeclaration {
    ControlDeclaration::Button {
        button,
        label: label.to_string(),
        pos: ControlPosition::new(x, y),
    }
}

fn bar(axis: usize, x: f32, y: f32, rot: f32) -> ControlDeclaration {
    ControlDeclaration::Bar {
        axis,
        pos: ControlPosition::new(x, y),
        rot,
    }
}

fn stick(axis_x: usize, axis_y: usize, button: usize, x: f32, y: f32) -> ControlDeclaration {
    ControlDeclaration::Stick {
        axis_x,
        axis_y,
        button,
        pos: ControlPosition::new(x, y),
    }
}

fn dpad(axis_x: usize, axis_y: usize, x: f32, y: f32) -> ControlDeclaration {
    ControlDeclaration::Dpad {
        axis_x,
        axis_y,
        pos: ControlPosition::new(x, y),
    }
}

/// Names of the shipped layouts, in selector order
pub const BUILTIN_LAYOUT_NAMES: [&str; 4] = ["steamdeck", "xbox", "ipega-9083s", "cheapo"];

/// Returns a shipped layout by name, or `None` for unknown names
pub fn builtin_layout(name: &str) -> Option<LayoutSchema> {
    let controls = match name {
        "steamdeck" => vec![
            stick(0, 1, 9, 184.0, 308.0),
            stick(2, 3, 10, 329.0, 308.0),
            bar(5, 119.0, 60.0, 0.0),
            bar(4, 395.0, 60.0, 0.0),
            dpad(6, 7, 117.0, 243.0),
            btn(0, "A", 397.0, 276.0),
            btn(1, "B", 430.0, 242.0),
            btn(2, "X", 363.0, 242.0),
            btn(3, "Y", 397.0, 210.0),
            btn(4, "LB", 121.0, 131.0),
            btn(5, "RB", 393.0, 131.0),
            btn(6, "View", 121.0, 97.0),
            btn(7, "Menu", 393.0, 97.0),
        ],
        "xbox" => vec![
            stick(0, 1, 9, 170.0, 300.0),
            stick(3, 4, 10, 340.0, 300.0),
            bar(2, 120.0, 60.0, 0.0),
            bar(5, 390.0, 60.0, 0.0),
            dpad(6, 7, 210.0, 360.0),
            btn(0, "A", 400.0, 270.0),
            btn(1, "B", 435.0, 235.0),
            btn(2, "X", 365.0, 235.0),
            btn(3, "Y", 400.0, 200.0),
            btn(4, "LB", 120.0, 120.0),
            btn(5, "RB", 390.0, 120.0),
            btn(6, "Back", 220.0, 200.0),
            btn(7, "Start", 290.0, 200.0),
            btn(8, "Guide", 255.0, 250.0),
        ],
        "ipega-9083s" => vec![
            stick(0, 1, 10, 150.0, 310.0),
            stick(2, 3, 11, 360.0, 310.0),
            bar(4, 120.0, 55.0, 0.0),
            bar(5, 390.0, 55.0, 0.0),
            dpad(6, 7, 130.0, 220.0),
            btn(0, "A", 390.0, 260.0),
            btn(1, "B", 425.0, 225.0),
            btn(3, "X", 355.0, 225.0),
            btn(4, "Y", 390.0, 190.0),
            btn(6, "L1", 120.0, 120.0),
            btn(7, "R1", 390.0, 120.0),
            btn(8, "Select", 225.0, 225.0),
            btn(9, "Start", 290.0, 225.0),
        ],
        "cheapo" => vec![
            dpad(0, 1, 140.0, 250.0),
            btn(0, "A", 380.0, 280.0),
            btn(1, "B", 420.0, 245.0),
            btn(2, "X", 340.0, 245.0),
            btn(3, "Y", 380.0, 210.0),
            btn(8, "Select", 220.0, 245.0),
            btn(9, "Start", 290.0, 245.0),
        ],
        _ => return None,
    };

    Some(LayoutSchema::new(name, controls))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_known_control_kinds() {
        let json = r#"[
            {"type": "stick", "x": 100, "y": 100, "axisX": 0, "axisY": 1, "button": 0},
            {"type": "d-pad", "x": 50, "y": 50, "axisX": 2, "axisY": 3},
            {"type": "bar", "x": 10, "y": 10, "axis": 4, "rot": 90},
            {"type": "button", "x": 20, "y": 20, "button": 1, "text": "A"}
        ]"#;

        let schema = LayoutSchema::from_json("test", json).unwrap();
        assert_eq!(schema.controls().len(), 4);
        assert_eq!(
            schema.controls()[0],
            ControlDeclaration::Stick {
                axis_x: 0,
                axis_y: 1,
                button: 0,
                pos: ControlPosition::new(100.0, 100.0),
            }
        );
        assert_eq!(
            schema.controls()[2],
            ControlDeclaration::Bar {
                axis: 4,
                pos: ControlPosition::new(10.0, 10.0),
                rot: 90.0,
            }
        );
    }

    #[test]
    fn skips_unknown_control_types() {
        let json = r#"[
            {"type": "hologram", "x": 0, "y": 0},
            {"type": "button", "x": 20, "y": 20, "button": 0}
        ]"#;

        let schema = LayoutSchema::from_json("test", json).unwrap();
        assert_eq!(schema.controls().len(), 1);
    }

    #[test]
    fn rejects_stick_without_axis_indices() {
        let json = r#"[{"type": "stick", "x": 0, "y": 0, "button": 0}]"#;

        let err = LayoutSchema::from_json("test", json).unwrap_err();
        assert!(matches!(err, LayoutError::MissingField { field: "axisX", .. }));
    }

    #[test]
    fn every_builtin_layout_resolves() {
        for name in BUILTIN_LAYOUT_NAMES {
            let schema = builtin_layout(name).unwrap();
            assert_eq!(schema.name(), name);
            assert!(!schema.is_empty());
        }
        assert!(builtin_layout("dreamcast").is_none());
    }
}
