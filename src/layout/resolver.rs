//! Message sizing derived from a layout schema
//!
//! Scans a schema for the highest referenced axis and button index and turns
//! that into the fixed array lengths of the output message. Every declaration
//! kind counts: bar and d-pad axes size the axis array, stick click buttons
//! size the button array. Pure computation, no error cases; an empty schema
//! yields zero-length arrays.

use super::{ControlDeclaration, LayoutSchema};

/// Required output message size for a given layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageDimensions {
    pub num_axes: usize,
    pub num_buttons: usize,
}

/// Computes `(num_axes, num_buttons)` for a schema
///
/// Each count is one past the highest referenced index, or zero when no
/// declaration references that array at all. Recompute whenever the active
/// schema changes.
pub fn resolve_dimensions(schema: &LayoutSchema) -> MessageDimensions {
    let mut max_axis: Option<usize> = None;
    let mut max_button: Option<usize> = None;

    let mut note_axis = |index: usize| {
        max_axis = Some(max_axis.map_or(index, |current| current.max(index)));
    };
    let mut note_button = |index: usize| {
        max_button = Some(max_button.map_or(index, |current| current.max(index)));
    };

    for control in schema.controls() {
        match control {
            ControlDeclaration::Button { button, .. } => note_button(*button),
            ControlDeclaration::Bar { axis, .. } => note_axis(*axis),
            ControlDeclaration::Stick {
                axis_x,
                axis_y,
                button,
                ..
            } => {
                note_axis(*axis_x);
                note_axis(*axis_y);
                note_button(*button);
            }
            ControlDeclaration::Dpad { axis_x, axis_y, .. } => {
                note_axis(*axis_x);
                note_axis(*axis_y);
            }
        }
    }

    MessageDimensions {
        num_axes: max_axis.map_or(0, |max| max + 1),
        num_buttons: max_button.map_or(0, |max| max + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{ControlPosition, LayoutSchema};

    fn pos() -> ControlPosition {
        ControlPosition::new(0.0, 0.0)
    }

    #[test]
    fn empty_schema_yields_zero_length_arrays() {
        let schema = LayoutSchema::new("empty", vec![]);
        assert_eq!(resolve_dimensions(&schema), MessageDimensions::default());
    }

    #[test]
    fn stick_axes_size_the_axis_array() {
        let schema = LayoutSchema::new(
            "sticks",
            vec![ControlDeclaration::Stick {
                axis_x: 2,
                axis_y: 3,
                button: 0,
                pos: pos(),
            }],
        );

        let dims = resolve_dimensions(&schema);
        assert_eq!(dims.num_axes, 4);
    }

    #[test]
    fn buttons_only_schema_has_no_axes() {
        let schema = LayoutSchema::new(
            "buttons",
            vec![
                ControlDeclaration::Button {
                    button: 0,
                    label: "A".into(),
                    pos: pos(),
                },
                ControlDeclaration::Button {
                    button: 1,
                    label: "B".into(),
                    pos: pos(),
                },
                ControlDeclaration::Button {
                    button: 3,
                    label: "Y".into(),
                    pos: pos(),
                },
            ],
        );

        let dims = resolve_dimensions(&schema);
        assert_eq!(dims.num_axes, 0);
        // Index 2 is unreferenced but still inside the array.
        assert_eq!(dims.num_buttons, 4);
    }

    #[test]
    fn bar_and_dpad_axes_count_toward_sizing() {
        let schema = LayoutSchema::new(
            "mixed",
            vec![
                ControlDeclaration::Bar {
                    axis: 5,
                    pos: pos(),
                    rot: 0.0,
                },
                ControlDeclaration::Dpad {
                    axis_x: 6,
                    axis_y: 7,
                    pos: pos(),
                },
            ],
        );

        assert_eq!(resolve_dimensions(&schema).num_axes, 8);
    }

    #[test]
    fn stick_click_button_counts_toward_sizing() {
        let schema = LayoutSchema::new(
            "clicky",
            vec![ControlDeclaration::Stick {
                axis_x: 0,
                axis_y: 1,
                button: 10,
                pos: pos(),
            }],
        );

        assert_eq!(resolve_dimensions(&schema).num_buttons, 11);
    }

    #[test]
    fn duplicate_indices_across_declarations_are_fine() {
        let schema = LayoutSchema::new(
            "shared",
            vec![
                ControlDeclaration::Stick {
                    axis_x: 0,
                    axis_y: 1,
                    button: 0,
                    pos: pos(),
                },
                ControlDeclaration::Dpad {
                    axis_x: 0,
                    axis_y: 1,
                    pos: pos(),
                },
            ],
        );

        let dims = resolve_dimensions(&schema);
        assert_eq!(dims.num_axes, 2);
        assert_eq!(dims.num_buttons, 1);
    }
}
