//! Per-pointer interaction capture and value tracking
//!
//! One [`Interaction`] exists per live physical contact, keyed by an opaque
//! pointer id and bound either to a single button slot or to a stick's axis
//! pair. The binding is a hard capture: it is made once at contact-start and
//! every later move/end for that pointer id lands on the same interaction no
//! matter where the pointer has wandered on screen.
//!
//! Interactions live in insertion order. That order is the merge order during
//! message synthesis, so when two contacts target the same slot the later one
//! deterministically wins.
//!
//! The tracker never fails: moves for unknown pointers, duplicate ends and
//! contacts on non-interactive controls are all no-ops. The one thing it
//! cannot recover from on its own is a missing end event (pointer lost without
//! notice) — the surrounding layer must deliver abnormal contact loss as a
//! regular contact-end, otherwise the interaction sticks.

use tracing::{debug, trace};

use crate::interaction::polar;
use crate::layout::{ControlDeclaration, ControlPosition};

/// Opaque identity of one live contact (touch id, mouse pointer, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointerId(pub u64);

/// Output slots a contact is bound to, plus its current values
#[derive(Debug, Clone, PartialEq)]
pub enum ContactBinding {
    /// Captured on a button; binary, position-invariant once held
    Button { index: usize },

    /// Captured on a stick; values recomputed from every move
    AxisPair {
        axis_x: usize,
        axis_y: usize,
        center: ControlPosition,
        x: f32,
        y: f32,
    },
}

/// One live contact currently driving output slots
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    pointer: PointerId,
    binding: ContactBinding,
}

impl Interaction {
    pub fn pointer(&self) -> PointerId {
        self.pointer
    }

    pub fn binding(&self) -> &ContactBinding {
        &self.binding
    }
}

/// Capture registry for all live pointer interactions
#[derive(Debug, Default)]
pub struct InteractionTracker {
    active: Vec<Interaction>,
}

impl InteractionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles contact-start on a control; returns whether the pointer was captured
    ///
    /// Buttons capture with value 1. Sticks capture the axis pair with values
    /// computed from the contact position against the stick center. Bars and
    /// d-pads are display-only and never originate a capture. A start for an
    /// already-captured pointer rebinds it (the old interaction is released
    /// first).
    pub fn contact_start(
        &mut self,
        pointer: PointerId,
        pos: ControlPosition,
        control: &ControlDeclaration,
    ) -> bool {
        let binding = match control {
            ControlDeclaration::Button { button, .. } => ContactBinding::Button { index: *button },
            ControlDeclaration::Stick {
                axis_x,
                axis_y,
                pos: center,
                ..
            } => {
                let (x, y) = polar::stick_axes(*center, pos);
                ContactBinding::AxisPair {
                    axis_x: *axis_x,
                    axis_y: *axis_y,
                    center: *center,
                    x,
                    y,
                }
            }
            ControlDeclaration::Bar { .. } | ControlDeclaration::Dpad { .. } => {
                trace!("Contact on display-only control ignored");
                return false;
            }
        };

        self.active.retain(|interaction| interaction.pointer != pointer);
        debug!("Captured pointer {:?} on {:?}", pointer, binding);
        self.active.push(Interaction { pointer, binding });
        true
    }

    /// Handles contact-move for a captured pointer
    ///
    /// Axis-pair bindings recompute their values from the stored stick center;
    /// button bindings ignore position entirely. Moves for uncaptured pointers
    /// are dropped.
    pub fn contact_move(&mut self, pointer: PointerId, pos: ControlPosition) {
        let Some(interaction) = self
            .active
            .iter_mut()
            .find(|interaction| interaction.pointer == pointer)
        else {
            return;
        };

        if let ContactBinding::AxisPair { center, x, y, .. } = &mut interaction.binding {
            let (new_x, new_y) = polar::stick_axes(*center, pos);
            *x = new_x;
            *y = new_y;
        }
    }

    /// Handles contact-end (including forced release); unmatched ends are no-ops
    pub fn contact_end(&mut self, pointer: PointerId) {
        let before = self.active.len();
        self.active.retain(|interaction| interaction.pointer != pointer);

        if self.active.len() < before {
            debug!("Released pointer {:?}", pointer);
        }
    }

    /// Discards every in-flight interaction (source or layout switch)
    pub fn clear(&mut self) {
        if !self.active.is_empty() {
            debug!("Discarding {} in-flight interactions", self.active.len());
            self.active.clear();
        }
    }

    pub fn is_captured(&self, pointer: PointerId) -> bool {
        self.active
            .iter()
            .any(|interaction| interaction.pointer == pointer)
    }

    /// Live interactions in capture order (the synthesis merge order)
    pub fn interactions(&self) -> &[Interaction] {
        &self.active
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stick_at_origin() -> ControlDeclaration {
        ControlDeclaration::Stick {
            axis_x: 0,
            axis_y: 1,
            button: 0,
            pos: ControlPosition::new(100.0, 100.0),
        }
    }

    fn button(index: usize) -> ControlDeclaration {
        ControlDeclaration::Button {
            button: index,
            label: "A".into(),
            pos: ControlPosition::new(0.0, 0.0),
        }
    }

    fn axis_values(interaction: &Interaction) -> (f32, f32) {
        match interaction.binding() {
            ContactBinding::AxisPair { x, y, .. } => (*x, *y),
            other => panic!("expected axis binding, got {:?}", other),
        }
    }

    #[test]
    fn start_then_end_leaves_no_trace() {
        let mut tracker = InteractionTracker::new();
        let pointer = PointerId(7);

        assert!(tracker.contact_start(pointer, ControlPosition::new(0.0, 0.0), &button(0)));
        tracker.contact_end(pointer);

        assert!(tracker.is_empty());
        assert!(!tracker.is_captured(pointer));
    }

    #[test]
    fn duplicate_end_is_a_no_op() {
        let mut tracker = InteractionTracker::new();
        let pointer = PointerId(1);

        tracker.contact_start(pointer, ControlPosition::new(0.0, 0.0), &button(0));
        tracker.contact_end(pointer);
        tracker.contact_end(pointer);
        tracker.contact_end(PointerId(99));

        assert!(tracker.is_empty());
    }

    #[test]
    fn capture_survives_moves_far_outside_the_control() {
        let mut tracker = InteractionTracker::new();
        let pointer = PointerId(3);

        tracker.contact_start(pointer, ControlPosition::new(100.0, 100.0), &stick_at_origin());
        tracker.contact_move(pointer, ControlPosition::new(-500.0, 900.0));

        assert!(tracker.is_captured(pointer));
        let (x, y) = axis_values(&tracker.interactions()[0]);
        let magnitude = (x * x + y * y).sqrt();
        assert!(magnitude <= 1.0 + 1e-6);
        assert!(magnitude > 0.99);
    }

    #[test]
    fn moves_do_not_change_button_bindings() {
        let mut tracker = InteractionTracker::new();
        let pointer = PointerId(2);

        tracker.contact_start(pointer, ControlPosition::new(0.0, 0.0), &button(4));
        tracker.contact_move(pointer, ControlPosition::new(300.0, 300.0));

        assert_eq!(
            tracker.interactions()[0].binding(),
            &ContactBinding::Button { index: 4 }
        );
    }

    #[test]
    fn display_only_controls_never_capture() {
        let mut tracker = InteractionTracker::new();
        let dpad = ControlDeclaration::Dpad {
            axis_x: 0,
            axis_y: 1,
            pos: ControlPosition::new(50.0, 50.0),
        };
        let bar = ControlDeclaration::Bar {
            axis: 2,
            pos: ControlPosition::new(10.0, 10.0),
            rot: 0.0,
        };

        assert!(!tracker.contact_start(PointerId(1), ControlPosition::new(50.0, 50.0), &dpad));
        assert!(!tracker.contact_start(PointerId(2), ControlPosition::new(10.0, 10.0), &bar));
        assert!(tracker.is_empty());
    }

    #[test]
    fn concurrent_contacts_stay_independent() {
        let mut tracker = InteractionTracker::new();

        tracker.contact_start(PointerId(1), ControlPosition::new(100.0, 100.0), &stick_at_origin());
        tracker.contact_start(PointerId(2), ControlPosition::new(0.0, 0.0), &button(3));

        // Moving pointer 1 must not disturb pointer 2's binding.
        tracker.contact_move(PointerId(1), ControlPosition::new(70.0, 100.0));

        assert_eq!(tracker.len(), 2);
        let (x, _) = axis_values(&tracker.interactions()[0]);
        assert!((x - 1.0).abs() < 1e-6);
        assert_eq!(
            tracker.interactions()[1].binding(),
            &ContactBinding::Button { index: 3 }
        );

        tracker.contact_end(PointerId(1));
        assert_eq!(tracker.len(), 1);
        assert!(tracker.is_captured(PointerId(2)));
    }

    #[test]
    fn interactions_keep_capture_order() {
        let mut tracker = InteractionTracker::new();

        tracker.contact_start(PointerId(5), ControlPosition::new(0.0, 0.0), &button(0));
        tracker.contact_start(PointerId(6), ControlPosition::new(0.0, 0.0), &button(0));

        let pointers: Vec<PointerId> = tracker
            .interactions()
            .iter()
            .map(|interaction| interaction.pointer())
            .collect();
        assert_eq!(pointers, vec![PointerId(5), PointerId(6)]);
    }

    #[test]
    fn clear_discards_everything() {
        let mut tracker = InteractionTracker::new();

        tracker.contact_start(PointerId(1), ControlPosition::new(100.0, 100.0), &stick_at_origin());
        tracker.contact_start(PointerId(2), ControlPosition::new(0.0, 0.0), &button(1));
        tracker.clear();

        assert!(tracker.is_empty());
    }
}
