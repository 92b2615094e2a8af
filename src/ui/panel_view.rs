//! Message views: layout canvas and auto-generated fallback
//!
//! The custom view draws the active layout schema on a fixed canvas and, in
//! interactive mode, routes raw egui pointer and touch events into the
//! interaction tracker. Hit-testing happens only at contact-start; afterwards
//! the tracker's capture decides where moves and ends are delivered, so the
//! canvas never re-tests a captured pointer against control bounds.
//!
//! The auto-generated view is layout-independent: one indicator per button
//! slot and one bar per axis slot of whatever message is current.

use egui::{Align2, Color32, Event, FontId, Pos2, Rect, Sense, Stroke, TouchPhase};
use tracing::trace;

use crate::interaction::{InteractionTracker, PointerId, STICK_TRAVEL_UNITS};
use crate::layout::resolver::MessageDimensions;
use crate::layout::{ControlDeclaration, ControlPosition, LayoutSchema};
use crate::message::{self, JoyMessage};

pub const BUTTON_RADIUS: f32 = 18.0;
pub const STICK_RADIUS: f32 = 30.0;
pub const BAR_WIDTH: f32 = 80.0;
pub const BAR_HEIGHT: f32 = 10.0;
pub const DPAD_EXTENT: f32 = 26.0;

const CANVAS_SIZE: egui::Vec2 = egui::vec2(512.0, 430.0);

/// The mouse pointer shares the capture registry with real touches
const MOUSE_POINTER: PointerId = PointerId(u64::MAX);

/// Finds the interactive control whose hit-region contains the position
///
/// Only buttons and sticks originate contacts; bars and d-pads are
/// display-only and transparent to hit-testing.
pub fn control_at(schema: &LayoutSchema, pos: ControlPosition) -> Option<&ControlDeclaration> {
    schema.controls().iter().find(|control| {
        let radius = match control {
            ControlDeclaration::Button { .. } => BUTTON_RADIUS,
            ControlDeclaration::Stick { .. } => STICK_RADIUS,
            ControlDeclaration::Bar { .. } | ControlDeclaration::Dpad { .. } => return false,
        };

        let center = control.pos();
        let dx = center.x - pos.x;
        let dy = center.y - pos.y;
        dx * dx + dy * dy <= radius * radius
    })
}

/// Draws the layout canvas; returns the synthesized message in interactive mode
///
/// When `interactive` is false the canvas is a pure visualization of
/// `current` and the tracker is left untouched.
pub fn custom_view(
    ui: &mut egui::Ui,
    schema: &LayoutSchema,
    dims: MessageDimensions,
    tracker: &mut InteractionTracker,
    current: Option<&JoyMessage>,
    frame_id: &str,
    interactive: bool,
) -> Option<JoyMessage> {
    let (response, painter) = ui.allocate_painter(CANVAS_SIZE, Sense::click_and_drag());
    let canvas = response.rect;

    let produced = if interactive {
        route_pointer_events(ui.ctx(), canvas, schema, tracker);
        Some(message::from_interactions(dims, tracker, frame_id))
    } else {
        None
    };

    let display = produced.as_ref().or(current);
    draw_layout(&painter, canvas.min, schema, display);

    produced
}

/// Auto-generated view: one indicator per slot of the current message
pub fn simple_view(ui: &mut egui::Ui, current: Option<&JoyMessage>) {
    let Some(message) = current else {
        ui.label("Waiting for first data...");
        return;
    };

    ui.horizontal_wrapped(|ui| {
        for (index, value) in message.buttons.iter().enumerate() {
            let pressed = *value > 0;
            let fill = if pressed { Color32::RED } else { Color32::from_rgb(40, 80, 200) };
            let text = egui::RichText::new(format!(" {} ", index)).color(Color32::WHITE);
            ui.add(egui::Button::new(text).fill(fill));
        }
    });

    for value in &message.axes {
        ui.add(egui::ProgressBar::new(value * 0.5 + 0.5).desired_height(BAR_HEIGHT));
    }
}

/// Routes raw pointer and touch events into the tracker
///
/// Contact-starts are hit-tested inside the canvas; moves and ends go by the
/// tracker's capture alone. Pointer loss (`PointerGone`, touch cancel, focus
/// loss) is delivered as contact-end so no interaction is left dangling.
fn route_pointer_events(
    ctx: &egui::Context,
    canvas: Rect,
    schema: &LayoutSchema,
    tracker: &mut InteractionTracker,
) {
    let events = ctx.input(|input| input.events.clone());

    for event in events {
        match event {
            Event::PointerButton { pos, pressed: true, .. } => {
                start_contact(MOUSE_POINTER, pos, canvas, schema, tracker);
            }
            Event::PointerButton { pressed: false, .. } => {
                tracker.contact_end(MOUSE_POINTER);
            }
            Event::PointerMoved(pos) => {
                tracker.contact_move(MOUSE_POINTER, to_layout(canvas.min, pos));
            }
            Event::PointerGone => {
                tracker.contact_end(MOUSE_POINTER);
            }
            Event::Touch { id, phase, pos, .. } => {
                let pointer = PointerId(id.0);
                match phase {
                    TouchPhase::Start => start_contact(pointer, pos, canvas, schema, tracker),
                    TouchPhase::Move => tracker.contact_move(pointer, to_layout(canvas.min, pos)),
                    TouchPhase::End | TouchPhase::Cancel => tracker.contact_end(pointer),
                }
            }
            Event::WindowFocused(false) => {
                // Key-up and touch-end events are lost while unfocused.
                tracker.clear();
            }
            _ => {}
        }
    }
}

fn start_contact(
    pointer: PointerId,
    pos: Pos2,
    canvas: Rect,
    schema: &LayoutSchema,
    tracker: &mut InteractionTracker,
) {
    if !canvas.contains(pos) {
        return;
    }

    let layout_pos = to_layout(canvas.min, pos);
    if let Some(control) = control_at(schema, layout_pos) {
        tracker.contact_start(pointer, layout_pos, control);
    } else {
        trace!("Contact at {:?} hit no control", layout_pos);
    }
}

fn to_layout(origin: Pos2, pos: Pos2) -> ControlPosition {
    ControlPosition::new(pos.x - origin.x, pos.y - origin.y)
}

fn to_screen(origin: Pos2, pos: ControlPosition) -> Pos2 {
    Pos2::new(origin.x + pos.x, origin.y + pos.y)
}

fn draw_layout(
    painter: &egui::Painter,
    origin: Pos2,
    schema: &LayoutSchema,
    message: Option<&JoyMessage>,
) {
    let axis = |index: usize| -> f32 {
        message
            .and_then(|m| m.axes.get(index))
            .copied()
            .unwrap_or(0.0)
    };
    let button = |index: usize| -> bool {
        message
            .and_then(|m| m.buttons.get(index))
            .map(|v| *v > 0)
            .unwrap_or(false)
    };

    for control in schema.controls() {
        let center = to_screen(origin, control.pos());

        match control {
            ControlDeclaration::Button {
                button: index,
                label,
                ..
            } => {
                draw_button(painter, center, BUTTON_RADIUS, button(*index), label);
            }
            ControlDeclaration::Bar { axis: index, rot, .. } => {
                draw_bar(painter, center, axis(*index), *rot);
            }
            ControlDeclaration::Stick {
                axis_x,
                axis_y,
                button: index,
                ..
            } => {
                painter.circle_stroke(center, STICK_RADIUS, Stroke::new(2.0, Color32::GRAY));

                // Knob sits where a pointer producing these values would be.
                let knob = Pos2::new(
                    center.x - axis(*axis_x) * STICK_TRAVEL_UNITS,
                    center.y - axis(*axis_y) * STICK_TRAVEL_UNITS,
                );
                let fill = if button(*index) { Color32::RED } else { Color32::from_rgb(40, 80, 200) };
                painter.circle_filled(knob, STICK_RADIUS * 0.45, fill);
            }
            ControlDeclaration::Dpad { axis_x, axis_y, .. } => {
                let arm = DPAD_EXTENT;
                let thickness = DPAD_EXTENT * 0.6;
                let background = Color32::from_gray(60);
                painter.rect_filled(
                    Rect::from_center_size(center, egui::vec2(arm * 2.0, thickness)),
                    2,
                    background,
                );
                painter.rect_filled(
                    Rect::from_center_size(center, egui::vec2(thickness, arm * 2.0)),
                    2,
                    background,
                );

                let indicator = Pos2::new(
                    center.x - axis(*axis_x) * arm,
                    center.y - axis(*axis_y) * arm,
                );
                painter.circle_filled(indicator, thickness * 0.4, Color32::WHITE);
            }
        }
    }
}

fn draw_button(painter: &egui::Painter, center: Pos2, radius: f32, pressed: bool, label: &str) {
    let fill = if pressed { Color32::RED } else { Color32::from_rgb(40, 80, 200) };
    painter.circle_filled(center, radius, fill);
    painter.circle_stroke(center, radius, Stroke::new(2.0, Color32::from_gray(220)));
    painter.text(
        center,
        Align2::CENTER_CENTER,
        label,
        FontId::proportional(12.0),
        Color32::WHITE,
    );
}

fn draw_bar(painter: &egui::Painter, center: Pos2, value: f32, rot: f32) {
    let vertical = (rot - 90.0).abs() < 45.0;
    let fraction = (value + 1.0) * 0.5;

    let (size, fill_size) = if vertical {
        (
            egui::vec2(BAR_HEIGHT, BAR_WIDTH),
            egui::vec2(BAR_HEIGHT, BAR_WIDTH * fraction),
        )
    } else {
        (
            egui::vec2(BAR_WIDTH, BAR_HEIGHT),
            egui::vec2(BAR_WIDTH * fraction, BAR_HEIGHT),
        )
    };

    let track = Rect::from_center_size(center, size);
    painter.rect_filled(track, 1, Color32::from_gray(60));

    // Fill grows from the track's min corner along the bar axis.
    let fill = Rect::from_min_size(track.min, fill_size);
    painter.rect_filled(fill, 1, Color32::from_rgb(40, 80, 200));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::builtin_layout;

    #[test]
    fn hit_test_finds_buttons_and_sticks_only() {
        let schema = builtin_layout("steamdeck").unwrap();

        // Left stick center.
        let hit = control_at(&schema, ControlPosition::new(184.0, 308.0)).unwrap();
        assert!(matches!(hit, ControlDeclaration::Stick { axis_x: 0, .. }));

        // The d-pad never captures.
        assert!(control_at(&schema, ControlPosition::new(117.0, 243.0)).is_none());

        // Dead space.
        assert!(control_at(&schema, ControlPosition::new(256.0, 400.0)).is_none());
    }

    #[test]
    fn hit_test_respects_the_button_radius() {
        let schema = builtin_layout("steamdeck").unwrap();

        let on_edge = ControlPosition::new(397.0 + BUTTON_RADIUS - 0.5, 276.0);
        assert!(matches!(
            control_at(&schema, on_edge),
            Some(ControlDeclaration::Button { button: 0, .. })
        ));

        let just_past = ControlPosition::new(397.0 + BUTTON_RADIUS + 1.0, 276.0 + BUTTON_RADIUS);
        assert!(control_at(&schema, just_past).is_none());
    }
}
